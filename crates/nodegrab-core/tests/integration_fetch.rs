//! Integration tests: fetch executor against local HTTP servers through the
//! real curl transport.

mod common;

use common::text_server::{self, TextServerOptions};
use nodegrab_core::fetch::{run_job, FetchJob};
use nodegrab_core::transport::CurlTransport;
use std::time::Duration;
use tempfile::tempdir;

fn job(urls: Vec<String>, output: std::path::PathBuf) -> FetchJob {
    FetchJob {
        urls,
        output_path: output,
        proxy: None,
        per_request_timeout: Duration::from_secs(5),
        total_timeout: Some(Duration::from_secs(60)),
    }
}

#[test]
fn fetches_all_urls_in_order() {
    let a = text_server::start("node-list-alpha");
    let b = text_server::start("node-list-beta");
    let dir = tempdir().unwrap();
    let out = dir.path().join("nodes.txt");

    let report = run_job(
        &CurlTransport::new(),
        &job(vec![a.url().to_string(), b.url().to_string()], out.clone()),
    )
    .expect("run_job");

    assert_eq!(report.attempted, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert!(!report.terminated_early);
    assert_eq!(a.hits(), 1);
    assert_eq!(b.hits(), 1);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "node-list-alpha\n\nnode-list-beta\n\n"
    );
}

#[test]
fn non_2xx_counts_as_failure_and_contributes_no_block() {
    let good = text_server::start("kept");
    let bad = text_server::start_with_options(
        "dropped",
        TextServerOptions {
            status: 404,
            ..Default::default()
        },
    );
    let tail = text_server::start("tail");
    let dir = tempdir().unwrap();
    let out = dir.path().join("nodes.txt");

    let report = run_job(
        &CurlTransport::new(),
        &job(
            vec![
                good.url().to_string(),
                bad.url().to_string(),
                tail.url().to_string(),
            ],
            out.clone(),
        ),
    )
    .expect("run_job");

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "kept\n\ntail\n\n");
}

#[test]
fn slow_origin_times_out_but_batch_continues() {
    let slow = text_server::start_with_options(
        "never delivered in time",
        TextServerOptions {
            status: 200,
            delay: Some(Duration::from_secs(3)),
        },
    );
    let fast = text_server::start("delivered");
    let dir = tempdir().unwrap();
    let out = dir.path().join("nodes.txt");

    let mut j = job(
        vec![slow.url().to_string(), fast.url().to_string()],
        out.clone(),
    );
    j.per_request_timeout = Duration::from_secs(1);
    let report = run_job(&CurlTransport::new(), &j).expect("run_job");

    assert_eq!(report.attempted, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "delivered\n\n");
}

#[test]
fn connection_refused_counts_as_failure() {
    // Nothing listens on this port: bind a listener to grab a free port,
    // then drop it before the fetch.
    let dead_url = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://127.0.0.1:{}/", l.local_addr().unwrap().port())
    };
    let alive = text_server::start("alive");
    let dir = tempdir().unwrap();
    let out = dir.path().join("nodes.txt");

    let report = run_job(
        &CurlTransport::new(),
        &job(vec![dead_url, alive.url().to_string()], out.clone()),
    )
    .expect("run_job");

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "alive\n\n");
}

#[test]
fn total_budget_drops_remaining_urls() {
    let slow = text_server::start_with_options(
        "slow body",
        TextServerOptions {
            status: 200,
            delay: Some(Duration::from_millis(400)),
        },
    );
    let never = text_server::start("never reached");
    let dir = tempdir().unwrap();
    let out = dir.path().join("nodes.txt");

    let mut j = job(
        vec![slow.url().to_string(), never.url().to_string()],
        out.clone(),
    );
    j.total_timeout = Some(Duration::from_millis(200));
    let report = run_job(&CurlTransport::new(), &j).expect("run_job");

    // The first request is allowed to overrun the budget; the second URL is
    // dropped at the between-requests check.
    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, 1);
    assert!(report.terminated_early);
    assert_eq!(never.hits(), 0);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "slow body\n\n");
}
