//! One-shot run: resolve parameters, validate the proxy, execute the batch.

use super::Cli;
use anyhow::Result;
use nodegrab_core::config::{self, Settings};
use nodegrab_core::fetch::{self, FetchEvent, FetchJob};
use nodegrab_core::proxy_check;
use nodegrab_core::transport::{truncate_msg, CurlTransport};
use std::time::Duration;

/// Render one fetch event for the console: progress to stdout, failures to
/// stderr. Shared with the interactive shell.
pub(crate) fn print_event(event: FetchEvent<'_>) {
    match event {
        FetchEvent::Started { index, total, url } => {
            println!("[{index}/{total}] fetching {url}");
        }
        FetchEvent::Succeeded { url } => println!("  ok: {url}"),
        FetchEvent::Failed { url, error } => eprintln!(
            "  failed: {url} ({})",
            truncate_msg(&error.to_string(), fetch::ERR_MSG_CHARS)
        ),
    }
}

/// Parameters after applying precedence: explicit flag, then a non-empty
/// stored value, then the built-in default. Nothing here is ever written
/// back to the settings store.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct EffectiveParams {
    pub output: String,
    pub urls: Vec<String>,
    /// Candidate proxy to validate; None under --no-proxy.
    pub proxy: Option<String>,
    pub timeout_secs: u64,
    pub total_timeout_secs: u64,
}

pub(crate) fn resolve(cli: &Cli, stored: &Settings) -> EffectiveParams {
    let default_urls = config::DEFAULT_URLS.join(",");
    let proxy = if cli.no_proxy {
        None
    } else {
        Some(config::resolve_str(
            cli.proxy.as_deref(),
            &stored.proxy,
            config::DEFAULT_PROXY,
        ))
    };
    EffectiveParams {
        output: config::resolve_str(
            cli.output.as_deref(),
            &stored.output_path,
            config::DEFAULT_OUTPUT,
        ),
        urls: config::parse_url_list(&config::resolve_str(
            cli.urls.as_deref(),
            &stored.urls,
            &default_urls,
        )),
        proxy,
        timeout_secs: cli.timeout.unwrap_or(stored.timeout),
        total_timeout_secs: cli.total_timeout.unwrap_or(config::DEFAULT_TOTAL_TIMEOUT_SECS),
    }
}

pub fn run_once(cli: &Cli) -> Result<()> {
    let stored = config::load_or_init()?;
    tracing::debug!("stored settings: {:?}", stored);
    let params = resolve(cli, &stored);

    println!("Configuration:");
    println!("  output file:      {}", params.output);
    println!(
        "  proxy:            {}",
        params.proxy.as_deref().unwrap_or("(direct)")
    );
    println!("  urls:             {}", params.urls.len());
    println!("  request timeout:  {}s", params.timeout_secs);
    println!("  total budget:     {}s", params.total_timeout_secs);

    let transport = CurlTransport::new();
    let timeout = Duration::from_secs(params.timeout_secs);

    // Validation failure is non-fatal here: the batch proceeds direct.
    let proxy = match &params.proxy {
        None => {
            println!("Proxy disabled, connecting directly.");
            None
        }
        Some(candidate) => {
            println!("Validating proxy {candidate} ...");
            let probe = proxy_check::probe(&transport, candidate, timeout);
            if probe.usable {
                println!(
                    "Proxy in effect, egress {}.",
                    probe.observed_address.as_deref().unwrap_or("unknown")
                );
                Some(candidate.clone())
            } else {
                eprintln!("Proxy {candidate} failed validation, connecting directly.");
                None
            }
        }
    };

    let job = FetchJob {
        urls: params.urls,
        output_path: params.output.clone().into(),
        proxy,
        per_request_timeout: timeout,
        total_timeout: Some(Duration::from_secs(params.total_timeout_secs)),
    };

    let report = fetch::run_job_with_events(&transport, &job, &mut print_event)?;
    if report.terminated_early {
        eprintln!(
            "Overall budget ({}s) spent, {} URLs dropped.",
            params.total_timeout_secs,
            job.urls.len() - report.attempted
        );
    }
    println!(
        "Done: {} attempted, {} succeeded, {} failed.",
        report.attempted, report.succeeded, report.failed
    );
    println!("Saved to {}", params.output);
    Ok(())
}
