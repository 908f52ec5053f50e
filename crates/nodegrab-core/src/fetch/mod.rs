//! Sequential fetch executor: one GET per URL, bodies appended to one file.
//!
//! Strictly single-threaded. URLs are processed in list order and the output
//! file holds one body per successful URL, each followed by a blank line,
//! in that same order.

use crate::transport::{truncate_msg, RequestOptions, Transport};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Maximum characters of an error message echoed per failed URL.
pub const ERR_MSG_CHARS: usize = 50;

/// One batch of fetches. Immutable once execution starts.
#[derive(Debug, Clone)]
pub struct FetchJob {
    /// Ordered URL list; duplicates are fetched again, not collapsed.
    pub urls: Vec<String>,
    /// Output file, created/truncated at job start.
    pub output_path: PathBuf,
    /// Proxy applied to every request, or None for direct connections.
    pub proxy: Option<String>,
    /// Budget for each individual request.
    pub per_request_timeout: Duration,
    /// Wall-clock budget for the whole batch; None means unbounded (the
    /// interactive surface runs without one).
    pub total_timeout: Option<Duration>,
}

/// Aggregate accounting for a finished (or early-terminated) job.
///
/// Holds `succeeded + failed == attempted <= urls.len()`, with
/// `attempted < urls.len()` only when `terminated_early` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// True when the overall budget expired before the list was exhausted.
    pub terminated_early: bool,
}

/// Per-URL progress surfaced to the caller while the loop runs, so the
/// operator sees each URL and each failure as it happens. Diagnostics still
/// go to `tracing`; rendering these is the caller's job.
#[derive(Debug)]
pub enum FetchEvent<'a> {
    /// A request is about to start. `index` is 1-based.
    Started {
        index: usize,
        total: usize,
        url: &'a str,
    },
    /// The body was fetched and written.
    Succeeded { url: &'a str },
    /// The request failed; the batch continues.
    Failed {
        url: &'a str,
        error: &'a crate::transport::FetchError,
    },
}

/// Failures that abort a job before or during the loop. Per-URL fetch
/// failures are not here: they are counted and the loop continues.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Missing output path or empty URL list; no network I/O was attempted.
    #[error("configuration: {0}")]
    Config(String),
    /// Output file could not be created or written. Partial contents up to
    /// the failure point may remain on disk.
    #[error("output file: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the job to completion, appending each successful body plus a blank
/// line to `output_path` and returning the aggregate counts.
///
/// The overall budget is checked only between requests: a single slow
/// request can overrun it by up to its own per-request timeout. In-flight
/// requests are never cancelled.
pub fn run_job(transport: &dyn Transport, job: &FetchJob) -> Result<FetchReport, JobError> {
    run_job_with_events(transport, job, &mut |_| {})
}

/// Like [`run_job`], invoking `on_event` once per URL state change so the
/// caller can report progress and failures live.
pub fn run_job_with_events(
    transport: &dyn Transport,
    job: &FetchJob,
    on_event: &mut dyn FnMut(FetchEvent<'_>),
) -> Result<FetchReport, JobError> {
    if job.output_path.as_os_str().is_empty() {
        return Err(JobError::Config("no output path set".to_string()));
    }
    if job.urls.is_empty() {
        return Err(JobError::Config("URL list is empty".to_string()));
    }

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut out = fs::File::create(&job.output_path)?;

    let opts = RequestOptions::new(job.proxy.clone(), job.per_request_timeout);
    let start = Instant::now();
    let total = job.urls.len();
    let mut report = FetchReport {
        attempted: 0,
        succeeded: 0,
        failed: 0,
        terminated_early: false,
    };

    for (idx, url) in job.urls.iter().enumerate() {
        if let Some(budget) = job.total_timeout {
            if start.elapsed() >= budget {
                tracing::warn!(
                    "overall budget ({}s) spent, dropping {} remaining URLs",
                    budget.as_secs(),
                    total - idx
                );
                report.terminated_early = true;
                break;
            }
        }

        tracing::info!("[{}/{}] fetching {}", idx + 1, total, url);
        on_event(FetchEvent::Started {
            index: idx + 1,
            total,
            url,
        });
        report.attempted += 1;
        match transport.get(url, &opts) {
            Ok(body) => {
                out.write_all(body.as_bytes())?;
                out.write_all(b"\n\n")?;
                report.succeeded += 1;
                tracing::debug!("fetched {} ({} bytes)", url, body.len());
                on_event(FetchEvent::Succeeded { url });
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    "fetch failed: {} ({})",
                    url,
                    truncate_msg(&e.to_string(), ERR_MSG_CHARS)
                );
                on_event(FetchEvent::Failed { url, error: &e });
            }
        }
    }

    out.flush()?;
    Ok(report)
}
