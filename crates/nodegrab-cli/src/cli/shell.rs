//! Interactive operator shell: one command per line, stored settings as the
//! only cross-command state.

use anyhow::Result;
use clap::{Parser, Subcommand};
use nodegrab_core::config::{self, Settings};
use nodegrab_core::fetch::{self, FetchJob};
use nodegrab_core::proxy_check;
use nodegrab_core::transport::{CurlTransport, Transport};
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Short timeout for interactive proxy probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const BANNER: &str = "\
+------------------------------------------------------------+
| nodegrab interactive shell                                 |
+------------------------------------------------------------+
|  show             show the stored configuration            |
|  set -o <path>    persist a new output path                |
|  set -p <proxy>   validate a proxy, persist if usable      |
|  run [-o] [-p]    fetch now, with optional overrides       |
|  help             show this reference                      |
|  exit             leave the shell                          |
+------------------------------------------------------------+
|  run overrides are saved only after you confirm at the end |
+------------------------------------------------------------+";

/// One parsed shell line. `no_binary_name` because tokens come straight from
/// the operator's input, with no argv[0].
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_subcommand = true)]
pub(crate) struct ShellLine {
    #[command(subcommand)]
    pub(crate) command: ShellCommand,
}

/// Closed command set; dispatch is an exhaustive match, no string table.
#[derive(Debug, Subcommand)]
pub(crate) enum ShellCommand {
    /// Show the stored configuration.
    Show,
    /// Persist settings: -o immediately, -p only after validation.
    Set {
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<String>,
        #[arg(short = 'p', long = "proxy", value_name = "ADDR")]
        proxy: Option<String>,
    },
    /// Run a fetch from the stored settings, with optional one-off overrides.
    Run {
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<String>,
        #[arg(short = 'p', long = "proxy", value_name = "ADDR")]
        proxy: Option<String>,
    },
    /// Show the command reference.
    Help,
    /// Leave the shell.
    Exit,
}

pub fn run_shell() -> Result<()> {
    let mut settings = config::load_or_init()?;
    println!("{BANNER}");

    let stdin = io::stdin();
    loop {
        print!("\nnodegrab> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF on stdin.
            println!();
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let tokens = match tokenize(line) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("parse error: {e}");
                continue;
            }
        };
        let parsed = match ShellLine::try_parse_from(tokens) {
            Ok(p) => p,
            Err(e) => {
                // Unknown command or bad arguments; stay in the loop.
                eprintln!("{e}");
                continue;
            }
        };

        match parsed.command {
            ShellCommand::Show => show(&settings),
            ShellCommand::Set { output, proxy } => handle_set(&mut settings, output, proxy),
            ShellCommand::Run { output, proxy } => handle_run(&mut settings, output, proxy),
            ShellCommand::Help => println!("{BANNER}"),
            ShellCommand::Exit => break,
        }
    }
    Ok(())
}

fn show(settings: &Settings) {
    let unset = |s: &str| {
        if s.trim().is_empty() {
            "(unset)".to_string()
        } else {
            s.to_string()
        }
    };
    println!("output path: {}", unset(&settings.output_path));
    println!("proxy:       {}", unset(&settings.proxy));
    println!("urls:        {}", config::parse_url_list(&settings.urls).len());
    println!("timeout:     {}s", settings.timeout);
}

fn handle_set(settings: &mut Settings, output: Option<String>, proxy: Option<String>) {
    if output.is_none() && proxy.is_none() {
        eprintln!("set: nothing to set (use -o and/or -p)");
        return;
    }
    if let Some(path) = output {
        settings.output_path = path.clone();
        match config::save(settings) {
            Ok(()) => println!("output path saved: {path}"),
            Err(e) => eprintln!("could not save settings: {e:#}"),
        }
    }
    if let Some(addr) = proxy {
        let probe = proxy_check::probe(&CurlTransport::new(), &addr, PROBE_TIMEOUT);
        if probe.usable {
            settings.proxy = addr.clone();
            match config::save(settings) {
                Ok(()) => println!("proxy saved: {addr}"),
                Err(e) => eprintln!("could not save settings: {e:#}"),
            }
        } else {
            eprintln!("proxy {addr} failed validation, not saved");
        }
    }
}

fn handle_run(settings: &mut Settings, output: Option<String>, proxy: Option<String>) {
    let transport = CurlTransport::new();

    // An override proxy must validate before anything runs; an unusable one
    // aborts back to the prompt.
    if let Some(addr) = &proxy {
        let probe = proxy_check::probe(&transport, addr, PROBE_TIMEOUT);
        if !probe.usable {
            eprintln!("override proxy {addr} failed validation, run aborted");
            return;
        }
        println!(
            "override proxy usable, egress {}",
            probe.observed_address.as_deref().unwrap_or("unknown")
        );
    }

    let overrides_used = output.is_some() || proxy.is_some();
    let out_path = output
        .clone()
        .unwrap_or_else(|| settings.output_path.clone());
    let effective_proxy = proxy.clone().or_else(|| {
        let stored = settings.proxy.trim();
        (!stored.is_empty()).then(|| stored.to_string())
    });

    let job = FetchJob {
        urls: config::parse_url_list(&settings.urls),
        output_path: out_path.clone().into(),
        proxy: effective_proxy,
        per_request_timeout: Duration::from_secs(settings.timeout),
        // The stored settings carry no overall budget; shell runs are
        // bounded only per request.
        total_timeout: None,
    };

    println!(
        "starting run: {} URLs -> {} ({})",
        job.urls.len(),
        out_path,
        job.proxy.as_deref().unwrap_or("direct")
    );
    match run_and_report(&transport, &job) {
        Ok(()) => {
            if overrides_used
                && confirm("save these settings to the config file?")
                && apply_overrides(settings, output.as_deref(), proxy.as_deref())
            {
                match config::save(settings) {
                    Ok(()) => println!("settings updated"),
                    Err(e) => eprintln!("could not save settings: {e:#}"),
                }
            }
        }
        Err(e) => eprintln!("run failed: {e}"),
    }
}

/// Copy confirmed one-off overrides into the settings value, touching only
/// the fields that were actually overridden. Returns true when something
/// changed and a save is warranted.
pub(crate) fn apply_overrides(
    settings: &mut Settings,
    output: Option<&str>,
    proxy: Option<&str>,
) -> bool {
    let mut changed = false;
    if let Some(p) = output {
        settings.output_path = p.to_string();
        changed = true;
    }
    if let Some(a) = proxy {
        settings.proxy = a.to_string();
        changed = true;
    }
    changed
}

/// True only for an explicit affirmative answer; anything else declines.
pub(crate) fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

fn run_and_report(transport: &dyn Transport, job: &FetchJob) -> Result<(), fetch::JobError> {
    let report = fetch::run_job_with_events(transport, job, &mut super::run::print_event)?;
    println!(
        "done: {} attempted, {} succeeded, {} failed",
        report.attempted, report.succeeded, report.failed
    );
    Ok(())
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    is_affirmative(&line)
}

/// Split an input line into tokens, honoring single and double quotes so
/// paths with spaces survive.
pub(crate) fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }
    if quote.is_some() {
        return Err("unclosed quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
