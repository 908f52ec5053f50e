use nodegrab_core::logging;

mod cli;

fn main() {
    // Initialize logging as early as possible; fall back to stderr if the
    // state dir is unwritable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    // Errors are reported, not turned into exit codes: runs are best-effort
    // and the process always exits 0.
    if let Err(err) = cli::run_from_args() {
        eprintln!("nodegrab error: {:#}", err);
    }
}
