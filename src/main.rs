use anyhow::Result;
use clap::Parser;
use control_conditions::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // handle broken pipe gracefully (e.g., when piping to `head` or `jq` that exits early)
    reset_sigpipe();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    cli::run(cli)
}

/// logs go to stderr so JSON output on stdout stays parseable
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "warn,control_conditions=debug",
            _ => "warn,control_conditions=trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// reset SIGPIPE to default behavior (terminate process) instead of panicking
fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
