mod logging;

use std::path::PathBuf;

use clap::Parser;
use magicport::exit::{self, Fatal};

use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "magicport",
    version,
    about = "libmagic port speaking framed terms over stdin/stdout"
)]
struct Cli {
    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        env = "MAGICPORT_LOG_LEVEL"
    )]
    log_level: LogLevel,

    /// Path to the libmagic shared library.
    #[arg(long, value_name = "PATH", env = "MAGICPORT_LIBMAGIC")]
    libmagic: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        target = env!("MAGICPORT_BUILD_TARGET"),
        "magicport starting"
    );

    if let Err(err) = ctrlc::set_handler(|| {
        tracing::info!("termination signal received");
        std::process::exit(exit::SUCCESS);
    }) {
        tracing::warn!(error = %err, "signal handler not installed");
    }

    std::process::exit(run(&cli));
}

#[cfg(unix)]
fn run(cli: &Cli) -> i32 {
    use std::io;

    use magicport::magic::LibMagic;
    use magicport::Port;

    let engine = match LibMagic::load(cli.libmagic.as_deref()) {
        Ok(engine) => engine,
        Err(err) => return unavailable(err.into()),
    };
    tracing::debug!(libmagic_version = ?engine.version(), "libmagic loaded");

    let mut port = Port::new(engine, io::stdin().lock(), io::stdout().lock());
    port.run().exit_code()
}

#[cfg(not(unix))]
fn run(_cli: &Cli) -> i32 {
    unavailable(magicport::magic::LibraryError::Unsupported.into())
}

fn unavailable(fatal: Fatal) -> i32 {
    tracing::error!(error = %fatal, "libmagic unavailable");
    fatal.code()
}
