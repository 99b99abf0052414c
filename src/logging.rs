use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the global subscriber. `verbosity` is the number of `-v` flags.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level(verbosity))
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
