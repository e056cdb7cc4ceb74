use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Installs the global JSON subscriber and routes `log` records into it.
///
/// `level` accepts anything `EnvFilter` does, from a bare `debug` to
/// `quizpoller=debug,sqlx=warn`.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level)?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    Ok(())
}
