use anyhow::Context;
use muralis_core::models::TerminalRange;
use muralis_core::Config;
use serde::Serialize;

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so JSON results on stdout stay machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Validate the configuration a command actually uses.
///
/// Offline commands only need the pipeline settings; storage settings are
/// checked only when the command writes objects.
pub fn check_config(config: &Config, needs_storage: bool) -> anyhow::Result<()> {
    if needs_storage {
        config.validate()
    } else {
        config.pipeline.validate()
    }
    .context("Invalid configuration")
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize result")?;
    println!("{}", out);
    Ok(())
}

/// Parse `minW,maxW,minH,maxH` into a terminal range.
pub fn parse_terminal(value: &str) -> Result<TerminalRange, String> {
    let parts: Vec<u32> = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid terminal range {:?}: {}", value, e))?;

    match parts.as_slice() {
        [min_width, max_width, min_height, max_height] => Ok(TerminalRange::new(
            *min_width,
            *max_width,
            *min_height,
            *max_height,
        )),
        _ => Err(format!(
            "terminal range must be minW,maxW,minH,maxH, got {:?}",
            value
        )),
    }
}
