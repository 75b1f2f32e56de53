//! Diagnostic logging to stderr.
//!
//! The base level comes from `-v`/`-q`; directives in `UNSPOOL_LOG` (same
//! syntax as `RUST_LOG`) are layered on top.

use anyhow::Context;
use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

const LOG_ENV: &str = "UNSPOOL_LOG";

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn parse_directives(value: &str) -> Result<Vec<Directive>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse::<Directive>()
                .with_context(|| format!("parsing {LOG_ENV} directive {d:?}"))
        })
        .collect()
}

fn env_filter(verbose: u8, quiet: bool) -> Result<EnvFilter> {
    let mut filter = EnvFilter::default().add_directive(log_level(verbose, quiet).into());
    if let Some(var) = std::env::var_os(LOG_ENV) {
        let value = var
            .to_str()
            .with_context(|| format!("{LOG_ENV} is not unicode"))?;
        for directive in parse_directives(value)? {
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}

/// Installs the global subscriber.
pub fn init(verbose: u8, quiet: bool) -> Result<()> {
    let filter = env_filter(verbose, quiet)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(console::colors_enabled_stderr())
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("installing log subscriber")
}
