//! paranoid-cascade: interactive trigger installer
//!
//! Scans a schema for soft-delete relations and asks, one relation at a time,
//! whether a cascade trigger should be installed.
//!
//! ## Usage
//! ```text
//! paranoid-cascade '{"connection":{"dialect":"postgres","url":"postgres://..."},"schema":"public"}'
//! paranoid-cascade cascade.yaml
//! echo '{"connection":{...}}' | paranoid-cascade    # config line, then answers
//! ```
//!
//! ## Configuration
//! - First argument: a JSON document, or a YAML file path
//! - PARANOID_CASCADE_CONFIG: YAML file path (when no argument is given)
//! - PARANOID_CASCADE__*: overrides for YAML-loaded configuration
//! - PARANOID_CASCADE_LOG: log filter (default: info), written to stderr

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use paranoid_cascade::config::{CascadeConfig, CONFIG_ENV_VAR};
use paranoid_cascade::error::CascadeError;
use paranoid_cascade::session::{run, Session};
use paranoid_cascade::sql;
use paranoid_cascade::utils::bootstrap::{connect_with_retry, init_tracing};

const CONNECT_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut stdin = BufReader::new(tokio::io::stdin());
    let config = load_config(std::env::args().nth(1), &mut stdin).await?;

    let executor = connect_with_retry(
        &config.connection.dialect.to_string(),
        CONNECT_ATTEMPTS,
        || sql::connect(&config.connection),
    )
    .await?;

    let mut session = Session::from_config(executor, &config)?;
    let mut stdout = tokio::io::stdout();
    let report = run(&mut session, stdin, &mut stdout).await?;

    info!(%report, "paranoid-cascade finished");
    Ok(())
}

/// Argument JSON, else a YAML file (argument or environment), else one JSON
/// line from `input`.
async fn load_config<R>(arg: Option<String>, input: &mut R) -> Result<CascadeConfig, CascadeError>
where
    R: AsyncBufRead + Unpin,
{
    match arg {
        Some(arg) if arg.trim_start().starts_with('{') => Ok(CascadeConfig::from_json(&arg)?),
        Some(path) => Ok(CascadeConfig::load(Some(&path))?),
        None if std::env::var(CONFIG_ENV_VAR).is_ok() => Ok(CascadeConfig::load(None)?),
        None => {
            let mut line = String::new();
            input.read_line(&mut line).await?;
            Ok(CascadeConfig::from_json(&line)?)
        }
    }
}
