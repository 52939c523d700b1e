//! AuthRelay entry point.
//!
//! Serves the AuthRelay tools over MCP stdio. Configuration:
//!
//! - `SPICEDB_PSK`: pre-shared key sent as a bearer token (required)
//! - `--endpoint`: SpiceDB HTTP gateway to talk to
//! - `--consistency`: read consistency applied to every query
//! - `RUST_LOG`: log filter (logs go to stderr)

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rmcp::{ServiceExt, transport::stdio};

use authrelay_mcp::{AuthRelayServer, ConsistencyPolicy};
use authrelay_spicedb::HttpClient;

#[derive(Parser, Debug)]
#[command(name = "authrelay", version)]
#[command(about = "MCP server exposing SpiceDB authorization queries as tools")]
struct Cli {
    /// SpiceDB HTTP gateway endpoint
    #[arg(long, default_value = "http://localhost:8443")]
    endpoint: String,

    /// Consistency mode applied to every read
    #[arg(long, value_enum, default_value_t = ConsistencyArg::Full)]
    consistency: ConsistencyArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConsistencyArg {
    /// Reflect all writes up to the moment of the request
    Full,
    /// Answer from the fastest snapshot available
    MinimizeLatency,
}

impl From<ConsistencyArg> for ConsistencyPolicy {
    fn from(arg: ConsistencyArg) -> Self {
        match arg {
            ConsistencyArg::Full => ConsistencyPolicy::FullyConsistent,
            ConsistencyArg::MinimizeLatency => ConsistencyPolicy::MinimizeLatency,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging to stderr only: stdout is reserved for the MCP stdio
    // transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let token = std::env::var("SPICEDB_PSK")
        .map_err(|_| "SPICEDB_PSK is not set; refusing to start without a pre-shared key")?;

    tracing::info!(
        endpoint = %cli.endpoint,
        consistency = ?cli.consistency,
        "starting AuthRelay"
    );

    let client = HttpClient::new(&cli.endpoint)?.with_token(token);
    let server = AuthRelayServer::new(Arc::new(client), cli.consistency.into());

    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("MCP serve error: {e:?}");
    })?;

    service.waiting().await?;
    Ok(())
}
