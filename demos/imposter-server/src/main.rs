use imposter::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// First CLI argument, then `IMPOSTER_BIND`, then [`DEFAULT_BIND`].
fn bind_addr(arg: Option<String>, env: Option<String>) -> String {
    arg.or(env)
        .filter(|addr| !addr.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = bind_addr(std::env::args().nth(1), std::env::var("IMPOSTER_BIND").ok());
    let server = ImposterServer::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "imposter server listening");

    server.run().await?;
    Ok(())
}
