//! arith-server: serves arithmetic tools on stdin/stdout. Logs go to stderr (`RUST_LOG`).

use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();

    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = chatgraph_arith::serve(stdin, tokio::io::stdout()).await {
        tracing::error!(error = %e, "stdio loop failed");
        std::process::exit(1);
    }
}
