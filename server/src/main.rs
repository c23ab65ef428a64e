use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "server", about = "Serve boolean and ranked search over a prepared corpus")]
struct Args {
    /// Corpus root holding lemmas/, tfidf-lemmas/ and inverted_index.txt
    #[arg(long, default_value = "./data")]
    data: PathBuf,
    /// Canonicalize boolean query terms with a Snowball stemmer for this language
    #[arg(long)]
    stemmer: Option<String>,
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let app = lemmadex_server::build_app(&args.data, args.stemmer.as_deref())
        .with_context(|| format!("loading corpus from {}", args.data.display()))?;

    let addr = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, data = %args.data.display(), "serving search");
    axum::serve(listener, app).await?;
    Ok(())
}
