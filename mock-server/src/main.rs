use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let env = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.to_string());
    let port = env("PORT", "3000");
    let config = MockConfig::new(&env("TURNITIN_ACCOUNT_ID", "100"), &env("TURNITIN_SHARED_SECRET", "secret"));

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, account_id = %config.account_id, endpoint = mock_server::ENDPOINT, "listening");
    mock_server::run(listener, config).await
}
