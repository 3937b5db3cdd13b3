use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::info;

use venturelink::initialize_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app = initialize_app()?;

    let port: u16 = std::env
        ::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
