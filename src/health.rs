// Minimal liveness endpoint: any request, any path, gets a 200 with a
// static body. Hosting platforms use this to decide the process is up.

use axum::Router;

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let app = Router::new().fallback(|| async { "greeter bot is running!" });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "health endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}
