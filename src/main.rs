use mentor_portal_api::{app, config};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL / PORTAL_DB_*.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!(
        "starting mentor portal against database {} at {}:{}",
        config.database.database,
        config.database.host,
        config.database.port
    );

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Mentor portal listening on http://{}", bind_addr);

    axum::serve(listener, app()).await.expect("server");
}
