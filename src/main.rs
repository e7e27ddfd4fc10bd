mod api;
mod config;
mod error;
mod games;
mod relay;
mod wordgen;

use warp::Filter;
use config::Config;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_server=info,warp=info".into()),
        )
        .init();

    let routes = api::relay_routes::relay_websocket_route()
        .or(api::relay_routes::health_check())
        .or(api::relay_routes::config_endpoint());

    tracing::info!(port = config.server.port, "Starting relay server");

    warp::serve(routes)
        .run(config.bind_address())
        .await;
}
