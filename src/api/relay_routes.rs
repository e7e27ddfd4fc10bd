use std::sync::Arc;
use warp::Filter;

use crate::config::Config;
use crate::relay::RelayServer;
use crate::wordgen::WordSource;
use super::relay_websocket;

/// Creates the signaling WebSocket route around an existing relay server
pub fn relay_websocket_route_with(
    relay_server: Arc<RelayServer>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("ws")
        .and(warp::ws())
        .and(with_relay_server(relay_server))
        .map(|ws: warp::ws::Ws, relay_server: Arc<RelayServer>| {
            ws.on_upgrade(move |websocket| {
                relay_websocket::handle_relay_websocket(websocket, relay_server)
            })
        })
}

/// Creates the signaling WebSocket route with environment configuration
pub fn relay_websocket_route() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let config = Config::from_env();
    let relay_server = Arc::new(RelayServer::new(
        WordSource::from_env(),
        config.rooms.default_room,
    ));
    relay_websocket_route_with(relay_server)
}

pub fn health_check() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("healthz")
        .and(warp::get())
        .map(|| {
            warp::reply::json(&serde_json::json!({
                "status": "healthy",
                "service": "Call Relay Server",
                "version": "1.0.0"
            }))
        })
}

pub fn config_endpoint() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("config")
        .and(warp::get())
        .map(|| {
            use std::env;

            let config = serde_json::json!({
                "SIGNALING_WEBSOCKET_URL": env::var("SIGNALING_WEBSOCKET_URL").ok(),
                "STUN_SERVER_URL": env::var("STUN_SERVER_URL").ok(),
            });

            warp::reply::json(&config)
        })
}

fn with_relay_server(
    relay_server: Arc<RelayServer>,
) -> impl Filter<Extract = (Arc<RelayServer>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || relay_server.clone())
}
