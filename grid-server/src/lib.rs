use std::sync::Arc;

use tokio::sync::oneshot;
use warp::Filter;

use crate::registry::RoomRegistry;
use crate::room_task::RoomCommand;
use crate::websocket::ConnectionManager;

pub mod arbitration;
pub mod bus;
pub mod config;
pub mod presence;
pub mod registry;
pub mod room_task;
pub mod websocket;

pub fn create_routes(
    connections: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connections_filter = warp::any().map({
        let connections = connections.clone();
        move || connections.clone()
    });

    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    // WebSocket endpoint
    let ws = warp::path("ws")
        .and(warp::ws())
        .and(connections_filter.clone())
        .and(registry_filter.clone())
        .map(|ws: warp::ws::Ws, connections, registry| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, connections, registry))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Room snapshot, for spectating and reconnect UIs.
    let room_summary = warp::path!("room" / String)
        .and(warp::get())
        .and(registry_filter.clone())
        .and_then(handle_room_summary);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    ws.or(health)
        .or(room_summary)
        .with(cors)
        .with(warp::log("grid_server"))
}

async fn handle_room_summary(
    code: String,
    registry: Arc<RoomRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let code = code.to_uppercase();

    let not_found = || {
        warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Room not found"
            })),
            warp::http::StatusCode::NOT_FOUND,
        )
    };

    let Some(room) = registry.get(&code).await else {
        return Ok(not_found());
    };

    let (reply, response) = oneshot::channel();
    if room.send(RoomCommand::Snapshot { reply }).is_err() {
        return Ok(not_found());
    }

    match response.await {
        Ok(summary) => Ok(warp::reply::with_status(
            warp::reply::json(&summary),
            warp::http::StatusCode::OK,
        )),
        Err(_) => Ok(not_found()),
    }
}
