use crate::{
    error::Result,
    services::auth::{CurrentUser, User},
    services::ChangeSubscription,
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(bookmark_feed))
}

/// Live change feed for the caller's bookmarks
/// GET /api/feed (WebSocket)
///
/// 每次连接建立全新订阅，断开期间的事件不重放。
async fn bookmark_feed(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let subscription = state.change_feed.subscribe(&user.id);
    Ok(ws.on_upgrade(move |socket| handle_feed(socket, user, subscription)))
}

async fn handle_feed(socket: WebSocket, user: User, mut subscription: ChangeSubscription) {
    info!("Change feed connected for user: {}", user.id);

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            event = subscription.recv() => {
                match event {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json_str) => {
                                if let Err(e) = ws_tx.send(Message::Text(json_str)).await {
                                    debug!("Failed to send feed event, closing: {}", e);
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("Failed to serialize change event: {}", e);
                            }
                        }
                    }
                    None => {
                        debug!("Change feed channel closed for user: {}", user.id);
                        break;
                    }
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ws_tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // 订阅是单向的，忽略客户端的其他消息
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error for user {}: {}", user.id, e);
                        break;
                    }
                }
            }
        }
    }

    // drop订阅即退订
    info!("Change feed disconnected for user: {}", user.id);
}
