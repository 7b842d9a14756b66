//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, Nickname, Notification, Rejection, RejectionCode, RoomName, UserId,
        ValueObjectError,
    },
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::ConnectError,
};

/// 1 フレームの書き込みにかけられる時間。超えた接続は切断する。
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Models
    let (user_id, nickname) = match parse_identity(query.user_id, query.nickname) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Rejecting connection with invalid identity: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Create a bounded queue for this connection
    let (tx, rx) = mpsc::channel(state.outbound_queue_capacity);

    // (register_client is called inside the UseCase)
    let connection = match state
        .connect_participant_usecase
        .execute(user_id, nickname, tx)
        .await
    {
        Ok(connection) => connection,
        Err(ConnectError::ResourceExhausted(max)) => {
            tracing::warn!("Connection limit ({}) reached. Rejecting connection.", max);
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
        Err(ConnectError::Internal(reason)) => {
            tracing::error!("Failed to register connection: {}", reason);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let connection_id = connection.id;
    tracing::info!(
        "Connection '{}' accepted as '{}' ({})",
        connection_id,
        connection.nickname,
        connection.user_id
    );

    let state_on_failure = state.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade for '{}' failed: {}", connection_id, e);
            tokio::spawn(async move {
                state_on_failure
                    .disconnect_participant_usecase
                    .execute(connection_id)
                    .await;
            });
        })
        .on_upgrade(move |socket| handle_socket(socket, state, connection_id, rx)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when the queue is closed (the connection was unregistered or dropped as a
/// slow client) or when a write fails or stalls.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
    connection_id: ConnectionId,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match tokio::time::timeout(SEND_TIMEOUT, sender.send(Message::Text(msg.into()))).await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!("Failed to write to '{}': {}", connection_id, e);
                    break;
                }
                Err(_) => {
                    tracing::warn!("Write to '{}' timed out, disconnecting", connection_id);
                    break;
                }
            }
        }
        let _ = sender.close().await;
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    rx: mpsc::Receiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_text(&state_clone, connection_id, text.as_str()).await;
                }
                Message::Binary(_) => {
                    reject(
                        &state_clone,
                        &connection_id,
                        Rejection::new(
                            RejectionCode::InvalidPayload,
                            "binary frames are not supported",
                        ),
                    )
                    .await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", connection_id);
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to deliver queued events to this client
    let mut send_task = pusher_loop(rx, sender, connection_id);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Use DisconnectParticipantUseCase to handle disconnection
    match state
        .disconnect_participant_usecase
        .execute(connection_id)
        .await
    {
        Some(disconnection) => {
            tracing::info!(
                "Connection '{}' ({}) disconnected",
                connection_id,
                disconnection.connection.nickname
            );
        }
        None => {
            tracing::debug!("Connection '{}' was already cleaned up", connection_id);
        }
    }
}

/// 1 フレーム分のイベントを処理する。失敗は送信元にだけ error イベントで返す。
async fn handle_text(state: &AppState, connection_id: ConnectionId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Failed to parse event from '{}': {}", connection_id, e);
            reject(
                state,
                &connection_id,
                Rejection::new(RejectionCode::InvalidPayload, format!("invalid event: {}", e)),
            )
            .await;
            return;
        }
    };

    let kind = event.kind();
    tracing::debug!("Received '{}' from '{}'", kind, connection_id);

    if let Err(rejection) = dispatch(state, connection_id, event).await {
        tracing::warn!("Rejected '{}' from '{}': {}", kind, connection_id, rejection);
        reject(state, &connection_id, rejection).await;
    }
}

async fn dispatch(
    state: &AppState,
    connection_id: ConnectionId,
    event: ClientEvent,
) -> Result<(), Rejection> {
    match event {
        ClientEvent::Join { room } => {
            state
                .join_room_usecase
                .execute(connection_id, parse_room(room)?)
                .await
                .map_err(|e| Rejection::from(&e))?;
        }
        ClientEvent::Leave { room } => {
            state
                .leave_room_usecase
                .execute(connection_id, parse_room(room)?)
                .await
                .map_err(|e| Rejection::from(&e))?;
        }
        ClientEvent::Message {
            room,
            message,
            user_id,
            nickname,
        } => {
            let room = parse_room(room)?;
            let (user_id, nickname) = parse_identity(user_id, nickname).map_err(invalid_identity)?;
            state
                .send_message_usecase
                .execute(connection_id, room, message, user_id, nickname)
                .await
                .map_err(|e| Rejection::from(&e))?;
        }
        ClientEvent::Typing {
            room,
            is_typing,
            user_id,
            nickname,
        } => {
            let room = parse_room(room)?;
            let (user_id, nickname) = parse_identity(user_id, nickname).map_err(invalid_identity)?;
            state
                .update_typing_usecase
                .execute(connection_id, room, is_typing, user_id, nickname)
                .await
                .map_err(|e| Rejection::from(&e))?;
        }
        ClientEvent::GetChatHistory { room } => {
            state
                .get_chat_history_usecase
                .execute(connection_id, parse_room(room)?)
                .await;
        }
        ClientEvent::GetUserList { room } => {
            state
                .get_user_list_usecase
                .execute(connection_id, parse_room(room)?)
                .await;
        }
    }
    Ok(())
}

async fn reject(state: &AppState, connection_id: &ConnectionId, rejection: Rejection) {
    if let Err(e) = state
        .message_pusher
        .push_to(connection_id, &Notification::Rejected(rejection))
        .await
    {
        tracing::debug!("Failed to send error to '{}': {}", connection_id, e);
    }
}

fn parse_room(raw: String) -> Result<RoomName, Rejection> {
    RoomName::new(raw).map_err(|e| Rejection::new(RejectionCode::InvalidRoom, e.to_string()))
}

fn invalid_identity(error: ValueObjectError) -> Rejection {
    Rejection::new(RejectionCode::InvalidIdentity, error.to_string())
}

/// 名乗りの検証。空文字列は名乗りなしとして扱う。
fn parse_identity(
    user_id: Option<String>,
    nickname: Option<String>,
) -> Result<(Option<UserId>, Option<Nickname>), ValueObjectError> {
    let user_id = user_id
        .filter(|raw| !raw.trim().is_empty())
        .map(UserId::new)
        .transpose()?;
    let nickname = nickname
        .filter(|raw| !raw.trim().is_empty())
        .map(Nickname::new)
        .transpose()?;
    Ok((user_id, nickname))
}
