//! Dependency wiring.
//!
//! Repository → MessagePusher → UseCases → AppState → Server の順に組み立てます。

use std::{collections::HashMap, sync::Arc};

use hiroba_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::{
    config::ServerConfig,
    domain::{ChatState, ConnectionRegistry, RoomName, RoomStore, TypingTracker},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryChatRepository, InMemoryPresenceRepository},
    },
    ui::{Server, state::AppState},
    usecase::{
        ConnectParticipantUseCase, DeliverySequencer, DisconnectParticipantUseCase,
        ExpireTypingUseCase, GetChatHistoryUseCase, GetUserListUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, SendMessageUseCase, UpdateTypingUseCase,
    },
};

/// 設定からサーバーを組み立てる（システム時計を使う）
pub fn build_server(config: &ServerConfig) -> Server {
    build_server_with_clock(config, Arc::new(SystemClock))
}

/// 時計を指定してサーバーを組み立てる
pub fn build_server_with_clock(config: &ServerConfig, clock: Arc<dyn Clock>) -> Server {
    // 1. Repository (in-memory)
    let mut rooms = RoomStore::new(config.history_capacity);
    if config.prune_empty_rooms {
        let pinned = match RoomName::new(config.default_room.as_str()) {
            Ok(room) => Some(room),
            Err(e) => {
                tracing::warn!(
                    "Default room '{}' is not a valid room name ({}); every empty room will be removed",
                    config.default_room,
                    e
                );
                None
            }
        };
        rooms = rooms.with_pruning(pinned);
    }
    let state = ChatState::new(ConnectionRegistry::new(config.max_connections), rooms);
    let repository = Arc::new(InMemoryChatRepository::new(Arc::new(Mutex::new(state))));

    let typing_timeout_ms = i64::try_from(config.typing_timeout.as_millis()).unwrap_or(i64::MAX);
    let presence = Arc::new(InMemoryPresenceRepository::new(Arc::new(Mutex::new(
        TypingTracker::new(typing_timeout_ms),
    ))));

    // 2. MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
        HashMap::new(),
    ))));

    // 3. UseCases
    let sequencer = Arc::new(DeliverySequencer::new());
    let app_state = AppState {
        connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            clock.clone(),
            sequencer.clone(),
        )),
        disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
            repository.clone(),
            presence.clone(),
            message_pusher.clone(),
            clock.clone(),
            sequencer.clone(),
        )),
        join_room_usecase: Arc::new(JoinRoomUseCase::new(
            repository.clone(),
            presence.clone(),
            message_pusher.clone(),
            clock.clone(),
            sequencer.clone(),
        )),
        leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
            repository.clone(),
            presence.clone(),
            message_pusher.clone(),
            clock.clone(),
            sequencer.clone(),
        )),
        send_message_usecase: Arc::new(
            SendMessageUseCase::new(
                repository.clone(),
                presence.clone(),
                message_pusher.clone(),
                clock.clone(),
                sequencer.clone(),
            )
            .with_max_message_length(config.max_message_length),
        ),
        update_typing_usecase: Arc::new(UpdateTypingUseCase::new(
            repository.clone(),
            presence.clone(),
            message_pusher.clone(),
            clock.clone(),
            sequencer.clone(),
        )),
        get_chat_history_usecase: Arc::new(GetChatHistoryUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            sequencer.clone(),
        )),
        get_user_list_usecase: Arc::new(GetUserListUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            sequencer.clone(),
        )),
        message_pusher: message_pusher.clone(),
        outbound_queue_capacity: config.outbound_queue_capacity.max(1),
    };
    let expire_typing_usecase = Arc::new(ExpireTypingUseCase::new(
        repository,
        presence,
        message_pusher,
        clock,
        sequencer,
    ));

    // 4. Server
    Server::new(
        app_state,
        expire_typing_usecase,
        config.typing_sweep_interval,
    )
}
