//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::MessagePusher,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, GetChatHistoryUseCase,
        GetUserListUseCase, JoinRoomUseCase, LeaveRoomUseCase, SendMessageUseCase,
        UpdateTypingUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（接続受付のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub update_typing_usecase: Arc<UpdateTypingUseCase>,
    pub get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
    pub get_user_list_usecase: Arc<GetUserListUseCase>,
    /// MessagePusher（error イベントを送信元に返すため）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// 接続ごとの送信キューの長さ
    pub outbound_queue_capacity: usize,
}
