//! UseCase 層
//!
//! クライアントからのイベント 1 種類につき 1 つのユースケースを持ちます。
//! 状態を変更して配信するユースケースは `DeliverySequencer` で直列化されます。

pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod expire_typing;
pub mod get_chat_history;
pub mod get_user_list;
pub mod join_room;
pub mod leave_room;
mod notifier;
pub mod send_message;
pub mod sequencer;
pub mod update_typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, RoomAccessError, SendMessageError};
pub use expire_typing::ExpireTypingUseCase;
pub use get_chat_history::GetChatHistoryUseCase;
pub use get_user_list::GetUserListUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use send_message::SendMessageUseCase;
pub use sequencer::DeliverySequencer;
pub use update_typing::UpdateTypingUseCase;
