//! サーバー設定

use std::time::Duration;

use crate::domain::value_object::DEFAULT_MAX_MESSAGE_CHARS;

/// サーバー全体の設定値
///
/// バイナリではコマンドライン引数（環境変数 `HIROBA_*`）から組み立てます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 同時接続数の上限
    pub max_connections: usize,
    /// ルームごとに保持する履歴の件数
    pub history_capacity: usize,
    /// 接続ごとの送信キューの長さ。溢れた接続は切断する。
    pub outbound_queue_capacity: usize,
    /// メッセージ本文の最大文字数
    pub max_message_length: usize,
    /// 入力中表示の有効期間
    pub typing_timeout: Duration,
    /// 期限切れの入力中表示を掃除する間隔
    pub typing_sweep_interval: Duration,
    /// 最後のメンバーが抜けたルームを削除するか
    pub prune_empty_rooms: bool,
    /// 空になっても削除しないルーム
    pub default_room: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: 1024,
            history_capacity: 100,
            outbound_queue_capacity: 256,
            max_message_length: DEFAULT_MAX_MESSAGE_CHARS,
            typing_timeout: Duration::from_millis(1000),
            typing_sweep_interval: Duration::from_millis(250),
            prune_empty_rooms: false,
            default_room: "default".to_string(),
        }
    }
}
