//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::{net::TcpListener, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;

use crate::usecase::ExpireTypingUseCase;

use super::{
    handler::{health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = hiroba_server::app::build_server(&config);
/// server.run(config.host.clone(), config.port).await?;
/// ```
pub struct Server {
    app_state: Arc<AppState>,
    /// ExpireTypingUseCase（入力中表示の掃除）
    expire_typing_usecase: Arc<ExpireTypingUseCase>,
    typing_sweep_interval: Duration,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `app_state` - UseCases shared by the handlers
    /// * `expire_typing_usecase` - UseCase run periodically to drop stale typing indicators
    /// * `typing_sweep_interval` - Period of the typing sweeper
    pub fn new(
        app_state: AppState,
        expire_typing_usecase: Arc<ExpireTypingUseCase>,
        typing_sweep_interval: Duration,
    ) -> Self {
        Self {
            app_state: Arc::new(app_state),
            expire_typing_usecase,
            typing_sweep_interval,
        }
    }

    fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(self.app_state.clone())
    }

    /// Run the WebSocket chat server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "WebSocket chat server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// Tests bind to port 0 and pass their own shutdown future.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let sweeper = tokio::spawn(typing_sweeper(
            self.expire_typing_usecase.clone(),
            self.typing_sweep_interval,
        ));

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        sweeper.abort();
        result
    }
}

/// 期限切れの入力中表示を定期的に掃除する
async fn typing_sweeper(usecase: Arc<ExpireTypingUseCase>, period: Duration) {
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let expired = usecase.execute().await;
        if !expired.is_empty() {
            tracing::debug!("Expired {} typing indicator(s)", expired.len());
        }
    }
}
