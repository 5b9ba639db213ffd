//! Server execution logic.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::usecase::{
    AuthenticateUseCase, ConnectConnectionUseCase, DisconnectConnectionUseCase, HubHandle,
    SendChatUseCase,
};

use super::{
    handler::{
        PASSWORD_HEADER, auth_handler, chat_handler, debug_hub_state, health_check, not_found,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Chat relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     authenticate_usecase,
///     connect_connection_usecase,
///     disconnect_connection_usecase,
///     send_chat_usecase,
///     hub,
///     None,
/// );
/// server.run("127.0.0.1".to_string(), 8081).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `authenticate_usecase` - UseCase for issuing tokens
    /// * `connect_connection_usecase` - UseCase for token checks and hub registration
    /// * `disconnect_connection_usecase` - UseCase for deregistration and token revocation
    /// * `send_chat_usecase` - UseCase for submitting chat messages
    /// * `hub` - Handle of the running connection hub
    /// * `allowed_origin` - Origin required on WebSocket upgrades, if any
    pub fn new(
        authenticate_usecase: Arc<AuthenticateUseCase>,
        connect_connection_usecase: Arc<ConnectConnectionUseCase>,
        disconnect_connection_usecase: Arc<DisconnectConnectionUseCase>,
        send_chat_usecase: Arc<SendChatUseCase>,
        hub: HubHandle,
        allowed_origin: Option<String>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                authenticate_usecase,
                connect_connection_usecase,
                disconnect_connection_usecase,
                send_chat_usecase,
                hub,
                allowed_origin,
            }),
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::OPTIONS,
                Method::PUT,
                Method::DELETE,
            ])
            .allow_headers([
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::CONTENT_LENGTH,
                HeaderName::from_static(PASSWORD_HEADER),
            ]);

        Router::new()
            // HTTP エンドポイント
            .route(
                "/auth",
                get(auth_handler).fallback(not_found).layer(cors),
            )
            .route("/api/health", get(health_check))
            .route("/debug/hub", get(debug_hub_state))
            // WebSocket エンドポイント
            .route("/chat", get(chat_handler))
            .fallback(not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the chat relay server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8081)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until Ctrl+C or SIGTERM
    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Chat relay listening on {}", local_addr);
        tracing::info!("Get a token from: http://{}/auth", local_addr);
        tracing::info!("Connect to: ws://{}/chat?token=<token>", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let app = self.router();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
