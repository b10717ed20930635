//! `TypespellServer` builder and accept loop.
//!
//! This is the entry point for running a Typespell server. It ties the
//! layers together: transport → protocol → room.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use typespell_protocol::{JsonCodec, PlayerId};
use typespell_room::{PlayerSender, RoomManager};
use typespell_timer::TimerConfig;
use typespell_transport::WsListener;

use crate::handler::handle_connection;
use crate::ServerError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState {
    pub(crate) rooms: Mutex<RoomManager>,
    /// Every live connection's outbound channel, keyed by player id.
    /// `cast_spell` delivers through this map directly, without going
    /// through a room.
    pub(crate) connections: Mutex<HashMap<PlayerId, PlayerSender>>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Typespell server.
///
/// # Example
///
/// ```rust,ignore
/// let server = TypespellServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TypespellServerBuilder {
    bind_addr: String,
    timer_config: TimerConfig,
}

impl TypespellServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            timer_config: TimerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the intermission window for all rooms (tests use
    /// short ones).
    pub fn timer_config(mut self, config: TimerConfig) -> Self {
        self.timer_config = config;
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build(self) -> Result<TypespellServer, ServerError> {
        let listener = WsListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::with_timer_config(
                self.timer_config,
            )),
            connections: Mutex::new(HashMap::new()),
            codec: JsonCodec,
        });

        Ok(TypespellServer { listener, state })
    }
}

impl Default for TypespellServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Typespell server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TypespellServer {
    listener: WsListener,
    state: Arc<ServerState>,
}

impl TypespellServer {
    /// Creates a new builder.
    pub fn builder() -> TypespellServerBuilder {
        TypespellServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("Typespell server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
