//! `ImposterServer` builder and server loop.
//!
//! Ties the layers together: WebSocket transport → JSON envelopes →
//! [`RoomDirectory`]. A background reaper evicts idle rooms.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use imposter_protocol::{Codec, JsonCodec};
use imposter_room::{RoomConfig, RoomDirectory};
use imposter_transport::{Transport, WebSocketTransport};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::ImposterError;
use crate::handler::handle_connection;

/// Server settings. Override with [`ImposterServerBuilder`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub room: RoomConfig,
    /// Connections silent for this long are closed. Clients sync every few
    /// seconds, so a live tab never gets near it.
    pub idle_timeout: Duration,
    /// How often idle rooms are swept.
    pub eviction_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room: RoomConfig::default(),
            idle_timeout: Duration::from_secs(30),
            eviction_interval: Duration::from_secs(60),
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: RoomDirectory,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting an imposter server.
///
/// # Example
///
/// ```rust,no_run
/// use imposter::prelude::*;
///
/// # async fn run() -> Result<(), ImposterError> {
/// let server = ImposterServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ImposterServerBuilder {
    config: ServerConfig,
}

impl ImposterServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn eviction_interval(mut self, interval: Duration) -> Self {
        self.config.eviction_interval = interval;
        self
    }

    /// Binds the listener. Uses [`JsonCodec`] on the wire.
    pub async fn build(self) -> Result<ImposterServer<JsonCodec>, ImposterError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: RoomDirectory::new(self.config.room.clone()),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(ImposterServer { transport, state })
    }
}

impl Default for ImposterServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound imposter server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ImposterServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl ImposterServer<JsonCodec> {
    pub fn builder() -> ImposterServerBuilder {
        ImposterServerBuilder::new()
    }
}

impl<C: Codec> ImposterServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop and the idle-room reaper.
    ///
    /// Spawns a handler task per connection. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), ImposterError> {
        tracing::info!(addr = ?self.local_addr().ok(), "imposter server running");
        let _reaper = Reaper(spawn_reaper(Arc::clone(&self.state)));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
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

/// Aborts the reaper when the server loop goes away.
struct Reaper(JoinHandle<()>);

impl Drop for Reaper {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn spawn_reaper<C: Codec>(state: Arc<ServerState<C>>) -> JoinHandle<()> {
    let period = state.config.eviction_interval;
    tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let evicted = state.rooms.evict_idle().await;
            tracing::debug!(evicted, "eviction sweep done");
        }
    })
}
