//! ChatServer implementation
//!
//! Owns the shared state (registry and group table) and runs the accept
//! loop, spawning one handler task per connection. Cloning a `ChatServer`
//! shares the same state.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::group::GroupTable;
use crate::handler::handle_connection;
use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::router;
use crate::session::Session;

/// The main chat server
///
/// Explicitly constructed state shared by every connection task.
#[derive(Debug, Clone)]
pub struct ChatServer {
    config: Arc<ServerConfig>,
    registry: Arc<Registry>,
    groups: Arc<GroupTable>,
}

impl ChatServer {
    /// Create a new ChatServer with empty registry and group table
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(Registry::new()),
            groups: Arc::new(GroupTable::new()),
        }
    }

    /// Server settings
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Active sessions
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Groups and memberships
    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    /// Run the accept loop
    ///
    /// Accept errors are logged and the loop keeps going; connection errors
    /// only affect their own connection.
    pub async fn run(self, listener: TcpListener) {
        match listener.local_addr() {
            Ok(addr) => info!("Chat server listening on {}", addr),
            Err(_) => info!("Chat server listening"),
        }

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("Accepted connection from {}", addr);
                    let server = self.clone();

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, server).await {
                            error!("Connection handler error for {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    /// Tear down a session's shared state and announce its departure
    ///
    /// Only the first call for a session has any effect.
    pub fn disconnect(&self, session: &Session) {
        if !self.registry.release(session) {
            return;
        }

        if let Some(group) = self.groups.remove_session(session.id()) {
            debug!("'{}' removed from group '{}'", session.name(), group);
        }

        router::broadcast(
            &self.registry,
            ServerMessage::UserLeft {
                name: session.name().to_string(),
            },
        );
        debug!("Total sessions: {}", self.registry.len());
    }
}
