//! Line-oriented TCP Chat Server Library
//!
//! A tokio chat server where every client picks a unique display name and
//! exchanges newline-delimited text with everyone else.
//!
//! # Features
//! - Name handshake with uniqueness check
//! - Broadcast chat to every connected user
//! - Private messages (`@name text`, name matched case-insensitively)
//! - Groups: create, join, leave, list and group messages
//! - `/online`, `/help` and `/logout` commands
//! - Join and departure announcements
//!
//! # Architecture
//! - `Registry` and `GroupTable` are explicitly constructed shared stores,
//!   each guarded by a single mutex and exposing only atomic operations
//! - Each connection runs in its own task; routing happens on that task
//! - Each session owns an unbounded outbound queue drained by a writer task,
//!   so a slow client never stalls delivery to the others
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use group_chat_server::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.addr).await.unwrap();
//!     ChatServer::new(config).run(listener).await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod group;
pub mod handler;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use error::{AppError, SendError};
pub use group::{Group, GroupTable, JoinOutcome};
pub use handler::handle_connection;
pub use message::{ClientCommand, ServerMessage};
pub use registry::Registry;
pub use router::{broadcast, route, Flow};
pub use server::ChatServer;
pub use session::Session;
pub use types::SessionId;
