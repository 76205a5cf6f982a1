//! TCP connection handler
//!
//! Handles individual client connections: the name handshake, the inbound
//! line loop, the outbound writer task and the one-time cleanup.

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::ServerMessage;
use crate::router::{self, Flow};
use crate::session::Rx;
use crate::server::ChatServer;

type LineWriter = FramedWrite<OwnedWriteHalf, LinesCodec>;

/// Handle a new TCP connection
///
/// Performs the name handshake, registers the session, routes every
/// inbound line and cleans up when the client logs out or the connection
/// fails. Handshake rejections are not errors.
pub async fn handle_connection(stream: TcpStream, server: ChatServer) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    let config = server.config();
    let (read_half, write_half) = stream.into_split();
    let mut lines = FramedRead::new(
        read_half,
        LinesCodec::new_with_max_length(config.max_line_length),
    );
    let mut writer = FramedWrite::new(write_half, LinesCodec::new());

    // Handshake: first line is the display name
    let Some(first) = lines.next().await else {
        debug!("{} closed before sending a name", peer_addr);
        return Ok(());
    };
    let name = first?.trim().to_string();
    if name.is_empty() {
        info!("Rejected empty username from {}", peer_addr);
        return reject(&mut writer, AppError::InvalidUsername).await;
    }

    // Create channel for server -> client lines. The confirmation is queued
    // before the claim so it precedes any broadcast.
    let (msg_tx, msg_rx) = mpsc::unbounded_channel::<ServerMessage>();
    if msg_tx
        .send(ServerMessage::Connected { name: name.clone() })
        .is_err()
    {
        return Err(AppError::Io(std::io::Error::other("outbound queue unavailable")));
    }

    let session = match server.registry().claim(&name, msg_tx) {
        Ok(session) => session,
        Err(e) => {
            info!("Rejected username '{}' from {}: {}", name, peer_addr, e);
            return reject(&mut writer, e).await;
        }
    };
    info!("'{}' ({}) connected from {}", name, session.id(), peer_addr);

    // Spawn write task (ServerMessage -> socket)
    let mut write_task = tokio::spawn(write_loop(msg_rx, writer));

    router::broadcast(server.registry(), ServerMessage::UserJoined { name: name.clone() });

    let mut writer_done = false;
    loop {
        tokio::select! {
            next = lines.next() => match next {
                Some(Ok(line)) => {
                    debug!("'{}' sent: {}", name, line);
                    if router::route(&session, &line, server.registry(), server.groups()) == Flow::Logout {
                        debug!("'{}' logged out", name);
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!("Read error for '{}': {}", name, e);
                    break;
                }
                None => {
                    debug!("'{}' closed the connection", name);
                    break;
                }
            },
            result = &mut write_task => {
                writer_done = true;
                match result {
                    Ok(Ok(())) => debug!("Write task ended for '{}'", name),
                    Ok(Err(e)) => warn!("Write error for '{}': {}", name, e),
                    Err(e) => error!("Write task for '{}' failed: {}", name, e),
                }
                break;
            }
        }
    }

    server.disconnect(&session);

    // Dropping the last handle closes the channel; the writer flushes what is
    // queued, then shuts the socket down.
    drop(session);
    drop(lines);
    if !writer_done {
        match tokio::time::timeout(config.drain_timeout, &mut write_task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => debug!("Write error while draining '{}': {}", name, e),
            Ok(Err(e)) => error!("Write task for '{}' failed: {}", name, e),
            Err(_) => {
                warn!("Writer for '{}' did not drain in time, aborting", name);
                write_task.abort();
            }
        }
    }

    info!("'{}' disconnected", name);

    Ok(())
}

/// Write one error line and close the connection
async fn reject(writer: &mut LineWriter, err: AppError) -> Result<(), AppError> {
    writer.send(ServerMessage::from(err).to_string()).await?;
    SinkExt::<String>::close(writer).await?;
    Ok(())
}

/// Forward queued lines to the socket until every sender is gone
async fn write_loop(
    mut msg_rx: Rx,
    mut writer: LineWriter,
) -> Result<(), AppError> {
    while let Some(msg) = msg_rx.recv().await {
        writer.feed(msg.to_string()).await?;
        // Batch whatever is already queued into one flush
        while let Ok(more) = msg_rx.try_recv() {
            writer.feed(more.to_string()).await?;
        }
        SinkExt::<String>::flush(&mut writer).await?;
    }

    SinkExt::<String>::close(&mut writer).await?;
    Ok(())
}
