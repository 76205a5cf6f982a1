//! Command dispatch
//!
//! Interprets one inbound line from a session and performs the resulting
//! broadcast, private delivery or group operation. Routing is synchronous
//! and runs on the calling connection's task; every delivery goes through
//! [`Session::deliver`], which never waits on the recipient.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AppError;
use crate::group::{GroupTable, JoinOutcome};
use crate::message::{ClientCommand, ServerMessage};
use crate::registry::Registry;
use crate::session::Session;

/// What the inbound loop should do after a line has been routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading
    Continue,
    /// The client asked to log out
    Logout,
}

/// Route one line from `session`
///
/// Command errors are reported to `session` only.
pub fn route(session: &Arc<Session>, line: &str, registry: &Registry, groups: &GroupTable) -> Flow {
    let command = match ClientCommand::parse(line) {
        Ok(command) => command,
        Err(e) => {
            debug!("Rejected line from '{}': {}", session.name(), e);
            session.deliver(e.into());
            return Flow::Continue;
        }
    };

    match execute(session, command, registry, groups) {
        Ok(flow) => flow,
        Err(e) => {
            debug!("Command from '{}' failed: {}", session.name(), e);
            session.deliver(e.into());
            Flow::Continue
        }
    }
}

/// Deliver `msg` to every registered session
///
/// Recipients are taken from a registry snapshot, so sessions joining or
/// leaving meanwhile never disturb the fan-out.
pub fn broadcast(registry: &Registry, msg: ServerMessage) {
    for session in registry.snapshot() {
        session.deliver(msg.clone());
    }
}

fn execute(
    session: &Arc<Session>,
    command: ClientCommand,
    registry: &Registry,
    groups: &GroupTable,
) -> Result<Flow, AppError> {
    match command {
        ClientCommand::Logout => return Ok(Flow::Logout),
        ClientCommand::Online => {
            session.deliver(ServerMessage::OnlineUsers {
                names: registry.names(),
            });
        }
        ClientCommand::Help => session.deliver(ServerMessage::Help),
        ClientCommand::Private { target, text } => {
            send_private(session, &target, text, registry)?;
        }
        ClientCommand::CreateGroup { group } => {
            groups.create(&group)?;
            session.deliver(ServerMessage::GroupCreated { group });
        }
        ClientCommand::JoinGroup { group } => {
            join_group(session, group, groups)?;
        }
        ClientCommand::LeaveGroup => {
            let group = groups.leave(session.id())?;
            info!("'{}' left group '{}'", session.name(), group);
            session.deliver(ServerMessage::GroupLeft { group });
        }
        ClientCommand::ListGroups => {
            session.deliver(ServerMessage::GroupList {
                groups: groups.list_names(),
            });
        }
        ClientCommand::GroupMessage { text } => {
            let (group, members) = groups.current_members(session.id())?;
            let msg = ServerMessage::Group {
                group,
                from: session.name().to_string(),
                text,
            };
            for member in members {
                member.deliver(msg.clone());
            }
        }
        ClientCommand::Chat { text } => {
            broadcast(
                registry,
                ServerMessage::Chat {
                    from: session.name().to_string(),
                    text,
                },
            );
        }
        ClientCommand::Empty => {}
    }
    Ok(Flow::Continue)
}

fn send_private(
    session: &Session,
    target: &str,
    text: String,
    registry: &Registry,
) -> Result<(), AppError> {
    let recipient = registry
        .find_ignore_case(target)
        .ok_or_else(|| AppError::UserNotFound(target.to_string()))?;

    debug!("Private message '{}' -> '{}'", session.name(), recipient.name());
    recipient.deliver(ServerMessage::Private {
        from: session.name().to_string(),
        text,
    });
    Ok(())
}

fn join_group(session: &Arc<Session>, group: String, groups: &GroupTable) -> Result<(), AppError> {
    match groups.join(&group, session)? {
        JoinOutcome::Joined => {}
        JoinOutcome::Switched { from } => {
            session.deliver(ServerMessage::GroupLeft { group: from });
        }
        JoinOutcome::AlreadyMember => {
            session.deliver(ServerMessage::AlreadyInGroup { group });
            return Ok(());
        }
    }
    session.deliver(ServerMessage::GroupJoined { group });
    Ok(())
}
