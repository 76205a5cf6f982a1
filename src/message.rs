//! Message protocol definitions
//!
//! Newline-delimited UTF-8 text in both directions. Inbound lines are
//! parsed into [`ClientCommand`]; outbound lines are rendered from
//! [`ServerMessage`] through its `Display` implementation.

use std::fmt;

use crate::error::AppError;

/// Usage strings reported with `AppError::InvalidFormat`
pub mod usage {
    /// Private message
    pub const PRIVATE: &str = "@<name> <message>";
    /// Group creation
    pub const GROUP_CREATE: &str = "/group create <name>";
    /// Group join
    pub const GROUP_JOIN: &str = "/group join <name>";
    /// Group leave
    pub const GROUP_LEAVE: &str = "/group leave";
    /// Group listing
    pub const GROUP_LIST: &str = "/group list";
    /// Group message
    pub const GROUP_MSG: &str = "/group msg <message>";
    /// Any group sub-command
    pub const GROUP: &str = "/group create|join|leave|list|msg";
}

/// Client → Server command
///
/// One inbound line, classified in precedence order: `/logout`, `/online`,
/// `/help`, `@name`, `/group ...`, then plain chat. Keywords match
/// case-insensitively, payloads are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// End the session
    Logout,
    /// List connected users
    Online,
    /// Show the command summary
    Help,
    /// Private message to one user
    Private { target: String, text: String },
    /// Create a new group
    CreateGroup { group: String },
    /// Join an existing group
    JoinGroup { group: String },
    /// Leave the current group
    LeaveGroup,
    /// List existing groups
    ListGroups,
    /// Send to every member of the current group
    GroupMessage { text: String },
    /// Broadcast to everyone
    Chat { text: String },
    /// Blank line
    Empty,
}

impl ClientCommand {
    /// Parse one inbound line
    ///
    /// Returns a command error when a recognised command has malformed
    /// arguments. The line must already have its terminator removed.
    pub fn parse(line: &str) -> Result<Self, AppError> {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return Ok(ClientCommand::Empty);
        }
        // Whole-line commands match exactly, ignoring case only
        if line.eq_ignore_ascii_case("/logout") {
            return Ok(ClientCommand::Logout);
        }
        if line.eq_ignore_ascii_case("/online") {
            return Ok(ClientCommand::Online);
        }
        if line.eq_ignore_ascii_case("/help") {
            return Ok(ClientCommand::Help);
        }
        if let Some(body) = line.strip_prefix('@') {
            return parse_private(body);
        }
        if let Some(rest) = strip_keyword(trimmed, "/group") {
            return parse_group(rest);
        }

        Ok(ClientCommand::Chat {
            text: line.to_string(),
        })
    }
}

/// Strip a case-insensitive keyword that must be followed by whitespace or
/// end of line. Returns the remainder with leading whitespace removed.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        Some(_) => None,
    }
}

fn parse_private(body: &str) -> Result<ClientCommand, AppError> {
    let invalid = AppError::InvalidFormat {
        usage: usage::PRIVATE,
    };
    let Some((target, text)) = body.split_once(' ') else {
        return Err(invalid);
    };
    if target.is_empty() || text.trim().is_empty() {
        return Err(invalid);
    }
    Ok(ClientCommand::Private {
        target: target.to_string(),
        text: text.to_string(),
    })
}

fn parse_group(rest: &str) -> Result<ClientCommand, AppError> {
    let (sub, arg) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    let arg = arg.trim();

    let require_arg = |usage: &'static str| {
        if arg.is_empty() {
            Err(AppError::InvalidFormat { usage })
        } else {
            Ok(arg.to_string())
        }
    };
    let require_none = |usage: &'static str| {
        if arg.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFormat { usage })
        }
    };

    match sub.to_ascii_lowercase().as_str() {
        "create" => Ok(ClientCommand::CreateGroup {
            group: require_arg(usage::GROUP_CREATE)?,
        }),
        "join" => Ok(ClientCommand::JoinGroup {
            group: require_arg(usage::GROUP_JOIN)?,
        }),
        "leave" => require_none(usage::GROUP_LEAVE).map(|()| ClientCommand::LeaveGroup),
        "list" => require_none(usage::GROUP_LIST).map(|()| ClientCommand::ListGroups),
        "msg" => Ok(ClientCommand::GroupMessage {
            text: require_arg(usage::GROUP_MSG)?,
        }),
        "" => Err(AppError::InvalidFormat { usage: usage::GROUP }),
        _ => Err(AppError::UnknownCommand(format!("/group {}", sub))),
    }
}

/// Server → Client message
///
/// Each variant renders to exactly one line (without the terminator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Handshake accepted
    Connected { name: String },
    /// A user joined the chat
    UserJoined { name: String },
    /// A user left the chat
    UserLeft { name: String },
    /// Reply to `/online`
    OnlineUsers { names: Vec<String> },
    /// Reply to `/group list`
    GroupList { groups: Vec<String> },
    /// Group created
    GroupCreated { group: String },
    /// Group joined
    GroupJoined { group: String },
    /// Join requested for the group the sender is already in
    AlreadyInGroup { group: String },
    /// Group left
    GroupLeft { group: String },
    /// Broadcast chat line
    Chat { from: String, text: String },
    /// Private message
    Private { from: String, text: String },
    /// Group message
    Group {
        group: String,
        from: String,
        text: String,
    },
    /// Reply to `/help`
    Help,
    /// Error occurred
    Error { message: String },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Connected { name } => write!(f, "✅ Connected as {}", name),
            ServerMessage::UserJoined { name } => write!(f, "🔵 {} has joined the chat.", name),
            ServerMessage::UserLeft { name } => write!(f, "🔻 {} has left the chat.", name),
            ServerMessage::OnlineUsers { names } => {
                write!(f, "👥 Online users: {}", names.join(" "))
            }
            ServerMessage::GroupList { groups } if groups.is_empty() => {
                write!(f, "📂 No groups available.")
            }
            ServerMessage::GroupList { groups } => {
                write!(f, "📂 Available groups: {}", groups.join(", "))
            }
            ServerMessage::GroupCreated { group } => write!(f, "✅ Group '{}' created.", group),
            ServerMessage::GroupJoined { group } => write!(f, "✅ Joined group '{}'.", group),
            ServerMessage::AlreadyInGroup { group } => {
                write!(f, "ℹ️ Already in group '{}'.", group)
            }
            ServerMessage::GroupLeft { group } => write!(f, "🚪 Left group '{}'.", group),
            ServerMessage::Chat { from, text } => write!(f, "[{}]: {}", from, text),
            ServerMessage::Private { from, text } => {
                write!(f, "📩 [Private from {}]> {}", from, text)
            }
            ServerMessage::Group { group, from, text } => {
                write!(f, "[Group {}] {}: {}", group, from, text)
            }
            ServerMessage::Help => write!(
                f,
                "📘 Commands: /online | /logout | @<name> <message> | \
                 /group create <name> | /group join <name> | /group leave | \
                 /group list | /group msg <message>"
            ),
            ServerMessage::Error { message } => write!(f, "❌ {}", message),
        }
    }
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let message = if err.is_fatal() {
            // Transport details stay in the server log
            "Internal error".to_string()
        } else {
            err.to_string()
        };
        ServerMessage::Error { message }
    }
}
