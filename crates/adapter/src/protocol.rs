//! Protocol module - JSON message types for the network adapter
//!
//! Line-delimited JSON. All messages have: type, seq (sequence number), ts (timestamp in ms)

use serde::{Deserialize, Serialize};

use crate::core::{GameError, GameEvent, GameSnapshot, Piece, PieceSnapshot};
use crate::types::{CellChange, GameStats};

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlType {
    #[serde(rename = "control")]
    #[default]
    Control,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    /// Receive every game event as it happens
    #[serde(default)]
    pub stream_events: bool,
    /// `observer` never takes control; `auto` and `controller` take it when free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RequestedRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestedRole {
    Auto,
    Controller,
    Observer,
}

impl<'de> Deserialize<'de> for RequestedRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else if s.eq_ignore_ascii_case("controller") {
            Ok(Self::Controller)
        } else if s.eq_ignore_ascii_case("observer") {
            Ok(Self::Observer)
        } else {
            Err(serde::de::Error::custom("invalid requested role"))
        }
    }
}

impl Serialize for RequestedRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RequestedRole::Auto => serializer.serialize_str("auto"),
            RequestedRole::Controller => serializer.serialize_str("controller"),
            RequestedRole::Observer => serializer.serialize_str("observer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Command message
///
/// `snapshot` may be sent by any client; every other action is controller only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub action: CommandAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i8>,
    /// `cw`/`ccw` (also `clockwise`, `right`, `counterclockwise`, `left`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandAction {
    Start,
    Place,
    Rotate,
    Swap,
    Abandon,
    Snapshot,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Start => "start",
            CommandAction::Place => "place",
            CommandAction::Rotate => "rotate",
            CommandAction::Swap => "swap",
            CommandAction::Abandon => "abandon",
            CommandAction::Snapshot => "snapshot",
        }
    }

    /// Whether the action changes the game (and so needs the controller).
    pub fn is_mutating(&self) -> bool {
        !matches!(self, CommandAction::Snapshot)
    }
}

impl<'de> Deserialize<'de> for CommandAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        [
            CommandAction::Start,
            CommandAction::Place,
            CommandAction::Rotate,
            CommandAction::Swap,
            CommandAction::Abandon,
            CommandAction::Snapshot,
        ]
        .into_iter()
        .find(|a| s.eq_ignore_ascii_case(a.as_str()))
        .ok_or_else(|| serde::de::Error::custom("unknown action"))
    }
}

impl Serialize for CommandAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Control message (claim/release controller status)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ControlType,
    pub seq: u64,
    pub ts: u64,
    pub action: ControlAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Claim,
    Release,
}

impl<'de> Deserialize<'de> for ControlAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("claim") {
            Ok(Self::Claim)
        } else if s.eq_ignore_ascii_case("release") {
            Ok(Self::Release)
        } else {
            Err(serde::de::Error::custom("invalid control action"))
        }
    }
}

impl Serialize for ControlAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ControlAction::Claim => serializer.serialize_str("claim"),
            ControlAction::Release => serializer.serialize_str("release"),
        }
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "event")]
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "controller_active")]
    ControllerActive,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "out_of_bounds")]
    OutOfBounds,
    #[serde(rename = "illegal_placement")]
    IllegalPlacement,
    #[serde(rename = "invalid_state")]
    InvalidState,
    #[serde(rename = "engine_unavailable")]
    EngineUnavailable,
}

impl From<&GameError> for ErrorCode {
    fn from(value: &GameError) -> Self {
        match value {
            GameError::OutOfBounds { .. } => ErrorCode::OutOfBounds,
            GameError::IllegalPlacement { .. } => ErrorCode::IllegalPlacement,
            GameError::InvalidStateTransition { .. } => ErrorCode::InvalidState,
            GameError::InvalidCellValue(_)
            | GameError::UnknownPiece(_)
            | GameError::InvalidDimensions { .. } => ErrorCode::InvalidCommand,
        }
    }
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub grid: GridInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridInfo {
    pub width: u8,
    pub height: u8,
}

/// Acknowledgment of an applied command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResult>,
}

/// What an applied command did; fields irrelevant to the command are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_cleared: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks_cleared: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<PieceWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PieceWire>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// One game event, pushed to clients that asked for `stream_events`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: EventType,
    pub seq: u64,
    pub ts: u64,
    pub event: EventPayload,
}

/// Wire form of a game event, tagged by its kind name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventPayload {
    Started {
        delay_ms: u32,
    },
    CellChanged {
        x: u8,
        y: u8,
        value: u8,
    },
    Placed {
        x: i8,
        y: i8,
        piece: u8,
    },
    Rejected {
        x: i8,
        y: i8,
        piece: u8,
        code: ErrorCode,
        message: String,
    },
    LineCleared {
        /// `[x, y]` pairs
        cells: Vec<[u8; 2]>,
        lines: u32,
        blocks: u32,
    },
    LifeLost {
        lives: u32,
    },
    PiecesChanged {
        current: PieceWire,
        next: PieceWire,
    },
    StatsChanged(StatsWire),
    TimerReset {
        delay_ms: u32,
        turn: u64,
    },
    GameOver {
        final_score: u32,
        reason: String,
    },
}

impl From<&GameEvent> for EventPayload {
    fn from(value: &GameEvent) -> Self {
        match value {
            GameEvent::Started { delay_ms } => Self::Started {
                delay_ms: *delay_ms,
            },
            GameEvent::CellChanged(CellChange { x, y, value }) => Self::CellChanged {
                x: *x,
                y: *y,
                value: *value,
            },
            GameEvent::Placed { x, y, piece } => Self::Placed {
                x: *x,
                y: *y,
                piece: *piece,
            },
            GameEvent::Rejected { x, y, piece, error } => Self::Rejected {
                x: *x,
                y: *y,
                piece: *piece,
                code: ErrorCode::from(error),
                message: error.to_string(),
            },
            GameEvent::LinesCleared {
                cells,
                lines,
                blocks,
            } => Self::LineCleared {
                cells: cells.iter().map(|c| [c.x, c.y]).collect(),
                lines: *lines,
                blocks: *blocks,
            },
            GameEvent::LifeLost { lives } => Self::LifeLost { lives: *lives },
            GameEvent::PiecesChanged { current, next } => Self::PiecesChanged {
                current: PieceWire::from(*current),
                next: PieceWire::from(*next),
            },
            GameEvent::StatsChanged(stats) => Self::StatsChanged(StatsWire::from(*stats)),
            GameEvent::TimerReset { delay_ms, turn } => Self::TimerReset {
                delay_ms: *delay_ms,
                turn: *turn,
            },
            GameEvent::GameOver {
                final_score,
                reason,
            } => Self::GameOver {
                final_score: *final_score,
                reason: reason.as_str().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsWire {
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    pub multiplier: u32,
}

impl From<GameStats> for StatsWire {
    fn from(value: GameStats) -> Self {
        Self {
            score: value.score,
            level: value.level,
            lives: value.lives,
            multiplier: value.multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceWire {
    pub id: u8,
    pub name: String,
    pub color: u8,
    /// `mask[x][y]`, 1 = occupied
    pub mask: [[u8; 3]; 3],
}

impl From<PieceSnapshot> for PieceWire {
    fn from(value: PieceSnapshot) -> Self {
        Self {
            id: value.id,
            name: value.name.to_string(),
            color: value.color,
            mask: value.mask,
        }
    }
}

impl From<Piece> for PieceWire {
    fn from(value: Piece) -> Self {
        PieceSnapshot::from(value).into()
    }
}

/// Full game state (reply to `snapshot`, and sent after hello to streaming clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub phase: String,
    pub playable: bool,
    pub game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_over_reason: Option<String>,
    pub board: BoardSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<PieceWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PieceWire>,
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    pub multiplier: u32,
    pub high_score: u32,
    pub turn: u64,
    pub seed: u32,
    pub delay_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub width: u8,
    pub height: u8,
    /// Rows top to bottom; 0 = empty, 1-15 = piece color
    pub cells: Vec<Vec<u8>>,
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
        #[serde(rename = "control")]
        Control(ControlMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Ok(InboundMessage::Control(m)) => Ok(ParsedMessage::Control(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type")]
                #[serde(borrow)]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let head = serde_json::from_str::<TypeOnly>(json)?;
            let msg_type = head.msg_type.unwrap_or("unknown");
            if msg_type != "hello" && msg_type != "command" && msg_type != "control" {
                return Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: head.seq.unwrap_or(0),
                }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Control(ControlMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities {
            stream_events: true,
            role: Some(RequestedRole::Auto),
        },
    }
}

/// Create a command message
pub fn create_command(seq: u64, action: CommandAction) -> CommandMessage {
    CommandMessage {
        msg_type: CommandType::Command,
        seq,
        ts: current_timestamp_ms(),
        action,
        x: None,
        y: None,
        direction: None,
    }
}

/// Create a place command
pub fn create_place(seq: u64, x: i8, y: i8) -> CommandMessage {
    CommandMessage {
        x: Some(x),
        y: Some(y),
        ..create_command(seq, CommandAction::Place)
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
    grid: GridInfo,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: "tetrecs".to_string(),
        grid,
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64, result: Option<CommandResult>) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        result,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Create an event message
pub fn create_event(seq: u64, event: &GameEvent) -> EventMessage {
    EventMessage {
        msg_type: EventType::Event,
        seq,
        ts: current_timestamp_ms(),
        event: EventPayload::from(event),
    }
}

/// Build an observation from a game snapshot
pub fn create_observation(seq: u64, snapshot: &GameSnapshot) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        phase: snapshot.phase.as_str().to_string(),
        playable: snapshot.playable(),
        game_over: snapshot.game_over_reason.is_some(),
        game_over_reason: snapshot
            .game_over_reason
            .map(|r| r.as_str().to_string()),
        board: BoardSnapshot {
            width: snapshot.width,
            height: snapshot.height,
            cells: snapshot.rows().map(<[u8]>::to_vec).collect(),
        },
        current: snapshot.current.map(PieceWire::from),
        next: snapshot.next.map(PieceWire::from),
        score: snapshot.stats.score,
        level: snapshot.stats.level,
        lives: snapshot.stats.lives,
        multiplier: snapshot.stats.multiplier,
        high_score: snapshot.high_score,
        turn: snapshot.turn,
        seed: snapshot.seed,
        delay_ms: snapshot.delay_ms,
    }
}

/// Get current timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
