//! JSON wire protocol: ActionCable-style command envelopes around tagged
//! action payloads. The action set is a closed enum on both directions, so
//! an unrecognized action is a decode-time case the caller can choose to
//! ignore instead of a silent string fallthrough.

use serde::{Deserialize, Serialize};

use crate::board::{Goal, Position};
use crate::robots::{Robot, RobotColor, RobotSet};
use crate::session::Move;

/// Actions this client sends to the game channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    StartNewGame,
    NextGoal,
    SolutionIn { nr_moves: u32 },
    SolutionMoves { moves: Vec<Move> },
}

/// Server-authoritative events delivered on the game channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerEvent {
    StartNewGame {
        cells: Vec<Vec<u8>>,
        goals: Vec<Goal>,
        robot_colors: Vec<RobotColor>,
        robot_positions: Vec<RobotPlacement>,
        #[serde(default)]
        current_goal: Option<Goal>,
    },
    SolutionIn {
        current_winner: String,
        current_winner_id: String,
        current_nr_moves: u32,
        seconds_left: u32,
    },
    ClosedForSolutions {
        current_winner: String,
        current_winner_id: String,
        seconds_left: u32,
    },
    ClosedForMoves,
    NewGoal {
        goal: Goal,
        robot_positions: Vec<RobotPlacement>,
    },
    GoalWonBy {
        winner: String,
        moves: Vec<Move>,
    },
    GameFinished,
}

/// One robot position on the wire. Accepts both `robot` and `color` for
/// the color key, as different server revisions used either name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotPlacement {
    #[serde(alias = "robot")]
    pub color: RobotColor,
    pub position: Position,
}

/// Build a robot set from wire placements.
pub fn robot_set_from_placements(placements: &[RobotPlacement]) -> RobotSet {
    placements
        .iter()
        .map(|p| Robot {
            color: p.color,
            position: p.position,
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
pub enum ProtocolError {
    EmptyFrame,
    UnknownAction(String),
    Serialize(String),
    Deserialize(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFrame => write!(f, "empty frame"),
            Self::UnknownAction(action) => write!(f, "unknown action: {action}"),
            Self::Serialize(e) => write!(f, "serialize error: {e}"),
            Self::Deserialize(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Channel identifier as ActionCable expects it: the subscription params
/// plus the channel name, JSON-encoded to a string.
pub fn channel_identifier(channel: &str, room: &str) -> String {
    serde_json::json!({ "channel": channel, "room": room }).to_string()
}

#[derive(Debug, Serialize)]
struct CommandFrame<'a> {
    command: &'a str,
    identifier: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

/// Frame subscribing to the channel identified by `identifier`.
pub fn encode_subscribe(identifier: &str) -> Result<String, ProtocolError> {
    serde_json::to_string(&CommandFrame {
        command: "subscribe",
        identifier,
        data: None,
    })
    .map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Frame carrying a client action: the action payload is JSON-encoded into
/// the envelope's `data` string.
pub fn encode_action(identifier: &str, action: &ClientAction) -> Result<String, ProtocolError> {
    let data =
        serde_json::to_string(action).map_err(|e| ProtocolError::Serialize(e.to_string()))?;
    serde_json::to_string(&CommandFrame {
        command: "message",
        identifier,
        data: Some(data),
    })
    .map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// An inbound frame before channel filtering. Pings and subscription
/// confirmations carry no `message` member and are skipped by callers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

pub fn decode_frame(frame: &str) -> Result<InboundFrame, ProtocolError> {
    if frame.trim().is_empty() {
        return Err(ProtocolError::EmptyFrame);
    }
    serde_json::from_str(frame).map_err(|e| ProtocolError::Deserialize(e.to_string()))
}

const KNOWN_ACTIONS: &[&str] = &[
    "start_new_game",
    "solution_in",
    "closed_for_solutions",
    "closed_for_moves",
    "new_goal",
    "goal_won_by",
    "game_finished",
];

/// Parse a frame's `message` member into a server event, distinguishing
/// actions we have never heard of from malformed payloads of known ones.
pub fn parse_event(message: &serde_json::Value) -> Result<ServerEvent, ProtocolError> {
    serde_json::from_value(message.clone()).map_err(|e| {
        match message.get("action").and_then(serde_json::Value::as_str) {
            Some(action) if !KNOWN_ACTIONS.contains(&action) => {
                ProtocolError::UnknownAction(action.to_string())
            },
            _ => ProtocolError::Deserialize(e.to_string()),
        }
    })
}
