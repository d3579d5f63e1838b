use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::types::{BoardView, Direction, Snapshot};

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Start,
    Restart,
    Input { dir: Direction },
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "start" => Some(ParsedClientMessage::Start),
        "restart" => Some(ParsedClientMessage::Restart),
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

pub fn welcome_message(board: &BoardView, config: &SessionConfig) -> Value {
    json!({
        "type": "welcome",
        "board": board,
        "config": config,
    })
}

pub fn state_message(snapshot: &Snapshot) -> Value {
    json!({
        "type": "state",
        "snapshot": snapshot,
    })
}

pub fn game_over_message(snapshot: &Snapshot) -> Value {
    json!({
        "type": "game_over",
        "lifecycle": snapshot.lifecycle,
        "score": snapshot.score,
        "highScore": snapshot.high_score,
    })
}

pub fn pong_message(t: f64) -> Value {
    json!({
        "type": "pong",
        "t": t,
    })
}

pub fn error_message(message: &str) -> Value {
    json!({
        "type": "error",
        "message": message,
    })
}
