use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use packman_arcade::config::SessionConfig;
use packman_arcade::constants::TICK_MS;
use packman_arcade::engine::GameSession;
use packman_arcade::server_protocol::{
    error_message, game_over_message, parse_client_message, pong_message, state_message,
    welcome_message, ParsedClientMessage,
};
use packman_arcade::types::StepOutcome;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
struct AppState {
    config: Arc<SessionConfig>,
}

type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let config = match std::env::var("SESSION_CONFIG") {
        Ok(raw) => {
            let path = PathBuf::from(raw);
            SessionConfig::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        Err(_) => SessionConfig::default(),
    };
    GameSession::with_seed(config.clone(), 0).context("invalid session config")?;

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(AppState {
            config: Arc::new(config),
        });

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        eprintln!("[server] static file root not found. serving /ws and /healthz only.");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    println!("[server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")?;
    Ok(())
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("static")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let client_id = make_id("client");
    let seed: u32 = rand::rng().random();
    let session = match GameSession::with_seed((*state.config).clone(), seed) {
        Ok(session) => Arc::new(Mutex::new(session)),
        Err(error) => {
            eprintln!("[server] {client_id}: session rejected: {error}");
            return;
        }
    };
    println!("[server] {client_id} connected (seed {seed})");

    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    {
        let mut guard = session.lock().await;
        let welcome = welcome_message(&guard.board(), guard.config());
        send(&tx, &welcome, QueuePolicy::DisconnectOnFull);
        let snapshot = guard.build_snapshot(true);
        send(&tx, &state_message(&snapshot), QueuePolicy::DisconnectOnFull);
    }
    let ticker = start_tick_loop(session.clone(), tx.clone());

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        let raw = match message {
            Message::Text(raw) => raw.to_string(),
            Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    send(
                        &tx,
                        &error_message("invalid utf8 message"),
                        QueuePolicy::DisconnectOnFull,
                    );
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };

        let replies = {
            let mut guard = session.lock().await;
            handle_client_message(&mut guard, &raw)
        };
        for reply in &replies {
            send(&tx, reply, QueuePolicy::DisconnectOnFull);
        }
    }

    ticker.abort();
    drop(tx);
    let _ = writer.await;
    println!("[server] {client_id} disconnected");
}

/// Applies one client message to the session and returns the replies for
/// that client, in send order.
fn handle_client_message(session: &mut GameSession, raw: &str) -> Vec<Value> {
    let Some(message) = parse_client_message(raw) else {
        return vec![error_message("invalid message")];
    };

    match message {
        ParsedClientMessage::Start => {
            if !session.start() {
                return vec![error_message("session already started")];
            }
            vec![state_message(&session.build_snapshot(true))]
        }
        ParsedClientMessage::Restart => {
            session.restart();
            vec![state_message(&session.build_snapshot(true))]
        }
        ParsedClientMessage::Input { dir } => {
            session.queue_intent(dir);
            Vec::new()
        }
        ParsedClientMessage::Ping { t } => vec![pong_message(t)],
    }
}

fn start_tick_loop(
    session: SharedSession,
    tx: mpsc::Sender<OutboundMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let messages = {
                let mut guard = session.lock().await;
                tick_session(&mut guard)
            };
            for (message, policy) in &messages {
                send(&tx, message, *policy);
            }
            if tx.is_closed() {
                break;
            }
        }
    })
}

fn tick_session(session: &mut GameSession) -> Vec<(Value, QueuePolicy)> {
    if session.step() == StepOutcome::Inactive {
        return Vec::new();
    }
    let snapshot = session.build_snapshot(true);
    let mut messages = vec![(state_message(&snapshot), QueuePolicy::DropOnFull)];
    if snapshot.lifecycle.is_terminal() {
        messages.push((game_over_message(&snapshot), QueuePolicy::DisconnectOnFull));
    }
    messages
}

fn send(tx: &mpsc::Sender<OutboundMessage>, message: &Value, policy: QueuePolicy) {
    let send_failed = tx
        .try_send(OutboundMessage::Text(message.to_string()))
        .is_err();
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        let _ = tx.try_send(OutboundMessage::Close {
            code: 1013,
            reason: "outbound queue full".to_string(),
        });
    }
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
