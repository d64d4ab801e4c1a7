//! TCP server for the network adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking; game requests go straight to the [`GameHandle`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

use crate::engine::{EngineError, GameHandle};
use crate::protocol::*;
use crate::types::RotateDirection;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            protocol_version: "1.0.0".to_string(),
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let host = env::var("TETRECS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("TETRECS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7777);

        let log_path = env::var("TETRECS_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        Self {
            host,
            port,
            protocol_version: "1.0.0".to_string(),
            log_path,
        }
    }

    /// Check if the adapter is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("TETRECS_ADAPTER_DISABLED")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<u64>>,
    /// Sequence numbers of server-originated event messages
    event_seq: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
            event_seq: AtomicU64::new(0),
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: u64,
    pub addr: SocketAddr,
    pub is_controller: bool,
    pub stream_events: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>, // Channel to send messages to client
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Event(EventMessage),
    Observation(Box<ObservationMessage>),
}

impl ClientOutbound {
    fn encode(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        fn write<T: Serialize>(buf: &mut Vec<u8>, value: &T) -> serde_json::Result<()> {
            buf.clear();
            serde_json::to_writer(buf, value)
        }

        match self {
            ClientOutbound::Welcome(v) => write(buf, v),
            ClientOutbound::Ack(v) => write(buf, v),
            ClientOutbound::Error(v) => write(buf, v),
            ClientOutbound::Event(v) => write(buf, v),
            ClientOutbound::Observation(v) => write(buf, v.as_ref()),
        }
    }
}

async fn is_handshaken(state: &ServerState, client_id: u64) -> bool {
    let clients = state.clients.read().await;
    clients
        .iter()
        .find(|c| c.id == client_id)
        .map(|c| c.handshaken)
        .unwrap_or(false)
}

async fn is_controller(state: &ServerState, client_id: u64) -> bool {
    *state.controller.read().await == Some(client_id)
}

async fn check_and_update_seq(state: &ServerState, client_id: u64, seq: u64) -> bool {
    let mut clients = state.clients.write().await;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        return true;
    };

    match client.last_seq {
        Some(prev) if seq <= prev => false,
        _ => {
            client.last_seq = Some(seq);
            true
        }
    }
}

/// Handshake and sequencing checks shared by command and control messages
async fn admit(
    state: &ServerState,
    client_id: u64,
    seq: u64,
    what: &str,
) -> Result<(), ErrorMessage> {
    if !is_handshaken(state, client_id).await {
        return Err(create_error(
            seq,
            ErrorCode::HandshakeRequired,
            &format!("Send hello before {}", what),
        ));
    }
    if !check_and_update_seq(state, client_id, seq).await {
        return Err(create_error(
            seq,
            ErrorCode::InvalidCommand,
            "seq must be strictly increasing",
        ));
    }
    Ok(())
}

/// Start the TCP server
///
/// Runs until the listener fails. `ready_tx` receives the bound address (useful with port 0).
pub async fn run_server(
    config: ServerConfig,
    game: GameHandle,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    if ServerConfig::is_disabled() {
        println!("[Adapter] Network adapter disabled via TETRECS_ADAPTER_DISABLED");
        return Ok(());
    }

    let wire_log_tx = config.log_path.clone().map(spawn_wire_log);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound = listener.local_addr()?;
    println!("[Adapter] TCP server listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0u64;

    // Event dispatcher.
    {
        let state = Arc::clone(&state);
        let mut events = game.subscribe();
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        eprintln!("[Adapter] Event stream lagged, {} events dropped", missed);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let seq = state.event_seq.fetch_add(1, Ordering::Relaxed) + 1;
                let msg = create_event(seq, &event);
                let clients = state.clients.read().await;
                for c in clients.iter() {
                    if c.handshaken && c.stream_events {
                        let _ = c.tx.send(ClientOutbound::Event(msg.clone()));
                    }
                }
            }
        });
    }

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        println!("[Adapter] Client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let game = game.clone();
        let wire_log_tx = wire_log_tx.clone();

        // Spawn task to handle this client
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state, game, wire_log_tx).await
            {
                eprintln!("[Adapter] Client {} error: {}", client_id, e);
            }
            println!("[Adapter] Client {} disconnected", client_id);
        });
    }
}

/// Append every inbound line and every outbound message to `path` as JSON lines.
fn spawn_wire_log(path: String) -> mpsc::UnboundedSender<Vec<u8>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                eprintln!("[Adapter] Wire log {} unavailable: {}", path, e);
                return;
            }
        };

        while let Some(bytes) = rx.recv().await {
            if file.write_all(&bytes).await.is_err() {
                break;
            }
            if file.write_all(b"\n").await.is_err() {
                break;
            }
        }

        let _ = file.flush().await;
    });
    tx
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: u64,
    state: Arc<ServerState>,
    game: GameHandle,
    wire_log_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            addr,
            is_controller: false,
            stream_events: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let wire_log_tx_out = wire_log_tx.clone();

    // Spawn task to write messages to client
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            if msg.encode(&mut buf).is_err() {
                continue;
            }
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if let Some(tx) = wire_log_tx_out.as_ref() {
                let _ = tx.send(buf.clone());
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            // Client disconnected
            break;
        }

        let raw_line = line.trim_end_matches(['\n', '\r']);
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(tx) = wire_log_tx.as_ref() {
            let _ = tx.send(raw_line.as_bytes().to_vec());
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if !handle_hello(&state, &game, client_id, &tx, hello).await {
                    break;
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if let Err(error) = admit(&state, client_id, cmd.seq, "command").await {
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                if cmd.action.is_mutating() && !is_controller(&state, client_id).await {
                    let error = create_error(
                        cmd.seq,
                        ErrorCode::NotController,
                        "Only controller may send commands",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                let _ = tx.send(apply_command(&game, &cmd).await);
            }

            Ok(ParsedMessage::Control(ctrl)) => {
                if let Err(error) = admit(&state, client_id, ctrl.seq, "control").await {
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                let reply = match ctrl.action {
                    ControlAction::Claim => claim_control(&state, client_id, ctrl.seq).await,
                    ControlAction::Release => release_control(&state, client_id, ctrl.seq).await,
                };
                let _ = tx.send(reply);
            }

            Ok(ParsedMessage::Unknown(msg)) => {
                if is_handshaken(&state, client_id).await
                    && !check_and_update_seq(&state, client_id, msg.seq).await
                {
                    let error = create_error(
                        msg.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }
                let error = create_error(msg.seq, ErrorCode::InvalidCommand, "Unknown message type");
                let _ = tx.send(ClientOutbound::Error(error));
            }

            Err(e) => {
                let seq = serde_json::from_str::<serde_json::Value>(trimmed)
                    .ok()
                    .and_then(|v| v.get("seq").and_then(|s| s.as_u64()))
                    .unwrap_or(0);
                let error = create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
                let _ = tx.send(ClientOutbound::Error(error));
            }
        }
    }

    // Clean up: remove client and release/promote controller if needed.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;

        let was_controller = *controller == Some(client_id);
        clients.retain(|c| c.id != client_id);

        if was_controller {
            // Promote the next handshaken client (lowest id) to controller.
            let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            *controller = next_id;
            if let Some(new_id) = next_id {
                if let Some(c) = clients.iter_mut().find(|c| c.id == new_id) {
                    c.is_controller = true;
                }
                println!("[Adapter] Controller {} promoted", new_id);
            } else {
                println!("[Adapter] Controller {} released", client_id);
            }
        }
    }

    // Cancel write task
    drop(tx);
    let _ = write_task.await;

    Ok(())
}

/// Returns false when the connection must be closed.
async fn handle_hello(
    state: &ServerState,
    game: &GameHandle,
    client_id: u64,
    tx: &mpsc::UnboundedSender<ClientOutbound>,
    hello: HelloMessage,
) -> bool {
    // Sequencing: enforce monotonic seq per sender.
    if is_handshaken(state, client_id).await
        && !check_and_update_seq(state, client_id, hello.seq).await
    {
        let error = create_error(
            hello.seq,
            ErrorCode::InvalidCommand,
            "seq must be strictly increasing",
        );
        let _ = tx.send(ClientOutbound::Error(error));
        return true;
    }

    // Validate protocol version
    if !hello.protocol_version.starts_with("1.") {
        let error = create_error(
            hello.seq,
            ErrorCode::ProtocolMismatch,
            &format!("Protocol version {} not supported", hello.protocol_version),
        );
        let _ = tx.send(ClientOutbound::Error(error));
        return false;
    }

    let snapshot = match game.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let error = create_error(hello.seq, ErrorCode::EngineUnavailable, &e.to_string());
            let _ = tx.send(ClientOutbound::Error(error));
            return false;
        }
    };

    let wants_control = hello.requested.role != Some(RequestedRole::Observer);
    let role = {
        // First client to hello becomes controller
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        let becomes_controller = wants_control && controller.is_none();
        if becomes_controller {
            *controller = Some(client_id);
            println!("[Adapter] Client {} is now controller", client_id);
        }
        if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
            client.handshaken = true;
            client.last_seq = Some(hello.seq);
            client.stream_events = hello.requested.stream_events;
            client.is_controller = *controller == Some(client_id);
        }
        if *controller == Some(client_id) {
            AssignedRole::Controller
        } else {
            AssignedRole::Observer
        }
    };
    let controller_id = *state.controller.read().await;

    let welcome = create_welcome(
        hello.seq,
        &state.config.protocol_version,
        client_id,
        role,
        controller_id,
        GridInfo {
            width: snapshot.width,
            height: snapshot.height,
        },
    );
    let _ = tx.send(ClientOutbound::Welcome(welcome));

    // Streaming clients start from a full observation.
    if hello.requested.stream_events {
        let obs = create_observation(hello.seq, &snapshot);
        let _ = tx.send(ClientOutbound::Observation(Box::new(obs)));
    }
    true
}

async fn claim_control(state: &ServerState, client_id: u64, seq: u64) -> ClientOutbound {
    let mut controller = state.controller.write().await;
    match *controller {
        None => {
            *controller = Some(client_id);
            let mut clients = state.clients.write().await;
            if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                client.is_controller = true;
            }
            println!("[Adapter] Client {} claimed control", client_id);
            ClientOutbound::Ack(create_ack(seq, None))
        }
        Some(id) if id == client_id => ClientOutbound::Ack(create_ack(seq, None)),
        Some(_) => ClientOutbound::Error(create_error(
            seq,
            ErrorCode::ControllerActive,
            "Controller already assigned",
        )),
    }
}

async fn release_control(state: &ServerState, client_id: u64, seq: u64) -> ClientOutbound {
    let mut controller = state.controller.write().await;
    if *controller != Some(client_id) {
        return ClientOutbound::Error(create_error(
            seq,
            ErrorCode::NotController,
            "Only controller may release",
        ));
    }

    *controller = None;
    let mut clients = state.clients.write().await;
    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
        client.is_controller = false;
    }
    println!("[Adapter] Controller {} released", client_id);
    ClientOutbound::Ack(create_ack(seq, None))
}

/// Apply a command to the game and build the reply
async fn apply_command(game: &GameHandle, cmd: &CommandMessage) -> ClientOutbound {
    let seq = cmd.seq;
    let result = match cmd.action {
        CommandAction::Start => game.start().await.map(|delay_ms| CommandResult {
            delay_ms: Some(delay_ms),
            ..CommandResult::default()
        }),
        CommandAction::Place => {
            let (Some(x), Some(y)) = (cmd.x, cmd.y) else {
                return ClientOutbound::Error(create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    "place requires x and y",
                ));
            };
            game.attempt_placement(x, y)
                .await
                .map(|outcome| CommandResult {
                    delay_ms: Some(outcome.delay_ms),
                    lines_cleared: Some(outcome.lines_cleared),
                    blocks_cleared: Some(outcome.blocks_cleared),
                    points: Some(outcome.points),
                    ..CommandResult::default()
                })
        }
        CommandAction::Rotate => {
            let direction = match cmd.direction.as_deref() {
                None => RotateDirection::Clockwise,
                Some(s) => match RotateDirection::from_str(s) {
                    Some(direction) => direction,
                    None => {
                        return ClientOutbound::Error(create_error(
                            seq,
                            ErrorCode::InvalidCommand,
                            &format!("Invalid direction: {}", s),
                        ))
                    }
                },
            };
            game.request_rotate(direction)
                .await
                .map(|current| CommandResult {
                    current: Some(current.into()),
                    ..CommandResult::default()
                })
        }
        CommandAction::Swap => game
            .request_swap_pieces()
            .await
            .map(|(current, next)| CommandResult {
                current: Some(current.into()),
                next: Some(next.into()),
                ..CommandResult::default()
            }),
        CommandAction::Abandon => game.abandon().await.map(|final_score| CommandResult {
            final_score: Some(final_score),
            ..CommandResult::default()
        }),
        CommandAction::Snapshot => {
            return match game.snapshot().await {
                Ok(snapshot) => {
                    ClientOutbound::Observation(Box::new(create_observation(seq, &snapshot)))
                }
                Err(e) => engine_error(seq, &e),
            };
        }
    };

    match result {
        Ok(result) => ClientOutbound::Ack(create_ack(seq, Some(result))),
        Err(e) => engine_error(seq, &e),
    }
}

fn engine_error(seq: u64, error: &EngineError) -> ClientOutbound {
    let code = match error {
        EngineError::Game(e) => ErrorCode::from(e),
        EngineError::Closed => ErrorCode::EngineUnavailable,
    };
    ClientOutbound::Error(create_error(seq, code, &error.to_string()))
}
