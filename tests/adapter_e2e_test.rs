use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use tetrecs::adapter::protocol::{create_command, create_hello, create_place, CommandAction};
use tetrecs::adapter::server::{run_server, ServerConfig};
use tetrecs::core::MemoryHighScores;
use tetrecs::engine::{spawn_game, EngineConfig, GameHandle};

type Lines = tokio::io::Lines<BufReader<OwnedReadHalf>>;

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

async fn start_server() -> (SocketAddr, GameHandle, JoinHandle<()>) {
    let game = spawn_game(EngineConfig::with_seed(42), Arc::new(MemoryHighScores::new())).unwrap();
    let (ready_tx, ready_rx) = oneshot::channel();

    let server_game = game.clone();
    let server_handle = tokio::spawn(async move {
        let _ = run_server(test_config(), server_game, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");
    (addr, game, server_handle)
}

async fn connect(addr: SocketAddr) -> (Lines, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half).lines(), write_half)
}

async fn send<T: serde::Serialize>(writer: &mut OwnedWriteHalf, msg: &T) {
    send_raw(writer, &serde_json::to_string(msg).unwrap()).await;
}

async fn send_raw(writer: &mut OwnedWriteHalf, line: &str) {
    writer.write_all(line.as_bytes()).await.unwrap();
    writer.write_all(b"\n").await.unwrap();
    writer.flush().await.unwrap();
}

async fn read_json(lines: &mut Lines) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for line")
        .expect("io error")
        .expect("expected line");
    serde_json::from_str(&line).unwrap()
}

/// Skip streamed events until the reply to `seq` arrives.
async fn read_reply(lines: &mut Lines, seq: u64) -> serde_json::Value {
    loop {
        let v = read_json(lines).await;
        if v["type"] != "event" && v["seq"] == seq {
            return v;
        }
    }
}

async fn handshake(writer: &mut OwnedWriteHalf, lines: &mut Lines, name: &str) -> serde_json::Value {
    let mut hello = create_hello(1, name, "1.0.0");
    hello.requested.stream_events = false;
    send(writer, &hello).await;
    read_json(lines).await
}

#[tokio::test]
async fn adapter_hello_start_place_and_snapshot() {
    let (addr, _game, server_handle) = start_server().await;
    let (mut lines, mut writer) = connect(addr).await;

    send(&mut writer, &create_hello(1, "e2e-test", "1.0.0")).await;
    let welcome = read_json(&mut lines).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["seq"], 1);
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["grid"]["width"], 5);
    assert_eq!(welcome["grid"]["height"], 5);

    let obs = read_json(&mut lines).await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["phase"], "idle");
    assert_eq!(obs["board"]["cells"].as_array().unwrap().len(), 5);

    send(&mut writer, &create_command(2, CommandAction::Start)).await;
    let ack = read_reply(&mut lines, 2).await;
    assert_eq!(ack["type"], "ack", "expected ack, got {ack}");
    assert_eq!(ack["status"], "ok");
    assert_eq!(ack["result"]["delay_ms"], 12_000);

    send(&mut writer, &create_place(3, 2, 2)).await;
    let mut saw_placed = false;
    let ack = loop {
        let v = read_json(&mut lines).await;
        if v["type"] == "event" {
            saw_placed |= v["event"]["kind"] == "placed";
            continue;
        }
        break v;
    };
    assert_eq!(ack["type"], "ack", "expected ack, got {ack}");
    assert_eq!(ack["seq"], 3);
    assert_eq!(ack["result"]["lines_cleared"], 0);

    send(&mut writer, &create_command(4, CommandAction::Snapshot)).await;
    let obs = loop {
        let v = read_json(&mut lines).await;
        if v["type"] == "event" {
            saw_placed |= v["event"]["kind"] == "placed";
            continue;
        }
        break v;
    };
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["seq"], 4);
    assert_eq!(obs["phase"], "running");
    assert_eq!(obs["turn"], 1);
    assert_eq!(obs["lives"], 3);
    assert!(saw_placed, "placed event was not streamed");

    server_handle.abort();
}

#[tokio::test]
async fn adapter_rejections_map_to_error_codes() {
    let (addr, _game, server_handle) = start_server().await;
    let (mut lines, mut writer) = connect(addr).await;

    // Commands need a handshake first.
    send(&mut writer, &create_command(1, CommandAction::Start)).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "handshake_required");

    let welcome = handshake(&mut writer, &mut lines, "rules").await;
    assert_eq!(welcome["type"], "welcome");

    send(&mut writer, &create_place(2, 2, 2)).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_state");

    // seq must be strictly increasing.
    send(&mut writer, &create_command(2, CommandAction::Start)).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 2);

    send(&mut writer, &create_command(3, CommandAction::Start)).await;
    assert_eq!(read_json(&mut lines).await["type"], "ack");

    send(&mut writer, &create_place(4, 7, 0)).await;
    assert_eq!(read_json(&mut lines).await["code"], "out_of_bounds");

    send(&mut writer, &create_place(5, 2, 2)).await;
    assert_eq!(read_json(&mut lines).await["type"], "ack");
    send(&mut writer, &create_place(6, 2, 2)).await;
    assert_eq!(read_json(&mut lines).await["code"], "illegal_placement");

    send_raw(&mut writer, r#"{"type":"command","seq":7,"ts":1,"action":"place"}"#).await;
    assert_eq!(read_json(&mut lines).await["code"], "invalid_command");

    send_raw(&mut writer, r#"{"type":"teleport","seq":8}"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 8);

    send_raw(&mut writer, r#"{"type":"command","seq":9,"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert!(err["message"].as_str().unwrap().starts_with("JSON parse error"));

    server_handle.abort();
}

#[tokio::test]
async fn adapter_protocol_mismatch_closes_connection() {
    let (addr, _game, server_handle) = start_server().await;
    let (mut lines, mut writer) = connect(addr).await;

    send(&mut writer, &create_hello(1, "old-client", "2.0.0")).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "protocol_mismatch");

    let end = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for close")
        .expect("io error");
    assert!(end.is_none());

    server_handle.abort();
}

#[tokio::test]
async fn adapter_observer_gating_and_controller_promotion() {
    let (addr, game, server_handle) = start_server().await;

    let (mut lines_a, mut writer_a) = connect(addr).await;
    let welcome_a = handshake(&mut writer_a, &mut lines_a, "first").await;
    assert_eq!(welcome_a["role"], "controller");

    let (mut lines_b, mut writer_b) = connect(addr).await;
    let welcome_b = handshake(&mut writer_b, &mut lines_b, "second").await;
    assert_eq!(welcome_b["role"], "observer");
    assert_eq!(welcome_b["controller_id"], welcome_a["client_id"]);

    send(&mut writer_b, &create_command(2, CommandAction::Start)).await;
    assert_eq!(read_json(&mut lines_b).await["code"], "not_controller");

    send_raw(&mut writer_b, r#"{"type":"control","seq":3,"ts":1,"action":"claim"}"#).await;
    assert_eq!(read_json(&mut lines_b).await["code"], "controller_active");

    // Observers may still read the game.
    send(&mut writer_b, &create_command(4, CommandAction::Snapshot)).await;
    assert_eq!(read_json(&mut lines_b).await["type"], "observation");

    // The controller leaves; the observer takes over.
    drop(writer_a);
    drop(lines_a);

    let mut seq = 5;
    let ack = loop {
        send(&mut writer_b, &create_command(seq, CommandAction::Start)).await;
        let resp = read_json(&mut lines_b).await;
        if resp["code"] == "not_controller" && seq < 60 {
            seq += 1;
            tokio::time::sleep(Duration::from_millis(20)).await;
            continue;
        }
        break resp;
    };
    assert_eq!(ack["type"], "ack", "expected ack, got {ack}");
    assert_eq!(game.snapshot().await.unwrap().phase.as_str(), "running");

    server_handle.abort();
}

#[tokio::test]
async fn adapter_release_then_claim() {
    let (addr, _game, server_handle) = start_server().await;

    let (mut lines_a, mut writer_a) = connect(addr).await;
    handshake(&mut writer_a, &mut lines_a, "first").await;
    let (mut lines_b, mut writer_b) = connect(addr).await;
    handshake(&mut writer_b, &mut lines_b, "second").await;

    send_raw(&mut writer_b, r#"{"type":"control","seq":2,"ts":1,"action":"release"}"#).await;
    assert_eq!(read_json(&mut lines_b).await["code"], "not_controller");

    send_raw(&mut writer_a, r#"{"type":"control","seq":2,"ts":1,"action":"release"}"#).await;
    assert_eq!(read_json(&mut lines_a).await["type"], "ack");

    send_raw(&mut writer_b, r#"{"type":"control","seq":3,"ts":1,"action":"claim"}"#).await;
    assert_eq!(read_json(&mut lines_b).await["type"], "ack");

    send(&mut writer_a, &create_command(3, CommandAction::Start)).await;
    assert_eq!(read_json(&mut lines_a).await["code"], "not_controller");

    server_handle.abort();
}

#[tokio::test]
async fn adapter_bind_failure_is_reported() {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral port");
    let port = listener.local_addr().unwrap().port();

    let game = spawn_game(EngineConfig::with_seed(1), Arc::new(MemoryHighScores::new())).unwrap();
    let config = ServerConfig {
        port,
        ..test_config()
    };
    let result = tokio::time::timeout(Duration::from_secs(2), run_server(config, game, None))
        .await
        .expect("run_server should fail fast");
    assert!(result.is_err());
}
