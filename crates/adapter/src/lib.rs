//! Adapter module - remote play and observation via TCP socket with JSON protocol
//!
//! This module lets external clients drive a running game through a TCP socket
//! connection and watch its event stream.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7777)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Event Streaming**: Clients that ask for it receive every game event as it happens
//! 5. **Commanding**: Controller sends commands (`start`, `place`, `rotate`, `swap`, `abandon`)
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested capabilities
//! - **command**: Game requests; `snapshot` is open to observers too
//! - **control**: Claim or release controller status
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with assigned role and grid size
//! - **observation**: Full game snapshot (grid, pieces, stats, phase)
//! - **event**: One game event (`cellChanged`, `lineCleared`, `lifeLost`, ...)
//! - **ack**: Command acknowledgment with its result
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `TETRECS_HOST`: Bind address (default: "127.0.0.1")
//! - `TETRECS_PORT`: Port number (default: 7777)
//! - `TETRECS_LOG_PATH`: Append every inbound and outbound line to this file
//! - `TETRECS_ADAPTER_DISABLED`: Set to "1" or "true" to disable adapter entirely
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1234567890,"client":{"name":"bot","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_events":true}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1234567890,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":1234567890,"phase":"idle",...}
//! Client -> Server: {"type":"command","seq":2,"ts":1234567891,"action":"start"}
//! Server -> Client: {"type":"ack","seq":2,"ts":1234567891,"status":"ok","result":{"delay_ms":12000}}
//! Client -> Server: {"type":"command","seq":3,"ts":1234567892,"action":"place","x":2,"y":2}
//! Server -> Client: {"type":"event","seq":4,"ts":1234567892,"event":{"kind":"cellChanged","x":2,"y":2,"value":1}}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7777
//! {"type":"hello","seq":1,"ts":0,"client":{"name":"test","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_events":true}}
//! ```

pub mod protocol;
pub mod server;

pub use tetrecs_core as core;
pub use tetrecs_engine as engine;
pub use tetrecs_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use server::{run_server, ServerConfig};
