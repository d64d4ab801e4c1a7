//! TetrECS (workspace facade crate).
//!
//! Re-exports the `tetrecs::{types,core,engine,adapter}` public API while the implementation
//! lives in dedicated crates under `crates/`.

pub mod cli;

pub use tetrecs_adapter as adapter;
pub use tetrecs_core as core;
pub use tetrecs_engine as engine;
pub use tetrecs_types as types;
