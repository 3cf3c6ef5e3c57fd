//! wordgrid - multi-client letter placement game server
//!
//! This library provides the wire protocol (framing, RSA login handshake,
//! AES session cipher), the shared game board, and the TCP server and
//! client built on top of them.

pub mod game;

pub use game::{GameClient, GameServer};
