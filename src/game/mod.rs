// Word grid game server
//
// Clients log in with an RSA challenge-response handshake, receive an
// RSA-wrapped session key, then exchange AES-encrypted text commands that
// place letters on a shared board. Every message on the wire is a
// length-prefixed frame.

pub mod error;
pub mod message;
pub mod cipher;
pub mod keys;
pub mod users;
pub mod handshake;
pub mod scores;
pub mod board;
pub mod protocol;
pub mod storage;
pub mod server;
pub mod client;
pub mod cli;
pub mod commands;

pub use error::{CryptoError, HandshakeError, SessionError, TransportError};
pub use message::MessageChannel;
pub use cipher::SessionCipher;
pub use users::{UserRecord, UserRegistry};
pub use handshake::{HandshakeState, ServerHandshake, Session};
pub use scores::ScoreTable;
pub use board::{BoardState, BoardTemplate, Cell, PlaceError, PlayerId, Terrain};
pub use protocol::Command;
pub use server::{GameContext, GameServer};
pub use client::GameClient;
pub use cli::{WordgridCli, WordgridCommand};
pub use commands::execute_command;
