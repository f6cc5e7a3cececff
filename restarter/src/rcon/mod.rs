//! Remote console access to the game server
//!
//! - `protocol`: Source RCON packet codec
//! - `connector`: TCP sessions with password authentication
//! - `client`: the retrying, self-healing client used by the restart cycle

pub mod client;
pub mod connector;
pub mod protocol;

pub use client::{ConnectionStatus, RconClient, RetryPolicy};
pub use connector::{RconConnector, RconSession, TcpRconConnector};
