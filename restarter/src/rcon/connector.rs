//! Opening authenticated console sessions

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::debug;

use super::protocol::{
    Packet, RconCodec, SERVERDATA_AUTH_RESPONSE, SERVERDATA_RESPONSE_VALUE,
};
use crate::constants::rcon::{CONNECT_TIMEOUT, IO_TIMEOUT};
use crate::errors::RconError;

/// A live console connection.
#[async_trait]
pub trait RconSession: Send {
    /// Run a command and return the server's response text.
    async fn command(&mut self, command: &str) -> Result<String, RconError>;
}

/// Creates new console sessions.
#[async_trait]
pub trait RconConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RconSession>, RconError>;

    /// `host:port` used in log lines
    fn address(&self) -> String;
}

pub struct TcpRconConnector {
    address: String,
    password: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl TcpRconConnector {
    pub fn new(address: String, password: String) -> Self {
        Self {
            address,
            password,
            connect_timeout: CONNECT_TIMEOUT,
            io_timeout: IO_TIMEOUT,
        }
    }
}

#[async_trait]
impl RconConnector for TcpRconConnector {
    async fn connect(&self) -> Result<Box<dyn RconSession>, RconError> {
        debug!("Opening RCON connection to {}", self.address);

        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| RconError::Transport {
                reason: format!("connect to {} timed out", self.address),
            })??;
        stream.set_nodelay(true)?;

        let mut session = TcpRconSession {
            framed: Framed::new(stream, RconCodec),
            next_id: 1,
            address: self.address.clone(),
            io_timeout: self.io_timeout,
        };
        session.authenticate(&self.password).await?;

        Ok(Box::new(session))
    }

    fn address(&self) -> String {
        self.address.clone()
    }
}

/// Ids wrap from `i32::MAX` back to 1, so they never reach 0 or the -1 auth failure marker.
fn next_request_id(current: i32) -> i32 {
    current.checked_add(1).unwrap_or(1)
}

pub struct TcpRconSession {
    framed: Framed<TcpStream, RconCodec>,
    next_id: i32,
    address: String,
    io_timeout: Duration,
}

impl TcpRconSession {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = next_request_id(id);
        id
    }

    async fn send(&mut self, packet: Packet) -> Result<(), RconError> {
        timeout(self.io_timeout, self.framed.send(packet))
            .await
            .map_err(|_| RconError::Transport {
                reason: format!("write to {} timed out", self.address),
            })?
    }

    async fn receive(&mut self) -> Result<Packet, RconError> {
        match timeout(self.io_timeout, self.framed.next()).await {
            Err(_) => Err(RconError::Transport {
                reason: format!("read from {} timed out", self.address),
            }),
            Ok(None) => Err(RconError::Transport {
                reason: format!("connection to {} closed", self.address),
            }),
            Ok(Some(packet)) => packet,
        }
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), RconError> {
        let id = self.allocate_id();
        self.send(Packet::auth(id, password)).await?;

        // Source servers send an empty RESPONSE_VALUE ahead of the auth result.
        loop {
            let packet = self.receive().await?;
            if packet.kind != SERVERDATA_AUTH_RESPONSE {
                continue;
            }
            if packet.id == -1 {
                return Err(RconError::AuthenticationFailed {
                    host: self.address.clone(),
                });
            }
            return Ok(());
        }
    }
}

#[async_trait]
impl RconSession for TcpRconSession {
    async fn command(&mut self, command: &str) -> Result<String, RconError> {
        let id = self.allocate_id();
        self.send(Packet::exec(id, command)).await?;

        loop {
            let packet = self.receive().await?;
            if packet.id == id && packet.kind == SERVERDATA_RESPONSE_VALUE {
                return Ok(packet.body_text());
            }
            debug!(
                "Skipping unrelated RCON packet id={} type={}",
                packet.id, packet.kind
            );
        }
    }
}
