//! Source RCON wire format
//!
//! Every packet is `size | id | type | body | 0x00 0x00`, all integers
//! little-endian `i32`, where `size` counts everything after itself.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::constants::rcon::MAX_BODY_SIZE;
use crate::errors::RconError;

pub const SERVERDATA_AUTH: i32 = 3;
pub const SERVERDATA_AUTH_RESPONSE: i32 = 2;
pub const SERVERDATA_EXECCOMMAND: i32 = 2;
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// id + type + two terminators
const HEADER_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: Vec<u8>,
}

impl Packet {
    pub fn auth(id: i32, password: &str) -> Self {
        Self {
            id,
            kind: SERVERDATA_AUTH,
            body: password.as_bytes().to_vec(),
        }
    }

    pub fn exec(id: i32, command: &str) -> Self {
        Self {
            id,
            kind: SERVERDATA_EXECCOMMAND,
            body: command.as_bytes().to_vec(),
        }
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RconCodec;

impl Encoder<Packet> for RconCodec {
    type Error = RconError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if packet.body.len() > MAX_BODY_SIZE {
            return Err(RconError::Protocol {
                reason: format!(
                    "body of {} bytes exceeds the {} byte limit",
                    packet.body.len(),
                    MAX_BODY_SIZE
                ),
            });
        }

        let size = (HEADER_SIZE + packet.body.len()) as i32;
        dst.reserve(4 + size as usize);
        dst.put_i32_le(size);
        dst.put_i32_le(packet.id);
        dst.put_i32_le(packet.kind);
        dst.put_slice(&packet.body);
        dst.put_u8(0);
        dst.put_u8(0);
        Ok(())
    }
}

impl Decoder for RconCodec {
    type Item = Packet;
    type Error = RconError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let size = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        if size < HEADER_SIZE as i32 || size as usize > HEADER_SIZE + MAX_BODY_SIZE {
            return Err(RconError::Protocol {
                reason: format!("invalid packet size {}", size),
            });
        }

        let size = size as usize;
        if src.len() < 4 + size {
            src.reserve(4 + size - src.len());
            return Ok(None);
        }

        src.advance(4);
        let id = src.get_i32_le();
        let kind = src.get_i32_le();
        let mut body = src.split_to(size - HEADER_SIZE).to_vec();
        src.advance(2);

        // Some servers pad the body with its own terminator.
        while body.last() == Some(&0) {
            body.pop();
        }

        Ok(Some(Packet { id, kind, body }))
    }
}
