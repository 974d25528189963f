//! SMPP frame codec.
//!
//! A frame is the 16-byte header plus an opaque body. Body semantics live
//! in [`crate::protocol::pdu`]; this layer only enforces the length
//! invariant `command_length == 16 + body.len()`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use super::command::CommandId;
use super::status::Status;

/// Size of the fixed PDU header.
pub const HEADER_LEN: usize = 16;

/// Upper bound on a single PDU, to bound memory against hostile peers.
pub const MAX_PDU_LEN: u32 = 64 * 1024;

/// Framing and body-layout errors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid command_length {length}, must be {min}..={max}")]
    InvalidLength { length: u32, min: u32, max: u32 },

    #[error("truncated {field} in {command} body")]
    Truncated {
        command: &'static str,
        field: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The fixed PDU header, minus `command_length` (always recomputed on
/// encode from the actual body size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command_id: u32,
    pub command_status: u32,
    pub sequence_number: u32,
}

impl Header {
    pub fn new(command: CommandId, sequence_number: u32) -> Self {
        Self {
            command_id: command.as_u32(),
            command_status: Status::Ok.as_u32(),
            sequence_number,
        }
    }

    pub fn with_status(command: CommandId, sequence_number: u32, status: Status) -> Self {
        Self {
            command_id: command.as_u32(),
            command_status: status.as_u32(),
            sequence_number,
        }
    }

    /// Decoded command id, if known.
    pub fn command(&self) -> Option<CommandId> {
        CommandId::from_u32(self.command_id)
    }
}

/// One framed PDU: header plus undecoded body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub body: Bytes,
}

impl Frame {
    pub fn new(header: Header, body: Bytes) -> Self {
        Self { header, body }
    }

    pub fn sequence(&self) -> u32 {
        self.header.sequence_number
    }

    pub fn is_response(&self) -> bool {
        self.header.command_id & super::command::RESPONSE_BIT != 0
    }

    /// Protocol name of the command, or a hex rendering for unknown ids.
    pub fn command_name(&self) -> String {
        match self.header.command() {
            Some(id) => id.name().to_string(),
            None => format!("0x{:08x}", self.header.command_id),
        }
    }
}

/// Framed codec for SMPP streams.
#[derive(Debug, Default)]
pub struct SmppCodec;

impl SmppCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for SmppCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, CodecError> {
        if src.len() < 4 {
            return Ok(None);
        }

        let command_length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        if command_length < HEADER_LEN as u32 || command_length > MAX_PDU_LEN {
            return Err(CodecError::InvalidLength {
                length: command_length,
                min: HEADER_LEN as u32,
                max: MAX_PDU_LEN,
            });
        }

        let total = command_length as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(total);
        frame.advance(4); // command_length already consumed above
        let command_id = frame.get_u32();
        let command_status = frame.get_u32();
        let sequence_number = frame.get_u32();

        Ok(Some(Frame {
            header: Header {
                command_id,
                command_status,
                sequence_number,
            },
            body: frame.freeze(),
        }))
    }
}

impl Encoder<Frame> for SmppCodec {
    type Error = CodecError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), CodecError> {
        let total = HEADER_LEN + frame.body.len();
        dst.reserve(total);
        dst.put_u32(total as u32);
        dst.put_u32(frame.header.command_id);
        dst.put_u32(frame.header.command_status);
        dst.put_u32(frame.header.sequence_number);
        dst.put_slice(&frame.body);
        Ok(())
    }
}
