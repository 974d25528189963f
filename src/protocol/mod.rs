//! SMPP 3.4 wire protocol: framing, PDU bodies, optional parameters.
//!
//! The codec layer (`codec`) only deals with the 16-byte header and an
//! opaque body; `pdu` parses and serializes the per-command bodies. The
//! split keeps frame I/O separate from command semantics and lets the
//! dispatcher generic_nack unknown command ids without a decode error.

pub mod codec;
pub mod command;
pub mod pdu;
pub mod status;
pub mod text;
pub mod tlv;

pub use codec::{CodecError, Frame, Header, SmppCodec, HEADER_LEN, MAX_PDU_LEN};
pub use command::CommandId;
pub use pdu::{Address, BindBody, BindRespBody, Pdu, SmBody, SmRespBody};
pub use status::Status;
pub use tlv::{ConcatInfo, Tlv, TlvMap};
