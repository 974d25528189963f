//! SMPP 3.4 command status codes.

/// Command status (`ESME_*` codes from the SMPP 3.4 specification).
///
/// The wire header carries a raw `u32`; this enum covers the codes the
/// server emits or inspects. Values must match the specification
/// bit-for-bit for interoperability with real SMPP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Status {
    Ok = 0x0000_0000,
    InvalidMsgLength = 0x0000_0001,
    InvalidCommandLength = 0x0000_0002,
    InvalidCommandId = 0x0000_0003,
    InvalidBindStatus = 0x0000_0004,
    AlreadyBound = 0x0000_0005,
    InvalidPriorityFlag = 0x0000_0006,
    InvalidRegisteredDelivery = 0x0000_0007,
    SystemError = 0x0000_0008,
    InvalidSourceAddress = 0x0000_000A,
    InvalidDestAddress = 0x0000_000B,
    InvalidMessageId = 0x0000_000C,
    BindFailed = 0x0000_000D,
    InvalidPassword = 0x0000_000E,
    InvalidSystemId = 0x0000_000F,
    CancelFailed = 0x0000_0011,
    ReplaceFailed = 0x0000_0013,
    MessageQueueFull = 0x0000_0014,
    InvalidServiceType = 0x0000_0015,
    InvalidNumDests = 0x0000_0033,
    InvalidDistListName = 0x0000_0034,
    InvalidDestFlag = 0x0000_0040,
    InvalidSubmitWithReplace = 0x0000_0042,
    InvalidEsmClass = 0x0000_0043,
    CannotSubmitToDistList = 0x0000_0044,
    SubmitFailed = 0x0000_0045,
    InvalidSourceTon = 0x0000_0048,
    InvalidSourceNpi = 0x0000_0049,
    InvalidDestTon = 0x0000_0050,
    InvalidDestNpi = 0x0000_0051,
    InvalidSystemType = 0x0000_0053,
    InvalidReplaceFlag = 0x0000_0054,
    InvalidNumMessages = 0x0000_0055,
    Throttled = 0x0000_0058,
    InvalidScheduleTime = 0x0000_0061,
    InvalidExpiryTime = 0x0000_0062,
    InvalidDefaultMsgId = 0x0000_0063,
    ReceiverTemporaryError = 0x0000_0064,
    ReceiverPermanentError = 0x0000_0065,
    ReceiverRejectError = 0x0000_0066,
    QueryFailed = 0x0000_0067,
    InvalidOptionalPartStream = 0x0000_00C0,
    OptionalPartNotAllowed = 0x0000_00C1,
    InvalidParameterLength = 0x0000_00C2,
    MissingOptionalParameter = 0x0000_00C3,
    InvalidOptionalParameterValue = 0x0000_00C4,
    DeliveryFailure = 0x0000_00FE,
    UnknownError = 0x0000_00FF,
}

impl Status {
    /// Raw wire value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Decode a raw status, if it is one this server understands.
    pub fn from_u32(value: u32) -> Option<Self> {
        use Status::*;
        let status = match value {
            0x0000 => Ok,
            0x0001 => InvalidMsgLength,
            0x0002 => InvalidCommandLength,
            0x0003 => InvalidCommandId,
            0x0004 => InvalidBindStatus,
            0x0005 => AlreadyBound,
            0x0006 => InvalidPriorityFlag,
            0x0007 => InvalidRegisteredDelivery,
            0x0008 => SystemError,
            0x000A => InvalidSourceAddress,
            0x000B => InvalidDestAddress,
            0x000C => InvalidMessageId,
            0x000D => BindFailed,
            0x000E => InvalidPassword,
            0x000F => InvalidSystemId,
            0x0011 => CancelFailed,
            0x0013 => ReplaceFailed,
            0x0014 => MessageQueueFull,
            0x0015 => InvalidServiceType,
            0x0033 => InvalidNumDests,
            0x0034 => InvalidDistListName,
            0x0040 => InvalidDestFlag,
            0x0042 => InvalidSubmitWithReplace,
            0x0043 => InvalidEsmClass,
            0x0044 => CannotSubmitToDistList,
            0x0045 => SubmitFailed,
            0x0048 => InvalidSourceTon,
            0x0049 => InvalidSourceNpi,
            0x0050 => InvalidDestTon,
            0x0051 => InvalidDestNpi,
            0x0053 => InvalidSystemType,
            0x0054 => InvalidReplaceFlag,
            0x0055 => InvalidNumMessages,
            0x0058 => Throttled,
            0x0061 => InvalidScheduleTime,
            0x0062 => InvalidExpiryTime,
            0x0063 => InvalidDefaultMsgId,
            0x0064 => ReceiverTemporaryError,
            0x0065 => ReceiverPermanentError,
            0x0066 => ReceiverRejectError,
            0x0067 => QueryFailed,
            0x00C0 => InvalidOptionalPartStream,
            0x00C1 => OptionalPartNotAllowed,
            0x00C2 => InvalidParameterLength,
            0x00C3 => MissingOptionalParameter,
            0x00C4 => InvalidOptionalParameterValue,
            0x00FE => DeliveryFailure,
            0x00FF => UnknownError,
            _ => return None,
        };
        Some(status)
    }
}

impl From<Status> for u32 {
    fn from(status: Status) -> Self {
        status.as_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_match_protocol_tables() {
        assert_eq!(Status::Ok.as_u32(), 0x00);
        assert_eq!(Status::InvalidCommandLength.as_u32(), 0x02);
        assert_eq!(Status::InvalidBindStatus.as_u32(), 0x04);
        assert_eq!(Status::AlreadyBound.as_u32(), 0x05);
        assert_eq!(Status::SystemError.as_u32(), 0x08);
        assert_eq!(Status::InvalidSourceAddress.as_u32(), 0x0A);
        assert_eq!(Status::InvalidDestAddress.as_u32(), 0x0B);
        assert_eq!(Status::InvalidPassword.as_u32(), 0x0E);
        assert_eq!(Status::InvalidSystemId.as_u32(), 0x0F);
        assert_eq!(Status::Throttled.as_u32(), 0x58);
    }

    #[test]
    fn from_u32_round_trips() {
        for raw in [0x00u32, 0x04, 0x05, 0x08, 0x0E, 0x58, 0xFF] {
            assert_eq!(Status::from_u32(raw).unwrap().as_u32(), raw);
        }
        assert!(Status::from_u32(0xDEAD_BEEF).is_none());
    }
}
