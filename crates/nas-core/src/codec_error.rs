use core::fmt;

/// Failure while decoding NAS wire data. Every variant is recoverable; a decoder never
/// reads outside the buffer window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    BufferEnded { field: Option<&'static str> },
    InvalidMessageType { expected: u64, found: u64 },
    InvalidProtocolDiscriminator { found: u64 },
    InvalidEnumValue { field: &'static str, value: u64 },
    InvalidValue { field: &'static str, value: u64 },
    TooManyElements { field: &'static str, max: usize, found: usize },
    UnexpectedIe { iei: u8 },
    InconsistentLength { field: &'static str, expected: usize, found: usize },
    MissingMandatoryIe { field: &'static str },
    UnsupportedSecurityHeader { found: u64 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::BufferEnded { field } => write!(f, "buffer ended while reading {}", field.unwrap_or("<unnamed>")),
            DecodeError::InvalidMessageType { expected, found } => write!(f, "invalid message type 0x{:02x}, expected 0x{:02x}", found, expected),
            DecodeError::InvalidProtocolDiscriminator { found } => write!(f, "invalid protocol discriminator {}", found),
            DecodeError::InvalidEnumValue { field, value } => write!(f, "invalid enum value {} for {}", value, field),
            DecodeError::InvalidValue { field, value } => write!(f, "invalid value {} for {}", value, field),
            DecodeError::TooManyElements { field, max, found } => write!(f, "{}: {} elements exceeds maximum {}", field, found, max),
            DecodeError::UnexpectedIe { iei } => write!(f, "unexpected IEI 0x{:02x}", iei),
            DecodeError::InconsistentLength { field, expected, found } => write!(f, "{}: inconsistent length, expected {} found {}", field, expected, found),
            DecodeError::MissingMandatoryIe { field } => write!(f, "missing mandatory IE {}", field),
            DecodeError::UnsupportedSecurityHeader { found } => write!(f, "unsupported security header type {}", found),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Failure while encoding: the caller supplied a value outside an IE's domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    ValueOutOfRange { field: &'static str, value: u64 },
    TooManyElements { field: &'static str, max: usize, found: usize },
    TooLong { field: &'static str, max: usize, found: usize },
    MissingField { field: &'static str },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::ValueOutOfRange { field, value } => write!(f, "value {} out of range for {}", value, field),
            EncodeError::TooManyElements { field, max, found } => write!(f, "{}: {} elements exceeds maximum {}", field, found, max),
            EncodeError::TooLong { field, max, found } => write!(f, "{}: length {} exceeds maximum {}", field, found, max),
            EncodeError::MissingField { field } => write!(f, "missing field {}", field),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Checks whether a message type value matches the expected value. If not, returns DecodeError::InvalidMessageType
#[macro_export]
macro_rules! expect_msg_type {
    ($value:expr, $expected:expr) => {{
        let raw_expected = $expected.into_raw();
        if $value == raw_expected {
            Ok(())
        } else {
            Err($crate::codec_error::DecodeError::InvalidMessageType {
                expected: raw_expected as u64,
                found: $value,
            })
        }
    }};
}

/// Checks whether a value matches an expected value. If not, returns DecodeError::InvalidValue
#[macro_export]
macro_rules! expect_value {
    ($value:ident, $expected:expr) => {
        $crate::expect_value!(@inner $value, $expected, stringify!($value))
    };
    ($value:expr, $expected:expr, $field:expr) => {
        $crate::expect_value!(@inner $value, $expected, $field)
    };

    (@inner $value:expr, $expected:expr, $field:expr) => {{
        let val = $value;
        if val == $expected {
            Ok(())
        } else {
            Err($crate::codec_error::DecodeError::InvalidValue {
                field: $field,
                value: val.into(),
            })
        }
    }};
}

/// Reads `bits` from the buffer into a local binding of the same name, propagating BufferEnded
#[macro_export]
macro_rules! let_field {
    ($buf:expr, $ident:ident, $bits:expr) => {
        let $ident = $buf.read_field($bits, stringify!($ident))?;
    };
}

/// Fails with EncodeError::ValueOutOfRange if `value` does not fit in `bits`
pub fn check_range(value: u64, bits: usize, field: &'static str) -> Result<(), EncodeError> {
    if bits < 64 && value >> bits != 0 {
        return Err(EncodeError::ValueOutOfRange { field, value });
    }
    Ok(())
}
