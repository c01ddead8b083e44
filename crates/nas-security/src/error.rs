use core::fmt;

use nas_core::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    /// Received MAC does not match the locally computed one
    MacMismatch,
    /// Received COUNT does not exceed the last accepted COUNT for that direction
    ReplayedOrStaleCount { count: u32, last: u32 },
    /// Algorithm is a valid wire value but not implemented
    UnsupportedAlgorithm { kind: &'static str, id: u8 },
    /// No algorithm common to the UE capability and the network preference list
    NoCommonAlgorithm { kind: &'static str },
    /// Operation needs a security context that has not been established
    NoSecurityContext,
    /// PDU too short to carry a security header
    Truncated { len: usize },
    Decode(DecodeError),
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityError::MacMismatch => write!(f, "MAC mismatch"),
            SecurityError::ReplayedOrStaleCount { count, last } => {
                write!(f, "replayed or stale NAS COUNT {} (last accepted {})", count, last)
            }
            SecurityError::UnsupportedAlgorithm { kind, id } => write!(f, "unsupported {} algorithm {}", kind, id),
            SecurityError::NoCommonAlgorithm { kind } => write!(f, "no common {} algorithm", kind),
            SecurityError::NoSecurityContext => write!(f, "no security context"),
            SecurityError::Truncated { len } => write!(f, "protected PDU truncated at {} bytes", len),
            SecurityError::Decode(e) => write!(f, "decode error: {}", e),
        }
    }
}

impl std::error::Error for SecurityError {}

impl From<DecodeError> for SecurityError {
    fn from(e: DecodeError) -> Self {
        SecurityError::Decode(e)
    }
}
