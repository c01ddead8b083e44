use core::fmt;

use nas_core::{DecodeError, Ebi, EncodeError};
use nas_pdus::NasMessageType;
use nas_security::SecurityError;

use crate::collaborators::CollaboratorError;
use crate::mme::components::ue_context::EmmState;

/// Failure of a NAS procedure step. The engine decides per variant whether the UE
/// sees a reject, a status message or nothing at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureError {
    /// Message not expected in the current EMM state or with the current pending procedure
    UnexpectedMessage { state: EmmState, message: NasMessageType },
    /// No UE NAS context for the identifiers of the event
    UnknownUe,
    /// The UE has no signalling connection to send on
    NotConnected,
    Decode(DecodeError),
    Encode(EncodeError),
    Security(SecurityError),
    Collaborator(CollaboratorError),
    InvalidBearer { ebi: Ebi },
}

impl fmt::Display for ProcedureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcedureError::UnexpectedMessage { state, message } => write!(f, "unexpected {} in state {:?}", message, state),
            ProcedureError::UnknownUe => write!(f, "unknown UE"),
            ProcedureError::NotConnected => write!(f, "UE not connected"),
            ProcedureError::Decode(e) => write!(f, "decode error: {}", e),
            ProcedureError::Encode(e) => write!(f, "encode error: {}", e),
            ProcedureError::Security(e) => write!(f, "security error: {}", e),
            ProcedureError::Collaborator(e) => write!(f, "collaborator error: {}", e),
            ProcedureError::InvalidBearer { ebi } => write!(f, "invalid EPS bearer {}", ebi),
        }
    }
}

impl std::error::Error for ProcedureError {}

impl From<DecodeError> for ProcedureError {
    fn from(e: DecodeError) -> Self {
        ProcedureError::Decode(e)
    }
}

impl From<EncodeError> for ProcedureError {
    fn from(e: EncodeError) -> Self {
        ProcedureError::Encode(e)
    }
}

impl From<SecurityError> for ProcedureError {
    fn from(e: SecurityError) -> Self {
        ProcedureError::Security(e)
    }
}

impl From<CollaboratorError> for ProcedureError {
    fn from(e: CollaboratorError) -> Self {
        ProcedureError::Collaborator(e)
    }
}
