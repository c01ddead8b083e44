//! Interfaces to the HSS and the GTP-C side of the serving gateway. Both are called
//! synchronously from the procedure engine and must be shareable between workers.

use core::fmt;
use std::net::Ipv4Addr;

use nas_core::{Ebi, Fteid, Imsi};

pub use nas_security::AuthVector;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The subscriber is not provisioned
    UnknownSubscriber { imsi: Imsi },
    /// No answer from the peer
    Unavailable { service: &'static str },
    /// The peer answered with a failure
    Rejected { service: &'static str, cause: String },
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorError::UnknownSubscriber { imsi } => write!(f, "unknown subscriber {}", imsi),
            CollaboratorError::Unavailable { service } => write!(f, "{} unavailable", service),
            CollaboratorError::Rejected { service, cause } => write!(f, "{} rejected request: {}", service, cause),
        }
    }
}

impl std::error::Error for CollaboratorError {}

/// Subscription data returned by update location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionData {
    /// QCI of the default bearer
    pub qci: u8,
}

/// Result of a create session exchange with the serving gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub ue_ipv4: Ipv4Addr,
    /// Gateway user plane endpoint for the default bearer
    pub sgw_s1u: Fteid,
    /// Gateway control plane TEID of the session
    pub sgw_ctrl_teid: u32,
}

pub trait HssInterface: Send + Sync {
    fn get_authentication_vector(&self, imsi: Imsi) -> Result<AuthVector, CollaboratorError>;

    /// Hands the AUTS of a synch failure to the HSS so that the next vector uses a
    /// resynchronised SQN
    fn resync(&self, imsi: Imsi, rand: &[u8; 16], auts: &[u8; 14]) -> Result<(), CollaboratorError>;

    fn update_location(&self, imsi: Imsi) -> Result<SubscriptionData, CollaboratorError>;
}

pub trait GtpcInterface: Send + Sync {
    fn create_session(&self, imsi: Imsi, ebi: Ebi, apn: &str) -> Result<SessionInfo, CollaboratorError>;

    fn modify_bearer(&self, imsi: Imsi, ebi: Ebi, enb_s1u: Fteid) -> Result<(), CollaboratorError>;

    fn release_access_bearers(&self, imsi: Imsi) -> Result<(), CollaboratorError>;

    fn delete_session(&self, imsi: Imsi) -> Result<(), CollaboratorError>;
}
