//! NAS security for the MME: EPS security context, key derivation (TS 33.401 Annex A),
//! the EIA/EEA algorithms and the protected NAS message envelope (TS 24.301 9.1, 4.4).

pub mod algorithms;
pub mod context;
pub mod envelope;
pub mod error;
pub mod kdf;

pub use context::{AuthVector, NasCount, SecurityContext};
pub use envelope::{build_service_request, protect, unprotect, verify_service_request, Unprotected};
pub use error::SecurityError;

/// NAS signalling always uses bearer id 0 as EEA/EIA BEARER input
pub const NAS_BEARER: u8 = 0;
