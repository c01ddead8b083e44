//! Core utilities for the NAS stack
//!
//! This crate provides fundamental types and utilities used across the NAS crates:
//! - BitBuffer for bit-level IE manipulation
//! - Decode/encode error types and IE format helpers
//! - Subscriber and S1AP identifiers
//! - Common macros and debug utilities

pub mod bitbuffer;
pub mod codec_error;
pub mod debug;
pub mod direction;
pub mod identities;
pub mod nas_common;
pub mod nas_entities;
pub mod typed_ies;

// Re-export commonly used items
pub use bitbuffer::BitBuffer;
pub use codec_error::{DecodeError, EncodeError};
pub use direction::Direction;
pub use identities::*;
pub use nas_common::*;
pub use nas_entities::NasEntity;
pub use typed_ies::IePolicy;

/// Stack version, including git revision when built from a checkout
pub const STACK_VERSION: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"),
    "-",
    git_version::git_version!(args = ["--always", "--dirty=-modified"], fallback = "unknown")
);

/// EPS bearer identity, 5..=15 for allocated bearers
pub type Ebi = u8;

/// Local handle of a UE NAS context, stable for the lifetime of the context
pub type UeId = u32;
