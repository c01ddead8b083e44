//! EMM and ESM information element and message codec (TS 24.301, TS 24.008)

#[macro_use]
mod macros;

pub mod common;
pub mod emm;
pub mod esm;
pub mod nas_message;

pub use nas_message::{decode_message, decode_unciphered, encode_message, parse_header, NasHeader, NasMessage, NasMessageType};
