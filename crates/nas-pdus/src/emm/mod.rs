//! EPS mobility management (protocol discriminator 7)

pub mod enums;
pub mod fields;
pub mod pdus;
