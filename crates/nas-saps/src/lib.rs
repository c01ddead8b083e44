#![allow(dead_code)]

/// Custom definitions for stack control
pub mod control;
pub mod core_network;
pub mod s1ap;
pub mod sapmsg;

pub use sapmsg::*;
