#![allow(dead_code)]

pub mod component_test;
pub mod mocks;
pub mod sink;
pub mod ue_sim;

pub use component_test::{ComponentTest, default_test_config, downlink_pdus, releases};
pub use mocks::{GtpcCall, MockGtpc, MockHss};
pub use sink::Sink;
pub use ue_sim::UeSim;
