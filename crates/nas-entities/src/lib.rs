#![allow(dead_code)]

pub mod collaborators;
pub mod entity_trait;
pub mod error;
pub mod messagerouter;
pub mod mme;
pub mod worker_pool;

// Re-export commonly used items from router
pub use entity_trait::NasEntityTrait;
pub use error::ProcedureError;
pub use messagerouter::{MessagePrio, MessageQueue, MessageRouter};
pub use worker_pool::MmeWorkerPool;
