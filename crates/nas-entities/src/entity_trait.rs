use std::time::Instant;

use as_any::AsAny;
use nas_config::SharedConfig;
use nas_core::NasEntity;
use nas_saps::SapMsg;

use crate::MessageQueue;

/// Trait for NAS entities
/// Used by MessageRouter for passing messages between entities
pub trait NasEntityTrait: Send + AsAny {
    /// Returns the entity type identifier
    fn entity(&self) -> NasEntity;

    /// Handle incoming SAP primitive
    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg);

    /// Update configuration (optional)
    fn set_config(&mut self, _config: SharedConfig) {}

    /// Called whenever the router's clock advances. Entities holding timers enqueue
    /// expiry events here.
    fn tick(&mut self, _queue: &mut MessageQueue, _now: Instant) {}

    /// Earliest instant at which `tick` has work to do
    fn next_deadline(&self) -> Option<Instant> {
        None
    }
}
