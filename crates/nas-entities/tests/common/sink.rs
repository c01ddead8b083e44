use nas_core::NasEntity;
use nas_entities::{MessageQueue, NasEntityTrait};
use nas_saps::SapMsg;

/// A NAS entity sink for testing purposes
/// Collects all received SapMsg messages for later inspection
pub struct Sink {
    component: NasEntity,
    msgqueue: Vec<SapMsg>,
}

impl Sink {
    pub fn new(component: NasEntity) -> Self {
        Self {
            component,
            msgqueue: vec![],
        }
    }

    pub fn take_msgqueue(&mut self) -> Vec<SapMsg> {
        std::mem::take(&mut self.msgqueue)
    }
}

impl NasEntityTrait for Sink {

    fn entity(&self) -> NasEntity {
        self.component
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {

        tracing::debug!("rx_prim: {:?}", message);

        self.msgqueue.push(message);
    }
}
