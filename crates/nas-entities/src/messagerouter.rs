use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use nas_config::SharedConfig;
use nas_core::NasEntity;
use nas_saps::SapMsg;

use crate::NasEntityTrait;


#[derive(Default)]
pub enum MessagePrio {
    Immediate,
    #[default]
    Normal,
}

#[derive(Default)]
pub struct MessageQueue {
    messages: VecDeque<SapMsg>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, message: SapMsg) {
        self.messages.push_back(message);
    }

    pub fn push_prio(&mut self, message: SapMsg, prio: MessagePrio) {
        match prio {
            MessagePrio::Immediate => {
                // Insert at the front for immediate processing
                self.messages.push_front(message);
            }
            MessagePrio::Normal => {
                self.messages.push_back(message);
            }
        }
    }

    pub fn pop_front(&mut self) -> Option<SapMsg> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub struct MessageRouter {
    /// While currently unused by the MessageRouter, this may change in the future
    /// As such, we provide the MessageRouter with a copy of the SharedConfig
    _config: SharedConfig,
    entities: HashMap<NasEntity, Box<dyn NasEntityTrait>>,
    msg_queue: MessageQueue,

    /// Clock last passed to the entities
    now: Instant,
}


impl MessageRouter {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            entities: HashMap::new(),
            msg_queue: MessageQueue::new(),
            _config: config,
            now: Instant::now(),
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn register_entity(&mut self, entity: Box<dyn NasEntityTrait>) {
        let comp_type = entity.entity();
        tracing::debug!("register_entity {:?}", comp_type);
        self.entities.insert(comp_type, entity);
    }

    /// Returns a mut ref to a component of the requested type
    pub fn get_entity(&mut self, comp: NasEntity) -> Option<&mut dyn NasEntityTrait> {
        self.entities.get_mut(&comp).map(|entity| entity.as_mut())
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        tracing::debug!("submit_message {:?}: {:?} -> {:?} {}", message.get_sap(), message.get_source(), message.get_dest(), message.msg);
        self.msg_queue.push_back(message);
    }

    pub fn deliver_message(&mut self) {
        let Some(message) = self.msg_queue.pop_front() else {
            return;
        };

        tracing::trace!("deliver_message: got {:?}: {:?} -> {:?}", message.get_sap(), message.get_source(), message.get_dest());

        // Check if the destination entity registered and deliver if found
        let dest = *message.get_dest();
        if let Some(entity) = self.entities.get_mut(&dest) {
            entity.rx_prim(&mut self.msg_queue, message);
        } else {
            tracing::warn!("deliver_message: entity {:?} not found for {:?}: {:?} -> {:?}", dest, message.get_sap(), message.get_source(), message.get_dest());
        }
    }

    pub fn deliver_all_messages(&mut self) {
        while !self.msg_queue.is_empty() {
            self.deliver_message();
        }
    }

    pub fn get_msgqueue_len(&self) -> usize {
        self.msg_queue.len()
    }

    /// Advances the clock of all entities to `now` and delivers whatever that produced,
    /// typically timer expiries
    pub fn tick(&mut self, now: Instant) {
        self.now = now;
        for entity in self.entities.values_mut() {
            entity.tick(&mut self.msg_queue, now);
        }
        self.deliver_all_messages();
    }

    /// Earliest deadline over all registered entities
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entities.values().filter_map(|e| e.next_deadline()).min()
    }
}
