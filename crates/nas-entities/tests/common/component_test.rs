use std::sync::Arc;
use std::time::{Duration, Instant};

use nas_config::{MmeConfig, SharedConfig};
use nas_core::{Imsi, NasEntity};
use nas_entities::mme::components::registry::{lock_ue, UeContextRegistry};
use nas_entities::mme::components::ue_context::{EcmState, EmmState};
use nas_entities::mme::MmeNas;
use nas_entities::{MessageRouter, NasEntityTrait};
use nas_saps::s1ap::ReleaseCause;
use nas_saps::{SapMsg, SapMsgInner};

use super::mocks::{MockGtpc, MockHss};
use super::sink::Sink;

/// Creates a default config for testing. It can still be modified as needed
/// before passing it to the ComponentTest constructor
pub fn default_test_config() -> MmeConfig {
    let mut cfg = MmeConfig::new("001", "01", 7);
    cfg.workers = 1;
    cfg
}

/// Infrastructure for testing the MME procedure engine
/// Runs one MmeNas against mock collaborators, with sinks standing in for S1AP and GTP-C
pub struct ComponentTest {
    pub config: SharedConfig,
    pub router: MessageRouter,
    pub sinks: Vec<NasEntity>,
    pub registry: UeContextRegistry,
    pub hss: Arc<MockHss>,
    pub gtpc: Arc<MockGtpc>,
    now: Instant,
}

impl ComponentTest {

    pub fn new(config: MmeConfig) -> Self {
        let shared_config = SharedConfig::from_config(config).expect("valid test config");
        let mut router = MessageRouter::new(shared_config.clone());

        let registry = UeContextRegistry::new();
        let hss = Arc::new(MockHss::new());
        let gtpc = Arc::new(MockGtpc::new());
        let mme = MmeNas::new(shared_config.clone(), registry.clone(), hss.clone(), gtpc.clone());
        router.register_entity(Box::new(mme));

        // Align the engine clock with the one the test advances
        let now = Instant::now();
        router.tick(now);

        let mut test = Self {
            config: shared_config,
            router,
            sinks: vec![],
            registry,
            hss,
            gtpc,
            now,
        };
        test.create_sinks(vec![NasEntity::S1ap, NasEntity::Gtpc]);
        test
    }

    fn create_sinks(&mut self, sinks: Vec<NasEntity>) {
        for sink in sinks.iter() {
            assert!(!self.sinks.contains(sink), "Sink already exists: {:?}", sink);
            assert!(self.router.get_entity(*sink).is_none(), "Sink already registered as entity: {:?}", sink);

            self.sinks.push(*sink);
            let sink = Sink::new(*sink);
            self.router.register_entity(Box::new(sink));
        }
    }

    pub fn register_entity<T: 'static + NasEntityTrait>(&mut self, entity: T) {
        self.router.register_entity(Box::new(entity));
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        self.router.submit_message(message);
    }

    pub fn deliver_all_messages(&mut self) {
        self.router.deliver_all_messages();
    }

    /// Submits one message, runs the stack until idle and returns what reached the sinks
    pub fn process(&mut self, message: SapMsg) -> Vec<SapMsg> {
        self.submit_message(message);
        self.deliver_all_messages();
        self.dump_sinks()
    }

    /// Moves the clock forward, firing whatever timers fell due
    pub fn advance(&mut self, duration: Duration) -> Vec<SapMsg> {
        self.now += duration;
        self.router.tick(self.now);
        self.dump_sinks()
    }

    pub fn emm_state(&self, imsi: Imsi) -> Option<EmmState> {
        self.registry.find_by_imsi(imsi).map(|handle| {
            let ue = lock_ue(&handle);
            ue.emm.state
        })
    }

    pub fn ecm_state(&self, imsi: Imsi) -> Option<EcmState> {
        self.registry.find_by_imsi(imsi).map(|handle| {
            let ue = lock_ue(&handle);
            ue.ecm.state
        })
    }

    pub fn dump_sinks(&mut self) -> Vec<SapMsg> {
        let mut msgs = vec![];
        for sink in self.sinks.iter() {
            if let Some(component) = self.router.get_entity(*sink) {
                if let Some(sink) = component.as_any_mut().downcast_mut::<Sink>() {
                    let mut sink_msgs = sink.take_msgqueue();
                    msgs.append(&mut sink_msgs);
                }
            }
        }
        msgs
    }
}

/// NAS PDUs sent towards the UE, in order, whether in a downlink transport or piggybacked
/// on a context setup
pub fn downlink_pdus(msgs: &[SapMsg]) -> Vec<Vec<u8>> {
    msgs.iter()
        .filter_map(|m| match &m.msg {
            SapMsgInner::S1apDownlinkNasTransport(p) => Some(p.nas_pdu.clone()),
            SapMsgInner::S1apInitialContextSetupRequest(p) => p.nas_pdu.clone(),
            _ => None,
        })
        .collect()
}

/// Causes of the release commands in `msgs`
pub fn releases(msgs: &[SapMsg]) -> Vec<ReleaseCause> {
    msgs.iter()
        .filter_map(|m| match &m.msg {
            SapMsgInner::S1apUeContextReleaseCommand(p) => Some(p.cause),
            _ => None,
        })
        .collect()
}
