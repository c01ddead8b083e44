//! Keyed dispatch of MME events onto a fixed set of worker threads. Events of one
//! signalling connection always land on the same worker and are handled in arrival order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use nas_config::SharedConfig;
use nas_core::{Imsi, NasEntity};
use nas_saps::{SapMsg, SapMsgInner};

use crate::collaborators::{GtpcInterface, HssInterface};
use crate::mme::components::registry::UeContextRegistry;
use crate::mme::MmeNas;
use crate::{MessageQueue, MessageRouter, NasEntityTrait};

/// Wait used when no timer is armed
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Hands everything an MME worker addresses to `entity` over to the outbound channel
struct Forwarder {
    entity: NasEntity,
    outbound: Sender<SapMsg>,
}

impl NasEntityTrait for Forwarder {
    fn entity(&self) -> NasEntity {
        self.entity
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        if self.outbound.send(message).is_err() {
            tracing::warn!("outbound channel for {} closed, dropping message", self.entity);
        }
    }
}

#[derive(Hash)]
enum DispatchKey {
    Connection(u32),
    Subscriber(Imsi),
    Unkeyed,
}

pub struct MmeWorkerPool {
    registry: UeContextRegistry,
    senders: Vec<Sender<SapMsg>>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl MmeWorkerPool {
    /// Starts `workers` threads (from the config), each with its own procedure engine on a
    /// shared UE context registry. Messages for S1AP and GTP-C leave through `outbound`.
    pub fn new(
        config: SharedConfig,
        hss: Arc<dyn HssInterface>,
        gtpc: Arc<dyn GtpcInterface>,
        outbound: Sender<SapMsg>,
    ) -> io::Result<Self> {
        let registry = UeContextRegistry::new();
        let workers = config.config().workers.max(1);
        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for index in 0..workers {
            let (sender, receiver) = unbounded::<SapMsg>();
            let mut router = MessageRouter::new(config.clone());
            router.register_entity(Box::new(MmeNas::new(config.clone(), registry.clone(), hss.clone(), gtpc.clone())));
            router.register_entity(Box::new(Forwarder { entity: NasEntity::S1ap, outbound: outbound.clone() }));
            router.register_entity(Box::new(Forwarder { entity: NasEntity::Gtpc, outbound: outbound.clone() }));

            let handle = thread::Builder::new()
                .name(format!("mme-worker-{}", index))
                .spawn(move || run_worker(index, router, receiver))?;
            senders.push(sender);
            handles.push(handle);
        }
        tracing::info!("started {} MME workers", workers);
        Ok(Self { registry, senders, handles })
    }

    pub fn registry(&self) -> &UeContextRegistry {
        &self.registry
    }

    pub fn workers(&self) -> usize {
        self.senders.len()
    }

    pub fn submit(&self, message: SapMsg) {
        if self.senders.is_empty() {
            tracing::warn!("pool shut down, dropping {}", message.msg);
            return;
        }
        let index = self.worker_for(&message);
        if self.senders[index].send(message).is_err() {
            tracing::warn!("worker {} gone, message dropped", index);
        }
    }

    fn dispatch_key(&self, message: &SapMsg) -> DispatchKey {
        if let Some(id) = message.mme_ue_s1ap_id() {
            return DispatchKey::Connection(id);
        }
        let imsi = match &message.msg {
            SapMsgInner::GtpcDownlinkDataNotification(m) => m.imsi,
            SapMsgInner::HssCancelLocation(m) => m.imsi,
            _ => return DispatchKey::Unkeyed,
        };
        // A connected UE's core network events queue up behind its S1AP events
        match self.registry.ue_for_imsi(imsi).and_then(|ue| self.registry.s1ap_id_of(ue)) {
            Some(id) => DispatchKey::Connection(id),
            None => DispatchKey::Subscriber(imsi),
        }
    }

    fn worker_for(&self, message: &SapMsg) -> usize {
        let mut hasher = DefaultHasher::new();
        self.dispatch_key(message).hash(&mut hasher);
        (hasher.finish() % self.senders.len() as u64) as usize
    }

    /// Closes the worker queues and waits for the threads to drain them
    pub fn shutdown(&mut self) {
        self.senders.clear();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("MME worker panicked");
            }
        }
    }
}

impl Drop for MmeWorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(index: usize, mut router: MessageRouter, receiver: Receiver<SapMsg>) {
    tracing::debug!("mme-worker-{} running", index);
    loop {
        let timeout = router
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL);
        match receiver.recv_timeout(timeout) {
            Ok(message) => {
                router.submit_message(message);
                while let Ok(message) = receiver.try_recv() {
                    router.submit_message(message);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        // Advances the engine clock, fires due timers and delivers everything queued
        router.tick(Instant::now());
    }
    tracing::debug!("mme-worker-{} stopped", index);
}
