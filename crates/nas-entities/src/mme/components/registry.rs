use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nas_core::{Imsi, MTmsi, UeId};

use super::ue_context::UeNasContext;

pub type UeHandle = Arc<Mutex<UeNasContext>>;

/// Locks a UE context. A worker that panicked while holding the lock leaves the context
/// in whatever state it reached; processing continues with it.
pub fn lock_ue(handle: &UeHandle) -> MutexGuard<'_, UeNasContext> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct RegistryInner {
    contexts: HashMap<UeId, UeHandle>,
    by_s1ap: HashMap<u32, UeId>,
    s1ap_of: HashMap<UeId, u32>,
    by_imsi: HashMap<Imsi, UeId>,
    by_m_tmsi: HashMap<MTmsi, UeId>,
}

impl RegistryInner {
    fn lookup(&self, ue: Option<&UeId>) -> Option<UeHandle> {
        ue.and_then(|id| self.contexts.get(id)).cloned()
    }
}

/// Shared map of all UE NAS contexts with lookups by MME-UE-S1AP-ID, IMSI and M-TMSI.
/// Cloning gives another handle onto the same registry.
#[derive(Clone, Default)]
pub struct UeContextRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl UeContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, ctx: UeNasContext) -> UeHandle {
        let id = ctx.id;
        let handle = Arc::new(Mutex::new(ctx));
        self.inner().contexts.insert(id, handle.clone());
        tracing::debug!("registry: inserted ue {}", id);
        handle
    }

    pub fn get(&self, ue: UeId) -> Option<UeHandle> {
        self.inner().contexts.get(&ue).cloned()
    }

    pub fn find_by_s1ap(&self, mme_ue_s1ap_id: u32) -> Option<UeHandle> {
        let inner = self.inner();
        inner.lookup(inner.by_s1ap.get(&mme_ue_s1ap_id))
    }

    pub fn find_by_imsi(&self, imsi: Imsi) -> Option<UeHandle> {
        let inner = self.inner();
        inner.lookup(inner.by_imsi.get(&imsi))
    }

    pub fn find_by_m_tmsi(&self, m_tmsi: MTmsi) -> Option<UeHandle> {
        let inner = self.inner();
        inner.lookup(inner.by_m_tmsi.get(&m_tmsi))
    }

    pub fn ue_for_imsi(&self, imsi: Imsi) -> Option<UeId> {
        self.inner().by_imsi.get(&imsi).copied()
    }

    /// MME-UE-S1AP-ID of the UE's current connection
    pub fn s1ap_id_of(&self, ue: UeId) -> Option<u32> {
        self.inner().s1ap_of.get(&ue).copied()
    }

    /// Associates a connection with the UE, replacing any previous one
    pub fn bind_s1ap(&self, mme_ue_s1ap_id: u32, ue: UeId) {
        let mut inner = self.inner();
        if let Some(old) = inner.s1ap_of.insert(ue, mme_ue_s1ap_id) {
            if old != mme_ue_s1ap_id {
                inner.by_s1ap.remove(&old);
            }
        }
        if let Some(prev_ue) = inner.by_s1ap.insert(mme_ue_s1ap_id, ue) {
            if prev_ue != ue {
                inner.s1ap_of.remove(&prev_ue);
            }
        }
    }

    pub fn unbind_s1ap(&self, ue: UeId) {
        let mut inner = self.inner();
        if let Some(id) = inner.s1ap_of.remove(&ue) {
            inner.by_s1ap.remove(&id);
        }
    }

    pub fn bind_imsi(&self, imsi: Imsi, ue: UeId) {
        self.inner().by_imsi.insert(imsi, ue);
    }

    /// Indexes the UE under a newly allocated M-TMSI, dropping its previous one
    pub fn bind_m_tmsi(&self, m_tmsi: MTmsi, old: Option<MTmsi>, ue: UeId) {
        let mut inner = self.inner();
        if let Some(old) = old {
            if inner.by_m_tmsi.get(&old) == Some(&ue) {
                inner.by_m_tmsi.remove(&old);
            }
        }
        inner.by_m_tmsi.insert(m_tmsi, ue);
    }

    /// Removes the context and every index entry pointing at it
    pub fn remove(&self, ue: UeId) -> Option<UeHandle> {
        let mut inner = self.inner();
        let handle = inner.contexts.remove(&ue)?;
        if let Some(id) = inner.s1ap_of.remove(&ue) {
            inner.by_s1ap.remove(&id);
        }
        inner.by_imsi.retain(|_, v| *v != ue);
        inner.by_m_tmsi.retain(|_, v| *v != ue);
        tracing::debug!("registry: removed ue {}", ue);
        Some(handle)
    }

    pub fn len(&self) -> usize {
        self.inner().contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
