//! UE-initiated (TS 24.301 5.5.2.2) and network-initiated (5.5.2.3) detach

use nas_core::Direction;
use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::common::mobile_identity::EpsMobileIdentity;
use nas_pdus::emm::enums::detach_type::NetworkDetachType;
use nas_pdus::emm::pdus::detach_request::{DetachRequestUeOriginating, DetachRequestUeTerminated};
use nas_pdus::emm::pdus::header_only::DetachAccept;
use nas_pdus::NasMessageType;
use nas_saps::control::NasTimer;
use nas_saps::core_network::HssCancelLocation;
use nas_saps::s1ap::{ReleaseCause, S1apInitialUeMessage};
use nas_security::unprotect;

use crate::error::ProcedureError;
use crate::mme::components::registry::lock_ue;
use crate::mme::components::ue_context::{EcmState, EmmState, PendingProcedure, UeNasContext};
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    /// Detach request opening a new connection, typically from an idle UE switching off
    pub(crate) fn rx_initial_detach_request(
        &mut self,
        queue: &mut MessageQueue,
        prim: &S1apInitialUeMessage,
        header: SecurityHeaderType,
        req: DetachRequestUeOriginating,
    ) -> Result<(), ProcedureError> {
        let handle = match &req.eps_mobile_id {
            EpsMobileIdentity::Guti(guti) if self.is_own_guti(guti) => self.registry.find_by_m_tmsi(guti.m_tmsi),
            EpsMobileIdentity::Imsi(imsi) => self.registry.find_by_imsi(*imsi),
            _ => None,
        };
        let Some(handle) = handle else {
            tracing::info!("{}: detach of unknown UE", prim.ids);
            if !req.switch_off {
                self.send_to_connection(queue, prim.ids, DetachAccept.into())?;
            }
            self.release_ids(queue, prim.ids, ReleaseCause::Detach);
            return Ok(());
        };

        let mut ue = lock_ue(&handle);
        self.connect(&mut ue, prim.ids);
        // Integrity is checked to keep the uplink COUNT in step; a detach is honoured either way
        if header.is_protected() {
            if let Some(sec) = ue.security.as_mut() {
                if let Err(e) = unprotect(sec, &prim.nas_pdu, Direction::Uplink) {
                    tracing::info!(ue = ue.id, "detach request failed integrity check: {}", e);
                }
            }
        }
        self.detach_ue_originating(queue, &mut ue, req)
    }

    pub(crate) fn detach_ue_originating(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        req: DetachRequestUeOriginating,
    ) -> Result<(), ProcedureError> {
        tracing::info!(ue = ue.id, "detach ({:?}, switch off {})", req.detach_type, req.switch_off);
        ue.stop_all_timers(false);
        ue.procedure = None;
        self.delete_session(ue);

        if !req.switch_off {
            let header = Self::downlink_protection(ue);
            if let Err(e) = self.send_nas(queue, ue, DetachAccept.into(), header) {
                tracing::warn!(ue = ue.id, "failed to send detach accept: {}", e);
            }
        }
        self.release_connection(queue, ue, ReleaseCause::Detach);
        self.forget_ue(ue);
        Ok(())
    }

    /// The HSS withdrew the subscriber
    pub(crate) fn rx_cancel_location(&mut self, queue: &mut MessageQueue, prim: HssCancelLocation) -> Result<(), ProcedureError> {
        let handle = self.registry.find_by_imsi(prim.imsi).ok_or(ProcedureError::UnknownUe)?;
        let mut ue = lock_ue(&handle);
        tracing::info!(ue = ue.id, "cancel location for {}", prim.imsi);

        if ue.ecm.state == EcmState::Idle || ue.emm.state != EmmState::Registered {
            // Nothing to signal to an unreachable or unregistered UE
            self.complete_network_detach(queue, &mut ue);
            return Ok(());
        }

        ue.stop_all_timers(false);
        ue.procedure = Some(PendingProcedure::NetworkDetach);
        ue.emm.state = EmmState::DeregisteredInitiated;
        let req = DetachRequestUeTerminated { detach_type: NetworkDetachType::ReAttachNotRequired, emm_cause: None };
        self.send_supervised(queue, &mut ue, req.into(), SecurityHeaderType::IntegrityProtectedCiphered, NasTimer::T3422)
    }

    pub(crate) fn rx_detach_accept(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext) -> Result<(), ProcedureError> {
        if ue.emm.state != EmmState::DeregisteredInitiated {
            return Err(Self::unexpected(ue, NasMessageType::DetachAccept));
        }
        ue.stop_timer(NasTimer::T3422);
        self.complete_network_detach(queue, ue);
        Ok(())
    }

    /// Ends a network detach, on detach accept or once T3422 gave up
    pub(crate) fn complete_network_detach(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext) {
        tracing::info!(ue = ue.id, "network detach complete");
        ue.stop_all_timers(false);
        ue.procedure = None;
        self.delete_session(ue);
        self.release_connection(queue, ue, ReleaseCause::Detach);
        self.forget_ue(ue);
    }

    /// Marks the UE deregistered and drops its context from the registry
    fn forget_ue(&self, ue: &mut UeNasContext) {
        ue.emm.state = EmmState::Deregistered;
        ue.ecm.state = EcmState::Idle;
        ue.ecm.ids = None;
        self.registry.remove(ue.id);
    }
}
