use std::sync::Arc;
use std::time::{Duration, Instant};

use nas_config::SharedConfig;
use nas_core::{Direction, IePolicy, NasEntity, S1apUeIds, Sap};
use nas_pdus::common::header::{ProtocolDiscriminator, SecurityHeaderType};
use nas_pdus::common::plmn::PlmnId;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::nas_message::strip_security_header;
use nas_pdus::{encode_message, NasMessage, NasMessageType};
use nas_saps::control::{MmeTimerExpiry, NasTimer};
use nas_saps::s1ap::{ReleaseCause, S1apDownlinkNasTransport, S1apInitialUeMessage, S1apUeContextReleaseCommand, S1apUplinkNasTransport};
use nas_saps::{SapMsg, SapMsgInner};
use nas_security::{protect, unprotect, SecurityError, Unprotected};

use crate::collaborators::{GtpcInterface, HssInterface};
use crate::error::ProcedureError;
use crate::mme::components::registry::{lock_ue, UeContextRegistry, UeHandle};
use crate::mme::components::timers::TimerQueue;
use crate::mme::components::ue_context::{EcmState, EmmState, PendingProcedure, Retransmit, UeNasContext};
use crate::{MessageQueue, NasEntityTrait};

/// The MME NAS procedure engine. One instance runs per worker; all instances share the
/// UE context registry and the collaborators.
pub struct MmeNas {
    pub(crate) config: SharedConfig,
    pub(crate) registry: UeContextRegistry,
    pub(crate) hss: Arc<dyn HssInterface>,
    pub(crate) gtpc: Arc<dyn GtpcInterface>,
    pub(crate) plmn: PlmnId,
    pub(crate) timers: TimerQueue,
    /// Clock of the last tick
    pub(crate) now: Instant,
}

impl MmeNas {
    pub fn new(config: SharedConfig, registry: UeContextRegistry, hss: Arc<dyn HssInterface>, gtpc: Arc<dyn GtpcInterface>) -> Self {
        let cfg = config.config();
        // SharedConfig only exists for validated identities
        let plmn = PlmnId::from_digits(&cfg.network.mcc_digits(), &cfg.network.mnc_digits())
            .unwrap_or_else(|| unreachable!("validated PLMN {}{}", cfg.network.mcc, cfg.network.mnc));
        Self {
            config,
            registry,
            hss,
            gtpc,
            plmn,
            timers: TimerQueue::new(),
            now: Instant::now(),
        }
    }

    pub fn registry(&self) -> &UeContextRegistry {
        &self.registry
    }

    pub(crate) fn timer_duration(&self, timer: NasTimer) -> Duration {
        let t = &self.config.config().timers;
        match timer {
            NasTimer::T3413 => t.t3413,
            NasTimer::T3422 => t.t3422,
            NasTimer::T3450 => t.t3450,
            NasTimer::T3460 => t.t3460,
            NasTimer::T3470 => t.t3470,
            NasTimer::T3489 => t.t3489,
        }
    }

    /// Allocates a fresh, empty UE context
    pub(crate) fn new_context(&self) -> UeHandle {
        let id = self.config.state_write().alloc_ue_id();
        self.registry.insert(UeNasContext::new(id))
    }

    /// Attaches the UE to the signalling connection `ids`
    pub(crate) fn connect(&self, ue: &mut UeNasContext, ids: S1apUeIds) {
        if let Some(old) = ue.ecm.ids {
            if old != ids {
                tracing::debug!(ue = ue.id, "connection {} replaces {}", ids, old);
            }
        }
        ue.ecm.ids = Some(ids);
        ue.ecm.state = EcmState::Connected;
        ue.ecm.established_initially = false;
        self.registry.bind_s1ap(ids.mme_ue_s1ap_id, ue.id);
    }

    /// Header type for a downlink message outside security mode control. Messages go
    /// protected once a context is in use and no procedure is still negotiating one.
    pub(crate) fn downlink_protection(ue: &UeNasContext) -> SecurityHeaderType {
        match (&ue.security, &ue.procedure) {
            (Some(_), None)
            | (Some(_), Some(PendingProcedure::EsmInformation))
            | (Some(_), Some(PendingProcedure::AttachAccept))
            | (Some(_), Some(PendingProcedure::NetworkDetach)) => SecurityHeaderType::IntegrityProtectedCiphered,
            _ => SecurityHeaderType::PlainNas,
        }
    }

    /// Applies the envelope for `header`. New-context header types use the context under
    /// negotiation in security mode control.
    pub(crate) fn protect_for(ue: &mut UeNasContext, plain: &[u8], header: SecurityHeaderType) -> Result<Vec<u8>, ProcedureError> {
        match header {
            SecurityHeaderType::PlainNas => Ok(plain.to_vec()),
            SecurityHeaderType::IntegrityProtectedNewContext | SecurityHeaderType::IntegrityProtectedCipheredNewContext => {
                let Some(PendingProcedure::SecurityMode { new_ctx }) = ue.procedure.as_mut() else {
                    return Err(SecurityError::NoSecurityContext.into());
                };
                Ok(protect(new_ctx, plain, header, Direction::Downlink)?)
            }
            _ => {
                let sec = ue.security.as_mut().ok_or(SecurityError::NoSecurityContext)?;
                Ok(protect(sec, plain, header, Direction::Downlink)?)
            }
        }
    }

    pub(crate) fn send_downlink(&self, queue: &mut MessageQueue, ids: S1apUeIds, nas_pdu: Vec<u8>) {
        let msg = SapMsg::new(
            Sap::S1apNas,
            NasEntity::Mme,
            NasEntity::S1ap,
            SapMsgInner::S1apDownlinkNasTransport(S1apDownlinkNasTransport { ids, nas_pdu }),
        );
        queue.push_back(msg);
    }

    /// Sends a plain message on a connection that has no UE context behind it
    pub(crate) fn send_to_connection(&self, queue: &mut MessageQueue, ids: S1apUeIds, msg: NasMessage) -> Result<(), ProcedureError> {
        tracing::debug!("-> {} {:?}", ids, msg);
        let pdu = encode_message(&msg)?;
        self.send_downlink(queue, ids, pdu);
        Ok(())
    }

    pub(crate) fn send_plain(
        &self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        plain: &[u8],
        header: SecurityHeaderType,
    ) -> Result<(), ProcedureError> {
        let ids = ue.ecm.ids.ok_or(ProcedureError::NotConnected)?;
        let pdu = Self::protect_for(ue, plain, header)?;
        self.send_downlink(queue, ids, pdu);
        Ok(())
    }

    /// Encodes, protects and sends a message to the UE. Returns the plain encoding.
    pub(crate) fn send_nas(
        &self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: NasMessage,
        header: SecurityHeaderType,
    ) -> Result<Vec<u8>, ProcedureError> {
        tracing::debug!(ue = ue.id, "-> {:?}", msg);
        let plain = encode_message(&msg)?;
        self.send_plain(queue, ue, &plain, header)?;
        Ok(plain)
    }

    /// Sends a message and supervises the answer with `timer`
    pub(crate) fn send_supervised(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: NasMessage,
        header: SecurityHeaderType,
        timer: NasTimer,
    ) -> Result<(), ProcedureError> {
        let plain = self.send_nas(queue, ue, msg, header)?;
        self.start_timer(ue, timer, Retransmit::Nas { plain, header });
        Ok(())
    }

    pub(crate) fn start_timer(&mut self, ue: &mut UeNasContext, timer: NasTimer, retransmit: Retransmit) {
        let generation = ue.arm_timer(timer, retransmit);
        let deadline = self.now + self.timer_duration(timer);
        self.timers.schedule(deadline, ue.id, timer, generation);
    }

    /// Asks S1AP to release the UE's signalling connection. ECM state follows once the
    /// release is confirmed.
    pub(crate) fn release_connection(&self, queue: &mut MessageQueue, ue: &UeNasContext, cause: ReleaseCause) {
        match ue.ecm.ids {
            Some(ids) => self.release_ids(queue, ids, cause),
            None => tracing::debug!(ue = ue.id, "no connection to release"),
        }
    }

    pub(crate) fn release_ids(&self, queue: &mut MessageQueue, ids: S1apUeIds, cause: ReleaseCause) {
        tracing::debug!("-> {} release ({:?})", ids, cause);
        let msg = SapMsg::new(
            Sap::S1apNas,
            NasEntity::Mme,
            NasEntity::S1ap,
            SapMsgInner::S1apUeContextReleaseCommand(S1apUeContextReleaseCommand { ids, cause }),
        );
        queue.push_back(msg);
    }

    /// Gives up on the running procedure: the UE ends up deregistered and its connection
    /// is released
    pub(crate) fn abort_procedure(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext, cause: ReleaseCause) {
        let name = ue.procedure.as_ref().map(PendingProcedure::name).unwrap_or("none");
        tracing::warn!(ue = ue.id, "aborting procedure {} in {:?}", name, ue.emm.state);
        ue.procedure = None;
        ue.stop_all_timers(true);
        self.delete_session(ue);
        ue.emm.state = EmmState::Deregistered;
        self.release_connection(queue, ue, cause);
    }

    pub(crate) fn unexpected(ue: &UeNasContext, message: NasMessageType) -> ProcedureError {
        ProcedureError::UnexpectedMessage { state: ue.emm.state, message }
    }

    fn rx_uplink_nas_transport(&mut self, queue: &mut MessageQueue, prim: S1apUplinkNasTransport) -> Result<(), ProcedureError> {
        let handle = self.registry.find_by_s1ap(prim.ids.mme_ue_s1ap_id).ok_or(ProcedureError::UnknownUe)?;
        let mut ue = lock_ue(&handle);
        self.rx_nas_pdu(queue, &mut ue, &prim.nas_pdu)
    }

    /// Removes the envelope of an uplink PDU. While security mode control runs, protected
    /// PDUs are checked against the context under negotiation.
    fn remove_envelope(ue: &mut UeNasContext, pdu: &[u8]) -> Result<Unprotected, ProcedureError> {
        let first = *pdu.first().ok_or(SecurityError::Truncated { len: 0 })?;
        let plain_header = first >> 4 == SecurityHeaderType::PlainNas.into_raw() as u8;
        if plain_header || first & 0x0F == ProtocolDiscriminator::EpsSessionManagement.into_raw() as u8 {
            return Ok(Unprotected { header_type: SecurityHeaderType::PlainNas, count: None, plain: pdu.to_vec() });
        }
        if let Some(PendingProcedure::SecurityMode { new_ctx }) = ue.procedure.as_mut() {
            return Ok(unprotect(new_ctx, pdu, Direction::Uplink)?);
        }
        let sec = ue.security.as_mut().ok_or(SecurityError::NoSecurityContext)?;
        Ok(unprotect(sec, pdu, Direction::Uplink)?)
    }

    /// Messages a UE may send without integrity protection (TS 24.301 4.4.4.3)
    fn allowed_unprotected(msg_type: NasMessageType) -> bool {
        matches!(
            msg_type,
            NasMessageType::AttachRequest
                | NasMessageType::IdentityResponse
                | NasMessageType::AuthenticationResponse
                | NasMessageType::AuthenticationFailure
                | NasMessageType::SecurityModeReject
                | NasMessageType::DetachRequestUeOriginating
                | NasMessageType::DetachAccept
                | NasMessageType::TrackingAreaUpdateRequest
                | NasMessageType::ServiceRequest
        )
    }

    pub(crate) fn rx_nas_pdu(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext, pdu: &[u8]) -> Result<(), ProcedureError> {
        let unprotected = match Self::remove_envelope(ue, pdu) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(ue = ue.id, "dropping uplink PDU: {}", e);
                return Err(e);
            }
        };

        let header = match nas_pdus::parse_header(&nas_core::BitBuffer::from_bytes(&unprotected.plain), Direction::Uplink) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(ue = ue.id, "unreadable NAS header: {}", e);
                return Err(e.into());
            }
        };
        let Some(msg_type) = header.message_type else {
            if header.is_unknown_message_type() && header.protocol_discriminator == ProtocolDiscriminator::EpsMobilityManagement {
                tracing::info!(ue = ue.id, "unknown message type {:?}", header.raw_message_type);
                self.send_emm_status(queue, ue, EmmCause::MessageTypeNonExistent)?;
            }
            return Ok(());
        };

        if ue.security.is_some() && !unprotected.header_type.is_protected() && !Self::allowed_unprotected(msg_type) {
            tracing::warn!(ue = ue.id, "discarding unprotected {}", msg_type);
            return Ok(());
        }

        let msg = match NasMessage::from_bytes(&unprotected.plain, Direction::Uplink, IePolicy::Skip) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(ue = ue.id, "failed to decode {}: {}", msg_type, e);
                if header.protocol_discriminator == ProtocolDiscriminator::EpsMobilityManagement {
                    self.send_emm_status(queue, ue, EmmCause::InvalidMandatoryInformation)?;
                }
                return Err(e.into());
            }
        };
        tracing::debug!(ue = ue.id, "<- {:?} ({:?})", msg, unprotected.header_type);
        self.dispatch_uplink(queue, ue, msg, &unprotected)
    }

    fn dispatch_uplink(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: NasMessage,
        unprotected: &Unprotected,
    ) -> Result<(), ProcedureError> {
        match msg {
            NasMessage::IdentityResponse(m) => self.rx_identity_response(queue, ue, m),
            NasMessage::AuthenticationResponse(m) => self.rx_authentication_response(queue, ue, m),
            NasMessage::AuthenticationFailure(m) => self.rx_authentication_failure(queue, ue, m),
            NasMessage::SecurityModeComplete(m) => self.rx_security_mode_complete(queue, ue, m, unprotected.header_type),
            NasMessage::SecurityModeReject(m) => self.rx_security_mode_reject(queue, ue, m),
            NasMessage::EsmInformationResponse(m) => self.rx_esm_information_response(queue, ue, m),
            NasMessage::AttachComplete(m) => self.rx_attach_complete(queue, ue, m),
            NasMessage::DetachRequestUeOriginating(m) => self.detach_ue_originating(queue, ue, m),
            NasMessage::DetachAccept(_) => self.rx_detach_accept(queue, ue),
            NasMessage::TrackingAreaUpdateComplete(_) => {
                tracing::debug!(ue = ue.id, "TAU complete");
                Ok(())
            }
            NasMessage::EmmStatus(m) => {
                tracing::info!(ue = ue.id, "UE reported EMM status {:?}", m.emm_cause);
                Ok(())
            }
            NasMessage::EsmStatus(m) => {
                tracing::info!(ue = ue.id, "UE reported ESM status {:?} for bearer {}", m.esm_cause, m.eps_bearer_id);
                Ok(())
            }
            other => Err(Self::unexpected(ue, other.message_type())),
        }
    }

    fn rx_initial_ue_message(&mut self, queue: &mut MessageQueue, prim: S1apInitialUeMessage) -> Result<(), ProcedureError> {
        let decoded = strip_security_header(&prim.nas_pdu)
            .and_then(|(header, plain)| NasMessage::from_bytes(plain, Direction::Uplink, IePolicy::Skip).map(|m| (header, m)));
        let (header, msg) = match decoded {
            Ok(d) => d,
            Err(_) if prim.nas_pdu.first().map(|b| b >> 4) == Some(SecurityHeaderType::ServiceRequest.into_raw() as u8) => {
                let msg = NasMessage::from_bytes(&prim.nas_pdu, Direction::Uplink, IePolicy::Skip)?;
                (SecurityHeaderType::ServiceRequest, msg)
            }
            Err(e) => {
                tracing::warn!("{}: undecodable initial NAS message: {}", prim.ids, e);
                if let Some(cause) = Self::status_cause_for(&prim.nas_pdu) {
                    self.send_emm_status_to(queue, prim.ids, cause)?;
                }
                return Err(e.into());
            }
        };
        tracing::debug!("<- {} initial {:?}", prim.ids, msg);

        match msg {
            NasMessage::AttachRequest(req) => self.rx_attach_request(queue, &prim, header, req),
            NasMessage::TrackingAreaUpdateRequest(req) => self.rx_tau_request(queue, &prim, header, req),
            NasMessage::DetachRequestUeOriginating(req) => self.rx_initial_detach_request(queue, &prim, header, req),
            NasMessage::ServiceRequest(req) => self.rx_service_request(queue, &prim, req),
            other => {
                tracing::warn!("{}: {} cannot open a connection", prim.ids, other);
                Ok(())
            }
        }
    }
}

impl NasEntityTrait for MmeNas {
    fn entity(&self) -> NasEntity {
        NasEntity::Mme
    }

    fn set_config(&mut self, config: SharedConfig) {
        self.config = config;
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_prim: {:?}", message);
        let result = match message.msg {
            SapMsgInner::S1apInitialUeMessage(prim) => self.rx_initial_ue_message(queue, prim),
            SapMsgInner::S1apUplinkNasTransport(prim) => self.rx_uplink_nas_transport(queue, prim),
            SapMsgInner::S1apInitialContextSetupResponse(prim) => self.rx_initial_context_setup_response(prim),
            SapMsgInner::S1apUeContextReleased(prim) => self.rx_ue_context_released(queue, prim),
            SapMsgInner::GtpcDownlinkDataNotification(prim) => self.rx_downlink_data_notification(queue, prim),
            SapMsgInner::HssCancelLocation(prim) => self.rx_cancel_location(queue, prim),
            SapMsgInner::MmeTimerExpiry(prim) => self.rx_timer_expiry(queue, prim),
            other => {
                tracing::warn!("MME got unexpected primitive {}", other);
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::warn!("procedure failed: {}", e);
        }
    }

    fn tick(&mut self, queue: &mut MessageQueue, now: Instant) {
        self.now = now;
        for expiry in self.timers.pop_due(now) {
            let msg = SapMsg::new(
                Sap::Control,
                NasEntity::Mme,
                NasEntity::Mme,
                SapMsgInner::MmeTimerExpiry(MmeTimerExpiry {
                    ue: expiry.ue,
                    timer: expiry.timer,
                    generation: expiry.generation,
                }),
            );
            queue.push_back(msg);
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }
}
