//! Attach (TS 24.301 5.5.1): request handling, reject, completion and the EMM
//! information that follows a successful registration

use chrono::{Datelike, Timelike, Utc};
use nas_core::{Direction, IePolicy, Imsi, UeId};
use nas_pdus::common::guti::Guti;
use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::common::mobile_identity::EpsMobileIdentity;
use nas_pdus::common::network_name::NetworkName;
use nas_pdus::common::time_zone::{TimeZone, TimeZoneAndTime};
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::pdus::attach_complete::AttachComplete;
use nas_pdus::emm::pdus::attach_reject::AttachReject;
use nas_pdus::emm::pdus::attach_request::AttachRequest;
use nas_pdus::emm::pdus::emm_information::EmmInformation;
use nas_pdus::{NasMessage, NasMessageType};
use nas_saps::control::NasTimer;
use nas_saps::s1ap::{ReleaseCause, S1apInitialUeMessage};
use nas_security::unprotect;

use crate::error::ProcedureError;
use crate::mme::components::registry::lock_ue;
use crate::mme::components::ue_context::{AttachParams, EmmState, PendingProcedure, UeNasContext, MAX_EBI, MIN_EBI};
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    pub(crate) fn rx_attach_request(
        &mut self,
        queue: &mut MessageQueue,
        prim: &S1apInitialUeMessage,
        header: SecurityHeaderType,
        req: AttachRequest,
    ) -> Result<(), ProcedureError> {
        let pdn_req = match NasMessage::from_bytes(&req.esm_msg, Direction::Uplink, IePolicy::Skip) {
            Ok(NasMessage::PdnConnectivityRequest(p)) => p,
            Ok(other) => {
                tracing::warn!("{}: attach request carries {} instead of a PDN connectivity request", prim.ids, other);
                return self.send_to_connection(queue, prim.ids, AttachReject::new(EmmCause::EsmFailure).into());
            }
            Err(e) => {
                tracing::warn!("{}: undecodable ESM container in attach request: {}", prim.ids, e);
                self.send_to_connection(queue, prim.ids, AttachReject::new(EmmCause::EsmFailure).into())?;
                return Err(e.into());
            }
        };

        let params = AttachParams {
            attach_type: req.eps_attach_type,
            ue_network_cap: req.ue_network_cap,
            pti: pdn_req.proc_transaction_id,
            esm_info_transfer: pdn_req.esm_info_transfer_flag.unwrap_or(false),
            apn: pdn_req.apn.map(|a| a.0),
            pco: pdn_req.pco,
        };

        match req.eps_mobile_id {
            EpsMobileIdentity::Imsi(imsi) => {
                tracing::info!("{}: attach request ({:?}) from {}", prim.ids, params.attach_type, imsi);
                self.attach_by_imsi(queue, prim, imsi, params)
            }
            EpsMobileIdentity::Guti(guti) => {
                tracing::info!("{}: attach request ({:?}) with GUTI m-tmsi {:08x}", prim.ids, params.attach_type, guti.m_tmsi);
                self.attach_by_guti(queue, prim, header, guti, params)
            }
            EpsMobileIdentity::Imei(_) => {
                // IMEI only appears in emergency attach, which is not offered
                tracing::warn!("{}: attach with IMEI refused", prim.ids);
                self.send_to_connection(queue, prim.ids, AttachReject::new(EmmCause::UeIdentityCannotBeDerived).into())
            }
        }
    }

    fn attach_by_imsi(
        &mut self,
        queue: &mut MessageQueue,
        prim: &S1apInitialUeMessage,
        imsi: Imsi,
        params: AttachParams,
    ) -> Result<(), ProcedureError> {
        if let Some(old) = self.registry.ue_for_imsi(imsi) {
            self.discard_context(old);
        }

        let handle = self.new_context();
        let mut ue = lock_ue(&handle);
        ue.emm.imsi = Some(imsi);
        self.registry.bind_imsi(imsi, ue.id);
        self.connect(&mut ue, prim.ids);
        ue.emm.attach = Some(params);
        ue.emm.state = EmmState::CommonProcedureInitiated;
        self.start_authentication(queue, &mut ue)
    }

    fn attach_by_guti(
        &mut self,
        queue: &mut MessageQueue,
        prim: &S1apInitialUeMessage,
        header: SecurityHeaderType,
        guti: Guti,
        params: AttachParams,
    ) -> Result<(), ProcedureError> {
        let known = if self.is_own_guti(&guti) { self.registry.find_by_m_tmsi(guti.m_tmsi) } else { None };
        let Some(handle) = known else {
            let handle = self.new_context();
            let mut ue = lock_ue(&handle);
            self.connect(&mut ue, prim.ids);
            ue.emm.attach = Some(params);
            ue.emm.state = EmmState::CommonProcedureInitiated;
            return self.start_identification(queue, &mut ue);
        };

        let mut ue = lock_ue(&handle);
        self.connect(&mut ue, prim.ids);
        ue.emm.attach = Some(params);
        ue.procedure = None;
        ue.stop_all_timers(false);

        let verified = match ue.security.as_mut() {
            Some(sec) if header.is_protected() => Some(unprotect(sec, &prim.nas_pdu, Direction::Uplink)),
            _ => None,
        };
        let verified_count = match verified {
            Some(Ok(u)) => u.count,
            Some(Err(e)) => {
                tracing::info!(ue = ue.id, "attach request failed integrity check: {}", e);
                None
            }
            None => None,
        };

        let allow = self.config.config().security.allow_guti_attach_without_auth;
        if let (Some(count), true, EmmState::Deregistered) = (verified_count, allow, ue.emm.state) {
            tracing::info!(ue = ue.id, "known GUTI, integrity ok at count {}, continuing with security mode", count);
            ue.emm.state = EmmState::CommonProcedureInitiated;
            let Some(ctx) = ue.security.clone() else {
                return Err(ProcedureError::UnknownUe);
            };
            return self.start_security_mode(queue, &mut ue, ctx);
        }

        tracing::info!(ue = ue.id, "known GUTI in {:?}, running full authentication", ue.emm.state);
        self.delete_session(&mut ue);
        if let Some(sec) = ue.security.as_mut() {
            sec.reset_counts();
        }
        ue.emm.state = EmmState::CommonProcedureInitiated;
        if ue.emm.imsi.is_some() {
            self.start_authentication(queue, &mut ue)
        } else {
            self.start_identification(queue, &mut ue)
        }
    }

    pub(crate) fn is_own_guti(&self, guti: &Guti) -> bool {
        let cfg = self.config.config();
        guti.plmn == self.plmn && guti.mme_group_id == cfg.network.mme_group && guti.mme_code == cfg.network.mme_code
    }

    /// Drops a UE context that a new registration of the same subscriber replaces
    pub(crate) fn discard_context(&mut self, ue_id: UeId) {
        let Some(handle) = self.registry.remove(ue_id) else {
            return;
        };
        let mut old = lock_ue(&handle);
        tracing::info!(ue = old.id, "discarding stale context in {:?}", old.emm.state);
        old.stop_all_timers(false);
        self.delete_session(&mut old);
    }

    /// Refuses the attach running for the UE and releases it
    pub(crate) fn reject_attach(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext, cause: EmmCause) {
        tracing::info!(ue = ue.id, "attach reject {:?}", cause);
        let header = Self::downlink_protection(ue);
        if let Err(e) = self.send_nas(queue, ue, AttachReject::new(cause).into(), header) {
            tracing::warn!(ue = ue.id, "failed to send attach reject: {}", e);
        }
        self.abort_procedure(queue, ue, ReleaseCause::Unspecified);
    }

    pub(crate) fn rx_attach_complete(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: AttachComplete,
    ) -> Result<(), ProcedureError> {
        if !matches!(ue.procedure, Some(PendingProcedure::AttachAccept)) {
            return Err(Self::unexpected(ue, NasMessageType::AttachComplete));
        }
        ue.stop_timer(NasTimer::T3450);

        let accept = match NasMessage::from_bytes(&msg.esm_msg, Direction::Uplink, IePolicy::Skip)? {
            NasMessage::ActivateDefaultEpsBearerContextAccept(a) => a,
            other => return Err(Self::unexpected(ue, other.message_type())),
        };
        let ebi = accept.eps_bearer_id;
        if !(MIN_EBI..=MAX_EBI).contains(&ebi) || ue.bearer(ebi).is_none() {
            return Err(ProcedureError::InvalidBearer { ebi });
        }
        if let Some(bearer) = ue.bearer_mut(ebi) {
            bearer.ue_accepted = true;
        }
        self.try_activate_bearer(ue, ebi)?;

        ue.procedure = None;
        ue.emm.state = EmmState::Registered;
        tracing::info!(ue = ue.id, "registered with m-tmsi {:08x}", ue.m_tmsi().unwrap_or_default());
        self.send_emm_information(queue, ue)
    }

    fn send_emm_information(&self, queue: &mut MessageQueue, ue: &mut UeNasContext) -> Result<(), ProcedureError> {
        let cfg = self.config.config();
        let now = Utc::now();
        let info = EmmInformation {
            full_name: Some(NetworkName::gsm7(&cfg.network.full_network_name)),
            short_name: Some(NetworkName::gsm7(&cfg.network.short_network_name)),
            local_time_zone: Some(TimeZone::UTC),
            universal_time: Some(TimeZoneAndTime {
                year: now.year() as u16,
                month: now.month() as u8,
                day: now.day() as u8,
                hour: now.hour() as u8,
                minute: now.minute() as u8,
                second: now.second() as u8,
                tz: TimeZone::UTC,
            }),
            daylight_saving_time: None,
        };
        self.send_nas(queue, ue, info.into(), SecurityHeaderType::IntegrityProtectedCiphered)?;
        Ok(())
    }
}
