//! Default bearer setup during attach, bearer activation and session teardown

use nas_core::{Ebi, NasEntity, Sap};
use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::common::lai::LocationAreaId;
use nas_pdus::common::mobile_identity::{EpsMobileIdentity, MobileIdentity};
use nas_pdus::common::gprs_timer::GprsTimer;
use nas_pdus::common::guti::Guti;
use nas_pdus::common::tai::{TaiList, TrackingAreaId};
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::enums::eps_attach_result::EpsAttachResult;
use nas_pdus::emm::enums::eps_attach_type::EpsAttachType;
use nas_pdus::emm::fields::ue_security_capability::UeSecurityCapability;
use nas_pdus::emm::pdus::attach_accept::AttachAccept;
use nas_pdus::esm::fields::apn::Apn;
use nas_pdus::esm::fields::eps_qos::EpsQos;
use nas_pdus::esm::fields::pco::{container_id, ProtocolConfigOptions};
use nas_pdus::esm::fields::pdn_address::PdnAddress;
use nas_pdus::esm::pdus::activate_default_eps_bearer_context_request::ActivateDefaultEpsBearerContextRequest;
use nas_pdus::esm::pdus::esm_information_response::EsmInformationResponse;
use nas_pdus::{encode_message, NasMessage, NasMessageType};
use nas_saps::control::NasTimer;
use nas_saps::s1ap::{ErabToSetup, S1apInitialContextSetupRequest, S1apInitialContextSetupResponse};
use nas_saps::{SapMsg, SapMsgInner};
use nas_security::SecurityError;

use crate::error::ProcedureError;
use crate::mme::components::registry::lock_ue;
use crate::mme::components::ue_context::{EsmBearer, EsmState, PendingProcedure, Retransmit, UeNasContext, DEFAULT_EBI};
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    pub(crate) fn rx_esm_information_response(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: EsmInformationResponse,
    ) -> Result<(), ProcedureError> {
        let expected_pti = ue.emm.attach.as_ref().map(|p| p.pti);
        if !matches!(ue.procedure, Some(PendingProcedure::EsmInformation)) || expected_pti != Some(msg.proc_transaction_id) {
            return Err(Self::unexpected(ue, NasMessageType::EsmInformationResponse));
        }
        ue.stop_timer(NasTimer::T3489);
        ue.procedure = None;
        if let Some(params) = ue.emm.attach.as_mut() {
            if let Some(apn) = msg.apn {
                params.apn = Some(apn.0);
            }
            if msg.pco.is_some() {
                params.pco = msg.pco;
            }
        }
        self.allocate_default_bearer(queue, ue)
    }

    /// Obtains subscription and session for the default bearer, allocates the GUTI and sends
    /// the attach accept inside the initial context setup
    pub(crate) fn allocate_default_bearer(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext) -> Result<(), ProcedureError> {
        let cfg = self.config.config();
        let imsi = ue.emm.imsi.ok_or(ProcedureError::UnknownUe)?;
        let Some(params) = ue.emm.attach.clone() else {
            return Err(ProcedureError::UnknownUe);
        };
        let apn = params.apn.clone().unwrap_or_else(|| cfg.pdn.apn.clone());

        let subscription = match self.hss.update_location(imsi) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(ue = ue.id, "update location failed: {}", e);
                self.reject_attach(queue, ue, EmmCause::NetworkFailure);
                return Err(e.into());
            }
        };
        let session = match self.gtpc.create_session(imsi, DEFAULT_EBI, &apn) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(ue = ue.id, "create session failed: {}", e);
                self.reject_attach(queue, ue, EmmCause::NetworkFailure);
                return Err(e.into());
            }
        };
        tracing::info!(ue = ue.id, "session on {} with address {}", apn, session.ue_ipv4);

        ue.emm.ue_ipv4 = Some(session.ue_ipv4);
        ue.emm.sgw_ctrl_teid = Some(session.sgw_ctrl_teid);
        let mut bearer = EsmBearer::new(DEFAULT_EBI, subscription.qci, &apn);
        bearer.state = EsmState::CtxRequested;
        bearer.pdn_ipv4 = Some(session.ue_ipv4);
        bearer.sgw_s1u = Some(session.sgw_s1u);
        ue.add_bearer(bearer)?;

        let m_tmsi = self.config.state_write().alloc_m_tmsi();
        let guti = Guti {
            plmn: self.plmn,
            mme_group_id: cfg.network.mme_group,
            mme_code: cfg.network.mme_code,
            m_tmsi,
        };
        self.registry.bind_m_tmsi(m_tmsi, ue.m_tmsi(), ue.id);
        ue.emm.guti = Some(guti);

        let mut activate = ActivateDefaultEpsBearerContextRequest::new(
            DEFAULT_EBI,
            params.pti,
            EpsQos::from_qci(subscription.qci),
            Apn::new(&apn),
            PdnAddress::Ipv4(session.ue_ipv4),
        );
        let mut pco = ProtocolConfigOptions::default();
        pco.push(container_id::DNS_SERVER_IPV4_ADDRESS, cfg.pdn.dns.octets().to_vec());
        activate.pco = Some(pco);
        tracing::debug!(ue = ue.id, "-> {:?}", activate);

        // Circuit switched services are not offered, a combined attach is answered EPS-only
        let cs_cause = match params.attach_type {
            EpsAttachType::CombinedEpsImsiAttach => Some(EmmCause::CsDomainNotAvailable),
            _ => None,
        };
        let tai = TrackingAreaId { plmn: self.plmn, tac: cfg.network.tac };
        let accept = AttachAccept {
            eps_attach_result: EpsAttachResult::EpsOnly,
            t3412: GprsTimer::minutes(cfg.timers.t3412_minutes),
            tai_list: TaiList::single(tai),
            esm_msg: encode_message(&activate.into())?,
            guti: Some(EpsMobileIdentity::Guti(guti)),
            lai: Some(LocationAreaId { plmn: self.plmn, lac: cfg.network.tac }),
            ms_id: Some(MobileIdentity::Tmsi(m_tmsi)),
            emm_cause: cs_cause,
            t3402: None,
            t3423: None,
            equivalent_plmns: None,
            emergency_number_list: None,
            eps_network_feature_support: None,
            additional_update_result: None,
            t3412_extended: None,
        };
        tracing::debug!(ue = ue.id, "-> {:?}", accept);
        let header = SecurityHeaderType::IntegrityProtectedCiphered;
        let plain = encode_message(&NasMessage::from(accept))?;
        let nas_pdu = Self::protect_for(ue, &plain, header)?;

        ue.procedure = Some(PendingProcedure::AttachAccept);
        self.send_initial_context_setup(queue, ue, Some(nas_pdu))?;
        self.start_timer(ue, NasTimer::T3450, Retransmit::Nas { plain, header });
        tracing::info!(ue = ue.id, "attach accept, m-tmsi {:08x}", m_tmsi);
        Ok(())
    }

    /// Requests radio and S1-U setup for the UE's bearers. K_eNB is regenerated from the
    /// last uplink COUNT accepted under the current context.
    pub(crate) fn send_initial_context_setup(
        &self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        nas_pdu: Option<Vec<u8>>,
    ) -> Result<(), ProcedureError> {
        let ids = ue.ecm.ids.ok_or(ProcedureError::NotConnected)?;
        let caps = ue.emm.attach.as_ref().map(|p| UeSecurityCapability::from_network_capability(&p.ue_network_cap));
        let sec = ue.security.as_mut().ok_or(SecurityError::NoSecurityContext)?;
        sec.refresh_k_enb(sec.uplink.last_accepted().unwrap_or(0));
        let k_enb = sec.k_enb;

        let erabs: Vec<ErabToSetup> = ue
            .bearers
            .iter()
            .filter(|b| matches!(b.state, EsmState::CtxRequested | EsmState::Active))
            .filter_map(|b| b.sgw_s1u.map(|sgw_s1u| ErabToSetup { ebi: b.ebi, qci: b.qci, sgw_s1u }))
            .collect();
        if erabs.is_empty() {
            tracing::warn!(ue = ue.id, "context setup without bearers");
        }

        let prim = S1apInitialContextSetupRequest {
            ids,
            k_enb,
            ue_eea_caps: caps.map(|c| c.eea).unwrap_or(0),
            ue_eia_caps: caps.map(|c| c.eia).unwrap_or(0),
            erabs,
            nas_pdu,
        };
        tracing::debug!("-> {} initial context setup, {} bearers", ids, prim.erabs.len());
        queue.push_back(SapMsg::new(
            Sap::S1apNas,
            NasEntity::Mme,
            NasEntity::S1ap,
            SapMsgInner::S1apInitialContextSetupRequest(prim),
        ));
        ue.ecm.established_initially = true;
        Ok(())
    }

    pub(crate) fn rx_initial_context_setup_response(&mut self, prim: S1apInitialContextSetupResponse) -> Result<(), ProcedureError> {
        let handle = self.registry.find_by_s1ap(prim.ids.mme_ue_s1ap_id).ok_or(ProcedureError::UnknownUe)?;
        let mut ue = lock_ue(&handle);
        let imsi = ue.emm.imsi.ok_or(ProcedureError::UnknownUe)?;

        for erab in prim.erabs {
            let Some(bearer) = ue.bearer_mut(erab.ebi) else {
                tracing::warn!("{}: setup result for unknown bearer {}", prim.ids, erab.ebi);
                continue;
            };
            bearer.enb_s1u = Some(erab.enb_s1u);
            match bearer.state {
                EsmState::CtxRequested => {
                    bearer.state = EsmState::CtxSetup;
                    self.try_activate_bearer(&mut ue, erab.ebi)?;
                }
                EsmState::Active => {
                    // Connection re-established from idle, the gateway learns the new endpoint
                    self.gtpc.modify_bearer(imsi, erab.ebi, erab.enb_s1u)?;
                }
                state => tracing::debug!("{}: bearer {} in {:?} ignores setup result", prim.ids, erab.ebi, state),
            }
        }
        Ok(())
    }

    /// Activates a bearer once both the UE accepted it and the eNodeB endpoint is known
    pub(crate) fn try_activate_bearer(&self, ue: &mut UeNasContext, ebi: Ebi) -> Result<(), ProcedureError> {
        let imsi = ue.emm.imsi.ok_or(ProcedureError::UnknownUe)?;
        let bearer = ue.bearer_mut(ebi).ok_or(ProcedureError::InvalidBearer { ebi })?;
        if bearer.state == EsmState::Active || !bearer.ue_accepted {
            return Ok(());
        }
        let Some(enb_s1u) = bearer.enb_s1u else {
            return Ok(());
        };
        self.gtpc.modify_bearer(imsi, ebi, enb_s1u)?;
        bearer.state = EsmState::Active;
        tracing::info!("bearer {} of {} active towards {}", ebi, imsi, enb_s1u);
        Ok(())
    }

    /// Tears down the UE's session at the gateway and forgets its bearers
    pub(crate) fn delete_session(&self, ue: &mut UeNasContext) {
        if ue.bearers.is_empty() && ue.emm.sgw_ctrl_teid.is_none() {
            return;
        }
        if let Some(imsi) = ue.emm.imsi {
            if let Err(e) = self.gtpc.delete_session(imsi) {
                tracing::error!(ue = ue.id, "delete session failed: {}", e);
            }
        }
        ue.bearers.clear();
        ue.emm.ue_ipv4 = None;
        ue.emm.sgw_ctrl_teid = None;
    }
}
