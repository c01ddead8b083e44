use std::net::Ipv4Addr;

use nas_core::{Direction, Ebi, Fteid, IePolicy, Imsi, MTmsi, NasEntity, S1apUeIds, Sap};
use nas_pdus::common::guti::Guti;
use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::common::mobile_identity::EpsMobileIdentity;
use nas_pdus::common::nas_key_set_id::NasKeySetId;
use nas_pdus::common::plmn::PlmnId;
use nas_pdus::emm::enums::detach_type::UeDetachType;
use nas_pdus::emm::enums::eps_attach_type::EpsAttachType;
use nas_pdus::emm::enums::eps_update_type::EpsUpdateTypeValue;
use nas_pdus::emm::fields::auth_parameters::AuthRes;
use nas_pdus::emm::fields::ue_network_capability::UeNetworkCapability;
use nas_pdus::emm::pdus::attach_complete::AttachComplete;
use nas_pdus::emm::pdus::attach_request::AttachRequest;
use nas_pdus::emm::pdus::authentication_request::AuthenticationRequest;
use nas_pdus::emm::pdus::authentication_response::AuthenticationResponse;
use nas_pdus::emm::pdus::detach_request::DetachRequestUeOriginating;
use nas_pdus::emm::pdus::security_mode_complete::SecurityModeComplete;
use nas_pdus::emm::pdus::tracking_area_update_request::TrackingAreaUpdateRequest;
use nas_pdus::esm::enums::pdn_type::PdnType;
use nas_pdus::esm::enums::request_type::RequestType;
use nas_pdus::esm::pdus::activate_default_eps_bearer_context_request::ActivateDefaultEpsBearerContextRequest;
use nas_pdus::esm::pdus::pdn_connectivity_request::PdnConnectivityRequest;
use nas_pdus::esm::pdus::simple::ActivateDefaultEpsBearerContextAccept;
use nas_pdus::nas_message::strip_security_header;
use nas_pdus::{encode_message, NasMessage};
use nas_saps::s1ap::{
    ErabSetupResult, ReportedTai, S1apInitialContextSetupResponse, S1apInitialUeMessage, S1apUeContextReleased,
    S1apUplinkNasTransport,
};
use nas_saps::{SapMsg, SapMsgInner};
use nas_security::{build_service_request, protect, unprotect, SecurityContext};

use super::component_test::{downlink_pdus, ComponentTest};
use super::mocks::test_vector;

/// eNodeB user plane endpoint reported in context setup responses
pub const ENB_S1U: Fteid = Fteid { teid: 0x0000_3001, ipv4: Ipv4Addr::new(10, 0, 0, 1) };

/// Plays the UE (and, for S1AP, its eNodeB) against the MME: builds uplink messages,
/// checks and deciphers downlink ones with its own copy of the security context
pub struct UeSim {
    pub imsi: Imsi,
    pub ids: S1apUeIds,
    pub security: Option<SecurityContext>,
    pub guti: Option<Guti>,
    pub pti: u8,
    /// Context derived from the last authentication, until a security mode command takes it into use
    pending: Option<SecurityContext>,
    plmn: PlmnId,
    tac: u16,
}

impl UeSim {
    pub fn new(imsi: &str, mme_ue_s1ap_id: u32) -> Self {
        Self {
            imsi: imsi.parse().expect("valid IMSI"),
            ids: Self::ids_for(mme_ue_s1ap_id),
            security: None,
            guti: None,
            pti: 1,
            pending: None,
            plmn: PlmnId::from_digits(&[0, 0, 1], &[0, 1]).expect("valid PLMN"),
            tac: 7,
        }
    }

    fn ids_for(mme_ue_s1ap_id: u32) -> S1apUeIds {
        S1apUeIds { enb_ue_s1ap_id: mme_ue_s1ap_id + 1000, mme_ue_s1ap_id }
    }

    /// The next messages go over a fresh signalling connection
    pub fn new_connection(&mut self, mme_ue_s1ap_id: u32) {
        self.ids = Self::ids_for(mme_ue_s1ap_id);
    }

    /// EEA0..EEA2 and EIA1..EIA2
    pub fn network_capability() -> UeNetworkCapability {
        UeNetworkCapability { eea: 0xE0, eia: 0x60, uea: None, ucs2_uia: None, additional: vec![] }
    }

    pub fn pdn_connectivity_request(&self, esm_info_transfer: bool) -> Vec<u8> {
        let mut req = PdnConnectivityRequest::new(self.pti, PdnType::Ipv4, RequestType::InitialRequest);
        if esm_info_transfer {
            req.esm_info_transfer_flag = Some(true);
        }
        encode_message(&req.into()).expect("encodable PDN connectivity request")
    }

    pub fn attach_request(&self, eps_mobile_id: EpsMobileIdentity, esm_msg: Vec<u8>) -> AttachRequest {
        let nas_ksi = match &self.security {
            Some(sec) => NasKeySetId::native(sec.ksi),
            None => NasKeySetId::no_key(),
        };
        AttachRequest {
            eps_attach_type: EpsAttachType::EpsAttach,
            nas_ksi,
            eps_mobile_id,
            ue_network_cap: Self::network_capability(),
            esm_msg,
            old_p_tmsi_signature: None,
            additional_guti: None,
            last_visited_registered_tai: None,
            drx_param: None,
            ms_network_cap: None,
            old_lai: None,
            tmsi_status: None,
            ms_cm2: None,
            ms_cm3: None,
            supported_codecs: None,
            additional_update_type: None,
            voice_domain_pref_and_ue_usage_setting: None,
            device_properties: None,
            old_guti_type: None,
        }
    }

    pub fn initial_message(&self, nas_pdu: Vec<u8>, m_tmsi: Option<MTmsi>) -> SapMsg {
        let prim = S1apInitialUeMessage {
            ids: self.ids,
            nas_pdu,
            tai: ReportedTai { plmn: self.plmn.to_bytes(), tac: self.tac },
            m_tmsi,
        };
        SapMsg::new(Sap::S1apNas, NasEntity::S1ap, NasEntity::Mme, SapMsgInner::S1apInitialUeMessage(prim))
    }

    pub fn attach_with_imsi(&self, esm_info_transfer: bool) -> SapMsg {
        let req = self.attach_request(EpsMobileIdentity::Imsi(self.imsi), self.pdn_connectivity_request(esm_info_transfer));
        self.initial_message(encode_message(&req.into()).expect("encodable attach request"), None)
    }

    /// Attach request with the GUTI, integrity protected when the UE holds a context
    pub fn attach_with_guti(&mut self, guti: Guti) -> SapMsg {
        let req = self.attach_request(EpsMobileIdentity::Guti(guti), self.pdn_connectivity_request(false));
        let pdu = self.protect_initial(req.into());
        self.initial_message(pdu, Some(guti.m_tmsi))
    }

    fn protect_initial(&mut self, msg: NasMessage) -> Vec<u8> {
        let plain = encode_message(&msg).expect("encodable uplink");
        match self.security.as_mut() {
            Some(sec) => protect(sec, &plain, SecurityHeaderType::IntegrityProtected, Direction::Uplink).expect("protect"),
            None => plain,
        }
    }

    pub fn uplink_raw(&self, nas_pdu: Vec<u8>) -> SapMsg {
        let prim = S1apUplinkNasTransport { ids: self.ids, nas_pdu };
        SapMsg::new(Sap::S1apNas, NasEntity::S1ap, NasEntity::Mme, SapMsgInner::S1apUplinkNasTransport(prim))
    }

    pub fn uplink_plain(&self, msg: NasMessage) -> SapMsg {
        tracing::info!("UE -> {} (plain)", msg);
        self.uplink_raw(encode_message(&msg).expect("encodable uplink"))
    }

    /// Integrity protected and ciphered with the current context
    pub fn uplink(&mut self, msg: NasMessage) -> SapMsg {
        self.uplink_with(msg, SecurityHeaderType::IntegrityProtectedCiphered)
    }

    pub fn uplink_with(&mut self, msg: NasMessage, header: SecurityHeaderType) -> SapMsg {
        tracing::info!("UE -> {} ({:?})", msg, header);
        let plain = encode_message(&msg).expect("encodable uplink");
        let sec = self.security.as_mut().expect("UE has no security context");
        let pdu = protect(sec, &plain, header, Direction::Uplink).expect("protect");
        self.uplink_raw(pdu)
    }

    /// Checks and decodes a downlink PDU the way the UE would
    pub fn receive(&mut self, pdu: &[u8]) -> NasMessage {
        let sht = pdu[0] >> 4;
        let plain = if sht == SecurityHeaderType::PlainNas.into_raw() as u8 {
            pdu.to_vec()
        } else if sht == SecurityHeaderType::IntegrityProtectedNewContext.into_raw() as u8 {
            self.take_new_context(pdu)
        } else {
            let sec = self.security.as_mut().expect("protected downlink without a context");
            unprotect(sec, pdu, Direction::Downlink).expect("downlink integrity").plain
        };
        let msg = NasMessage::from_bytes(&plain, Direction::Downlink, IePolicy::Skip).expect("decodable downlink");
        tracing::info!("UE <- {}", msg);
        msg
    }

    /// A security mode command selects the algorithms, so the UE can only check it after
    /// reading the selection from the unciphered message
    fn take_new_context(&mut self, pdu: &[u8]) -> Vec<u8> {
        let (_, plain) = strip_security_header(pdu).expect("integrity-only new context PDU");
        let Ok(NasMessage::SecurityModeCommand(smc)) = NasMessage::from_bytes(plain, Direction::Downlink, IePolicy::Skip) else {
            panic!("new context header on something other than a security mode command");
        };
        let mut ctx = match self.pending.take() {
            Some(ctx) => ctx,
            None => self.security.clone().expect("security mode command without any context"),
        };
        ctx.set_algorithms(smc.selected_algorithms.ciphering, smc.selected_algorithms.integrity)
            .expect("supported algorithms");
        let unprotected = unprotect(&mut ctx, pdu, Direction::Downlink).expect("security mode command integrity");
        self.security = Some(ctx);
        unprotected.plain
    }

    /// Exactly one NAS message must have gone to the UE; returns it decoded
    pub fn expect_single(&mut self, msgs: &[SapMsg]) -> NasMessage {
        let pdus = downlink_pdus(msgs);
        assert_eq!(pdus.len(), 1, "expected one downlink NAS message, got {}", pdus.len());
        self.receive(&pdus[0])
    }

    /// Runs the USIM side of AKA against the mock vectors
    pub fn authenticate(&mut self, req: &AuthenticationRequest) -> NasMessage {
        let vector = test_vector(req.rand[0]);
        self.pending = Some(SecurityContext::derive_from_vector(req.nas_ksi.ksi, &vector, self.plmn.to_bytes()));
        AuthenticationResponse { res: AuthRes(vector.xres) }.into()
    }

    pub fn security_mode_complete(&mut self) -> SapMsg {
        self.uplink_with(
            SecurityModeComplete { imeisv: None }.into(),
            SecurityHeaderType::IntegrityProtectedCipheredNewContext,
        )
    }

    pub fn service_request(&mut self) -> SapMsg {
        let guti = self.guti.expect("UE has no GUTI");
        let sec = self.security.as_mut().expect("UE has no security context");
        let req = build_service_request(sec).expect("service request");
        self.initial_message(encode_message(&req.into()).expect("encodable service request"), Some(guti.m_tmsi))
    }

    pub fn tau_request(&mut self, active_flag: bool) -> SapMsg {
        let guti = self.guti.expect("UE has no GUTI");
        let ksi = self.security.as_ref().map(|s| s.ksi).unwrap_or(NasKeySetId::NO_KEY_AVAILABLE);
        let mut req = TrackingAreaUpdateRequest::new(EpsUpdateTypeValue::TaUpdating, NasKeySetId::native(ksi), EpsMobileIdentity::Guti(guti));
        req.active_flag = active_flag;
        let pdu = self.protect_initial(req.into());
        self.initial_message(pdu, Some(guti.m_tmsi))
    }

    pub fn detach_request(&self, switch_off: bool) -> DetachRequestUeOriginating {
        let eps_mobile_id = match self.guti {
            Some(guti) => EpsMobileIdentity::Guti(guti),
            None => EpsMobileIdentity::Imsi(self.imsi),
        };
        let nas_ksi = self.security.as_ref().map(|s| NasKeySetId::native(s.ksi)).unwrap_or_else(NasKeySetId::no_key);
        DetachRequestUeOriginating { switch_off, detach_type: UeDetachType::EpsDetach, nas_ksi, eps_mobile_id }
    }

    /// Detach request opening a new connection
    pub fn initial_detach(&mut self, switch_off: bool) -> SapMsg {
        let req = self.detach_request(switch_off);
        let m_tmsi = self.guti.map(|g| g.m_tmsi);
        let pdu = self.protect_initial(req.into());
        self.initial_message(pdu, m_tmsi)
    }

    pub fn context_setup_response(&self, ebis: &[Ebi]) -> SapMsg {
        let erabs = ebis.iter().map(|ebi| ErabSetupResult { ebi: *ebi, enb_s1u: ENB_S1U }).collect();
        let prim = S1apInitialContextSetupResponse { ids: self.ids, erabs };
        SapMsg::new(Sap::S1apNas, NasEntity::S1ap, NasEntity::Mme, SapMsgInner::S1apInitialContextSetupResponse(prim))
    }

    pub fn context_released(&self) -> SapMsg {
        let prim = S1apUeContextReleased { ids: self.ids };
        SapMsg::new(Sap::S1apNas, NasEntity::S1ap, NasEntity::Mme, SapMsgInner::S1apUeContextReleased(prim))
    }

    /// Full attach by IMSI up to the EMM information: authentication, security mode,
    /// attach accept with default bearer, context setup and attach complete
    pub fn attach(&mut self, test: &mut ComponentTest) -> ActivateDefaultEpsBearerContextRequest {
        let out = test.process(self.attach_with_imsi(false));
        self.attach_from_authentication(test, &out)
    }

    /// Continues an attach from the authentication request found in `out`
    pub fn attach_from_authentication(&mut self, test: &mut ComponentTest, out: &[SapMsg]) -> ActivateDefaultEpsBearerContextRequest {
        let NasMessage::AuthenticationRequest(req) = self.expect_single(out) else {
            panic!("expected authentication request");
        };
        let resp = self.authenticate(&req);
        let out = test.process(self.uplink_plain(resp));
        let NasMessage::SecurityModeCommand(_) = self.expect_single(&out) else {
            panic!("authentication not followed by security mode command");
        };
        let out = test.process(self.security_mode_complete());
        self.complete_attach(test, &out)
    }

    /// Takes the attach accept out of `out`, answers the context setup and completes the attach
    pub fn complete_attach(&mut self, test: &mut ComponentTest, out: &[SapMsg]) -> ActivateDefaultEpsBearerContextRequest {
        let NasMessage::AttachAccept(accept) = self.expect_single(out) else {
            panic!("expected attach accept");
        };
        let Ok(NasMessage::ActivateDefaultEpsBearerContextRequest(activate)) =
            NasMessage::from_bytes(&accept.esm_msg, Direction::Downlink, IePolicy::Skip)
        else {
            panic!("attach accept does not carry a default bearer activation");
        };
        if let Some(EpsMobileIdentity::Guti(guti)) = accept.guti {
            self.guti = Some(guti);
        }

        let out = test.process(self.context_setup_response(&[activate.eps_bearer_id]));
        assert!(out.is_empty());

        let accept_esm = ActivateDefaultEpsBearerContextAccept::new(activate.eps_bearer_id, activate.proc_transaction_id);
        let esm_msg = encode_message(&accept_esm.into()).expect("encodable bearer accept");
        let out = test.process(self.uplink(AttachComplete { esm_msg }.into()));
        let NasMessage::EmmInformation(_) = self.expect_single(&out) else {
            panic!("attach complete not followed by EMM information");
        };
        activate
    }
}
