mod common;

use nas_core::debug;
use nas_entities::mme::components::ue_context::{EcmState, EmmState};
use nas_pdus::common::guti::Guti;
use nas_pdus::common::mobile_identity::{EpsMobileIdentity, MobileIdentity};
use nas_pdus::common::plmn::PlmnId;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::enums::eps_attach_result::EpsAttachResult;
use nas_pdus::emm::enums::eps_attach_type::EpsAttachType;
use nas_pdus::emm::pdus::authentication_failure::AuthenticationFailure;
use nas_pdus::emm::pdus::authentication_response::AuthenticationResponse;
use nas_pdus::emm::fields::auth_parameters::AuthRes;
use nas_pdus::emm::pdus::identity_response::IdentityResponse;
use nas_pdus::emm::pdus::security_mode_reject::SecurityModeReject;
use nas_pdus::esm::fields::apn::Apn;
use nas_pdus::esm::pdus::esm_information_response::EsmInformationResponse;
use nas_pdus::{encode_message, NasMessage};
use nas_saps::s1ap::ReleaseCause;
use nas_saps::SapMsgInner;
use common::{default_test_config, downlink_pdus, releases, ComponentTest, GtpcCall, MockGtpc, UeSim};

const IMSI: &str = "001010000000001";

#[test]
fn test_attach_by_imsi() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let activate = ue.attach(&mut test);

    assert_eq!(activate.eps_bearer_id, 5);
    assert_eq!(activate.proc_transaction_id, ue.pti);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Registered));
    assert_eq!(test.ecm_state(ue.imsi), Some(EcmState::Connected));

    let guti = ue.guti.expect("GUTI assigned in attach accept");
    assert_eq!(guti.m_tmsi, 1);
    assert_eq!(guti.mme_group_id, 1);
    assert_eq!(guti.mme_code, 1);
    assert!(test.registry.find_by_m_tmsi(guti.m_tmsi).is_some());

    assert_eq!(*test.hss.location_updates.lock().unwrap(), vec![ue.imsi]);
    assert_eq!(
        test.gtpc.take_calls(),
        vec![
            GtpcCall::CreateSession { imsi: ue.imsi, ebi: 5, apn: "internet".to_string() },
            GtpcCall::ModifyBearer { imsi: ue.imsi, ebi: 5, enb_s1u: common::ue_sim::ENB_S1U },
        ]
    );
    tracing::info!("UE registered with m-tmsi {:08x}", guti.m_tmsi);
}

#[test]
fn test_attach_accept_contents() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.attach_with_imsi(false));
    let NasMessage::AuthenticationRequest(req) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    assert_eq!(req.nas_ksi.ksi, 0);
    let resp = ue.authenticate(&req);
    let out = test.process(ue.uplink_plain(resp));
    let NasMessage::SecurityModeCommand(smc) = ue.expect_single(&out) else {
        panic!("expected security mode command");
    };
    assert_eq!(smc.replayed_ue_security_cap.eea, UeSim::network_capability().eea);
    let out = test.process(ue.security_mode_complete());

    // The attach accept rides on the initial context setup
    let setup = out
        .iter()
        .find_map(|m| match &m.msg {
            SapMsgInner::S1apInitialContextSetupRequest(p) => Some(p),
            _ => None,
        })
        .expect("initial context setup");
    assert_eq!(setup.erabs.len(), 1);
    assert_eq!(setup.erabs[0].ebi, 5);
    assert_eq!(setup.erabs[0].sgw_s1u, MockGtpc::SGW_S1U);
    assert_eq!(setup.ue_eea_caps, 0xE0);
    assert!(setup.nas_pdu.is_some());

    let pdus = downlink_pdus(&out);
    assert_eq!(pdus.len(), 1);
    let NasMessage::AttachAccept(accept) = ue.receive(&pdus[0]) else {
        panic!("expected attach accept");
    };
    assert_eq!(accept.eps_attach_result, EpsAttachResult::EpsOnly);
    assert_eq!(accept.emm_cause, None);
    assert_eq!(accept.ms_id, Some(MobileIdentity::Tmsi(1)));
    let NasMessage::ActivateDefaultEpsBearerContextRequest(activate) =
        NasMessage::from_bytes(&accept.esm_msg, nas_core::Direction::Downlink, nas_core::IePolicy::Skip).unwrap()
    else {
        panic!("expected default bearer activation");
    };
    assert_eq!(activate.apn, Apn::new("internet"));
    assert!(activate.pco.is_some());
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::CommonProcedureInitiated));
}

#[test]
fn test_combined_attach_answered_eps_only() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let mut req = ue.attach_request(EpsMobileIdentity::Imsi(ue.imsi), ue.pdn_connectivity_request(false));
    req.eps_attach_type = EpsAttachType::CombinedEpsImsiAttach;
    let out = test.process(ue.initial_message(encode_message(&req.into()).unwrap(), None));
    let NasMessage::AuthenticationRequest(auth) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    let resp = ue.authenticate(&auth);
    let out = test.process(ue.uplink_plain(resp));
    ue.expect_single(&out);
    let out = test.process(ue.security_mode_complete());

    let NasMessage::AttachAccept(accept) = ue.expect_single(&out) else {
        panic!("expected attach accept");
    };
    assert_eq!(accept.eps_attach_result, EpsAttachResult::EpsOnly);
    assert_eq!(accept.emm_cause, Some(EmmCause::CsDomainNotAvailable));
}

#[test]
fn test_attach_with_esm_information_transfer() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.attach_with_imsi(true));
    let NasMessage::AuthenticationRequest(req) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    let resp = ue.authenticate(&req);
    let out = test.process(ue.uplink_plain(resp));
    ue.expect_single(&out);

    // APN and PCO were held back, so the MME asks for them before setting up the PDN
    let out = test.process(ue.security_mode_complete());
    let NasMessage::EsmInformationRequest(info_req) = ue.expect_single(&out) else {
        panic!("expected ESM information request");
    };
    assert_eq!(info_req.proc_transaction_id, ue.pti);
    assert!(test.gtpc.take_calls().is_empty());

    let mut info = EsmInformationResponse::new(ue.pti);
    info.apn = Some(Apn::new("ims"));
    let out = test.process(ue.uplink(info.into()));
    let activate = ue.complete_attach(&mut test, &out);

    assert_eq!(activate.apn, Apn::new("ims"));
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Registered));
    let calls = test.gtpc.take_calls();
    assert_eq!(calls[0], GtpcCall::CreateSession { imsi: ue.imsi, ebi: 5, apn: "ims".to_string() });
}

#[test]
fn test_authentication_res_mismatch() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.attach_with_imsi(false));
    let NasMessage::AuthenticationRequest(_) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };

    let wrong = AuthenticationResponse { res: AuthRes(vec![0xEE; 8]) };
    let out = test.process(ue.uplink_plain(wrong.into()));

    let NasMessage::AuthenticationReject(_) = ue.expect_single(&out) else {
        panic!("expected authentication reject");
    };
    assert_eq!(releases(&out), vec![ReleaseCause::AuthenticationFailure]);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Deregistered));
    assert!(test.gtpc.take_calls().is_empty());
}

#[test]
fn test_authentication_synch_failure_resyncs_once() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.attach_with_imsi(false));
    let NasMessage::AuthenticationRequest(first) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    assert_eq!(first.nas_ksi.ksi, 0);

    let failure = AuthenticationFailure { emm_cause: EmmCause::SynchFailure, auts: Some([0x33; 14]) };
    let out = test.process(ue.uplink_plain(failure.into()));
    assert_eq!(test.hss.resync_count(), 1);
    assert_eq!(test.hss.resyncs.lock().unwrap()[0], (ue.imsi, [0x33; 14]));

    // Fresh vector after resynchronisation, under the next key set identifier
    let pdus = downlink_pdus(&out);
    assert_eq!(pdus.len(), 1);
    let NasMessage::AuthenticationRequest(second) = ue.receive(&pdus[0]) else {
        panic!("expected a second authentication request");
    };
    assert_eq!(second.nas_ksi.ksi, 1);
    assert_ne!(second.rand, first.rand);

    ue.attach_from_authentication(&mut test, &out);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Registered));
}

#[test]
fn test_authentication_second_synch_failure_aborts() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.attach_with_imsi(false));
    ue.expect_single(&out);
    let failure = AuthenticationFailure { emm_cause: EmmCause::SynchFailure, auts: Some([0x33; 14]) };
    let out = test.process(ue.uplink_plain(failure.clone().into()));
    ue.expect_single(&out);

    let out = test.process(ue.uplink_plain(failure.into()));
    assert!(downlink_pdus(&out).is_empty());
    assert_eq!(releases(&out), vec![ReleaseCause::AuthenticationFailure]);
    assert_eq!(test.hss.resync_count(), 1);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Deregistered));
}

#[test]
fn test_security_mode_reject_aborts() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.attach_with_imsi(false));
    let NasMessage::AuthenticationRequest(req) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    let resp = ue.authenticate(&req);
    let out = test.process(ue.uplink_plain(resp));
    ue.expect_single(&out);

    let reject = SecurityModeReject { emm_cause: EmmCause::UeSecurityCapabilitiesMismatch };
    let out = test.process(ue.uplink_plain(reject.into()));
    assert!(downlink_pdus(&out).is_empty());
    assert_eq!(releases(&out), vec![ReleaseCause::Unspecified]);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Deregistered));
}

#[test]
fn test_attach_unknown_guti_identifies_ue() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let foreign = Guti {
        plmn: PlmnId::from_digits(&[0, 0, 1], &[0, 1]).unwrap(),
        mme_group_id: 1,
        mme_code: 1,
        m_tmsi: 0x0BAD_CAFE,
    };
    let out = test.process(ue.attach_with_guti(foreign));
    let NasMessage::IdentityRequest(_) = ue.expect_single(&out) else {
        panic!("expected identity request");
    };
    assert!(test.registry.find_by_imsi(ue.imsi).is_none());

    let identity = IdentityResponse { mobile_identity: MobileIdentity::Imsi(ue.imsi) };
    let out = test.process(ue.uplink_plain(identity.into()));
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::CommonProcedureInitiated));

    ue.attach_from_authentication(&mut test, &out);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Registered));
}

#[test]
fn test_identity_response_without_imsi_rejected() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let foreign = Guti {
        plmn: PlmnId::from_digits(&[0, 0, 2], &[0, 1]).unwrap(),
        mme_group_id: 7,
        mme_code: 3,
        m_tmsi: 0x1234,
    };
    let out = test.process(ue.attach_with_guti(foreign));
    ue.expect_single(&out);

    let identity = IdentityResponse { mobile_identity: MobileIdentity::Tmsi(0x1234) };
    let out = test.process(ue.uplink_plain(identity.into()));
    let NasMessage::AttachReject(reject) = ue.expect_single(&out) else {
        panic!("expected attach reject");
    };
    assert_eq!(reject.emm_cause, EmmCause::UeIdentityCannotBeDerived);
    assert_eq!(releases(&out).len(), 1);
}

#[test]
fn test_reattach_with_known_guti_reauthenticates() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);
    ue.attach(&mut test);
    test.gtpc.take_calls();
    let guti = ue.guti.unwrap();

    // A registered UE attaching again loses its session and runs full authentication
    ue.new_connection(2);
    let out = test.process(ue.attach_with_guti(guti));
    let NasMessage::AuthenticationRequest(req) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    assert_eq!(req.nas_ksi.ksi, 1);
    assert_eq!(test.gtpc.take_calls(), vec![GtpcCall::DeleteSession { imsi: ue.imsi }]);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::CommonProcedureInitiated));
}

#[test]
fn test_attach_with_bad_esm_container_rejected() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let esm = encode_message(&EsmInformationResponse::new(1).into()).unwrap();
    let req = ue.attach_request(EpsMobileIdentity::Imsi(ue.imsi), esm);
    let out = test.process(ue.initial_message(encode_message(&req.into()).unwrap(), None));

    let NasMessage::AttachReject(reject) = ue.expect_single(&out) else {
        panic!("expected attach reject");
    };
    assert_eq!(reject.emm_cause, EmmCause::EsmFailure);
    assert!(test.registry.is_empty());
}

#[test]
fn test_attach_unknown_subscriber_rejected() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);
    test.hss.remove_subscriber(ue.imsi);

    let out = test.process(ue.attach_with_imsi(false));
    let NasMessage::AttachReject(reject) = ue.expect_single(&out) else {
        panic!("expected attach reject");
    };
    assert_eq!(reject.emm_cause, EmmCause::NetworkFailure);
    assert_eq!(releases(&out), vec![ReleaseCause::Unspecified]);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Deregistered));
}

#[test]
fn test_create_session_failure_rejects_attach() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);
    *test.gtpc.fail_create.lock().unwrap() = true;

    let out = test.process(ue.attach_with_imsi(false));
    let NasMessage::AuthenticationRequest(req) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    let resp = ue.authenticate(&req);
    let out = test.process(ue.uplink_plain(resp));
    ue.expect_single(&out);
    let out = test.process(ue.security_mode_complete());

    // The context is in use by now, so the reject goes out protected
    let NasMessage::AttachReject(reject) = ue.expect_single(&out) else {
        panic!("expected attach reject");
    };
    assert_eq!(reject.emm_cause, EmmCause::NetworkFailure);
    assert_eq!(releases(&out), vec![ReleaseCause::Unspecified]);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Deregistered));
}
