mod common;

use nas_core::debug;
use nas_entities::mme::components::ue_context::EmmState;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::pdus::emm_status::EmmStatus;
use nas_pdus::NasMessage;
use nas_saps::s1ap::ReleaseCause;
use nas_saps::{SapMsg, SapMsgInner};
use common::{default_test_config, releases, ComponentTest, UeSim};

const IMSI: &str = "001010000000009";

fn flip_last_bit(msg: &mut SapMsg) {
    let SapMsgInner::S1apUplinkNasTransport(prim) = &mut msg.msg else {
        panic!("not an uplink NAS transport");
    };
    if let Some(last) = prim.nas_pdu.last_mut() {
        *last ^= 0x01;
    }
}

#[test]
fn test_tampered_security_mode_complete_dropped() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.attach_with_imsi(false));
    let NasMessage::AuthenticationRequest(req) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    let resp = ue.authenticate(&req);
    let out = test.process(ue.uplink_plain(resp));
    let NasMessage::SecurityModeCommand(_) = ue.expect_single(&out) else {
        panic!("expected security mode command");
    };

    let mut complete = ue.security_mode_complete();
    flip_last_bit(&mut complete);
    let out = test.process(complete);
    assert!(out.is_empty());
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::CommonProcedureInitiated));
    assert!(test.gtpc.take_calls().is_empty());

    // The procedure is still waiting for a genuine answer
    let out = test.process(ue.security_mode_complete());
    let NasMessage::AttachAccept(_) = ue.expect_single(&out) else {
        panic!("expected attach accept");
    };
}

#[test]
fn test_tampered_uplink_keeps_registration() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);
    ue.attach(&mut test);
    test.gtpc.take_calls();

    let req = ue.detach_request(false);
    let mut detach = ue.uplink(req.into());
    flip_last_bit(&mut detach);
    assert!(test.process(detach).is_empty());
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Registered));
    assert!(test.gtpc.take_calls().is_empty());
}

#[test]
fn test_stale_uplink_transport_dropped() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);
    ue.attach(&mut test);
    test.gtpc.take_calls();

    // Protected at one COUNT, delivered after a later one
    let req = ue.detach_request(false);
    let stale = ue.uplink(req.into());
    let status = EmmStatus { emm_cause: EmmCause::ProtocolErrorUnspecified };
    assert!(test.process(ue.uplink(status.into())).is_empty());

    assert!(test.process(stale).is_empty());
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Registered));
    assert!(test.gtpc.take_calls().is_empty());

    let req = ue.detach_request(false);
    let out = test.process(ue.uplink(req.into()));
    let NasMessage::DetachAccept(_) = ue.expect_single(&out) else {
        panic!("expected detach accept");
    };
    assert_eq!(releases(&out), vec![ReleaseCause::Detach]);
}
