mod common;

use nas_core::debug;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::NasMessage;
use common::{default_test_config, downlink_pdus, ComponentTest, UeSim};

const IMSI: &str = "001010000000006";

/// UE waiting in authentication, with nothing protected yet
fn authenticating(test: &mut ComponentTest) -> UeSim {
    let mut ue = UeSim::new(IMSI, 1);
    let out = test.process(ue.attach_with_imsi(false));
    let NasMessage::AuthenticationRequest(_) = ue.expect_single(&out) else {
        panic!("expected authentication request");
    };
    ue
}

fn expect_status(ue: &mut UeSim, out: &[nas_saps::SapMsg]) -> EmmCause {
    let NasMessage::EmmStatus(status) = ue.expect_single(out) else {
        panic!("expected EMM status");
    };
    status.emm_cause
}

#[test]
fn test_unknown_message_type() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = authenticating(&mut test);

    let out = test.process(ue.uplink_raw(vec![0x07, 0x7F]));
    assert_eq!(expect_status(&mut ue, &out), EmmCause::MessageTypeNonExistent);
}

#[test]
fn test_truncated_message() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = authenticating(&mut test);

    // Identity response without its mobile identity
    let out = test.process(ue.uplink_raw(vec![0x07, 0x56]));
    assert_eq!(expect_status(&mut ue, &out), EmmCause::InvalidMandatoryInformation);
}

#[test]
fn test_truncated_initial_message() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.initial_message(vec![0x07, 0x41], None));
    assert_eq!(expect_status(&mut ue, &out), EmmCause::InvalidMandatoryInformation);
    assert!(test.registry.is_empty());
}

#[test]
fn test_malformed_esm_gets_no_emm_status() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let ue = authenticating(&mut test);

    let out = test.process(ue.uplink_raw(vec![0x02, 0x01, 0xD0]));
    assert!(downlink_pdus(&out).is_empty());
}

#[test]
fn test_unprotected_message_discarded_once_secured() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);
    ue.attach(&mut test);

    // EMM status is not among the messages a UE may send in the clear
    let status = nas_pdus::emm::pdus::emm_status::EmmStatus { emm_cause: EmmCause::ProtocolErrorUnspecified };
    let out = test.process(ue.uplink_plain(status.into()));
    assert!(out.is_empty());
}
