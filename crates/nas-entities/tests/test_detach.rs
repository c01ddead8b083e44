mod common;

use std::time::Duration;

use nas_core::{debug, NasEntity, Sap};
use nas_pdus::emm::enums::detach_type::NetworkDetachType;
use nas_pdus::emm::pdus::header_only::DetachAccept;
use nas_pdus::NasMessage;
use nas_saps::core_network::HssCancelLocation;
use nas_saps::s1ap::ReleaseCause;
use nas_saps::{SapMsg, SapMsgInner};
use common::{default_test_config, downlink_pdus, releases, ComponentTest, GtpcCall, UeSim};

const IMSI: &str = "001010000000003";

fn cancel_location(ue: &UeSim) -> SapMsg {
    let prim = HssCancelLocation { imsi: ue.imsi };
    SapMsg::new(Sap::HssNas, NasEntity::Hss, NasEntity::Mme, SapMsgInner::HssCancelLocation(prim))
}

fn attached(test: &mut ComponentTest) -> UeSim {
    let mut ue = UeSim::new(IMSI, 1);
    ue.attach(test);
    test.gtpc.take_calls();
    ue
}

#[test]
fn test_detach_connected_ue() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = attached(&mut test);

    let req = ue.detach_request(false);
    let out = test.process(ue.uplink(req.into()));
    let NasMessage::DetachAccept(_) = ue.expect_single(&out) else {
        panic!("expected detach accept");
    };
    assert_eq!(releases(&out), vec![ReleaseCause::Detach]);
    assert_eq!(test.gtpc.take_calls(), vec![GtpcCall::DeleteSession { imsi: ue.imsi }]);
    assert!(test.registry.find_by_imsi(ue.imsi).is_none());
    assert!(test.registry.is_empty());

    // S1AP confirming the release finds nothing left to clean up
    let out = test.process(ue.context_released());
    assert!(out.is_empty());
}

#[test]
fn test_switch_off_from_idle() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = attached(&mut test);
    test.process(ue.context_released());
    test.gtpc.take_calls();

    ue.new_connection(2);
    let out = test.process(ue.initial_detach(true));
    assert!(downlink_pdus(&out).is_empty());
    assert_eq!(releases(&out), vec![ReleaseCause::Detach]);
    assert_eq!(test.gtpc.take_calls(), vec![GtpcCall::DeleteSession { imsi: ue.imsi }]);
    assert!(test.registry.is_empty());
}

#[test]
fn test_detach_from_unknown_ue_accepted() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);

    let out = test.process(ue.initial_detach(false));
    let NasMessage::DetachAccept(_) = ue.expect_single(&out) else {
        panic!("expected detach accept");
    };
    assert_eq!(releases(&out), vec![ReleaseCause::Detach]);
    assert!(test.gtpc.take_calls().is_empty());
}

#[test]
fn test_cancel_location_connected_ue() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = attached(&mut test);

    let out = test.process(cancel_location(&ue));
    let NasMessage::DetachRequestUeTerminated(req) = ue.expect_single(&out) else {
        panic!("expected network detach request");
    };
    assert_eq!(req.detach_type, NetworkDetachType::ReAttachNotRequired);
    assert!(releases(&out).is_empty());
    assert!(test.registry.find_by_imsi(ue.imsi).is_some());

    let out = test.process(ue.uplink(DetachAccept.into()));
    assert!(downlink_pdus(&out).is_empty());
    assert_eq!(releases(&out), vec![ReleaseCause::Detach]);
    assert_eq!(test.gtpc.take_calls(), vec![GtpcCall::DeleteSession { imsi: ue.imsi }]);
    assert!(test.registry.is_empty());
}

#[test]
fn test_network_detach_retransmitted_then_forced() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = attached(&mut test);
    let max = test.config.config().timers.max_retransmissions as usize;
    let step = test.config.config().timers.t3422 + Duration::from_millis(100);

    let out = test.process(cancel_location(&ue));
    ue.expect_single(&out);

    for _ in 0..max {
        let out = test.advance(step);
        let NasMessage::DetachRequestUeTerminated(_) = ue.expect_single(&out) else {
            panic!("expected retransmitted detach request");
        };
        assert!(releases(&out).is_empty());
    }

    let out = test.advance(step);
    assert!(downlink_pdus(&out).is_empty());
    assert_eq!(releases(&out), vec![ReleaseCause::Detach]);
    assert_eq!(test.gtpc.take_calls(), vec![GtpcCall::DeleteSession { imsi: ue.imsi }]);
    assert!(test.registry.is_empty());

    // Late answer after the context is gone
    let out = test.process(ue.uplink(DetachAccept.into()));
    assert!(out.is_empty());
}

#[test]
fn test_cancel_location_idle_ue() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let ue = attached(&mut test);
    test.process(ue.context_released());
    test.gtpc.take_calls();

    let out = test.process(cancel_location(&ue));
    assert!(out.is_empty());
    assert_eq!(test.gtpc.take_calls(), vec![GtpcCall::DeleteSession { imsi: ue.imsi }]);
    assert!(test.registry.is_empty());
}

#[test]
fn test_cancel_location_unknown_subscriber_ignored() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let ue = UeSim::new(IMSI, 1);

    let out = test.process(cancel_location(&ue));
    assert!(out.is_empty());
    assert!(test.gtpc.take_calls().is_empty());
}
