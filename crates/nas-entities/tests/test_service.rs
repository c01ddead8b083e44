mod common;

use std::time::Duration;

use nas_core::{debug, NasEntity, Sap};
use nas_entities::mme::components::ue_context::{EcmState, EmmState};
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::{encode_message, NasMessage};
use nas_saps::core_network::GtpcDownlinkDataNotification;
use nas_saps::s1ap::ReleaseCause;
use nas_saps::{SapMsg, SapMsgInner};
use nas_security::build_service_request;
use common::ue_sim::ENB_S1U;
use common::{default_test_config, downlink_pdus, releases, ComponentTest, GtpcCall, UeSim};

const IMSI: &str = "001010000000002";

/// Attached UE whose connection was released again
fn idle_ue(test: &mut ComponentTest) -> UeSim {
    let mut ue = UeSim::new(IMSI, 1);
    ue.attach(test);
    let out = test.process(ue.context_released());
    assert!(out.is_empty());
    test.gtpc.take_calls();
    ue
}

fn downlink_data(ue: &UeSim) -> SapMsg {
    let prim = GtpcDownlinkDataNotification { imsi: ue.imsi, ebi: 5 };
    SapMsg::new(Sap::GtpcNas, NasEntity::Gtpc, NasEntity::Mme, SapMsgInner::GtpcDownlinkDataNotification(prim))
}

fn pagings(msgs: &[SapMsg]) -> Vec<u32> {
    msgs.iter()
        .filter_map(|m| match &m.msg {
            SapMsgInner::S1apPaging(p) => Some(p.m_tmsi),
            _ => None,
        })
        .collect()
}

#[test]
fn test_release_keeps_registration() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);
    ue.attach(&mut test);
    test.gtpc.take_calls();

    let out = test.process(ue.context_released());
    assert!(out.is_empty());
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Registered));
    assert_eq!(test.ecm_state(ue.imsi), Some(EcmState::Idle));
    assert_eq!(test.gtpc.take_calls(), vec![GtpcCall::ReleaseAccessBearers { imsi: ue.imsi }]);
    assert!(test.registry.find_by_s1ap(ue.ids.mme_ue_s1ap_id).is_none());
}

#[test]
fn test_service_request_restores_bearers() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = idle_ue(&mut test);

    ue.new_connection(2);
    let out = test.process(ue.service_request());
    assert!(downlink_pdus(&out).is_empty());
    let setup = out
        .iter()
        .find_map(|m| match &m.msg {
            SapMsgInner::S1apInitialContextSetupRequest(p) => Some(p),
            _ => None,
        })
        .expect("initial context setup");
    assert_eq!(setup.ids, ue.ids);
    assert_eq!(setup.erabs.len(), 1);
    assert_eq!(setup.erabs[0].ebi, 5);
    assert_eq!(test.ecm_state(ue.imsi), Some(EcmState::Connected));

    let out = test.process(ue.context_setup_response(&[5]));
    assert!(out.is_empty());
    assert_eq!(test.gtpc.take_calls(), vec![GtpcCall::ModifyBearer { imsi: ue.imsi, ebi: 5, enb_s1u: ENB_S1U }]);
}

#[test]
fn test_service_request_bad_mac_rejected() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = idle_ue(&mut test);

    ue.new_connection(2);
    let mut req = build_service_request(ue.security.as_mut().unwrap()).unwrap();
    req.short_mac ^= 0xFFFF;
    let m_tmsi = ue.guti.map(|g| g.m_tmsi);
    let out = test.process(ue.initial_message(encode_message(&req.into()).unwrap(), m_tmsi));

    let NasMessage::ServiceReject(reject) = ue.expect_single(&out) else {
        panic!("expected service reject");
    };
    assert_eq!(reject.emm_cause, EmmCause::UeIdentityCannotBeDerived);
    assert_eq!(releases(&out), vec![ReleaseCause::NormalRelease]);

    // The security context is gone, the registration itself stays
    let handle = test.registry.find_by_imsi(ue.imsi).unwrap();
    assert!(handle.lock().unwrap().security.is_none());
    assert!(test.gtpc.take_calls().is_empty());
}

#[test]
fn test_service_request_unknown_tmsi_rejected() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = idle_ue(&mut test);

    ue.new_connection(2);
    if let Some(guti) = ue.guti.as_mut() {
        guti.m_tmsi = 0x00DE_AD00;
    }
    let out = test.process(ue.service_request());
    let NasMessage::ServiceReject(reject) = ue.expect_single(&out) else {
        panic!("expected service reject");
    };
    assert_eq!(reject.emm_cause, EmmCause::ImplicitlyDetached);
    assert_eq!(releases(&out).len(), 1);
    assert_eq!(test.ecm_state(ue.imsi), Some(EcmState::Idle));
}

#[test]
fn test_paging_answered_by_service_request() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = idle_ue(&mut test);
    let m_tmsi = ue.guti.unwrap().m_tmsi;

    let out = test.process(downlink_data(&ue));
    assert_eq!(pagings(&out), vec![m_tmsi]);

    // A second notification while paging runs does not page again
    let out = test.process(downlink_data(&ue));
    assert!(pagings(&out).is_empty());

    ue.new_connection(2);
    let out = test.process(ue.service_request());
    assert_eq!(out.len(), 1);

    // Paging supervision ended with the service request
    let t3413 = test.config.config().timers.t3413;
    let out = test.advance(t3413 * 3);
    assert!(out.is_empty());
}

#[test]
fn test_paging_failure_reported() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let ue = idle_ue(&mut test);
    let max = test.config.config().timers.max_retransmissions as usize;
    let step = test.config.config().timers.t3413 + Duration::from_millis(100);

    let out = test.process(downlink_data(&ue));
    assert_eq!(pagings(&out).len(), 1);

    let mut repaged = 0;
    for _ in 0..max {
        let out = test.advance(step);
        repaged += pagings(&out).len();
        assert!(out.iter().all(|m| !matches!(m.msg, SapMsgInner::GtpcPagingFailed(_))));
    }
    assert_eq!(repaged, max);

    let out = test.advance(step);
    assert!(pagings(&out).is_empty());
    let failed: Vec<_> = out
        .iter()
        .filter_map(|m| match &m.msg {
            SapMsgInner::GtpcPagingFailed(p) => Some(p.imsi),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![ue.imsi]);
    assert_eq!(test.emm_state(ue.imsi), Some(EmmState::Registered));
}

#[test]
fn test_downlink_data_for_connected_ue_ignored() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    let mut ue = UeSim::new(IMSI, 1);
    ue.attach(&mut test);

    let out = test.process(downlink_data(&ue));
    assert!(out.is_empty());
}
