use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Mutex;

use nas_core::{Ebi, Fteid, Imsi};
use nas_entities::collaborators::{
    AuthVector, CollaboratorError, GtpcInterface, HssInterface, SessionInfo, SubscriptionData,
};

/// Deterministic vector number `seq`. The UE simulator recognises the vector by its RAND.
pub fn test_vector(seq: u8) -> AuthVector {
    AuthVector {
        rand: [seq; 16],
        autn: [0xA0 | (seq & 0x0F); 16],
        xres: vec![0x50u8.wrapping_add(seq); 8],
        ck: [0xC0 | (seq & 0x0F); 16],
        ik: [0x10u8.wrapping_add(seq); 16],
    }
}

/// HSS handing out numbered vectors. A resync moves on to the next vector.
pub struct MockHss {
    next_seq: Mutex<u8>,
    pub resyncs: Mutex<Vec<(Imsi, [u8; 14])>>,
    pub location_updates: Mutex<Vec<Imsi>>,
    pub unknown: Mutex<HashSet<Imsi>>,
    pub qci: u8,
}

impl MockHss {
    pub fn new() -> Self {
        Self {
            next_seq: Mutex::new(1),
            resyncs: Mutex::new(vec![]),
            location_updates: Mutex::new(vec![]),
            unknown: Mutex::new(HashSet::new()),
            qci: 9,
        }
    }

    pub fn remove_subscriber(&self, imsi: Imsi) {
        self.unknown.lock().unwrap().insert(imsi);
    }

    pub fn resync_count(&self) -> usize {
        self.resyncs.lock().unwrap().len()
    }
}

impl HssInterface for MockHss {
    fn get_authentication_vector(&self, imsi: Imsi) -> Result<AuthVector, CollaboratorError> {
        if self.unknown.lock().unwrap().contains(&imsi) {
            return Err(CollaboratorError::UnknownSubscriber { imsi });
        }
        Ok(test_vector(*self.next_seq.lock().unwrap()))
    }

    fn resync(&self, imsi: Imsi, _rand: &[u8; 16], auts: &[u8; 14]) -> Result<(), CollaboratorError> {
        self.resyncs.lock().unwrap().push((imsi, *auts));
        *self.next_seq.lock().unwrap() += 1;
        Ok(())
    }

    fn update_location(&self, imsi: Imsi) -> Result<SubscriptionData, CollaboratorError> {
        if self.unknown.lock().unwrap().contains(&imsi) {
            return Err(CollaboratorError::UnknownSubscriber { imsi });
        }
        self.location_updates.lock().unwrap().push(imsi);
        Ok(SubscriptionData { qci: self.qci })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GtpcCall {
    CreateSession { imsi: Imsi, ebi: Ebi, apn: String },
    ModifyBearer { imsi: Imsi, ebi: Ebi, enb_s1u: Fteid },
    ReleaseAccessBearers { imsi: Imsi },
    DeleteSession { imsi: Imsi },
}

/// Serving gateway that records every request and always succeeds
pub struct MockGtpc {
    pub calls: Mutex<Vec<GtpcCall>>,
    pub fail_create: Mutex<bool>,
}

impl MockGtpc {
    pub const UE_IPV4: Ipv4Addr = Ipv4Addr::new(172, 16, 0, 2);
    pub const SGW_S1U: Fteid = Fteid { teid: 0x0000_1001, ipv4: Ipv4Addr::new(127, 0, 0, 2) };

    pub fn new() -> Self {
        Self {
            calls: Mutex::new(vec![]),
            fail_create: Mutex::new(false),
        }
    }

    pub fn take_calls(&self) -> Vec<GtpcCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn record(&self, call: GtpcCall) {
        tracing::debug!("gtpc: {:?}", call);
        self.calls.lock().unwrap().push(call);
    }
}

impl GtpcInterface for MockGtpc {
    fn create_session(&self, imsi: Imsi, ebi: Ebi, apn: &str) -> Result<SessionInfo, CollaboratorError> {
        if *self.fail_create.lock().unwrap() {
            return Err(CollaboratorError::Unavailable { service: "sgw" });
        }
        self.record(GtpcCall::CreateSession { imsi, ebi, apn: apn.to_string() });
        Ok(SessionInfo {
            ue_ipv4: Self::UE_IPV4,
            sgw_s1u: Self::SGW_S1U,
            sgw_ctrl_teid: 0x0000_2001,
        })
    }

    fn modify_bearer(&self, imsi: Imsi, ebi: Ebi, enb_s1u: Fteid) -> Result<(), CollaboratorError> {
        self.record(GtpcCall::ModifyBearer { imsi, ebi, enb_s1u });
        Ok(())
    }

    fn release_access_bearers(&self, imsi: Imsi) -> Result<(), CollaboratorError> {
        self.record(GtpcCall::ReleaseAccessBearers { imsi });
        Ok(())
    }

    fn delete_session(&self, imsi: Imsi) -> Result<(), CollaboratorError> {
        self.record(GtpcCall::DeleteSession { imsi });
        Ok(())
    }
}
