//! In-process stand-ins for the HSS and the serving gateway, so the MME can run without
//! any core network around it

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Mutex, PoisonError};

use nas_core::{Ebi, Fteid, Imsi};
use nas_entities::collaborators::{
    AuthVector, CollaboratorError, GtpcInterface, HssInterface, SessionInfo, SubscriptionData,
};

/// Hands out random vectors to any subscriber of the home PLMN
pub struct DemoHss {
    home_prefix: String,
    qci: u8,
}

impl DemoHss {
    pub fn new(mcc: &str, mnc: &str) -> Self {
        Self { home_prefix: format!("{}{}", mcc, mnc), qci: 9 }
    }

    fn check(&self, imsi: Imsi) -> Result<(), CollaboratorError> {
        if imsi.to_string().starts_with(&self.home_prefix) {
            Ok(())
        } else {
            Err(CollaboratorError::UnknownSubscriber { imsi })
        }
    }
}

impl HssInterface for DemoHss {
    fn get_authentication_vector(&self, imsi: Imsi) -> Result<AuthVector, CollaboratorError> {
        self.check(imsi)?;
        tracing::debug!("hss: vector for {}", imsi);
        Ok(AuthVector {
            rand: rand::random(),
            autn: rand::random(),
            xres: rand::random::<[u8; 8]>().to_vec(),
            ck: rand::random(),
            ik: rand::random(),
        })
    }

    fn resync(&self, imsi: Imsi, _rand: &[u8; 16], _auts: &[u8; 14]) -> Result<(), CollaboratorError> {
        self.check(imsi)?;
        tracing::info!("hss: resync for {}", imsi);
        Ok(())
    }

    fn update_location(&self, imsi: Imsi) -> Result<SubscriptionData, CollaboratorError> {
        self.check(imsi)?;
        Ok(SubscriptionData { qci: self.qci })
    }
}

struct GatewayState {
    next_ue_ip: u32,
    next_teid: u32,
    sessions: HashMap<Imsi, SessionInfo>,
}

/// Gateway allocating UE addresses from a /16 and tunnel ids from a counter
pub struct DemoGtpc {
    sgw_ip: Ipv4Addr,
    pool_base: Ipv4Addr,
    state: Mutex<GatewayState>,
}

impl DemoGtpc {
    pub fn new(sgw_ip: Ipv4Addr, pool_base: Ipv4Addr) -> Self {
        Self {
            sgw_ip,
            pool_base,
            state: Mutex::new(GatewayState { next_ue_ip: 2, next_teid: 1, sessions: HashMap::new() }),
        }
    }

    pub fn session(&self, imsi: Imsi) -> Option<SessionInfo> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).sessions.get(&imsi).copied()
    }
}

impl GtpcInterface for DemoGtpc {
    fn create_session(&self, imsi: Imsi, ebi: Ebi, apn: &str) -> Result<SessionInfo, CollaboratorError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = state.sessions.get(&imsi) {
            tracing::debug!("gtpc: {} already has a session, reusing it", imsi);
            return Ok(*existing);
        }
        if state.next_ue_ip > 0xFFFE {
            return Err(CollaboratorError::Rejected { service: "sgw", cause: "address pool exhausted".to_string() });
        }
        let ue_ipv4 = Ipv4Addr::from(u32::from(self.pool_base) + state.next_ue_ip);
        state.next_ue_ip += 1;
        let teid = state.next_teid;
        state.next_teid = state.next_teid.wrapping_add(2).max(1);

        let session = SessionInfo {
            ue_ipv4,
            sgw_s1u: Fteid { teid, ipv4: self.sgw_ip },
            sgw_ctrl_teid: teid + 1,
        };
        tracing::info!("gtpc: session for {} bearer {} on {:?}, ue {}", imsi, ebi, apn, ue_ipv4);
        state.sessions.insert(imsi, session);
        Ok(session)
    }

    fn modify_bearer(&self, imsi: Imsi, ebi: Ebi, enb_s1u: Fteid) -> Result<(), CollaboratorError> {
        if self.session(imsi).is_none() {
            return Err(CollaboratorError::Rejected { service: "sgw", cause: format!("no session for {}", imsi) });
        }
        tracing::info!("gtpc: bearer {} of {} downlink to {}", ebi, imsi, enb_s1u);
        Ok(())
    }

    fn release_access_bearers(&self, imsi: Imsi) -> Result<(), CollaboratorError> {
        tracing::info!("gtpc: release access bearers of {}", imsi);
        Ok(())
    }

    fn delete_session(&self, imsi: Imsi) -> Result<(), CollaboratorError> {
        let removed = self.state.lock().unwrap_or_else(PoisonError::into_inner).sessions.remove(&imsi);
        match removed {
            Some(s) => tracing::info!("gtpc: deleted session of {}, released {}", imsi, s.ue_ipv4),
            None => tracing::debug!("gtpc: no session of {} to delete", imsi),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hss_rejects_roamers() {
        let hss = DemoHss::new("001", "01");
        let home: Imsi = "001010000000001".parse().unwrap();
        let roamer: Imsi = "262010000000001".parse().unwrap();
        let v = hss.get_authentication_vector(home).unwrap();
        assert_eq!(v.xres.len(), 8);
        assert_eq!(
            hss.get_authentication_vector(roamer),
            Err(CollaboratorError::UnknownSubscriber { imsi: roamer })
        );
    }

    #[test]
    fn test_gateway_allocations() {
        let gw = DemoGtpc::new(Ipv4Addr::new(127, 0, 0, 2), Ipv4Addr::new(10, 45, 0, 0));
        let a: Imsi = "001010000000001".parse().unwrap();
        let b: Imsi = "001010000000002".parse().unwrap();

        let sa = gw.create_session(a, 5, "internet").unwrap();
        let sb = gw.create_session(b, 5, "internet").unwrap();
        assert_eq!(sa.ue_ipv4, Ipv4Addr::new(10, 45, 0, 2));
        assert_eq!(sb.ue_ipv4, Ipv4Addr::new(10, 45, 0, 3));
        assert_ne!(sa.sgw_s1u.teid, sb.sgw_s1u.teid);
        assert_eq!(gw.create_session(a, 5, "internet").unwrap(), sa);

        assert!(gw.modify_bearer(a, 5, Fteid { teid: 7, ipv4: Ipv4Addr::new(10, 0, 0, 1) }).is_ok());
        gw.delete_session(a).unwrap();
        assert!(gw.session(a).is_none());
        assert!(gw.modify_bearer(a, 5, Fteid { teid: 7, ipv4: Ipv4Addr::new(10, 0, 0, 1) }).is_err());
    }
}
