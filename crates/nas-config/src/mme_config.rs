use std::net::Ipv4Addr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use nas_core::{MTmsi, UeId};

#[derive(Debug, Clone)]
pub struct CfgNetwork {
    /// 3 decimal digits
    pub mcc: String,
    /// 2 or 3 decimal digits
    pub mnc: String,
    pub mme_group: u16,
    pub mme_code: u8,
    pub tac: u16,
    pub full_network_name: String,
    pub short_network_name: String,
}

impl CfgNetwork {
    pub fn mcc_digits(&self) -> Vec<u8> {
        digits(&self.mcc)
    }

    pub fn mnc_digits(&self) -> Vec<u8> {
        digits(&self.mnc)
    }
}

fn digits(s: &str) -> Vec<u8> {
    s.chars().filter_map(|c| c.to_digit(10)).map(|d| d as u8).collect()
}

#[derive(Debug, Clone)]
pub struct CfgPdn {
    pub apn: String,
    pub dns: Ipv4Addr,
}

impl Default for CfgPdn {
    fn default() -> Self {
        Self {
            apn: "internet".to_string(),
            dns: Ipv4Addr::new(8, 8, 8, 8),
        }
    }
}

/// NAS security policy. Algorithms are stored as their 3-bit identifiers, in order of preference.
#[derive(Debug, Clone)]
pub struct CfgSecurity {
    pub integrity: Vec<u8>,
    pub ciphering: Vec<u8>,
    pub allow_guti_attach_without_auth: bool,
}

impl Default for CfgSecurity {
    fn default() -> Self {
        Self {
            integrity: vec![2, 0],
            ciphering: vec![0, 2],
            allow_guti_attach_without_auth: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CfgTimers {
    pub t3413: Duration,
    pub t3422: Duration,
    pub t3450: Duration,
    pub t3460: Duration,
    pub t3470: Duration,
    pub t3489: Duration,
    pub max_retransmissions: u8,
    /// Periodic TAU timer value signalled to the UE
    pub t3412_minutes: u8,
}

impl Default for CfgTimers {
    fn default() -> Self {
        Self {
            t3413: Duration::from_millis(2000),
            t3422: Duration::from_millis(6000),
            t3450: Duration::from_millis(6000),
            t3460: Duration::from_millis(6000),
            t3470: Duration::from_millis(6000),
            t3489: Duration::from_millis(4000),
            max_retransmissions: 4,
            t3412_minutes: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MmeConfig {
    pub debug_log: Option<String>,
    /// Number of worker threads in the keyed dispatch pool
    pub workers: usize,

    /// Network identity is REQUIRED - no default provided
    pub network: CfgNetwork,
    pub pdn: CfgPdn,
    pub security: CfgSecurity,
    pub timers: CfgTimers,
}

impl MmeConfig {
    pub fn new(mcc: &str, mnc: &str, tac: u16) -> Self {
        MmeConfig {
            debug_log: None,
            workers: default_workers(),
            network: CfgNetwork {
                mcc: mcc.to_string(),
                mnc: mnc.to_string(),
                mme_group: 1,
                mme_code: 1,
                tac,
                full_network_name: "Software Radio Systems RAN".to_string(),
                short_network_name: "SRS RAN".to_string(),
            },
            pdn: CfgPdn::default(),
            security: CfgSecurity::default(),
            timers: CfgTimers::default(),
        }
    }

    /// Validate that all required configuration fields are properly set.
    pub fn validate(&self) -> Result<(), String> {
        let net = &self.network;
        if net.mcc.len() != 3 || !net.mcc.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("network.mcc must be 3 decimal digits, got {:?}", net.mcc));
        }
        if !(2..=3).contains(&net.mnc.len()) || !net.mnc.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("network.mnc must be 2 or 3 decimal digits, got {:?}", net.mnc));
        }
        if net.full_network_name.is_empty() || net.short_network_name.is_empty() {
            return Err("network names must not be empty".to_string());
        }
        if self.pdn.apn.is_empty() {
            return Err("pdn.apn must not be empty".to_string());
        }
        if self.pdn.apn.split('.').any(|label| label.is_empty() || label.len() > 63) {
            return Err(format!("pdn.apn has an invalid label: {:?}", self.pdn.apn));
        }
        if self.security.integrity.is_empty() {
            return Err("security.integrity must list at least one algorithm".to_string());
        }
        if self.security.ciphering.is_empty() {
            return Err("security.ciphering must list at least one algorithm".to_string());
        }
        if self.security.integrity.iter().chain(self.security.ciphering.iter()).any(|a| *a > 7) {
            return Err("security algorithm identifiers must be in 0..=7".to_string());
        }
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if self.timers.t3412_minutes > 186 {
            return Err("timers.t3412_minutes must be at most 186".to_string());
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn default_workers() -> usize {
    4
}

/// Mutable, stack-editable state (lock-protected).
#[derive(Debug, Clone)]
pub struct MmeState {
    pub next_m_tmsi: MTmsi,
    pub next_ue_id: UeId,
}

impl Default for MmeState {
    fn default() -> Self {
        Self {
            next_m_tmsi: 1,
            next_ue_id: 1,
        }
    }
}

impl MmeState {
    /// Allocate a fresh M-TMSI. 0xFFFFFFFF is never handed out.
    pub fn alloc_m_tmsi(&mut self) -> MTmsi {
        let v = self.next_m_tmsi;
        self.next_m_tmsi = match self.next_m_tmsi.wrapping_add(1) {
            0xFFFF_FFFF | 0 => 1,
            n => n,
        };
        v
    }

    pub fn alloc_ue_id(&mut self) -> UeId {
        let v = self.next_ue_id;
        self.next_ue_id = self.next_ue_id.wrapping_add(1).max(1);
        v
    }
}

/// Global shared configuration: immutable config + mutable state.
#[derive(Clone)]
pub struct SharedConfig {
    /// Read-only configuration (immutable after construction).
    cfg: Arc<MmeConfig>,
    /// Mutable state guarded with RwLock
    state: Arc<RwLock<MmeState>>,
}

impl SharedConfig {
    pub fn from_config(cfg: MmeConfig) -> Result<Self, String> {
        Self::from_parts(cfg, MmeState::default())
    }

    pub fn from_parts(cfg: MmeConfig, state: MmeState) -> Result<Self, String> {
        // Check config for validity before returning the SharedConfig object
        cfg.validate()?;
        Ok(Self {
            cfg: Arc::new(cfg),
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<MmeConfig> {
        Arc::clone(&self.cfg)
    }

    /// Read guard for mutable state.
    pub fn state_read(&self) -> std::sync::RwLockReadGuard<'_, MmeState> {
        self.state.read().expect("MmeState RwLock poisoned")
    }

    /// Write guard for mutable state.
    pub fn state_write(&self) -> std::sync::RwLockWriteGuard<'_, MmeState> {
        self.state.write().expect("MmeState RwLock poisoned")
    }
}
