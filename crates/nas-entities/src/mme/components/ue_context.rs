use std::collections::HashMap;
use std::net::Ipv4Addr;

use nas_core::{Ebi, Fteid, Imsi, MTmsi, S1apUeIds, UeId};
use nas_pdus::common::guti::Guti;
use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::emm::enums::eps_attach_type::EpsAttachType;
use nas_pdus::emm::fields::ue_network_capability::UeNetworkCapability;
use nas_pdus::esm::fields::pco::ProtocolConfigOptions;
use nas_saps::control::NasTimer;
use nas_security::{AuthVector, SecurityContext};

use crate::error::ProcedureError;

/// Bearer identities 5..=15
pub const MIN_EBI: Ebi = 5;
pub const MAX_EBI: Ebi = 15;
pub const MAX_BEARERS: usize = (MAX_EBI - MIN_EBI + 1) as usize;

/// EBI of the default bearer set up during attach
pub const DEFAULT_EBI: Ebi = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmmState {
    Deregistered,
    CommonProcedureInitiated,
    Registered,
    DeregisteredInitiated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcmState {
    Idle,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsmState {
    Deactivated,
    /// Activation request sent to the UE
    CtxRequested,
    /// eNodeB endpoint known, waiting for the UE to accept
    CtxSetup,
    Active,
}

/// What the UE asked for in its attach request, kept until the default bearer is set up
#[derive(Debug, Clone)]
pub struct AttachParams {
    pub attach_type: EpsAttachType,
    pub ue_network_cap: UeNetworkCapability,
    /// PTI of the PDN connectivity request
    pub pti: u8,
    pub esm_info_transfer: bool,
    pub apn: Option<String>,
    pub pco: Option<ProtocolConfigOptions>,
}

#[derive(Debug, Clone)]
pub struct EmmContext {
    pub state: EmmState,
    pub imsi: Option<Imsi>,
    pub guti: Option<Guti>,
    pub attach: Option<AttachParams>,
    pub ue_ipv4: Option<Ipv4Addr>,
    pub sgw_ctrl_teid: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct EcmContext {
    pub state: EcmState,
    pub ids: Option<S1apUeIds>,
    /// The initial context setup of the current connection was sent
    pub established_initially: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsmBearer {
    pub ebi: Ebi,
    pub state: EsmState,
    pub qci: u8,
    pub apn: String,
    pub pdn_ipv4: Option<Ipv4Addr>,
    pub sgw_s1u: Option<Fteid>,
    pub enb_s1u: Option<Fteid>,
    /// The UE accepted the activation before the eNodeB endpoint was known
    pub ue_accepted: bool,
}

impl EsmBearer {
    pub fn new(ebi: Ebi, qci: u8, apn: &str) -> Self {
        Self {
            ebi,
            state: EsmState::Deactivated,
            qci,
            apn: apn.to_string(),
            pdn_ipv4: None,
            sgw_s1u: None,
            enb_s1u: None,
            ue_accepted: false,
        }
    }
}

/// Procedure awaiting an answer from the UE
#[derive(Debug, Clone)]
pub enum PendingProcedure {
    Identity,
    Authentication { vector: AuthVector, ksi: u8, resynced: bool },
    /// The context under negotiation. It replaces the current one only once the
    /// Security Mode Complete checked out under it.
    SecurityMode { new_ctx: Box<SecurityContext> },
    EsmInformation,
    AttachAccept,
    NetworkDetach,
}

impl PendingProcedure {
    pub fn name(&self) -> &'static str {
        match self {
            PendingProcedure::Identity => "identity",
            PendingProcedure::Authentication { .. } => "authentication",
            PendingProcedure::SecurityMode { .. } => "security mode",
            PendingProcedure::EsmInformation => "ESM information",
            PendingProcedure::AttachAccept => "attach accept",
            PendingProcedure::NetworkDetach => "network detach",
        }
    }
}

/// What goes out again when a supervising timer expires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retransmit {
    /// The plain message, protected afresh with `header` so that every copy takes a new COUNT
    Nas { plain: Vec<u8>, header: SecurityHeaderType },
    Paging,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedTimer {
    pub generation: u64,
    pub retries: u8,
    pub retransmit: Retransmit,
}

/// Everything the MME knows about one UE. Events of one UE are handled one at a time by
/// whichever worker holds the context lock.
#[derive(Debug)]
pub struct UeNasContext {
    pub id: UeId,
    pub emm: EmmContext,
    pub ecm: EcmContext,
    pub bearers: Vec<EsmBearer>,
    pub security: Option<SecurityContext>,
    pub procedure: Option<PendingProcedure>,
    timers: HashMap<NasTimer, ArmedTimer>,
    timer_generation: u64,
}

impl UeNasContext {
    pub fn new(id: UeId) -> Self {
        Self {
            id,
            emm: EmmContext {
                state: EmmState::Deregistered,
                imsi: None,
                guti: None,
                attach: None,
                ue_ipv4: None,
                sgw_ctrl_teid: None,
            },
            ecm: EcmContext { state: EcmState::Idle, ids: None, established_initially: false },
            bearers: Vec::new(),
            security: None,
            procedure: None,
            timers: HashMap::new(),
            timer_generation: 0,
        }
    }

    pub fn m_tmsi(&self) -> Option<MTmsi> {
        self.emm.guti.as_ref().map(|g| g.m_tmsi)
    }

    pub fn bearer(&self, ebi: Ebi) -> Option<&EsmBearer> {
        self.bearers.iter().find(|b| b.ebi == ebi)
    }

    pub fn bearer_mut(&mut self, ebi: Ebi) -> Option<&mut EsmBearer> {
        self.bearers.iter_mut().find(|b| b.ebi == ebi)
    }

    /// Adds or replaces the bearer with the same EBI
    pub fn add_bearer(&mut self, bearer: EsmBearer) -> Result<(), ProcedureError> {
        if !(MIN_EBI..=MAX_EBI).contains(&bearer.ebi) {
            return Err(ProcedureError::InvalidBearer { ebi: bearer.ebi });
        }
        self.bearers.retain(|b| b.ebi != bearer.ebi);
        if self.bearers.len() >= MAX_BEARERS {
            return Err(ProcedureError::InvalidBearer { ebi: bearer.ebi });
        }
        self.bearers.push(bearer);
        Ok(())
    }

    pub fn active_ebis(&self) -> impl Iterator<Item = Ebi> + '_ {
        self.bearers.iter().filter(|b| b.state == EsmState::Active).map(|b| b.ebi)
    }

    /// eKSI for a fresh authentication
    pub fn next_ksi(&self) -> u8 {
        match &self.security {
            Some(sec) => (sec.ksi + 1) % 7,
            None => 0,
        }
    }

    /// Arms (or re-arms) a timer and returns its generation. Any earlier arming of the
    /// same timer becomes stale.
    pub fn arm_timer(&mut self, timer: NasTimer, retransmit: Retransmit) -> u64 {
        self.timer_generation += 1;
        let generation = self.timer_generation;
        self.timers.insert(timer, ArmedTimer { generation, retries: 0, retransmit });
        generation
    }

    pub fn stop_timer(&mut self, timer: NasTimer) -> bool {
        self.timers.remove(&timer).is_some()
    }

    pub fn timer(&self, timer: NasTimer) -> Option<&ArmedTimer> {
        self.timers.get(&timer)
    }

    pub fn timer_mut(&mut self, timer: NasTimer) -> Option<&mut ArmedTimer> {
        self.timers.get_mut(&timer)
    }

    pub fn is_timer_running(&self, timer: NasTimer) -> bool {
        self.timers.contains_key(&timer)
    }

    /// Stops all procedure timers. Paging supervision survives when `keep_paging` is set.
    pub fn stop_all_timers(&mut self, keep_paging: bool) {
        self.timers.retain(|t, _| keep_paging && *t == NasTimer::T3413);
    }
}
