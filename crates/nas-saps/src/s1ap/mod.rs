// Primitives exchanged with the S1AP transport. Only the parts of the S1AP procedures
// that carry or are triggered by NAS are represented.
use nas_core::{Ebi, Fteid, MTmsi, S1apUeIds};


/// Tracking area the eNodeB reported with the UE-associated message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedTai {
    /// PLMN identity as encoded on the wire (3 octets BCD)
    pub plmn: [u8; 3],
    pub tac: u16,
}

/// First NAS PDU on a new UE-associated signalling connection
#[derive(Debug)]
pub struct S1apInitialUeMessage {
    pub ids: S1apUeIds,
    pub nas_pdu: Vec<u8>,
    pub tai: ReportedTai,
    /// M-TMSI part of the S-TMSI, present when the UE identified itself with it
    pub m_tmsi: Option<MTmsi>,
}

/// NAS PDU on an established UE-associated connection
#[derive(Debug)]
pub struct S1apUplinkNasTransport {
    pub ids: S1apUeIds,
    pub nas_pdu: Vec<u8>,
}

/// NAS PDU towards the UE
#[derive(Debug)]
pub struct S1apDownlinkNasTransport {
    pub ids: S1apUeIds,
    pub nas_pdu: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErabToSetup {
    pub ebi: Ebi,
    pub qci: u8,
    pub sgw_s1u: Fteid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErabSetupResult {
    pub ebi: Ebi,
    pub enb_s1u: Fteid,
}

/// Establishes the radio bearers and AS security for a UE, optionally piggybacking a NAS PDU
#[derive(Debug)]
pub struct S1apInitialContextSetupRequest {
    pub ids: S1apUeIds,
    pub k_enb: [u8; 32],
    /// EEA capability bits (EEA0..EEA7, MSB first) as advertised by the UE
    pub ue_eea_caps: u8,
    /// EIA capability bits (EIA0..EIA7, MSB first) as advertised by the UE
    pub ue_eia_caps: u8,
    pub erabs: Vec<ErabToSetup>,
    pub nas_pdu: Option<Vec<u8>>,
}

#[derive(Debug)]
pub struct S1apInitialContextSetupResponse {
    pub ids: S1apUeIds,
    pub erabs: Vec<ErabSetupResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseCause {
    NormalRelease,
    Detach,
    AuthenticationFailure,
    Unspecified,
}

#[derive(Debug)]
pub struct S1apUeContextReleaseCommand {
    pub ids: S1apUeIds,
    pub cause: ReleaseCause,
}

/// The UE-associated connection is gone (release complete or radio loss)
#[derive(Debug)]
pub struct S1apUeContextReleased {
    pub ids: S1apUeIds,
}

#[derive(Debug)]
pub struct S1apPaging {
    pub m_tmsi: MTmsi,
    pub mme_code: u8,
    pub tac: u16,
}
