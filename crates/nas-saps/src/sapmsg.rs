use core::fmt::Display;

use nas_core::Sap;
use nas_core::nas_entities::NasEntity;

use crate::control::MmeTimerExpiry;
use crate::core_network::*;
use crate::s1ap::*;


/// Exhaustive list of primitives for use in the SapMsg struct
#[derive(Debug)]
pub enum SapMsgInner {
    // S1AP -> NAS
    S1apInitialUeMessage(S1apInitialUeMessage),
    S1apUplinkNasTransport(S1apUplinkNasTransport),
    S1apInitialContextSetupResponse(S1apInitialContextSetupResponse),
    S1apUeContextReleased(S1apUeContextReleased),

    // NAS -> S1AP
    S1apDownlinkNasTransport(S1apDownlinkNasTransport),
    S1apInitialContextSetupRequest(S1apInitialContextSetupRequest),
    S1apUeContextReleaseCommand(S1apUeContextReleaseCommand),
    S1apPaging(S1apPaging),

    // GTP-C / HSS <-> NAS
    GtpcDownlinkDataNotification(GtpcDownlinkDataNotification),
    GtpcPagingFailed(GtpcPagingFailed),
    HssCancelLocation(HssCancelLocation),

    // Control
    MmeTimerExpiry(MmeTimerExpiry),
}

impl Display for SapMsgInner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SapMsgInner::S1apInitialUeMessage(_) => write!(f, "S1apInitialUeMessage"),
            SapMsgInner::S1apUplinkNasTransport(_) => write!(f, "S1apUplinkNasTransport"),
            SapMsgInner::S1apInitialContextSetupResponse(_) => write!(f, "S1apInitialContextSetupResponse"),
            SapMsgInner::S1apUeContextReleased(_) => write!(f, "S1apUeContextReleased"),
            SapMsgInner::S1apDownlinkNasTransport(_) => write!(f, "S1apDownlinkNasTransport"),
            SapMsgInner::S1apInitialContextSetupRequest(_) => write!(f, "S1apInitialContextSetupRequest"),
            SapMsgInner::S1apUeContextReleaseCommand(_) => write!(f, "S1apUeContextReleaseCommand"),
            SapMsgInner::S1apPaging(_) => write!(f, "S1apPaging"),
            SapMsgInner::GtpcDownlinkDataNotification(_) => write!(f, "GtpcDownlinkDataNotification"),
            SapMsgInner::GtpcPagingFailed(_) => write!(f, "GtpcPagingFailed"),
            SapMsgInner::HssCancelLocation(_) => write!(f, "HssCancelLocation"),
            SapMsgInner::MmeTimerExpiry(_) => write!(f, "MmeTimerExpiry"),
        }
    }
}

#[derive(Debug)]
pub struct SapMsg {
    pub sap: Sap,
    pub src: NasEntity,
    pub dest: NasEntity,
    pub msg: SapMsgInner,
}

impl SapMsg {
    pub fn new(sap: Sap, src: NasEntity, dest: NasEntity, msg: SapMsgInner) -> Self {
        Self { sap, src, dest, msg }
    }

    pub fn get_source(&self) -> &NasEntity {
        &self.src
    }
    pub fn get_dest(&self) -> &NasEntity {
        &self.dest
    }
    pub fn get_sap(&self) -> &Sap {
        &self.sap
    }

    /// MME-UE-S1AP-ID this primitive refers to, if it is UE-associated on S1
    pub fn mme_ue_s1ap_id(&self) -> Option<u32> {
        match &self.msg {
            SapMsgInner::S1apInitialUeMessage(m) => Some(m.ids.mme_ue_s1ap_id),
            SapMsgInner::S1apUplinkNasTransport(m) => Some(m.ids.mme_ue_s1ap_id),
            SapMsgInner::S1apInitialContextSetupResponse(m) => Some(m.ids.mme_ue_s1ap_id),
            SapMsgInner::S1apUeContextReleased(m) => Some(m.ids.mme_ue_s1ap_id),
            SapMsgInner::S1apDownlinkNasTransport(m) => Some(m.ids.mme_ue_s1ap_id),
            SapMsgInner::S1apInitialContextSetupRequest(m) => Some(m.ids.mme_ue_s1ap_id),
            SapMsgInner::S1apUeContextReleaseCommand(m) => Some(m.ids.mme_ue_s1ap_id),
            _ => None,
        }
    }
}
