// Notifications originating from the GTP-C and HSS collaborators, and indications towards them
use nas_core::{Ebi, Imsi};


/// Serving gateway has downlink data buffered for an idle UE
#[derive(Debug)]
pub struct GtpcDownlinkDataNotification {
    pub imsi: Imsi,
    pub ebi: Ebi,
}

/// Paging for a downlink data notification was abandoned
#[derive(Debug)]
pub struct GtpcPagingFailed {
    pub imsi: Imsi,
}

/// Subscriber was withdrawn; triggers a network-initiated detach
#[derive(Debug)]
pub struct HssCancelLocation {
    pub imsi: Imsi,
}
