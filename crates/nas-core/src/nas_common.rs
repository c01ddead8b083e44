/// Service access points between the NAS procedure engine and its collaborators
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sap {
    /// S1AP <-> NAS: NAS PDU transport, UE context and paging commands
    S1apNas,
    /// GTP-C -> NAS: downlink data notifications
    GtpcNas,
    /// HSS -> NAS: subscriber management notifications
    HssNas,
    /// Internal control, e.g. timer expiry
    Control,
}
