wire_enum_open! {
    /// TS 24.301 9.9.3.11 EPS attach type. Unused values are read as EPS attach by the network.
    /// Bits: 3
    pub enum EpsAttachType {
        EpsAttach = 1,
        CombinedEpsImsiAttach = 2,
        EpsEmergencyAttach = 6,
    }
}
