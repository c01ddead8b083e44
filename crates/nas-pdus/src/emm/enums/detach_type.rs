wire_enum_open! {
    /// TS 24.301 9.9.3.7 Type of detach, UE to network direction.
    /// Unused values are read as combined EPS/IMSI detach.
    /// Bits: 3
    pub enum UeDetachType {
        EpsDetach = 1,
        ImsiDetach = 2,
        CombinedEpsImsiDetach = 3,
    }
}

wire_enum_open! {
    /// TS 24.301 9.9.3.7 Type of detach, network to UE direction.
    /// Unused values are read as re-attach not required.
    /// Bits: 3
    pub enum NetworkDetachType {
        ReAttachRequired = 1,
        ReAttachNotRequired = 2,
        ImsiDetach = 3,
    }
}
