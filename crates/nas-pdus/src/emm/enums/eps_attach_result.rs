wire_enum! {
    /// TS 24.301 9.9.3.10 EPS attach result
    /// Bits: 3
    pub enum EpsAttachResult {
        EpsOnly = 1,
        CombinedEpsImsiAttach = 2,
    }
}
