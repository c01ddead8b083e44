wire_enum_open! {
    /// TS 24.301 9.9.3.40 LCS indicator
    /// Bits: 8
    pub enum LcsIndicator {
        MobileTerminatedLocationRequest = 1,
    }
}
