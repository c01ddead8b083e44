wire_enum! {
    /// TS 24.301 9.9.3.13 EPS update result
    /// Bits: 3
    pub enum EpsUpdateResult {
        TaUpdated = 0,
        CombinedTaLaUpdated = 1,
        TaUpdatedIsrActivated = 4,
        CombinedTaLaUpdatedIsrActivated = 5,
    }
}
