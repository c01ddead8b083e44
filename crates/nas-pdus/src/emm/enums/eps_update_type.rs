wire_enum_open! {
    /// TS 24.301 9.9.3.14 EPS update type value
    /// Bits: 3
    pub enum EpsUpdateTypeValue {
        TaUpdating = 0,
        CombinedTaLaUpdating = 1,
        CombinedTaLaUpdatingWithImsiAttach = 2,
        PeriodicUpdating = 3,
    }
}
