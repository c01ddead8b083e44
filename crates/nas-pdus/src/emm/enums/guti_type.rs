wire_enum! {
    /// TS 24.301 9.9.3.45 GUTI type
    /// Bits: 1
    pub enum GutiType {
        Native = 0,
        Mapped = 1,
    }
}
