wire_enum! {
    /// TS 24.301 9.9.3.5 CSFB response
    /// Bits: 3
    pub enum CsfbResponse {
        Rejected = 0,
        Accepted = 1,
    }
}
