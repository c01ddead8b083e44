wire_enum! {
    /// TS 24.301 9.9.3.25A Paging identity
    /// Bits: 1
    pub enum PagingIdentity {
        Imsi = 0,
        Tmsi = 1,
    }
}
