wire_enum_open! {
    /// TS 24.301 9.9.4.10 PDN type
    /// Bits: 3
    pub enum PdnType {
        Ipv4 = 1,
        Ipv6 = 2,
        Ipv4v6 = 3,
        NonIp = 5,
    }
}
