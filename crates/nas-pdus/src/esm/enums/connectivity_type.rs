wire_enum_open! {
    /// TS 24.301 9.9.4.2A Connectivity type
    /// Bits: 4
    pub enum ConnectivityType {
        NotIndicated = 0,
        LocalIpAccess = 1,
    }
}
