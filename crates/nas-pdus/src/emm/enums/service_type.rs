wire_enum_open! {
    /// TS 24.301 9.9.3.27 Service type
    /// Bits: 4
    pub enum ServiceType {
        MobileOriginatingCsFallback = 0,
        MobileTerminatingCsFallback = 1,
        MobileOriginatingCsFallbackEmergency = 2,
        PacketServicesViaS1 = 8,
    }
}
