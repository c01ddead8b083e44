wire_enum! {
    /// TS 24.008 10.5.6.12 Packet filter direction
    /// Bits: 2
    pub enum PacketFilterDirection {
        PreRel7 = 0,
        Downlink = 1,
        Uplink = 2,
        Bidirectional = 3,
    }
}
