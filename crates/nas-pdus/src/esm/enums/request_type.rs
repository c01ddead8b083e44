wire_enum_open! {
    /// TS 24.008 10.5.6.17 Request type
    /// Bits: 3
    pub enum RequestType {
        InitialRequest = 1,
        Handover = 2,
        Emergency = 4,
    }
}
