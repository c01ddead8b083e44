wire_enum_open! {
    /// TS 24.008 10.5.5.9 Identity type 2. Unused values are read as IMSI.
    /// Bits: 3
    pub enum IdentityType2 {
        Imsi = 1,
        Imei = 2,
        Imeisv = 3,
        Tmsi = 4,
    }
}
