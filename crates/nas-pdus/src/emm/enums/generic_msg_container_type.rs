wire_enum_open! {
    /// TS 24.301 9.9.3.42 Generic message container type
    /// Bits: 8
    pub enum GenericMsgContainerType {
        Lpp = 1,
        LocationServices = 2,
    }
}
