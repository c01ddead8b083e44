wire_enum_open! {
    /// TS 24.301 9.9.3.0A Additional update result
    /// Bits: 2
    pub enum AdditionalUpdateResult {
        NoAdditionalInformation = 0,
        CsFallbackNotPreferred = 1,
        SmsOnly = 2,
    }
}

wire_enum! {
    /// TS 24.301 9.9.3.0B Additional update type
    /// Bits: 1
    pub enum AdditionalUpdateType {
        NoAdditionalInformation = 0,
        SmsOnly = 1,
    }
}
