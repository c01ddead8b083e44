wire_enum! {
    /// TS 24.008 10.5.6.12 TFT operation code
    /// Bits: 3
    pub enum TftOperationCode {
        Ignore = 0,
        CreateNewTft = 1,
        DeleteExistingTft = 2,
        AddPacketFilters = 3,
        ReplacePacketFilters = 4,
        DeletePacketFilters = 5,
        NoTftOperation = 6,
        Reserved = 7,
    }
}
