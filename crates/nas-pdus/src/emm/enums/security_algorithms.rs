wire_enum! {
    /// TS 24.301 9.9.3.23 Type of ciphering algorithm
    /// Bits: 3
    pub enum CipheringAlgorithm {
        Eea0 = 0,
        Eea1 = 1,
        Eea2 = 2,
        Eea3 = 3,
        Eea4 = 4,
        Eea5 = 5,
        Eea6 = 6,
        Eea7 = 7,
    }
}

wire_enum! {
    /// TS 24.301 9.9.3.23 Type of integrity protection algorithm
    /// Bits: 3
    pub enum IntegrityAlgorithm {
        Eia0 = 0,
        Eia1 = 1,
        Eia2 = 2,
        Eia3 = 3,
        Eia4 = 4,
        Eia5 = 5,
        Eia6 = 6,
        Eia7 = 7,
    }
}
