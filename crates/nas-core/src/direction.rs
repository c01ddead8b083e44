/// Transfer direction of a NAS PDU, as used in the security algorithms' DIRECTION input
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash)]
pub enum Direction {
    /// UE to network
    Uplink,
    /// Network to UE
    Downlink,
}

impl Direction {
    /// Value of the 1-bit DIRECTION input of EEA/EIA
    #[inline]
    pub fn bit(&self) -> u8 {
        match self {
            Direction::Uplink => 0,
            Direction::Downlink => 1,
        }
    }

    #[inline]
    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Uplink => Direction::Downlink,
            Direction::Downlink => Direction::Uplink,
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Direction::Uplink => write!(f, "UL"),
            Direction::Downlink => write!(f, "DL"),
        }
    }
}
