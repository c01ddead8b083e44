use std::net::Ipv4Addr;

/// International Mobile Subscriber Identity, up to 15 decimal digits
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Imsi(pub u64);

impl Imsi {
    pub const MAX_DIGITS: usize = 15;

    /// Build from a sequence of decimal digits (most significant first).
    /// Returns None for an empty or too long sequence, or a non-decimal digit.
    pub fn from_digits(digits: &[u8]) -> Option<Self> {
        if digits.is_empty() || digits.len() > Self::MAX_DIGITS {
            return None;
        }
        let mut value = 0u64;
        for d in digits {
            if *d > 9 {
                return None;
            }
            value = value * 10 + *d as u64;
        }
        Some(Imsi(value))
    }

    /// 15 decimal digits, zero padded on the left
    pub fn to_digits(&self) -> [u8; Self::MAX_DIGITS] {
        let mut out = [0u8; Self::MAX_DIGITS];
        let mut v = self.0;
        for d in out.iter_mut().rev() {
            *d = (v % 10) as u8;
            v /= 10;
        }
        out
    }
}

impl core::fmt::Display for Imsi {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:015}", self.0)
    }
}

impl std::str::FromStr for Imsi {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Option<Vec<u8>> = s.chars().map(|c| c.to_digit(10).map(|d| d as u8)).collect();
        digits.and_then(|d| Imsi::from_digits(&d)).ok_or(())
    }
}

/// The pair of S1AP identifiers naming one UE-associated signalling connection
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct S1apUeIds {
    pub enb_ue_s1ap_id: u32,
    pub mme_ue_s1ap_id: u32,
}

impl core::fmt::Display for S1apUeIds {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "enb:{}/mme:{}", self.enb_ue_s1ap_id, self.mme_ue_s1ap_id)
    }
}

/// GTP tunnel endpoint: TEID plus transport address
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fteid {
    pub teid: u32,
    pub ipv4: Ipv4Addr,
}

impl core::fmt::Display for Fteid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:0x{:08x}", self.ipv4, self.teid)
    }
}

/// M-TMSI part of a GUTI
pub type MTmsi = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imsi_digits() {
        let imsi: Imsi = "001010123456789".parse().unwrap();
        assert_eq!(imsi.0, 1010123456789);
        assert_eq!(imsi.to_string(), "001010123456789");
        assert_eq!(imsi.to_digits(), [0, 0, 1, 0, 1, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(Imsi::from_digits(&imsi.to_digits()), Some(imsi));
    }

    #[test]
    fn test_imsi_invalid() {
        assert!("".parse::<Imsi>().is_err());
        assert!("0010101234567890".parse::<Imsi>().is_err());
        assert!("00101x".parse::<Imsi>().is_err());
        assert_eq!(Imsi::from_digits(&[1, 10]), None);
    }
}
