use core::fmt;

use nas_core::{BitBuffer, DecodeError, EncodeError};


/// TS 24.008 10.5.1.13 PLMN identity, BCD coded MCC and MNC.
/// Length: 3 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlmnId {
    pub mcc: [u8; 3],
    /// Third digit is only meaningful when `mnc_len` is 3
    pub mnc: [u8; 3],
    pub mnc_len: u8,
}

impl PlmnId {
    /// Build from decimal digit sequences. MCC must have 3 digits, MNC 2 or 3.
    pub fn from_digits(mcc: &[u8], mnc: &[u8]) -> Option<Self> {
        if mcc.len() != 3 || !(2..=3).contains(&mnc.len()) {
            return None;
        }
        if mcc.iter().chain(mnc.iter()).any(|d| *d > 9) {
            return None;
        }
        let mut m = [0u8; 3];
        m[..mnc.len()].copy_from_slice(mnc);
        Some(PlmnId {
            mcc: [mcc[0], mcc[1], mcc[2]],
            mnc: m,
            mnc_len: mnc.len() as u8,
        })
    }

    /// Wire encoding: MCC2|MCC1, MNC3|MCC3, MNC2|MNC1
    pub fn to_bytes(&self) -> [u8; 3] {
        let mnc3 = if self.mnc_len == 3 { self.mnc[2] } else { 0xF };
        [
            (self.mcc[1] << 4) | self.mcc[0],
            (mnc3 << 4) | self.mcc[2],
            (self.mnc[1] << 4) | self.mnc[0],
        ]
    }

    pub fn from_bytes(b: [u8; 3]) -> Result<Self, DecodeError> {
        let mcc = [b[0] & 0x0F, b[0] >> 4, b[1] & 0x0F];
        let mnc3 = b[1] >> 4;
        let mnc = [b[2] & 0x0F, b[2] >> 4, if mnc3 == 0xF { 0 } else { mnc3 }];
        let mnc_len = if mnc3 == 0xF { 2 } else { 3 };

        let digits_ok = mcc.iter().all(|d| *d <= 9) && mnc[..mnc_len as usize].iter().all(|d| *d <= 9);
        if !digits_ok {
            return Err(DecodeError::InvalidValue { field: "plmn_id", value: u32::from_be_bytes([0, b[0], b[1], b[2]]) as u64 });
        }
        Ok(PlmnId { mcc, mnc, mnc_len })
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let b = buffer.read_array::<3>("plmn_id")?;
        Self::from_bytes(b)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if self.mcc.iter().chain(self.mnc.iter()).any(|d| *d > 9) || !(2..=3).contains(&self.mnc_len) {
            return Err(EncodeError::ValueOutOfRange { field: "plmn_id", value: self.mnc_len as u64 });
        }
        buffer.write_bytes(&self.to_bytes());
        Ok(())
    }
}

impl fmt::Display for PlmnId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}-", self.mcc[0], self.mcc[1], self.mcc[2])?;
        for d in &self.mnc[..self.mnc_len as usize] {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

/// TS 24.008 10.5.1.13 PLMN list (equivalent PLMNs), value part.
/// Length: 3..45 octets, at most 15 entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlmnList {
    pub plmns: Vec<PlmnId>,
}

impl PlmnList {
    pub const MAX_ENTRIES: usize = 15;
    pub const MAX_LEN: usize = 45;

    /// Parses the value part; the buffer window holds exactly the IE contents
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let len = buffer.get_len_remaining_bytes();
        if len % 3 != 0 {
            return Err(DecodeError::InconsistentLength { field: "plmn_list", expected: len - len % 3, found: len });
        }
        let count = len / 3;
        if count > Self::MAX_ENTRIES {
            return Err(DecodeError::TooManyElements { field: "plmn_list", max: Self::MAX_ENTRIES, found: count });
        }
        let mut plmns = Vec::with_capacity(count);
        for _ in 0..count {
            plmns.push(PlmnId::from_bitbuf(buffer)?);
        }
        Ok(PlmnList { plmns })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if self.plmns.len() > Self::MAX_ENTRIES {
            return Err(EncodeError::TooManyElements { field: "plmn_list", max: Self::MAX_ENTRIES, found: self.plmns.len() });
        }
        for p in &self.plmns {
            p.to_bitbuf(buffer)?;
        }
        Ok(())
    }
}
