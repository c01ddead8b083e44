use nas_core::{BitBuffer, DecodeError, EncodeError};


/// TS 24.301 9.9.4.2 APN aggregate maximum bit rate, value part.
/// Length: 2, 4 or 6 octets. Rates are kept as raw 8-bit codes; see [`decode_bitrate_kbps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApnAmbr {
    pub dl: u8,
    pub ul: u8,
    /// (downlink, uplink) extended codes
    pub extended: Option<(u8, u8)>,
    pub extended2: Option<(u8, u8)>,
}

/// Decodes the basic 8-bit bit rate code into kbps. 0xFF means 0 kbps.
pub fn decode_bitrate_kbps(code: u8) -> u32 {
    match code {
        0x00 | 0xFF => 0,
        0x01..=0x3F => code as u32,
        0x40..=0x7F => 64 + (code as u32 - 0x40) * 8,
        _ => 576 + (code as u32 - 0x80) * 64,
    }
}

impl ApnAmbr {
    pub const MAX_LEN: usize = 6;

    pub fn new(dl: u8, ul: u8) -> Self {
        ApnAmbr { dl, ul, extended: None, extended2: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let len = buffer.get_len_remaining_bytes();
        if !matches!(len, 2 | 4 | 6) {
            return Err(DecodeError::InconsistentLength { field: "apn_ambr", expected: 2, found: len });
        }
        let mut ambr = ApnAmbr::new(buffer.read_u8_field("apn_ambr_dl")?, buffer.read_u8_field("apn_ambr_ul")?);
        if len >= 4 {
            ambr.extended = Some((buffer.read_u8_field("apn_ambr_dl_ext")?, buffer.read_u8_field("apn_ambr_ul_ext")?));
        }
        if len == 6 {
            ambr.extended2 = Some((buffer.read_u8_field("apn_ambr_dl_ext2")?, buffer.read_u8_field("apn_ambr_ul_ext2")?));
        }
        Ok(ambr)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if self.extended2.is_some() && self.extended.is_none() {
            return Err(EncodeError::MissingField { field: "apn_ambr_ext" });
        }
        buffer.write_u8(self.dl);
        buffer.write_u8(self.ul);
        for (dl, ul) in self.extended.iter().chain(self.extended2.iter()) {
            buffer.write_u8(*dl);
            buffer.write_u8(*ul);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrate_codes() {
        assert_eq!(decode_bitrate_kbps(0x3F), 63);
        assert_eq!(decode_bitrate_kbps(0x40), 64);
        assert_eq!(decode_bitrate_kbps(0x7F), 568);
        assert_eq!(decode_bitrate_kbps(0xFE), 8640);
        assert_eq!(decode_bitrate_kbps(0xFF), 0);
    }

    #[test]
    fn test_extended_ambr() {
        let mut buf = BitBuffer::from_bytes(&[0xFE, 0xFE, 0x4A, 0x4A]);
        let ambr = ApnAmbr::from_bitbuf(&mut buf).unwrap();
        assert_eq!(ambr.extended, Some((0x4A, 0x4A)));
        let mut buf = BitBuffer::from_bytes(&[0xFE, 0xFE, 0x4A]);
        assert!(ApnAmbr::from_bitbuf(&mut buf).is_err());
    }
}
