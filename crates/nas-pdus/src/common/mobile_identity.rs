use core::fmt;

use nas_core::{BitBuffer, DecodeError, EncodeError, Imsi};

use super::guti::Guti;


const TYPE_NO_IDENTITY: u8 = 0;
const TYPE_IMSI: u8 = 1;
const TYPE_IMEI: u8 = 2;
const TYPE_IMEISV: u8 = 3;
const TYPE_TMSI: u8 = 4;
const TYPE_TMGI: u8 = 5;
const TYPE_GUTI: u8 = 6;

/// Reads the digits of a BCD coded identity. `first_digit` is the high nibble of the
/// identity type octet; the remaining digits fill the rest of the window.
fn read_bcd_digits(buffer: &mut BitBuffer, first_digit: u8, odd: bool) -> Result<Vec<u8>, DecodeError> {
    let mut digits = vec![first_digit];
    while buffer.get_len_remaining() >= 8 {
        let octet = buffer.read_u8_field("identity_digits")?;
        digits.push(octet & 0x0F);
        digits.push(octet >> 4);
    }
    if !odd {
        // Even number of digits: last high nibble is the 0xF filler
        match digits.pop() {
            Some(0xF) => {}
            Some(other) => return Err(DecodeError::InvalidValue { field: "identity_filler", value: other as u64 }),
            None => {}
        }
    }
    if let Some(bad) = digits.iter().find(|d| **d > 9) {
        return Err(DecodeError::InvalidValue { field: "identity_digits", value: *bad as u64 });
    }
    Ok(digits)
}

/// Writes the identity type octet and the BCD digits, inserting a 0xF filler for an even count
fn write_bcd_digits(buffer: &mut BitBuffer, type_of_identity: u8, digits: &[u8]) -> Result<(), EncodeError> {
    if digits.is_empty() {
        return Err(EncodeError::MissingField { field: "identity_digits" });
    }
    if let Some(bad) = digits.iter().find(|d| **d > 9) {
        return Err(EncodeError::ValueOutOfRange { field: "identity_digits", value: *bad as u64 });
    }
    let odd = digits.len() % 2 == 1;
    buffer.write_bits(digits[0] as u64, 4);
    buffer.write_bit(odd as u8);
    buffer.write_bits(type_of_identity as u64, 3);
    for pair in digits[1..].chunks(2) {
        let hi = if pair.len() == 2 { pair[1] } else { 0xF };
        buffer.write_bits(hi as u64, 4);
        buffer.write_bits(pair[0] as u64, 4);
    }
    Ok(())
}

fn imsi_from_digits(digits: &[u8]) -> Result<Imsi, DecodeError> {
    Imsi::from_digits(digits).ok_or(DecodeError::InconsistentLength {
        field: "imsi",
        expected: Imsi::MAX_DIGITS,
        found: digits.len(),
    })
}

/// TS 24.301 9.9.3.12 EPS mobile identity, value part.
/// Length: 11 octets for a GUTI, up to 8 octets for IMSI and IMEI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpsMobileIdentity {
    /// Always encoded as 15 digits
    Imsi(Imsi),
    Guti(Guti),
    /// Decimal digits, 15 for an IMEI
    Imei(Vec<u8>),
}

impl EpsMobileIdentity {
    pub const MAX_LEN: usize = 11;

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let first = buffer.read_field(4, "identity_digit_1")? as u8;
        let odd = buffer.read_field(1, "odd_even")? == 1;
        let type_of_identity = buffer.read_field(3, "type_of_identity")? as u8;

        match type_of_identity {
            TYPE_GUTI => {
                if first != 0xF {
                    return Err(DecodeError::InvalidValue { field: "guti_filler", value: first as u64 });
                }
                Ok(EpsMobileIdentity::Guti(Guti::from_bitbuf(buffer)?))
            }
            TYPE_IMSI => {
                let digits = read_bcd_digits(buffer, first, odd)?;
                Ok(EpsMobileIdentity::Imsi(imsi_from_digits(&digits)?))
            }
            // EPS mobile identity codes IMEI as type 3
            TYPE_IMEISV => Ok(EpsMobileIdentity::Imei(read_bcd_digits(buffer, first, odd)?)),
            other => Err(DecodeError::InvalidEnumValue { field: "eps_type_of_identity", value: other as u64 }),
        }
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        match self {
            EpsMobileIdentity::Guti(guti) => {
                buffer.write_u8(0xF0 | TYPE_GUTI);
                guti.to_bitbuf(buffer)
            }
            EpsMobileIdentity::Imsi(imsi) => write_bcd_digits(buffer, TYPE_IMSI, &imsi.to_digits()),
            EpsMobileIdentity::Imei(digits) => write_bcd_digits(buffer, TYPE_IMEISV, digits),
        }
    }
}

impl fmt::Display for EpsMobileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpsMobileIdentity::Imsi(imsi) => write!(f, "IMSI {}", imsi),
            EpsMobileIdentity::Guti(guti) => write!(f, "GUTI {}", guti),
            EpsMobileIdentity::Imei(d) => write!(f, "IMEI {}", d.iter().map(|x| x.to_string()).collect::<String>()),
        }
    }
}

/// TS 24.008 10.5.1.4 Mobile identity, value part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MobileIdentity {
    NoIdentity,
    Imsi(Imsi),
    Imei(Vec<u8>),
    Imeisv(Vec<u8>),
    Tmsi(u32),
    /// Temporary mobile group identity, kept as raw octets including the type octet
    Tmgi(Vec<u8>),
}

impl MobileIdentity {
    pub const MAX_LEN: usize = 10;

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let first = buffer.read_field(4, "identity_digit_1")? as u8;
        let odd = buffer.read_field(1, "odd_even")? == 1;
        let type_of_identity = buffer.read_field(3, "type_of_identity")? as u8;

        match type_of_identity {
            TYPE_NO_IDENTITY => {
                // Remaining filler octets, if any, carry no information
                let n = buffer.get_len_remaining_bytes();
                buffer.skip_field(n * 8, "no_identity_filler")?;
                Ok(MobileIdentity::NoIdentity)
            }
            TYPE_IMSI => {
                let digits = read_bcd_digits(buffer, first, odd)?;
                Ok(MobileIdentity::Imsi(imsi_from_digits(&digits)?))
            }
            TYPE_IMEI => Ok(MobileIdentity::Imei(read_bcd_digits(buffer, first, odd)?)),
            TYPE_IMEISV => Ok(MobileIdentity::Imeisv(read_bcd_digits(buffer, first, odd)?)),
            TYPE_TMSI => {
                let tmsi = buffer.read_field(32, "tmsi")? as u32;
                Ok(MobileIdentity::Tmsi(tmsi))
            }
            TYPE_TMGI => {
                let mut raw = vec![(first << 4) | ((odd as u8) << 3) | TYPE_TMGI];
                let n = buffer.get_len_remaining_bytes();
                raw.extend(buffer.read_bytes(n, "tmgi")?);
                Ok(MobileIdentity::Tmgi(raw))
            }
            other => Err(DecodeError::InvalidEnumValue { field: "type_of_identity", value: other as u64 }),
        }
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        match self {
            MobileIdentity::NoIdentity => {
                buffer.write_u8(0xF0 | TYPE_NO_IDENTITY);
                Ok(())
            }
            MobileIdentity::Imsi(imsi) => write_bcd_digits(buffer, TYPE_IMSI, &imsi.to_digits()),
            MobileIdentity::Imei(digits) => write_bcd_digits(buffer, TYPE_IMEI, digits),
            MobileIdentity::Imeisv(digits) => write_bcd_digits(buffer, TYPE_IMEISV, digits),
            MobileIdentity::Tmsi(tmsi) => {
                buffer.write_u8(0xF0 | TYPE_TMSI);
                buffer.write_bits(*tmsi as u64, 32);
                Ok(())
            }
            MobileIdentity::Tmgi(raw) => {
                if raw.first().map(|b| b & 0x07) != Some(TYPE_TMGI) {
                    return Err(EncodeError::MissingField { field: "tmgi_type_octet" });
                }
                buffer.write_bytes(raw);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::plmn::PlmnId;

    #[test]
    fn test_imsi_bcd_layout() {
        let imsi: Imsi = "001010123456789".parse().unwrap();
        let id = EpsMobileIdentity::Imsi(imsi);
        let mut buf = BitBuffer::new_autoexpand(64);
        id.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x09, 0x10, 0x10, 0x10, 0x32, 0x54, 0x76, 0x98]);
        buf.seek(0);
        assert_eq!(EpsMobileIdentity::from_bitbuf(&mut buf).unwrap(), id);
    }

    #[test]
    fn test_guti_layout() {
        let guti = Guti {
            plmn: PlmnId::from_digits(&[0, 0, 1], &[0, 1]).unwrap(),
            mme_group_id: 0x0001,
            mme_code: 0x1a,
            m_tmsi: 0xc0de0001,
        };
        let id = EpsMobileIdentity::Guti(guti);
        let mut buf = BitBuffer::new_autoexpand(88);
        id.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0xF6, 0x00, 0xF1, 0x10, 0x00, 0x01, 0x1a, 0xc0, 0xde, 0x00, 0x01]);
        buf.seek(0);
        assert_eq!(EpsMobileIdentity::from_bitbuf(&mut buf).unwrap(), id);
    }

    #[test]
    fn test_even_digit_imeisv_filler() {
        let digits = vec![3, 5, 6, 9, 3, 8, 0, 3, 5, 4, 6, 2, 9, 1, 0, 1];
        let id = MobileIdentity::Imeisv(digits.clone());
        let mut buf = BitBuffer::new_autoexpand(72);
        id.to_bitbuf(&mut buf).unwrap();
        let bytes = buf.to_bytes();
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[0], 0x33);
        assert_eq!(bytes[8] >> 4, 0xF);
        buf.seek(0);
        assert_eq!(MobileIdentity::from_bitbuf(&mut buf).unwrap(), id);
    }

    #[test]
    fn test_tmsi_and_bad_digits() {
        let mut buf = BitBuffer::from_bytes(&[0xF4, 0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(MobileIdentity::from_bitbuf(&mut buf).unwrap(), MobileIdentity::Tmsi(0xdeadbeef));

        let mut buf = BitBuffer::from_bytes(&[0x09, 0x1A]);
        assert!(matches!(EpsMobileIdentity::from_bitbuf(&mut buf), Err(DecodeError::InvalidValue { .. })));

        let mut buf = BitBuffer::from_bytes(&[0xF4, 0x00]);
        assert!(matches!(EpsMobileIdentity::from_bitbuf(&mut buf), Err(DecodeError::InvalidEnumValue { .. })));
    }
}
