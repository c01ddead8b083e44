use std::net::Ipv4Addr;

use nas_core::{BitBuffer, DecodeError, EncodeError};
use nas_core::codec_error::check_range;

use crate::esm::enums::pdn_type::PdnType;


/// TS 24.301 9.9.4.9 PDN address, value part.
/// Length: 5 (IPv4), 9 (IPv6 interface id) or 13 (IPv4v6) octets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdnAddress {
    Ipv4(Ipv4Addr),
    /// IPv6 interface identifier
    Ipv6([u8; 8]),
    Ipv4v6 { iid: [u8; 8], ipv4: Ipv4Addr },
    /// Other PDN types, contents kept as received
    Other { pdn_type: PdnType, raw: Vec<u8> },
}

impl PdnAddress {
    pub const MAX_LEN: usize = 13;

    pub fn pdn_type(&self) -> PdnType {
        match self {
            PdnAddress::Ipv4(_) => PdnType::Ipv4,
            PdnAddress::Ipv6(_) => PdnType::Ipv6,
            PdnAddress::Ipv4v6 { .. } => PdnType::Ipv4v6,
            PdnAddress::Other { pdn_type, .. } => *pdn_type,
        }
    }

    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match self {
            PdnAddress::Ipv4(a) | PdnAddress::Ipv4v6 { ipv4: a, .. } => Some(*a),
            _ => None,
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        buffer.read_field(5, "spare")?;
        let pdn_type = PdnType::from(buffer.read_field(3, "pdn_type")? as u8);
        match pdn_type {
            PdnType::Ipv4 => Ok(PdnAddress::Ipv4(Ipv4Addr::from(buffer.read_array::<4>("ipv4_address")?))),
            PdnType::Ipv6 => Ok(PdnAddress::Ipv6(buffer.read_array::<8>("ipv6_iid")?)),
            PdnType::Ipv4v6 => {
                let iid = buffer.read_array::<8>("ipv6_iid")?;
                let ipv4 = Ipv4Addr::from(buffer.read_array::<4>("ipv4_address")?);
                Ok(PdnAddress::Ipv4v6 { iid, ipv4 })
            }
            other => {
                let n = buffer.get_len_remaining_bytes();
                Ok(PdnAddress::Other { pdn_type: other, raw: buffer.read_bytes(n, "pdn_address")? })
            }
        }
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        let pdn_type = self.pdn_type().into_raw();
        check_range(pdn_type as u64, 3, "pdn_type")?;
        buffer.write_bits(0, 5);
        buffer.write_bits(pdn_type as u64, 3);
        match self {
            PdnAddress::Ipv4(a) => buffer.write_bytes(&a.octets()),
            PdnAddress::Ipv6(iid) => buffer.write_bytes(iid),
            PdnAddress::Ipv4v6 { iid, ipv4 } => {
                buffer.write_bytes(iid);
                buffer.write_bytes(&ipv4.octets());
            }
            PdnAddress::Other { raw, .. } => buffer.write_bytes(raw),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_pdn_address() {
        let addr = PdnAddress::Ipv4(Ipv4Addr::new(172, 16, 0, 2));
        let mut buf = BitBuffer::new_autoexpand(40);
        addr.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x01, 172, 16, 0, 2]);
        buf.seek(0);
        assert_eq!(PdnAddress::from_bitbuf(&mut buf).unwrap(), addr);
    }

    #[test]
    fn test_truncated_ipv4v6() {
        let mut buf = BitBuffer::from_bytes(&[0x03, 0, 0, 0, 0, 0, 0, 0, 1, 10, 0]);
        assert!(matches!(PdnAddress::from_bitbuf(&mut buf), Err(DecodeError::BufferEnded { .. })));
    }
}
