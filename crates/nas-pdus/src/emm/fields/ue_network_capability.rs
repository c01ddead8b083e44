use nas_core::{BitBuffer, DecodeError, EncodeError};


/// TS 24.301 9.9.3.34 UE network capability, value part.
/// Each algorithm octet is a bitmap with algorithm 0 in the most significant bit.
/// Length: 2..13 octets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeNetworkCapability {
    pub eea: u8,
    pub eia: u8,
    pub uea: Option<u8>,
    /// UCS2 support in bit 8, UIA1..UIA7 below. Only present together with `uea`.
    pub ucs2_uia: Option<u8>,
    /// Octets 7 and up (ProSe, ACC-CSFB, LPP, ...), kept opaque
    pub additional: Vec<u8>,
}

impl UeNetworkCapability {
    pub const MAX_LEN: usize = 13;

    pub fn supports_eea(&self, id: u8) -> bool {
        id < 8 && self.eea & (0x80 >> id) != 0
    }

    pub fn supports_eia(&self, id: u8) -> bool {
        id < 8 && self.eia & (0x80 >> id) != 0
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let eea = buffer.read_u8_field("eea")?;
        let eia = buffer.read_u8_field("eia")?;
        let uea = if buffer.get_len_remaining_bytes() > 0 { Some(buffer.read_u8_field("uea")?) } else { None };
        let ucs2_uia = if buffer.get_len_remaining_bytes() > 0 { Some(buffer.read_u8_field("ucs2_uia")?) } else { None };
        let n = buffer.get_len_remaining_bytes();
        let additional = buffer.read_bytes(n, "ue_network_capability_additional")?;
        Ok(UeNetworkCapability { eea, eia, uea, ucs2_uia, additional })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_u8(self.eea);
        buffer.write_u8(self.eia);
        match (self.uea, self.ucs2_uia) {
            (None, None) if self.additional.is_empty() => {}
            (Some(uea), None) if self.additional.is_empty() => buffer.write_u8(uea),
            (Some(uea), Some(uia)) => {
                buffer.write_u8(uea);
                buffer.write_u8(uia);
                buffer.write_bytes(&self.additional);
            }
            _ => return Err(EncodeError::MissingField { field: "uea" }),
        }
        Ok(())
    }
}
