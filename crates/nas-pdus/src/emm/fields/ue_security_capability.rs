use nas_core::{BitBuffer, DecodeError, EncodeError};

use super::ue_network_capability::UeNetworkCapability;


/// TS 24.301 9.9.3.36 UE security capability, value part.
/// Length: 2..5 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeSecurityCapability {
    pub eea: u8,
    pub eia: u8,
    pub uea: Option<u8>,
    /// UIA1..UIA7, bit 8 spare
    pub uia: Option<u8>,
    /// GEA1..GEA7, bit 8 spare
    pub gea: Option<u8>,
}

impl UeSecurityCapability {
    pub const MAX_LEN: usize = 5;

    pub fn supports_eea(&self, id: u8) -> bool {
        id < 8 && self.eea & (0x80 >> id) != 0
    }

    pub fn supports_eia(&self, id: u8) -> bool {
        id < 8 && self.eia & (0x80 >> id) != 0
    }

    /// Replayed capability for the Security Mode Command, taken from what the UE advertised
    pub fn from_network_capability(cap: &UeNetworkCapability) -> Self {
        UeSecurityCapability {
            eea: cap.eea,
            eia: cap.eia,
            uea: cap.uea,
            uia: cap.ucs2_uia.map(|v| v & 0x7F),
            gea: None,
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let eea = buffer.read_u8_field("eea")?;
        let eia = buffer.read_u8_field("eia")?;
        let uea = if buffer.get_len_remaining_bytes() > 0 { Some(buffer.read_u8_field("uea")?) } else { None };
        let uia = if buffer.get_len_remaining_bytes() > 0 { Some(buffer.read_u8_field("uia")? & 0x7F) } else { None };
        let gea = if buffer.get_len_remaining_bytes() > 0 { Some(buffer.read_u8_field("gea")? & 0x7F) } else { None };
        Ok(UeSecurityCapability { eea, eia, uea, uia, gea })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_u8(self.eea);
        buffer.write_u8(self.eia);
        // Later octets require all earlier ones
        match (self.uea, self.uia, self.gea) {
            (None, None, None) => {}
            (Some(uea), None, None) => buffer.write_u8(uea),
            (Some(uea), Some(uia), gea) => {
                buffer.write_u8(uea);
                buffer.write_u8(uia & 0x7F);
                if let Some(gea) = gea {
                    buffer.write_u8(gea & 0x7F);
                }
            }
            _ => return Err(EncodeError::MissingField { field: "uea" }),
        }
        Ok(())
    }
}
