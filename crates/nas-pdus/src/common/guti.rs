use core::fmt;

use nas_core::{BitBuffer, DecodeError, EncodeError, MTmsi};

use super::plmn::PlmnId;


/// Globally Unique Temporary Identity (TS 23.003 2.8), without the identity type octet.
/// Length: 10 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guti {
    pub plmn: PlmnId,
    pub mme_group_id: u16,
    pub mme_code: u8,
    pub m_tmsi: MTmsi,
}

impl Guti {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let plmn = PlmnId::from_bitbuf(buffer)?;
        let mme_group_id = buffer.read_field(16, "mme_group_id")? as u16;
        let mme_code = buffer.read_u8_field("mme_code")?;
        let m_tmsi = buffer.read_field(32, "m_tmsi")? as u32;
        Ok(Guti { plmn, mme_group_id, mme_code, m_tmsi })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        self.plmn.to_bitbuf(buffer)?;
        buffer.write_bits(self.mme_group_id as u64, 16);
        buffer.write_u8(self.mme_code);
        buffer.write_bits(self.m_tmsi as u64, 32);
        Ok(())
    }
}

impl fmt::Display for Guti {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{:04x}:{:02x}:{:08x}", self.plmn, self.mme_group_id, self.mme_code, self.m_tmsi)
    }
}
