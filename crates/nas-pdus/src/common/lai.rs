use nas_core::{BitBuffer, DecodeError, EncodeError};

use super::plmn::PlmnId;


/// TS 24.008 10.5.1.3 Location area identification, value part.
/// Length: 5 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationAreaId {
    pub plmn: PlmnId,
    pub lac: u16,
}

impl LocationAreaId {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let plmn = PlmnId::from_bitbuf(buffer)?;
        let lac = buffer.read_field(16, "lac")? as u16;
        Ok(LocationAreaId { plmn, lac })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        self.plmn.to_bitbuf(buffer)?;
        buffer.write_bits(self.lac as u64, 16);
        Ok(())
    }
}
