use nas_core::{BitBuffer, DecodeError, EncodeError};
use nas_core::codec_error::check_range;


/// TS 24.301 9.9.3.19 KSI and sequence number, carried in the Service Request.
/// Length: 1 octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KsiAndSequenceNumber {
    /// 3 bits
    pub ksi: u8,
    /// Five least significant bits of the uplink NAS COUNT
    pub sequence_number: u8,
}

impl KsiAndSequenceNumber {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let ksi = buffer.read_field(3, "ksi")? as u8;
        let sequence_number = buffer.read_field(5, "sequence_number")? as u8;
        Ok(KsiAndSequenceNumber { ksi, sequence_number })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        check_range(self.ksi as u64, 3, "ksi")?;
        check_range(self.sequence_number as u64, 5, "sequence_number")?;
        buffer.write_bits(self.ksi as u64, 3);
        buffer.write_bits(self.sequence_number as u64, 5);
        Ok(())
    }
}
