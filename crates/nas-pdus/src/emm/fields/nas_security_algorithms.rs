use nas_core::{BitBuffer, DecodeError, EncodeError};

use crate::emm::enums::security_algorithms::{CipheringAlgorithm, IntegrityAlgorithm};


/// TS 24.301 9.9.3.23 NAS security algorithms.
/// Length: 1 octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NasSecurityAlgorithms {
    pub ciphering: CipheringAlgorithm,
    pub integrity: IntegrityAlgorithm,
}

impl NasSecurityAlgorithms {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        buffer.read_field(1, "spare")?;
        let ciphering = CipheringAlgorithm::from_raw(buffer.read_field(3, "ciphering_algorithm")?, "ciphering_algorithm")?;
        buffer.read_field(1, "spare")?;
        let integrity = IntegrityAlgorithm::from_raw(buffer.read_field(3, "integrity_algorithm")?, "integrity_algorithm")?;
        Ok(NasSecurityAlgorithms { ciphering, integrity })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_bit(0);
        buffer.write_bits(self.ciphering.into_raw(), 3);
        buffer.write_bit(0);
        buffer.write_bits(self.integrity.into_raw(), 3);
        Ok(())
    }
}
