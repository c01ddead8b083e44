use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi};


/// TS 24.301 9.9.2.1 EPS bearer context status, value part.
/// Bit `n` of the bitmap is set when EPS bearer `n` is active.
/// Length: 2 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpsBearerContextStatus(pub u16);

impl EpsBearerContextStatus {
    pub const LEN: usize = 2;

    pub fn from_ebis(ebis: impl IntoIterator<Item = Ebi>) -> Self {
        let mut bitmap = 0u16;
        for ebi in ebis {
            if ebi < 16 {
                bitmap |= 1 << ebi;
            }
        }
        EpsBearerContextStatus(bitmap)
    }

    pub fn is_active(&self, ebi: Ebi) -> bool {
        ebi < 16 && self.0 & (1 << ebi) != 0
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        // Octet 3 holds EBI(7)..EBI(0), octet 4 holds EBI(15)..EBI(8)
        let lo = buffer.read_u8_field("ebi_0_7")? as u16;
        let hi = buffer.read_u8_field("ebi_8_15")? as u16;
        Ok(EpsBearerContextStatus((hi << 8) | lo))
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_u8((self.0 & 0xFF) as u8);
        buffer.write_u8((self.0 >> 8) as u8);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_layout() {
        let status = EpsBearerContextStatus::from_ebis([5, 6, 9]);
        assert!(status.is_active(5));
        assert!(!status.is_active(7));
        let mut buf = BitBuffer::new_autoexpand(16);
        status.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x60, 0x02]);
        buf.seek(0);
        assert_eq!(EpsBearerContextStatus::from_bitbuf(&mut buf).unwrap(), status);
    }
}
