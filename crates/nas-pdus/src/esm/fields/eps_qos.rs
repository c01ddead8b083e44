use nas_core::{BitBuffer, DecodeError, EncodeError};


/// Maximum and guaranteed bit rates for one EPS QoS extension level, raw 8-bit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpsBitRates {
    pub mbr_ul: u8,
    pub mbr_dl: u8,
    pub gbr_ul: u8,
    pub gbr_dl: u8,
}

impl EpsBitRates {
    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Ok(EpsBitRates {
            mbr_ul: buffer.read_u8_field("mbr_ul")?,
            mbr_dl: buffer.read_u8_field("mbr_dl")?,
            gbr_ul: buffer.read_u8_field("gbr_ul")?,
            gbr_dl: buffer.read_u8_field("gbr_dl")?,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) {
        buffer.write_u8(self.mbr_ul);
        buffer.write_u8(self.mbr_dl);
        buffer.write_u8(self.gbr_ul);
        buffer.write_u8(self.gbr_dl);
    }
}

/// TS 24.301 9.9.4.3 EPS quality of service, value part.
/// Length: 1, 5, 9 or 13 octets. Each extension level requires the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpsQos {
    pub qci: u8,
    pub bit_rates: Option<EpsBitRates>,
    pub bit_rates_ext: Option<EpsBitRates>,
    pub bit_rates_ext2: Option<EpsBitRates>,
}

impl EpsQos {
    pub const MAX_LEN: usize = 13;

    pub fn from_qci(qci: u8) -> Self {
        EpsQos { qci, bit_rates: None, bit_rates_ext: None, bit_rates_ext2: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let len = buffer.get_len_remaining_bytes();
        if len == 0 || (len - 1) % 4 != 0 {
            return Err(DecodeError::InconsistentLength { field: "eps_qos", expected: 1 + 4 * ((len.saturating_sub(1)) / 4), found: len });
        }
        let mut qos = EpsQos::from_qci(buffer.read_u8_field("qci")?);
        if len >= 5 {
            qos.bit_rates = Some(EpsBitRates::from_bitbuf(buffer)?);
        }
        if len >= 9 {
            qos.bit_rates_ext = Some(EpsBitRates::from_bitbuf(buffer)?);
        }
        if len >= 13 {
            qos.bit_rates_ext2 = Some(EpsBitRates::from_bitbuf(buffer)?);
        }
        Ok(qos)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_u8(self.qci);
        match (self.bit_rates, self.bit_rates_ext, self.bit_rates_ext2) {
            (None, None, None) => {}
            (Some(b), None, None) => b.to_bitbuf(buffer),
            (Some(b), Some(e), e2) => {
                b.to_bitbuf(buffer);
                e.to_bitbuf(buffer);
                if let Some(e2) = e2 {
                    e2.to_bitbuf(buffer);
                }
            }
            _ => return Err(EncodeError::MissingField { field: "eps_qos_bit_rates" }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qci_only_and_bad_length() {
        let mut buf = BitBuffer::from_bytes(&[0x09]);
        assert_eq!(EpsQos::from_bitbuf(&mut buf).unwrap(), EpsQos::from_qci(9));

        let mut buf = BitBuffer::from_bytes(&[0x01, 0x02, 0x03]);
        assert!(matches!(EpsQos::from_bitbuf(&mut buf), Err(DecodeError::InconsistentLength { .. })));
    }

    #[test]
    fn test_gbr_bearer() {
        let qos = EpsQos { qci: 1, bit_rates: Some(EpsBitRates { mbr_ul: 64, mbr_dl: 64, gbr_ul: 32, gbr_dl: 32 }), bit_rates_ext: None, bit_rates_ext2: None };
        let mut buf = BitBuffer::new_autoexpand(40);
        qos.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x01, 64, 64, 32, 32]);
        buf.seek(0);
        assert_eq!(EpsQos::from_bitbuf(&mut buf).unwrap(), qos);
    }
}
