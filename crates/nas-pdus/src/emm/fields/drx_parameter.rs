use nas_core::{BitBuffer, DecodeError, EncodeError};
use nas_core::codec_error::check_range;


/// TS 24.008 10.5.5.6 DRX parameter, value part.
/// Length: 2 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrxParameter {
    pub split_pg_cycle_code: u8,
    /// 4 bits
    pub cn_specific_drx_cycle_coefficient: u8,
    pub split_on_ccch: bool,
    /// 3 bits
    pub non_drx_timer: u8,
}

impl DrxParameter {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let split_pg_cycle_code = buffer.read_u8_field("split_pg_cycle_code")?;
        let cn_specific_drx_cycle_coefficient = buffer.read_field(4, "cn_specific_drx_cycle_coefficient")? as u8;
        let split_on_ccch = buffer.read_field(1, "split_on_ccch")? == 1;
        let non_drx_timer = buffer.read_field(3, "non_drx_timer")? as u8;
        Ok(DrxParameter { split_pg_cycle_code, cn_specific_drx_cycle_coefficient, split_on_ccch, non_drx_timer })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        check_range(self.cn_specific_drx_cycle_coefficient as u64, 4, "cn_specific_drx_cycle_coefficient")?;
        check_range(self.non_drx_timer as u64, 3, "non_drx_timer")?;
        buffer.write_u8(self.split_pg_cycle_code);
        buffer.write_bits(self.cn_specific_drx_cycle_coefficient as u64, 4);
        buffer.write_bit(self.split_on_ccch as u8);
        buffer.write_bits(self.non_drx_timer as u64, 3);
        Ok(())
    }
}
