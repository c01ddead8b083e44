use nas_core::{BitBuffer, DecodeError, EncodeError};
use nas_core::codec_error::check_range;


/// TS 24.007 11.2.3.1.3 Transaction identifier, as carried in the TI IE of ESM messages
/// for GERAN/UTRAN interworking.
/// Length: 1 or 2 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionIdentifier {
    pub ti_flag: bool,
    /// 3 bits, 7 means the extension octet carries the value
    pub ti_value: u8,
    /// 7-bit extended value
    pub ti_extension: Option<u8>,
}

impl TransactionIdentifier {
    pub const MAX_LEN: usize = 2;

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let ti_flag = buffer.read_field(1, "ti_flag")? == 1;
        let ti_value = buffer.read_field(3, "ti_value")? as u8;
        buffer.read_field(4, "spare")?;
        let ti_extension = if buffer.get_len_remaining_bytes() > 0 {
            buffer.read_field(1, "ext")?;
            Some(buffer.read_field(7, "ti_extension")? as u8)
        } else {
            None
        };
        Ok(TransactionIdentifier { ti_flag, ti_value, ti_extension })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        check_range(self.ti_value as u64, 3, "ti_value")?;
        buffer.write_bit(self.ti_flag as u8);
        buffer.write_bits(self.ti_value as u64, 3);
        buffer.write_bits(0, 4);
        if let Some(ext) = self.ti_extension {
            check_range(ext as u64, 7, "ti_extension")?;
            buffer.write_bit(1);
            buffer.write_bits(ext as u64, 7);
        }
        Ok(())
    }
}
