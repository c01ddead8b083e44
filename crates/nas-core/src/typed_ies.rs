//! Helpers for the TS 24.007 IE formats used by EMM and ESM messages.
//!
//! Mandatory IEs are V or LV (LV-E) and appear at fixed positions. Optional IEs carry an
//! IEI and are either type 1 (IEI and value share one octet), TV, TLV or TLV-E.

use crate::bitbuffer::BitBuffer;
use crate::codec_error::{DecodeError, EncodeError};

/// What a message decoder does with an optional IEI it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IePolicy {
    /// Skip the IE according to its format (TS 24.007 comprehension rules)
    #[default]
    Skip,
    /// Fail with DecodeError::UnexpectedIe
    Reject,
}

/// Peek the next IEI octet without advancing. None when the window is exhausted.
pub fn peek_iei(buffer: &BitBuffer) -> Option<u8> {
    if buffer.get_len_remaining() < 8 {
        return None;
    }
    buffer.peek_bits(8).map(|v| v as u8)
}

/// Normalizes an IEI octet for matching. IEIs with bit 8 set are half-octet IEIs
/// (type 1) and only the high nibble identifies them.
pub fn iei_key(iei: u8) -> u8 {
    if iei & 0x80 != 0 { iei & 0xF0 } else { iei }
}

/// Handle an IEI that is not in the allow-list of the message being decoded.
pub fn unknown_ie(buffer: &mut BitBuffer, policy: IePolicy) -> Result<(), DecodeError> {
    let iei = buffer.read_u8_field("iei")?;
    if policy == IePolicy::Reject {
        return Err(DecodeError::UnexpectedIe { iei });
    }

    if iei & 0x80 != 0 {
        // Type 1 or type 2, value (if any) shares the IEI octet
        tracing::debug!("skipping unknown half-octet IE 0x{:02x}", iei);
        return Ok(());
    }
    let len = if iei & 0xF0 == 0x70 {
        buffer.read_field(16, "unknown_ie_len")? as usize
    } else {
        buffer.read_field(8, "unknown_ie_len")? as usize
    };
    tracing::debug!("skipping unknown IE 0x{:02x} len {}", iei, len);
    buffer.skip_field(len * 8, "unknown_ie_contents")
}

/// Reads a type 1 optional IE and returns its 4-bit value
pub fn parse_type1(buffer: &mut BitBuffer, field: &'static str) -> Result<u8, DecodeError> {
    let octet = buffer.read_u8_field(field)?;
    Ok(octet & 0x0F)
}

/// Reads a TV IE: skips the IEI octet, then hands over to `parser`
pub fn parse_tv<T, F>(buffer: &mut BitBuffer, field: &'static str, parser: F) -> Result<T, DecodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<T, DecodeError>,
{
    buffer.skip_field(8, field)?;
    parser(buffer)
}

/// Reads a TLV IE: skips the IEI octet, then parses the LV part
pub fn parse_tlv<T, F>(buffer: &mut BitBuffer, field: &'static str, max_len: usize, parser: F) -> Result<T, DecodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<T, DecodeError>,
{
    buffer.skip_field(8, field)?;
    parse_lv(buffer, field, max_len, parser)
}

/// Reads a TLV-E IE: skips the IEI octet, then parses the LV-E part
pub fn parse_tlve<T, F>(buffer: &mut BitBuffer, field: &'static str, max_len: usize, parser: F) -> Result<T, DecodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<T, DecodeError>,
{
    buffer.skip_field(8, field)?;
    parse_lve(buffer, field, max_len, parser)
}

/// Reads an LV IE (one length octet)
pub fn parse_lv<T, F>(buffer: &mut BitBuffer, field: &'static str, max_len: usize, parser: F) -> Result<T, DecodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<T, DecodeError>,
{
    let len = buffer.read_field(8, field)? as usize;
    parse_contents(buffer, len, field, max_len, parser)
}

/// Reads an LV-E IE (two length octets)
pub fn parse_lve<T, F>(buffer: &mut BitBuffer, field: &'static str, max_len: usize, parser: F) -> Result<T, DecodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<T, DecodeError>,
{
    let len = buffer.read_field(16, field)? as usize;
    parse_contents(buffer, len, field, max_len, parser)
}

/// Reads an LV IE as raw octets
pub fn parse_lv_bytes(buffer: &mut BitBuffer, field: &'static str, max_len: usize) -> Result<Vec<u8>, DecodeError> {
    parse_lv(buffer, field, max_len, |b| {
        let n = b.get_len_remaining_bytes();
        b.read_bytes(n, field)
    })
}

/// Reads an LV-E IE as raw octets
pub fn parse_lve_bytes(buffer: &mut BitBuffer, field: &'static str, max_len: usize) -> Result<Vec<u8>, DecodeError> {
    parse_lve(buffer, field, max_len, |b| {
        let n = b.get_len_remaining_bytes();
        b.read_bytes(n, field)
    })
}

/// Runs `parser` on a window of `len` octets. The window end is restored afterwards and
/// the position is placed right after the contents, also when the parser left octets unread.
fn parse_contents<T, F>(buffer: &mut BitBuffer, len: usize, field: &'static str, max_len: usize, parser: F) -> Result<T, DecodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<T, DecodeError>,
{
    if len > max_len {
        return Err(DecodeError::InconsistentLength { field, expected: max_len, found: len });
    }
    if buffer.get_len_remaining() < len * 8 {
        return Err(DecodeError::BufferEnded { field: Some(field) });
    }

    let contents_start = buffer.get_raw_pos();
    let contents_end = contents_start + len * 8;
    let saved_end = buffer.get_raw_end();

    buffer.set_raw_end(contents_end);
    let result = parser(buffer);
    if result.is_ok() && buffer.get_raw_pos() < contents_end {
        tracing::trace!("{}: ignoring {} trailing bits", field, contents_end - buffer.get_raw_pos());
    }
    buffer.set_raw_end(saved_end);
    buffer.set_raw_pos(contents_end);
    result
}

/// Writes a type 1 IE: `iei` in the high nibble, `value` in the low nibble
pub fn write_type1(buffer: &mut BitBuffer, iei: u8, value: u8, field: &'static str) -> Result<(), EncodeError> {
    if value > 0x0F {
        return Err(EncodeError::ValueOutOfRange { field, value: value as u64 });
    }
    buffer.write_u8((iei & 0xF0) | value);
    Ok(())
}

/// Writes a TV IE
pub fn write_tv<F>(buffer: &mut BitBuffer, iei: u8, writer: F) -> Result<(), EncodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<(), EncodeError>,
{
    buffer.write_u8(iei);
    writer(buffer)
}

/// Writes a TLV IE, the length octet is backfilled once the contents are known
pub fn write_tlv<F>(buffer: &mut BitBuffer, iei: u8, field: &'static str, max_len: usize, writer: F) -> Result<(), EncodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<(), EncodeError>,
{
    buffer.write_u8(iei);
    write_lv(buffer, field, max_len, writer)
}

/// Writes a TLV-E IE
pub fn write_tlve<F>(buffer: &mut BitBuffer, iei: u8, field: &'static str, max_len: usize, writer: F) -> Result<(), EncodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<(), EncodeError>,
{
    buffer.write_u8(iei);
    write_lve(buffer, field, max_len, writer)
}

/// Writes an LV IE
pub fn write_lv<F>(buffer: &mut BitBuffer, field: &'static str, max_len: usize, writer: F) -> Result<(), EncodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<(), EncodeError>,
{
    write_with_length(buffer, 8, field, max_len.min(0xFF), writer)
}

/// Writes an LV-E IE
pub fn write_lve<F>(buffer: &mut BitBuffer, field: &'static str, max_len: usize, writer: F) -> Result<(), EncodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<(), EncodeError>,
{
    write_with_length(buffer, 16, field, max_len.min(0xFFFF), writer)
}

/// Writes raw octets as an LV IE
pub fn write_lv_bytes(buffer: &mut BitBuffer, field: &'static str, max_len: usize, data: &[u8]) -> Result<(), EncodeError> {
    write_lv(buffer, field, max_len, |b| {
        b.write_bytes(data);
        Ok(())
    })
}

/// Writes raw octets as an LV-E IE
pub fn write_lve_bytes(buffer: &mut BitBuffer, field: &'static str, max_len: usize, data: &[u8]) -> Result<(), EncodeError> {
    write_lve(buffer, field, max_len, |b| {
        b.write_bytes(data);
        Ok(())
    })
}

fn write_with_length<F>(buffer: &mut BitBuffer, len_bits: usize, field: &'static str, max_len: usize, writer: F) -> Result<(), EncodeError>
where
    F: FnOnce(&mut BitBuffer) -> Result<(), EncodeError>,
{
    let len_pos = buffer.get_raw_pos();
    buffer.write_bits(0, len_bits);
    let contents_start = buffer.get_raw_pos();
    writer(buffer)?;
    let contents_end = buffer.get_raw_pos();

    let written_bits = contents_end - contents_start;
    assert!(written_bits % 8 == 0, "{}: IE contents not octet aligned", field);
    let len = written_bits / 8;
    if len > max_len {
        return Err(EncodeError::TooLong { field, max: max_len, found: len });
    }

    buffer.set_raw_pos(len_pos);
    buffer.write_bits(len as u64, len_bits);
    buffer.set_raw_pos(contents_end);
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn read_u8s(b: &mut BitBuffer) -> Result<Vec<u8>, DecodeError> {
        let n = b.get_len_remaining_bytes();
        b.read_bytes(n, "contents")
    }

    #[test]
    fn test_tlv_roundtrip_backfills_length() {
        let mut buf = BitBuffer::new_autoexpand(32);
        write_tlv(&mut buf, 0x27, "pco", 253, |b| {
            b.write_bytes(&[0x80, 0x00, 0x0d, 0x00]);
            Ok(())
        }).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x27, 0x04, 0x80, 0x00, 0x0d, 0x00]);

        buf.seek(0);
        assert_eq!(peek_iei(&buf), Some(0x27));
        let v = parse_tlv(&mut buf, "pco", 253, read_u8s).unwrap();
        assert_eq!(v, vec![0x80, 0x00, 0x0d, 0x00]);
        assert_eq!(peek_iei(&buf), None);
    }

    #[test]
    fn test_write_too_long() {
        let mut buf = BitBuffer::new_autoexpand(32);
        let res = write_lv_bytes(&mut buf, "apn", 2, &[1, 2, 3]);
        assert_eq!(res, Err(EncodeError::TooLong { field: "apn", max: 2, found: 3 }));
    }

    #[test]
    fn test_lv_truncated_and_oversized() {
        let mut buf = BitBuffer::from_bytes(&[0x05, 0x01, 0x02]);
        assert_eq!(parse_lv_bytes(&mut buf, "x", 10), Err(DecodeError::BufferEnded { field: Some("x") }));

        let mut buf = BitBuffer::from_bytes(&[0x05, 1, 2, 3, 4, 5]);
        assert_eq!(
            parse_lv_bytes(&mut buf, "x", 4),
            Err(DecodeError::InconsistentLength { field: "x", expected: 4, found: 5 })
        );
    }

    #[test]
    fn test_lv_parser_cannot_overrun_and_leftover_is_skipped() {
        let mut buf = BitBuffer::from_bytes(&[0x02, 0xAA, 0xBB, 0xCC]);
        // Parser reads only the first octet of a 2-octet IE
        let v = parse_lv(&mut buf, "x", 10, |b| b.read_u8_field("first")).unwrap();
        assert_eq!(v, 0xAA);
        assert_eq!(buf.read_u8_field("next").unwrap(), 0xCC);

        // Parser trying to read past the IE fails instead of consuming the next IE
        let mut buf = BitBuffer::from_bytes(&[0x01, 0xAA, 0xBB]);
        let res = parse_lv(&mut buf, "x", 10, |b| b.read_field(16, "too_far"));
        assert!(res.is_err());
        assert_eq!(buf.get_len_remaining(), 8);
    }

    #[test]
    fn test_unknown_ie_skip_rules() {
        // type 1 (0xC-), TLV (0x5D), TLV-E (0x78), then a marker octet
        let mut buf = BitBuffer::from_bytes(&[0xC1, 0x5D, 0x01, 0x00, 0x78, 0x00, 0x02, 0x11, 0x22, 0xEE]);
        unknown_ie(&mut buf, IePolicy::Skip).unwrap();
        unknown_ie(&mut buf, IePolicy::Skip).unwrap();
        unknown_ie(&mut buf, IePolicy::Skip).unwrap();
        assert_eq!(buf.read_u8_field("marker").unwrap(), 0xEE);

        let mut buf = BitBuffer::from_bytes(&[0x5D, 0x01, 0x00]);
        assert_eq!(unknown_ie(&mut buf, IePolicy::Reject), Err(DecodeError::UnexpectedIe { iei: 0x5D }));
    }

    #[test]
    fn test_type1() {
        let mut buf = BitBuffer::new_autoexpand(8);
        write_type1(&mut buf, 0xF0, 0x1, "additional_update_type").unwrap();
        assert!(write_type1(&mut buf, 0xF0, 0x10, "x").is_err());
        assert_eq!(buf.to_bytes(), vec![0xF1]);
        buf.seek(0);
        assert_eq!(iei_key(peek_iei(&buf).unwrap()), 0xF0);
        assert_eq!(parse_type1(&mut buf, "additional_update_type").unwrap(), 1);
    }

    #[test]
    fn test_lve_roundtrip() {
        let mut buf = BitBuffer::new_autoexpand(32);
        write_lve_bytes(&mut buf, "esm_container", 0xFFFF, &[0x52, 0x01, 0xC1]).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x00, 0x03, 0x52, 0x01, 0xC1]);
        buf.seek(0);
        assert_eq!(parse_lve_bytes(&mut buf, "esm_container", 0xFFFF).unwrap(), vec![0x52, 0x01, 0xC1]);
    }
}
