use std::{cmp::max, fmt};

use crate::codec_error::DecodeError;

/// Bit-addressable cursor over a byte vector, used for all NAS encoding and decoding.
///
/// The buffer exposes a window `[start, end)` with a read/write position `pos` inside it.
/// Reads never go past `end`; they return `None` (or `DecodeError::BufferEnded` for the
/// `_field` variants) instead. Writes past `end` are only permitted on buffers created with
/// [`BitBuffer::new_autoexpand`], which grow as needed.
pub struct BitBuffer {
    buffer: Vec<u8>,
    start: usize,       // bits before this are out of window
    pos: usize,         // next bit offset for read/write (absolute)
    end: usize,         // bits at or after this are out of window
    flag_autoexpand: bool,
}

impl BitBuffer {
    /// Create a zeroed buffer capable of holding exactly `len_bits` bits.
    pub fn new(len_bits: usize) -> Self {
        BitBuffer {
            buffer: vec![0; len_bits.div_ceil(8)],
            start: 0,
            pos: 0,
            end: len_bits,
            flag_autoexpand: false,
        }
    }

    /// Create an empty buffer that grows on write. Capacity is a hint only.
    pub fn new_autoexpand(initial_capacity_bits: usize) -> Self {
        BitBuffer {
            buffer: vec![0; initial_capacity_bits.div_ceil(8)],
            start: 0,
            pos: 0,
            end: 0,
            flag_autoexpand: true,
        }
    }

    /// Wrap an owned byte vector without copying.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let len_bits = data.len() * 8;
        BitBuffer {
            buffer: data,
            start: 0,
            pos: 0,
            end: len_bits,
            flag_autoexpand: false,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Parse a whitespace-separated hex string such as `"27 35 11 fd"`.
    /// Panics on invalid input; intended for tests and fixed vectors.
    pub fn from_hexstr(hexstr: &str) -> Self {
        let digits: Vec<u8> = hexstr
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c.to_digit(16) {
                Some(d) => d as u8,
                None => panic!("from_hexstr: invalid character `{}`", c),
            })
            .collect();
        assert!(digits.len() % 2 == 0, "from_hexstr: odd number of hex digits");
        let bytes = digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect();
        Self::from_vec(bytes)
    }

    /// Construct a buffer from a string of '0'/'1' characters.
    /// Panics if any other character is encountered.
    pub fn from_bitstr(bitstr: &str) -> Self {
        let mut buf = BitBuffer::new(bitstr.len());
        for c in bitstr.chars() {
            match c {
                '0' => buf.write_bit(0),
                '1' => buf.write_bit(1),
                other => panic!("from_bitstr: invalid character `{}`; only '0' or '1' allowed", other),
            }
        }
        buf.pos = buf.start;
        buf
    }

    /// Window contents (start to end) as a '0'/'1' string.
    pub fn to_bitstr(&self) -> String {
        (self.start..self.end)
            .map(|i| if self.read_bit_at_unchecked(i) == 1 { '1' } else { '0' })
            .collect()
    }

    /// Peek `num_bits` at the current pos, without advancing.
    /// Returns None on overflow or if `num_bits > 64`.
    pub fn peek_bits(&self, num_bits: usize) -> Option<u64> {
        self.peek_bits_posoffset(0, num_bits)
    }

    /// Peek `num_bits` at the current pos plus `offset` bits, without advancing.
    pub fn peek_bits_posoffset(&self, offset: usize, num_bits: usize) -> Option<u64> {
        let abs_pos = self.pos + offset;
        if num_bits > 64 || abs_pos + num_bits > self.end {
            return None;
        }
        Some(self.read_bits_at_unchecked(abs_pos, num_bits))
    }

    /// Read `num_bits` at the current pos, advancing on success.
    pub fn read_bits(&mut self, num_bits: usize) -> Option<u64> {
        let v = self.peek_bits(num_bits)?;
        self.pos += num_bits;
        Some(v)
    }

    /// Like `read_bits`, but names the field in the error when the window ends.
    pub fn read_field(&mut self, num_bits: usize, field: &'static str) -> Result<u64, DecodeError> {
        self.read_bits(num_bits).ok_or(DecodeError::BufferEnded { field: Some(field) })
    }

    pub fn read_bit(&mut self) -> Option<u8> {
        self.read_bits(1).map(|v| v as u8)
    }

    /// Read one octet. Does not require byte alignment.
    pub fn read_u8_field(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.read_field(8, field)? as u8)
    }

    /// Read `len` octets into a new vector, advancing on success.
    pub fn read_bytes(&mut self, len: usize, field: &'static str) -> Result<Vec<u8>, DecodeError> {
        if self.get_len_remaining() < len * 8 {
            return Err(DecodeError::BufferEnded { field: Some(field) });
        }
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_bits_at_unchecked(self.pos, 8) as u8);
            self.pos += 8;
        }
        Ok(out)
    }

    /// Read exactly `N` octets into a fixed-size array.
    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        if self.get_len_remaining() < N * 8 {
            return Err(DecodeError::BufferEnded { field: Some(field) });
        }
        let mut out = [0u8; N];
        for b in out.iter_mut() {
            *b = self.read_bits_at_unchecked(self.pos, 8) as u8;
            self.pos += 8;
        }
        Ok(out)
    }

    /// Grows `end` (and the backing storage if needed) for an autoexpanding buffer.
    fn move_end(&mut self, needed_extra_bits: usize) {
        let free_cap_bits = self.buffer.len() * 8 - self.end;
        if needed_extra_bits > free_cap_bits {
            let new_cap_bits = max(self.end + needed_extra_bits, self.buffer.len() * 8 * 2);
            self.buffer.resize(new_cap_bits.div_ceil(8), 0);
        }
        self.end += needed_extra_bits;
    }

    /// Makes room for a write of `num_bits` at pos, or panics on a fixed-size buffer.
    fn ensure_writable(&mut self, num_bits: usize) {
        if self.pos + num_bits > self.end {
            if self.flag_autoexpand {
                let extra = self.pos + num_bits - self.end;
                self.move_end(extra);
            } else {
                panic!("write would exceed buffer end");
            }
        }
    }

    /// Write a single bit to pos
    pub fn write_bit(&mut self, value: u8) {
        assert!(value == 0 || value == 1, "write_bit: value must be 0 or 1");
        self.write_bits(value as u64, 1);
    }

    /// Write up to 64 bits, advancing pos.
    /// Panics if `value` does not fit in `num_bits`; encoders check value domains first.
    pub fn write_bits(&mut self, value: u64, num_bits: usize) {
        assert!(num_bits <= 64, "can only write up to 64 bits");
        assert!(num_bits == 64 || value >> num_bits == 0, "value exceeds num_bits {} {}", value, num_bits);
        self.ensure_writable(num_bits);

        for i in 0..num_bits {
            let bit = ((value >> (num_bits - 1 - i)) & 1) as u8;
            let abs = self.pos + i;
            let shift = 7 - (abs % 8);
            let byte = &mut self.buffer[abs / 8];
            *byte = (*byte & !(1 << shift)) | (bit << shift);
        }
        self.pos += num_bits;
    }

    /// Write one octet. Does not require byte alignment.
    pub fn write_u8(&mut self, value: u8) {
        self.write_bits(value as u64, 8);
    }

    /// Write a slice of octets at pos.
    pub fn write_bytes(&mut self, data: &[u8]) {
        if self.pos % 8 == 0 {
            self.ensure_writable(data.len() * 8);
            let idx = self.pos / 8;
            self.buffer[idx..idx + data.len()].copy_from_slice(data);
            self.pos += data.len() * 8;
        } else {
            for b in data {
                self.write_u8(*b);
            }
        }
    }

    /// Write an arbitrary amount of zero-bits
    pub fn write_zeroes(&mut self, num_bits: usize) {
        let mut bits_remaining = num_bits;
        while bits_remaining > 0 {
            let chunk = bits_remaining.min(64);
            self.write_bits(0, chunk);
            bits_remaining -= chunk;
        }
    }

    /// Extract the backing storage, including any capacity beyond the window.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Copy out the window `[start, end)` as octets. The window must be byte aligned,
    /// which holds for every buffer produced by the NAS encoders.
    pub fn to_bytes(&self) -> Vec<u8> {
        assert!(self.start % 8 == 0, "to_bytes: window start not byte aligned");
        let end_byte = self.end.div_ceil(8);
        self.buffer[self.start / 8..end_byte].to_vec()
    }

    /// Active window length (bits), from start to end
    pub fn get_len(&self) -> usize {
        self.end - self.start
    }

    /// Number of bits left in the window, from pos to end.
    pub fn get_len_remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Number of whole octets left in the window.
    pub fn get_len_remaining_bytes(&self) -> usize {
        self.get_len_remaining() / 8
    }

    /// Number of bits written, from start to pos.
    pub fn get_len_written(&self) -> usize {
        self.pos - self.start
    }

    /// Get the current position, relative to window
    pub fn get_pos(&self) -> usize {
        self.pos - self.start
    }

    /// Seek `pos` to `offset` (relative to window start).
    pub fn seek(&mut self, offset: usize) {
        let abs = self.start + offset;
        assert!(abs <= self.end, "seek out of window: got {}, allowed [{},{}]", abs, self.start, self.end);
        self.pos = abs;
    }

    /// Move pos by `offset` bits (can be negative). Panics when leaving the window.
    pub fn seek_rel(&mut self, offset: isize) {
        let new_pos = self.pos as isize + offset;
        assert!(
            new_pos >= self.start as isize && new_pos <= self.end as isize,
            "seek out of window: got {}, allowed [{},{}]",
            new_pos, self.start, self.end);
        self.pos = new_pos as usize;
    }

    /// Skip `num_bits` forward, failing instead of panicking when the window ends.
    pub fn skip_field(&mut self, num_bits: usize, field: &'static str) -> Result<(), DecodeError> {
        if self.get_len_remaining() < num_bits {
            return Err(DecodeError::BufferEnded { field: Some(field) });
        }
        self.pos += num_bits;
        Ok(())
    }

    // Raw operations that ignore the window start ///////////////////////////////////////

    pub fn get_raw_start(&self) -> usize {
        self.start
    }

    pub fn get_raw_end(&self) -> usize {
        self.end
    }

    pub fn get_raw_pos(&self) -> usize {
        self.pos
    }

    /// Move window start. Ensure new_start <= min(end, pos)
    pub fn set_raw_start(&mut self, s: usize) {
        assert!(s <= self.end, "start must not exceed end");
        assert!(s <= self.pos, "start must not exceed pos");
        self.start = s;
    }

    /// Move window end. Ensure new_end >= max(pos, start) and new_end <= capacity
    pub fn set_raw_end(&mut self, e: usize) {
        assert!(e <= self.buffer.len() * 8, "end must not exceed capacity");
        assert!(e >= self.start, "end must not be before start");
        assert!(e >= self.pos, "end must not be before pos");
        self.end = e;
    }

    /// Move pos to an absolute location. Ensure start <= pos <= end
    pub fn set_raw_pos(&mut self, p: usize) {
        assert!(self.start <= p, "pos must not be before start");
        assert!(p <= self.end, "pos must not exceed end");
        self.pos = p;
    }

    // String representations /////////////////////////////

    /// Window contents as uppercase hex, one digit per nibble. A trailing partial
    /// nibble is padded with zeros on the right.
    pub fn dump_hex(&self) -> String {
        let len = self.end - self.start;
        let mut s = String::with_capacity(len.div_ceil(4));
        for i in 0..len.div_ceil(4) {
            let take = usize::min(4, len - i * 4);
            let v = self.read_bits_at_unchecked(self.start + i * 4, take) as u8;
            let digit = v << (4 - take);
            s.push_str(&format!("{:X}", digit));
        }
        s
    }

    /// Window contents as '0'/'1', with a ^ marker before the current pos.
    pub fn dump_bin(&self) -> String {
        let mut s = String::with_capacity(self.get_len() + 1);
        for i in self.start..self.end {
            if i == self.pos {
                s.push('^');
            }
            s.push(if self.read_bit_at_unchecked(i) == 1 { '1' } else { '0' });
        }
        if self.pos == self.end {
            s.push('^');
        }
        s
    }

    /// Reads `num_bits` starting at absolute `bit_pos`. Caller guarantees bounds.
    fn read_bits_at_unchecked(&self, bit_pos: usize, num_bits: usize) -> u64 {
        let mut result = 0u64;
        let mut p = bit_pos;
        let mut remaining = num_bits;

        // Unaligned head
        while remaining > 0 && p % 8 != 0 {
            result = (result << 1) | self.read_bit_at_unchecked(p) as u64;
            p += 1;
            remaining -= 1;
        }
        // Whole bytes
        while remaining >= 8 {
            result = (result << 8) | self.buffer[p / 8] as u64;
            p += 8;
            remaining -= 8;
        }
        // Tail
        while remaining > 0 {
            result = (result << 1) | self.read_bit_at_unchecked(p) as u64;
            p += 1;
            remaining -= 1;
        }
        result
    }

    fn read_bit_at_unchecked(&self, bit_pos: usize) -> u8 {
        (self.buffer[bit_pos / 8] >> (7 - (bit_pos % 8))) & 1
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBuffer {{ <{} ^{} >{} {} }}", self.start, self.pos, self.end, self.dump_hex())
    }
}
