use nas_core::{BitBuffer, DecodeError, EncodeError};


wire_enum! {
    /// TS 24.008 10.5.3.5a Coding scheme
    /// Bits: 3
    pub enum NameCodingScheme {
        Gsm7 = 0,
        Ucs2 = 1,
    }
}

/// TS 24.008 10.5.3.5a Network name, value part.
/// Only characters of the GSM 7-bit default alphabet that have an ASCII
/// counterpart are supported for Gsm7; others are sent as '?'.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkName {
    pub coding: NameCodingScheme,
    /// Add country initials
    pub add_ci: bool,
    pub name: String,
}

/// GSM 03.38 positions that differ from ASCII
const GSM7_SPECIAL: [(char, u8); 3] = [('@', 0x00), ('$', 0x02), ('_', 0x11)];

fn gsm7_from_char(c: char) -> u8 {
    if let Some((_, v)) = GSM7_SPECIAL.iter().find(|(ch, _)| *ch == c) {
        return *v;
    }
    match c {
        'A'..='Z' | 'a'..='z' | '0'..='9' | ' ' | '!' | '"' | '#' | '%' | '&' | '\'' | '(' | ')' | '*' | '+' | ','
        | '-' | '.' | '/' | ':' | ';' | '<' | '=' | '>' | '?' => c as u8,
        _ => b'?',
    }
}

fn gsm7_to_char(v: u8) -> char {
    if let Some((c, _)) = GSM7_SPECIAL.iter().find(|(_, val)| *val == v) {
        return *c;
    }
    let c = v as char;
    if gsm7_from_char(c) == v { c } else { '?' }
}

impl NetworkName {
    pub const MAX_LEN: usize = 253;

    pub fn gsm7(name: &str) -> Self {
        NetworkName { coding: NameCodingScheme::Gsm7, add_ci: false, name: name.to_string() }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        buffer.read_field(1, "ext")?;
        let coding = NameCodingScheme::from_raw(buffer.read_field(3, "coding_scheme")?, "coding_scheme")?;
        let add_ci = buffer.read_field(1, "add_ci")? == 1;
        let spare_bits = buffer.read_field(3, "spare_bits_in_last_octet")? as usize;

        let len = buffer.get_len_remaining_bytes();
        let text = buffer.read_bytes(len, "network_name_text")?;
        let name = match coding {
            NameCodingScheme::Gsm7 => {
                let total_bits = (len * 8).saturating_sub(spare_bits);
                let num_septets = total_bits / 7;
                (0..num_septets)
                    .map(|i| {
                        let bit = i * 7;
                        let (idx, shift) = (bit / 8, bit % 8);
                        let mut v = (text[idx] as u16) >> shift;
                        if shift > 1 && idx + 1 < text.len() {
                            v |= (text[idx + 1] as u16) << (8 - shift);
                        }
                        gsm7_to_char((v & 0x7F) as u8)
                    })
                    .collect()
            }
            NameCodingScheme::Ucs2 => {
                let units: Vec<u16> = text.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
                String::from_utf16_lossy(&units)
            }
        };
        Ok(NetworkName { coding, add_ci, name })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        let (text, spare_bits) = match self.coding {
            NameCodingScheme::Gsm7 => {
                let septets: Vec<u8> = self.name.chars().map(gsm7_from_char).collect();
                let total_bits = septets.len() * 7;
                let mut out = vec![0u8; total_bits.div_ceil(8)];
                for (i, s) in septets.iter().enumerate() {
                    let bit = i * 7;
                    let (idx, shift) = (bit / 8, bit % 8);
                    let v = (*s as u16) << shift;
                    out[idx] |= v as u8;
                    if shift > 1 {
                        out[idx + 1] |= (v >> 8) as u8;
                    }
                }
                (out, (8 - total_bits % 8) % 8)
            }
            NameCodingScheme::Ucs2 => {
                let out: Vec<u8> = self.name.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
                (out, 0)
            }
        };
        if text.len() + 1 > Self::MAX_LEN {
            return Err(EncodeError::TooLong { field: "network_name", max: Self::MAX_LEN, found: text.len() + 1 });
        }

        buffer.write_bit(1);
        buffer.write_bits(self.coding.into_raw(), 3);
        buffer.write_bit(self.add_ci as u8);
        buffer.write_bits(spare_bits as u64, 3);
        buffer.write_bytes(&text);
        Ok(())
    }
}
