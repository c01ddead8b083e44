use core::fmt;

use nas_core::{BitBuffer, DecodeError, EncodeError};


/// TS 24.008 10.5.6.1 Access point name, value part. The wire form is a sequence of
/// length-prefixed labels (TS 23.003 9.1); this type holds the dotted text form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Apn(pub String);

impl Apn {
    pub const MAX_LEN: usize = 100;

    pub fn new(name: &str) -> Self {
        Apn(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let mut labels: Vec<String> = Vec::new();
        while buffer.get_len_remaining_bytes() > 0 {
            let len = buffer.read_u8_field("apn_label_len")? as usize;
            if len > buffer.get_len_remaining_bytes() {
                return Err(DecodeError::InconsistentLength { field: "apn_label", expected: buffer.get_len_remaining_bytes(), found: len });
            }
            let label = buffer.read_bytes(len, "apn_label")?;
            labels.push(String::from_utf8_lossy(&label).into_owned());
        }
        Ok(Apn(labels.join(".")))
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if self.0.is_empty() {
            return Ok(());
        }
        let encoded_len = self.0.len() + 1;
        if encoded_len > Self::MAX_LEN {
            return Err(EncodeError::TooLong { field: "apn", max: Self::MAX_LEN, found: encoded_len });
        }
        for label in self.0.split('.') {
            if label.is_empty() || label.len() > 63 {
                return Err(EncodeError::ValueOutOfRange { field: "apn_label_len", value: label.len() as u64 });
            }
            buffer.write_u8(label.len() as u8);
            buffer.write_bytes(label.as_bytes());
        }
        Ok(())
    }
}

impl fmt::Display for Apn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apn_labels() {
        let apn = Apn::new("internet.mnc001.mcc001.gprs");
        let mut buf = BitBuffer::new_autoexpand(256);
        apn.to_bitbuf(&mut buf).unwrap();
        let bytes = buf.to_bytes();
        assert_eq!(&bytes[..9], &[0x08, b'i', b'n', b't', b'e', b'r', b'n', b'e', b't']);
        assert_eq!(bytes.len(), 28);
        buf.seek(0);
        assert_eq!(Apn::from_bitbuf(&mut buf).unwrap(), apn);
    }

    #[test]
    fn test_apn_label_overrun() {
        let mut buf = BitBuffer::from_bytes(&[0x05, b'a', b'b']);
        assert!(Apn::from_bitbuf(&mut buf).is_err());
    }
}
