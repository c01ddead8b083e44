use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::enums::identity_type2::IdentityType2;


/// Representation of the IDENTITY REQUEST message (TS 24.301 8.2.18).
/// Response expected: IDENTITY RESPONSE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRequest {
    pub identity_type: IdentityType2,
}

impl IdentityRequest {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::IdentityRequest)?;
        buffer.read_field(5, "spare")?;
        let identity_type = IdentityType2::from(buffer.read_field(3, "identity_type")? as u8);
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(IdentityRequest { identity_type })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::IdentityRequest);
        check_range(self.identity_type.into_raw() as u64, 3, "identity_type")?;
        buffer.write_bits(0, 5);
        buffer.write_bits(self.identity_type.into_raw() as u64, 3);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_request_imsi() {
        let msg = IdentityRequest { identity_type: IdentityType2::Imsi };
        let mut buf = BitBuffer::new_autoexpand(24);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x07, 0x55, 0x01]);
        buf.seek(0);
        assert_eq!(IdentityRequest::from_bitbuf(&mut buf).unwrap(), msg);
    }

    #[test]
    fn test_identity_request_reserved_type_out_of_range() {
        let msg = IdentityRequest { identity_type: IdentityType2::Reserved(9) };
        let mut buf = BitBuffer::new_autoexpand(24);
        assert!(msg.to_bitbuf(&mut buf).is_err());
    }
}
