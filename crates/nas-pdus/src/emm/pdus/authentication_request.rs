use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::nas_key_set_id::NasKeySetId;
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::fields::auth_parameters::{AuthAutn, AuthRand, read_fixed_16};


/// Representation of the AUTHENTICATION REQUEST message (TS 24.301 8.2.7).
/// Response expected: AUTHENTICATION RESPONSE or AUTHENTICATION FAILURE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationRequest {
    /// KSI assigned to the keys derived from this vector
    pub nas_ksi: NasKeySetId,
    pub rand: AuthRand,
    pub autn: AuthAutn,
}

impl AuthenticationRequest {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::AuthenticationRequest)?;
        buffer.read_field(4, "spare")?;
        let nas_ksi = NasKeySetId::from_nibble(buffer.read_field(4, "nas_ksi")? as u8)?;
        let rand = buffer.read_array::<16>("rand")?;
        let autn = parse_lv(buffer, "autn", 16, read_fixed_16)?;
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(AuthenticationRequest { nas_ksi, rand, autn })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::AuthenticationRequest);
        buffer.write_bits(0, 4);
        buffer.write_bits(self.nas_ksi.to_nibble()? as u64, 4);
        buffer.write_bytes(&self.rand);
        write_lv_bytes(buffer, "autn", 16, &self.autn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_request_layout() {
        let msg = AuthenticationRequest { nas_ksi: NasKeySetId::native(2), rand: [0xAA; 16], autn: [0x55; 16] };
        let mut buf = BitBuffer::new_autoexpand(320);
        msg.to_bitbuf(&mut buf).unwrap();
        let bytes = buf.to_bytes();
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[..4], &[0x07, 0x52, 0x02, 0xAA]);
        assert_eq!(bytes[19], 0x10);
        buf.seek(0);
        assert_eq!(AuthenticationRequest::from_bitbuf(&mut buf).unwrap(), msg);
    }

    #[test]
    fn test_authentication_request_short_autn() {
        let mut bytes = vec![0x07, 0x52, 0x00];
        bytes.extend([0u8; 16]);
        bytes.extend([0x0F]);
        bytes.extend([0u8; 15]);
        let mut buf = BitBuffer::from_vec(bytes);
        assert!(AuthenticationRequest::from_bitbuf(&mut buf).is_err());
    }
}
