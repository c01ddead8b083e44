use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::mobile_identity::MobileIdentity;
use crate::emm::enums::emm_message_type::EmmMessageType;


/// Representation of the IDENTITY RESPONSE message (TS 24.301 8.2.19).
/// Response to: IDENTITY REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResponse {
    pub mobile_identity: MobileIdentity,
}

impl IdentityResponse {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::IdentityResponse)?;
        let mobile_identity = parse_lv(buffer, "mobile_identity", MobileIdentity::MAX_LEN, MobileIdentity::from_bitbuf)?;
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(IdentityResponse { mobile_identity })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::IdentityResponse);
        write_lv(buffer, "mobile_identity", MobileIdentity::MAX_LEN, |b| self.mobile_identity.to_bitbuf(b))
    }
}
