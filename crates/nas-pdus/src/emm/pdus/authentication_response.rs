use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::fields::auth_parameters::AuthRes;


/// Representation of the AUTHENTICATION RESPONSE message (TS 24.301 8.2.8).
/// Response to: AUTHENTICATION REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResponse {
    pub res: AuthRes,
}

impl AuthenticationResponse {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::AuthenticationResponse)?;
        let res = parse_lv(buffer, "res", AuthRes::MAX_LEN, AuthRes::from_bitbuf)?;
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(AuthenticationResponse { res })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::AuthenticationResponse);
        write_lv(buffer, "res", AuthRes::MAX_LEN, |b| self.res.to_bitbuf(b))
    }
}
