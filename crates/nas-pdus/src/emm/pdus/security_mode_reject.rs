use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_cause::EmmCause;
use crate::emm::enums::emm_message_type::EmmMessageType;


/// Representation of the SECURITY MODE REJECT message (TS 24.301 8.2.22).
/// Response to: SECURITY MODE COMMAND
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityModeReject {
    pub emm_cause: EmmCause,
}

impl SecurityModeReject {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::SecurityModeReject)?;
        let emm_cause = EmmCause::from(buffer.read_u8_field("emm_cause")?);
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(SecurityModeReject { emm_cause })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::SecurityModeReject);
        buffer.write_u8(self.emm_cause.into_raw());
        Ok(())
    }
}
