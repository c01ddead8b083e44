use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::mobile_identity::MobileIdentity;
use crate::emm::enums::emm_message_type::EmmMessageType;


const IEI_IMEISV: u8 = 0x23;

/// Representation of the SECURITY MODE COMPLETE message (TS 24.301 8.2.21).
/// Response to: SECURITY MODE COMMAND
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityModeComplete {
    /// Present when the command requested it
    pub imeisv: Option<MobileIdentity>,
}

impl SecurityModeComplete {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::SecurityModeComplete)?;
        let mut msg = SecurityModeComplete::default();
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_IMEISV => msg.imeisv = Some(parse_tlv(buffer, "imeisv", MobileIdentity::MAX_LEN, MobileIdentity::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::SecurityModeComplete);
        if let Some(ref id) = self.imeisv {
            write_tlv(buffer, IEI_IMEISV, "imeisv", MobileIdentity::MAX_LEN, |b| id.to_bitbuf(b))?;
        }
        Ok(())
    }
}
