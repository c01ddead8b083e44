use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_message_type::EmmMessageType;


/// Representation of the ATTACH COMPLETE message (TS 24.301 8.2.2).
/// Response to: ATTACH ACCEPT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachComplete {
    /// LV-E, carries an ACTIVATE DEFAULT EPS BEARER CONTEXT ACCEPT
    pub esm_msg: Vec<u8>,
}

impl AttachComplete {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::AttachComplete)?;
        let esm_msg = parse_lve_bytes(buffer, "esm_msg", 0xFFFF)?;
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(AttachComplete { esm_msg })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::AttachComplete);
        write_lve_bytes(buffer, "esm_msg", 0xFFFF, &self.esm_msg)
    }
}
