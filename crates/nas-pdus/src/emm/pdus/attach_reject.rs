use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::gprs_timer::GprsTimer2;
use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::opaque::{read_rest, write_raw};
use crate::emm::enums::emm_cause::EmmCause;
use crate::emm::enums::emm_message_type::EmmMessageType;


const IEI_ESM_MSG: u8 = 0x78;
const IEI_T3346: u8 = 0x5F;
const IEI_T3402: u8 = 0x16;

/// Representation of the ATTACH REJECT message (TS 24.301 8.2.3).
/// Response to: ATTACH REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachReject {
    pub emm_cause: EmmCause,
    /// TLV-E 0x78, carries a PDN CONNECTIVITY REJECT
    pub esm_msg: Option<Vec<u8>>,
    /// TLV 0x5F
    pub t3346: Option<GprsTimer2>,
    /// TLV 0x16
    pub t3402: Option<GprsTimer2>,
}

impl AttachReject {
    pub fn new(emm_cause: EmmCause) -> Self {
        AttachReject { emm_cause, esm_msg: None, t3346: None, t3402: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::AttachReject)?;
        let mut msg = AttachReject::new(EmmCause::from(buffer.read_u8_field("emm_cause")?));

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_ESM_MSG => msg.esm_msg = Some(parse_tlve(buffer, "esm_msg", 0xFFFF, |b| read_rest(b, "esm_msg"))?),
                IEI_T3346 => msg.t3346 = Some(parse_tlv(buffer, "t3346", 1, GprsTimer2::from_bitbuf)?),
                IEI_T3402 => msg.t3402 = Some(parse_tlv(buffer, "t3402", 1, GprsTimer2::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::AttachReject);
        buffer.write_u8(self.emm_cause.into_raw());
        if let Some(ref esm) = self.esm_msg {
            write_tlve(buffer, IEI_ESM_MSG, "esm_msg", 0xFFFF, write_raw(esm))?;
        }
        if let Some(ref t) = self.t3346 {
            write_tlv(buffer, IEI_T3346, "t3346", 1, |b| t.to_bitbuf(b))?;
        }
        if let Some(ref t) = self.t3402 {
            write_tlv(buffer, IEI_T3402, "t3402", 1, |b| t.to_bitbuf(b))?;
        }
        Ok(())
    }
}
