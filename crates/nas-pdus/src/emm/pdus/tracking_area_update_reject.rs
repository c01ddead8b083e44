use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::gprs_timer::GprsTimer2;
use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_cause::EmmCause;
use crate::emm::enums::emm_message_type::EmmMessageType;


const IEI_T3346: u8 = 0x5F;

/// Representation of the TRACKING AREA UPDATE REJECT message (TS 24.301 8.2.28).
/// Response to: TRACKING AREA UPDATE REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingAreaUpdateReject {
    pub emm_cause: EmmCause,
    pub t3346: Option<GprsTimer2>,
}

impl TrackingAreaUpdateReject {
    pub fn new(emm_cause: EmmCause) -> Self {
        TrackingAreaUpdateReject { emm_cause, t3346: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::TrackingAreaUpdateReject)?;
        let mut msg = TrackingAreaUpdateReject::new(EmmCause::from(buffer.read_u8_field("emm_cause")?));
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_T3346 => msg.t3346 = Some(parse_tlv(buffer, "t3346", 1, GprsTimer2::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::TrackingAreaUpdateReject);
        buffer.write_u8(self.emm_cause.into_raw());
        if let Some(ref t) = self.t3346 {
            write_tlv(buffer, IEI_T3346, "t3346", 1, |b| t.to_bitbuf(b))?;
        }
        Ok(())
    }
}
