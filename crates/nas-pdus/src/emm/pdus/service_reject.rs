use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::gprs_timer::{GprsTimer, GprsTimer2};
use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_cause::EmmCause;
use crate::emm::enums::emm_message_type::EmmMessageType;


const IEI_T3442: u8 = 0x5B;
const IEI_T3346: u8 = 0x5F;

/// Representation of the SERVICE REJECT message (TS 24.301 8.2.24).
/// Response to: SERVICE REQUEST, EXTENDED SERVICE REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReject {
    pub emm_cause: EmmCause,
    /// TV 0x5B, only with cause #39
    pub t3442: Option<GprsTimer>,
    pub t3346: Option<GprsTimer2>,
}

impl ServiceReject {
    pub fn new(emm_cause: EmmCause) -> Self {
        ServiceReject { emm_cause, t3442: None, t3346: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::ServiceReject)?;
        let mut msg = ServiceReject::new(EmmCause::from(buffer.read_u8_field("emm_cause")?));
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_T3442 => msg.t3442 = Some(parse_tv(buffer, "t3442", GprsTimer::from_bitbuf)?),
                IEI_T3346 => msg.t3346 = Some(parse_tlv(buffer, "t3346", 1, GprsTimer2::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::ServiceReject);
        buffer.write_u8(self.emm_cause.into_raw());
        if let Some(ref t) = self.t3442 {
            write_tv(buffer, IEI_T3442, |b| t.to_bitbuf(b))?;
        }
        if let Some(ref t) = self.t3346 {
            write_tlv(buffer, IEI_T3346, "t3346", 1, |b| t.to_bitbuf(b))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_reject() {
        let mut msg = ServiceReject::new(EmmCause::ImplicitlyDetached);
        msg.t3346 = Some(GprsTimer::minutes(2));
        let mut buf = BitBuffer::new_autoexpand(32);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x07, 0x4E, 0x0A, 0x5F, 0x01, 0x22]);
        buf.seek(0);
        assert_eq!(ServiceReject::from_bitbuf(&mut buf).unwrap(), msg);
    }
}
