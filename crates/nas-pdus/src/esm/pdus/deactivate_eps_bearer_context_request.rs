use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::typed_ies::*;

use crate::common::gprs_timer::GprsTimer3;
use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_cause::EsmCause;
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::pco::ProtocolConfigOptions;
use super::simple::{IEI_PCO, IEI_T3396};


/// Representation of the DEACTIVATE EPS BEARER CONTEXT REQUEST message (TS 24.301 8.3.12).
/// Response expected: DEACTIVATE EPS BEARER CONTEXT ACCEPT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivateEpsBearerContextRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    pub esm_cause: EsmCause,
    pub pco: Option<ProtocolConfigOptions>,
    pub t3396: Option<GprsTimer3>,
}

impl DeactivateEpsBearerContextRequest {
    pub fn new(eps_bearer_id: Ebi, proc_transaction_id: u8, esm_cause: EsmCause) -> Self {
        DeactivateEpsBearerContextRequest { eps_bearer_id, proc_transaction_id, esm_cause, pco: None, t3396: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (ebi, pti) = read_esm_header(buffer, EsmMessageType::DeactivateEpsBearerContextRequest)?;
        let cause = EsmCause::from(buffer.read_u8_field("esm_cause")?);
        let mut msg = DeactivateEpsBearerContextRequest::new(ebi, pti, cause);
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                IEI_T3396 => msg.t3396 = Some(parse_tlv(buffer, "t3396", 1, GprsTimer3::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::DeactivateEpsBearerContextRequest)?;
        buffer.write_u8(self.esm_cause.into_raw());
        if let Some(ref pco) = self.pco {
            write_tlv(buffer, IEI_PCO, "pco", ProtocolConfigOptions::MAX_LEN, |b| pco.to_bitbuf(b))?;
        }
        if let Some(ref t) = self.t3396 {
            write_tlv(buffer, IEI_T3396, "t3396", 1, |b| t.to_bitbuf(b))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_deactivation() {
        let msg = DeactivateEpsBearerContextRequest::new(6, 0, EsmCause::RegularDeactivation);
        let mut buf = BitBuffer::new_autoexpand(32);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x62, 0x00, 0xCD, 0x24]);
        buf.seek(0);
        assert_eq!(DeactivateEpsBearerContextRequest::from_bitbuf(&mut buf).unwrap(), msg);
    }

    #[test]
    fn test_missing_cause() {
        let mut buf = BitBuffer::from_hexstr("6200cd");
        assert!(DeactivateEpsBearerContextRequest::from_bitbuf(&mut buf).is_err());
    }
}
