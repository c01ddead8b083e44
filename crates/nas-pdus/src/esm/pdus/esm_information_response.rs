use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::apn::Apn;
use crate::esm::fields::pco::ProtocolConfigOptions;
use super::pdn_connectivity_request::IEI_ACCESS_POINT_NAME;
use super::simple::IEI_PCO;


/// Representation of the ESM INFORMATION RESPONSE message (TS 24.301 8.3.14).
/// Response to: ESM INFORMATION REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsmInformationResponse {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    pub apn: Option<Apn>,
    pub pco: Option<ProtocolConfigOptions>,
}

impl EsmInformationResponse {
    pub fn new(proc_transaction_id: u8) -> Self {
        EsmInformationResponse { eps_bearer_id: 0, proc_transaction_id, apn: None, pco: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (ebi, pti) = read_esm_header(buffer, EsmMessageType::EsmInformationResponse)?;
        let mut msg = EsmInformationResponse::new(pti);
        msg.eps_bearer_id = ebi;
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_ACCESS_POINT_NAME => msg.apn = Some(parse_tlv(buffer, "apn", Apn::MAX_LEN, Apn::from_bitbuf)?),
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::EsmInformationResponse)?;
        if let Some(ref apn) = self.apn {
            write_tlv(buffer, IEI_ACCESS_POINT_NAME, "apn", Apn::MAX_LEN, |b| apn.to_bitbuf(b))?;
        }
        if let Some(ref pco) = self.pco {
            write_tlv(buffer, IEI_PCO, "pco", ProtocolConfigOptions::MAX_LEN, |b| pco.to_bitbuf(b))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esm_info_response_apn() {
        let mut buf = BitBuffer::from_hexstr("0201da2809 08696e7465726e6574");
        let msg = EsmInformationResponse::from_bitbuf(&mut buf).unwrap();
        assert_eq!(msg.proc_transaction_id, 1);
        assert_eq!(msg.apn.as_ref().map(|a| a.as_str()), Some("internet"));
        assert!(msg.pco.is_none());
    }

    #[test]
    fn test_unknown_ie_rejected_when_strict() {
        // 0x66 is not defined for this message
        let mut buf = BitBuffer::from_hexstr("0201da660101");
        assert!(EsmInformationResponse::from_bitbuf_with(&mut buf, IePolicy::Reject).is_err());
        buf.seek(0);
        assert_eq!(EsmInformationResponse::from_bitbuf(&mut buf).unwrap(), EsmInformationResponse::new(1));
    }
}
