use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::pco::ProtocolConfigOptions;
use super::simple::IEI_PCO;


/// Representation of the PDN DISCONNECT REQUEST message (TS 24.301 8.3.22).
/// Response expected: DEACTIVATE EPS BEARER CONTEXT REQUEST or PDN DISCONNECT REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdnDisconnectRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    /// Default bearer of the PDN connection to release
    pub linked_eps_bearer_id: Ebi,
    pub pco: Option<ProtocolConfigOptions>,
}

impl PdnDisconnectRequest {
    pub fn new(proc_transaction_id: u8, linked_eps_bearer_id: Ebi) -> Self {
        PdnDisconnectRequest { eps_bearer_id: 0, proc_transaction_id, linked_eps_bearer_id, pco: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (ebi, pti) = read_esm_header(buffer, EsmMessageType::PdnDisconnectRequest)?;
        buffer.read_field(4, "spare")?;
        let linked = buffer.read_field(4, "linked_eps_bearer_id")? as u8;
        let mut msg = PdnDisconnectRequest::new(pti, linked);
        msg.eps_bearer_id = ebi;
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::PdnDisconnectRequest)?;
        check_range(self.linked_eps_bearer_id as u64, 4, "linked_eps_bearer_id")?;
        buffer.write_bits(0, 4);
        buffer.write_bits(self.linked_eps_bearer_id as u64, 4);
        if let Some(ref pco) = self.pco {
            write_tlv(buffer, IEI_PCO, "pco", ProtocolConfigOptions::MAX_LEN, |b| pco.to_bitbuf(b))?;
        }
        Ok(())
    }
}
