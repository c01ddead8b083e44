use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::opaque::{read_rest, write_raw};
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::enums::lcs_indicator::LcsIndicator;
use crate::emm::enums::paging_identity::PagingIdentity;


const IEI_CLI: u8 = 0x60;
const IEI_SS_CODE: u8 = 0x61;
const IEI_LCS_INDICATOR: u8 = 0x62;
const IEI_LCS_CLIENT_IDENTITY: u8 = 0x63;

/// Representation of the CS SERVICE NOTIFICATION message (TS 24.301 8.2.9).
/// Notifies a UE in connected mode of a mobile terminating CS call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsServiceNotification {
    pub paging_identity: PagingIdentity,
    /// Calling line identification, opaque BCD number
    pub cli: Option<Vec<u8>>,
    pub ss_code: Option<u8>,
    pub lcs_indicator: Option<LcsIndicator>,
    pub lcs_client_identity: Option<Vec<u8>>,
}

impl CsServiceNotification {
    pub fn new(paging_identity: PagingIdentity) -> Self {
        CsServiceNotification { paging_identity, cli: None, ss_code: None, lcs_indicator: None, lcs_client_identity: None }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::CsServiceNotification)?;
        buffer.read_field(7, "spare")?;
        let paging_identity = PagingIdentity::from_raw(buffer.read_field(1, "paging_identity")?, "paging_identity")?;
        let mut msg = CsServiceNotification::new(paging_identity);

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_CLI => msg.cli = Some(parse_tlv(buffer, "cli", 12, |b| read_rest(b, "cli"))?),
                IEI_SS_CODE => msg.ss_code = Some(parse_tv(buffer, "ss_code", |b| b.read_u8_field("ss_code"))?),
                IEI_LCS_INDICATOR => {
                    msg.lcs_indicator = Some(parse_tv(buffer, "lcs_indicator", |b| Ok(LcsIndicator::from(b.read_u8_field("lcs_indicator")?)))?)
                }
                IEI_LCS_CLIENT_IDENTITY => {
                    msg.lcs_client_identity = Some(parse_tlv(buffer, "lcs_client_identity", 255, |b| read_rest(b, "lcs_client_identity"))?)
                }
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::CsServiceNotification);
        buffer.write_bits(0, 7);
        buffer.write_bits(self.paging_identity.into_raw(), 1);
        if let Some(ref cli) = self.cli {
            write_tlv(buffer, IEI_CLI, "cli", 12, write_raw(cli))?;
        }
        if let Some(code) = self.ss_code {
            write_tv(buffer, IEI_SS_CODE, |b| {
                b.write_u8(code);
                Ok(())
            })?;
        }
        if let Some(ind) = self.lcs_indicator {
            write_tv(buffer, IEI_LCS_INDICATOR, |b| {
                b.write_u8(ind.into_raw());
                Ok(())
            })?;
        }
        if let Some(ref id) = self.lcs_client_identity {
            write_tlv(buffer, IEI_LCS_CLIENT_IDENTITY, "lcs_client_identity", 255, write_raw(id))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cs_service_notification_tmsi_paging() {
        let mut msg = CsServiceNotification::new(PagingIdentity::Tmsi);
        msg.ss_code = Some(0x11);
        let mut buf = BitBuffer::new_autoexpand(48);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x07, 0x64, 0x01, 0x61, 0x11]);
        buf.seek(0);
        assert_eq!(CsServiceNotification::from_bitbuf(&mut buf).unwrap(), msg);
    }
}
