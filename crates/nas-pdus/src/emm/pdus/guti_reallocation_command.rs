use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::mobile_identity::EpsMobileIdentity;
use crate::common::tai::TaiList;
use crate::emm::enums::emm_message_type::EmmMessageType;


const IEI_TAI_LIST: u8 = 0x54;

/// Representation of the GUTI REALLOCATION COMMAND message (TS 24.301 8.2.16).
/// Response expected: GUTI REALLOCATION COMPLETE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutiReallocationCommand {
    pub guti: EpsMobileIdentity,
    pub tai_list: Option<TaiList>,
}

impl GutiReallocationCommand {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::GutiReallocationCommand)?;
        let guti = parse_lv(buffer, "guti", EpsMobileIdentity::MAX_LEN, EpsMobileIdentity::from_bitbuf)?;
        let mut tai_list = None;
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_TAI_LIST => tai_list = Some(parse_tlv(buffer, "tai_list", TaiList::MAX_LEN, TaiList::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(GutiReallocationCommand { guti, tai_list })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::GutiReallocationCommand);
        write_lv(buffer, "guti", EpsMobileIdentity::MAX_LEN, |b| self.guti.to_bitbuf(b))?;
        if let Some(ref tais) = self.tai_list {
            write_tlv(buffer, IEI_TAI_LIST, "tai_list", TaiList::MAX_LEN, |b| tais.to_bitbuf(b))?;
        }
        Ok(())
    }
}
