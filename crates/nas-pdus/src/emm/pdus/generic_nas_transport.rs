//! DOWNLINK GENERIC NAS TRANSPORT and UPLINK GENERIC NAS TRANSPORT (TS 24.301 8.2.31, 8.2.32)

use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::opaque::{read_rest, write_raw};
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::enums::generic_msg_container_type::GenericMsgContainerType;


const IEI_ADDITIONAL_INFORMATION: u8 = 0x65;
const ADDITIONAL_INFORMATION_MAX_LEN: usize = 255;

/// Fields shared by both directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericNasTransport {
    pub container_type: GenericMsgContainerType,
    /// LV-E
    pub container: Vec<u8>,
    pub additional_info: Option<Vec<u8>>,
}

impl GenericNasTransport {
    fn from_bitbuf_with(buffer: &mut BitBuffer, msg_type: EmmMessageType, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, msg_type)?;
        let container_type = GenericMsgContainerType::from(buffer.read_u8_field("generic_msg_container_type")?);
        let container = parse_lve_bytes(buffer, "generic_msg_container", 0xFFFF)?;
        let mut additional_info = None;
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_ADDITIONAL_INFORMATION => {
                    additional_info = Some(parse_tlv(buffer, "additional_info", ADDITIONAL_INFORMATION_MAX_LEN, |b| read_rest(b, "additional_info"))?)
                }
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(GenericNasTransport { container_type, container, additional_info })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer, msg_type: EmmMessageType) -> Result<(), EncodeError> {
        write_emm_header(buffer, msg_type);
        buffer.write_u8(self.container_type.into_raw());
        write_lve_bytes(buffer, "generic_msg_container", 0xFFFF, &self.container)?;
        if let Some(ref info) = self.additional_info {
            write_tlv(buffer, IEI_ADDITIONAL_INFORMATION, "additional_info", ADDITIONAL_INFORMATION_MAX_LEN, write_raw(info))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownlinkGenericNasTransport(pub GenericNasTransport);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkGenericNasTransport(pub GenericNasTransport);

impl DownlinkGenericNasTransport {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        GenericNasTransport::from_bitbuf_with(buffer, EmmMessageType::DownlinkGenericNasTransport, policy).map(Self)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        self.0.to_bitbuf(buffer, EmmMessageType::DownlinkGenericNasTransport)
    }
}

impl UplinkGenericNasTransport {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        GenericNasTransport::from_bitbuf_with(buffer, EmmMessageType::UplinkGenericNasTransport, policy).map(Self)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        self.0.to_bitbuf(buffer, EmmMessageType::UplinkGenericNasTransport)
    }
}
