//! DOWNLINK NAS TRANSPORT and UPLINK NAS TRANSPORT (TS 24.301 8.2.12, 8.2.30).
//! Both carry an SMS container as an LV of up to 250 octets.

use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_message_type::EmmMessageType;


pub const NAS_CONTAINER_MAX_LEN: usize = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownlinkNasTransport {
    pub nas_container: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkNasTransport {
    pub nas_container: Vec<u8>,
}

fn read_container(buffer: &mut BitBuffer, msg_type: EmmMessageType, policy: IePolicy) -> Result<Vec<u8>, DecodeError> {
    read_emm_header(buffer, msg_type)?;
    let container = parse_lv_bytes(buffer, "nas_container", NAS_CONTAINER_MAX_LEN)?;
    if container.len() < 2 {
        return Err(DecodeError::InconsistentLength { field: "nas_container", expected: 2, found: container.len() });
    }
    while peek_iei(buffer).is_some() {
        unknown_ie(buffer, policy)?;
    }
    Ok(container)
}

impl DownlinkNasTransport {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let nas_container = read_container(buffer, EmmMessageType::DownlinkNasTransport, policy)?;
        Ok(DownlinkNasTransport { nas_container })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::DownlinkNasTransport);
        write_lv_bytes(buffer, "nas_container", NAS_CONTAINER_MAX_LEN, &self.nas_container)
    }
}

impl UplinkNasTransport {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let nas_container = read_container(buffer, EmmMessageType::UplinkNasTransport, policy)?;
        Ok(UplinkNasTransport { nas_container })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::UplinkNasTransport);
        write_lv_bytes(buffer, "nas_container", NAS_CONTAINER_MAX_LEN, &self.nas_container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uplink_nas_transport() {
        let mut buf = BitBuffer::from_bytes(&[0x07, 0x63, 0x03, 0x09, 0x01, 0x00]);
        let msg = UplinkNasTransport::from_bitbuf(&mut buf).unwrap();
        assert_eq!(msg.nas_container, vec![0x09, 0x01, 0x00]);
    }

    #[test]
    fn test_container_too_short() {
        let mut buf = BitBuffer::from_bytes(&[0x07, 0x62, 0x01, 0x09]);
        assert!(DownlinkNasTransport::from_bitbuf(&mut buf).is_err());
    }
}
