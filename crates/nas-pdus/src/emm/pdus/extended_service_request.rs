use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::mobile_identity::MobileIdentity;
use crate::common::nas_key_set_id::NasKeySetId;
use crate::emm::enums::csfb_response::CsfbResponse;
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::enums::service_type::ServiceType;
use crate::emm::fields::eps_bearer_context_status::EpsBearerContextStatus;


const IEI_CSFB_RESPONSE: u8 = 0xB0;
const IEI_EPS_BEARER_CONTEXT_STATUS: u8 = 0x57;
const IEI_DEVICE_PROPERTIES: u8 = 0xD0;

/// Representation of the EXTENDED SERVICE REQUEST message (TS 24.301 8.2.15).
/// Response expected: SERVICE REJECT, or bearer setup by the access stratum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedServiceRequest {
    pub service_type: ServiceType,
    pub nas_ksi: NasKeySetId,
    /// LV, an S-TMSI in TMSI format
    pub m_tmsi: MobileIdentity,
    pub csfb_response: Option<CsfbResponse>,
    pub eps_bearer_context_status: Option<EpsBearerContextStatus>,
    pub device_properties: Option<bool>,
}

impl ExtendedServiceRequest {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::ExtendedServiceRequest)?;
        let nas_ksi = NasKeySetId::from_nibble(buffer.read_field(4, "nas_ksi")? as u8)?;
        let service_type = ServiceType::from(buffer.read_field(4, "service_type")? as u8);
        let m_tmsi = parse_lv(buffer, "m_tmsi", MobileIdentity::MAX_LEN, MobileIdentity::from_bitbuf)?;

        let mut msg = ExtendedServiceRequest {
            service_type,
            nas_ksi,
            m_tmsi,
            csfb_response: None,
            eps_bearer_context_status: None,
            device_properties: None,
        };

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_CSFB_RESPONSE => {
                    let v = parse_type1(buffer, "csfb_response")? & 0x07;
                    msg.csfb_response = Some(CsfbResponse::from_raw(v as u64, "csfb_response")?);
                }
                IEI_EPS_BEARER_CONTEXT_STATUS => {
                    msg.eps_bearer_context_status = Some(parse_tlv(
                        buffer,
                        "eps_bearer_context_status",
                        EpsBearerContextStatus::LEN,
                        EpsBearerContextStatus::from_bitbuf,
                    )?)
                }
                IEI_DEVICE_PROPERTIES => msg.device_properties = Some(parse_type1(buffer, "device_properties")? & 0x01 == 1),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::ExtendedServiceRequest);
        check_range(self.service_type.into_raw() as u64, 4, "service_type")?;
        buffer.write_bits(self.nas_ksi.to_nibble()? as u64, 4);
        buffer.write_bits(self.service_type.into_raw() as u64, 4);
        write_lv(buffer, "m_tmsi", MobileIdentity::MAX_LEN, |b| self.m_tmsi.to_bitbuf(b))?;

        if let Some(resp) = self.csfb_response {
            write_type1(buffer, IEI_CSFB_RESPONSE, resp.into_raw() as u8, "csfb_response")?;
        }
        if let Some(ref status) = self.eps_bearer_context_status {
            write_tlv(buffer, IEI_EPS_BEARER_CONTEXT_STATUS, "eps_bearer_context_status", EpsBearerContextStatus::LEN, |b| status.to_bitbuf(b))?;
        }
        if let Some(low_prio) = self.device_properties {
            write_type1(buffer, IEI_DEVICE_PROPERTIES, low_prio as u8, "device_properties")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_service_request_packet_services() {
        // KSI 2, packet services via S1, S-TMSI 0x01020304
        let bytes = [0x07, 0x4C, 0x28, 0x05, 0xF4, 0x01, 0x02, 0x03, 0x04];
        let mut buf = BitBuffer::from_bytes(&bytes);
        let msg = ExtendedServiceRequest::from_bitbuf(&mut buf).unwrap();
        assert_eq!(msg.service_type, ServiceType::PacketServicesViaS1);
        assert_eq!(msg.nas_ksi, NasKeySetId::native(2));
        assert_eq!(msg.m_tmsi, MobileIdentity::Tmsi(0x01020304));

        let mut out = BitBuffer::new_autoexpand(64);
        msg.to_bitbuf(&mut out).unwrap();
        assert_eq!(out.to_bytes(), bytes.to_vec());
    }
}
