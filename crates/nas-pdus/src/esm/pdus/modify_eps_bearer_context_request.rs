use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::apn_ambr::ApnAmbr;
use crate::esm::fields::eps_qos::EpsQos;
use crate::esm::fields::pco::ProtocolConfigOptions;
use crate::esm::fields::quality_of_service::QualityOfService;
use crate::esm::fields::tft::TrafficFlowTemplate;
use super::bearer_ies::*;
use super::simple::IEI_PCO;


const IEI_NEW_EPS_QOS: u8 = 0x5B;
const IEI_TFT: u8 = 0x36;

/// Representation of the MODIFY EPS BEARER CONTEXT REQUEST message (TS 24.301 8.3.18).
/// Every IE is optional; an empty request only refreshes the bearer.
/// Response expected: MODIFY EPS BEARER CONTEXT ACCEPT or REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyEpsBearerContextRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    pub new_eps_qos: Option<EpsQos>,
    pub tft: Option<TrafficFlowTemplate>,
    pub new_qos: Option<QualityOfService>,
    pub negotiated_llc_sapi: Option<u8>,
    pub radio_priority: Option<u8>,
    pub packet_flow_id: Option<u8>,
    pub apn_ambr: Option<ApnAmbr>,
    pub pco: Option<ProtocolConfigOptions>,
}

impl ModifyEpsBearerContextRequest {
    pub fn new(eps_bearer_id: Ebi, proc_transaction_id: u8) -> Self {
        ModifyEpsBearerContextRequest {
            eps_bearer_id,
            proc_transaction_id,
            new_eps_qos: None,
            tft: None,
            new_qos: None,
            negotiated_llc_sapi: None,
            radio_priority: None,
            packet_flow_id: None,
            apn_ambr: None,
            pco: None,
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (ebi, pti) = read_esm_header(buffer, EsmMessageType::ModifyEpsBearerContextRequest)?;
        let mut msg = ModifyEpsBearerContextRequest::new(ebi, pti);

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_NEW_EPS_QOS => msg.new_eps_qos = Some(parse_tlv(buffer, "new_eps_qos", EpsQos::MAX_LEN, EpsQos::from_bitbuf)?),
                IEI_TFT => msg.tft = Some(parse_tlv(buffer, "tft", TrafficFlowTemplate::MAX_LEN, TrafficFlowTemplate::from_bitbuf)?),
                IEI_QOS => msg.new_qos = Some(parse_tlv(buffer, "new_qos", QualityOfService::MAX_LEN, QualityOfService::from_bitbuf)?),
                IEI_LLC_SAPI => msg.negotiated_llc_sapi = Some(parse_tv(buffer, "negotiated_llc_sapi", parse_llc_sapi)?),
                IEI_RADIO_PRIORITY => msg.radio_priority = Some(parse_type1(buffer, "radio_priority")? & 0x07),
                IEI_PACKET_FLOW_ID => msg.packet_flow_id = Some(parse_tlv(buffer, "packet_flow_id", 1, parse_packet_flow_id)?),
                IEI_APN_AMBR => msg.apn_ambr = Some(parse_tlv(buffer, "apn_ambr", ApnAmbr::MAX_LEN, ApnAmbr::from_bitbuf)?),
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::ModifyEpsBearerContextRequest)?;
        if let Some(ref qos) = self.new_eps_qos {
            write_tlv(buffer, IEI_NEW_EPS_QOS, "new_eps_qos", EpsQos::MAX_LEN, |b| qos.to_bitbuf(b))?;
        }
        if let Some(ref tft) = self.tft {
            write_tlv(buffer, IEI_TFT, "tft", TrafficFlowTemplate::MAX_LEN, |b| tft.to_bitbuf(b))?;
        }
        if let Some(ref qos) = self.new_qos {
            write_tlv(buffer, IEI_QOS, "new_qos", QualityOfService::MAX_LEN, |b| qos.to_bitbuf(b))?;
        }
        if let Some(sapi) = self.negotiated_llc_sapi {
            write_tv(buffer, IEI_LLC_SAPI, |b| write_llc_sapi(b, sapi))?;
        }
        if let Some(prio) = self.radio_priority {
            check_range(prio as u64, 3, "radio_priority")?;
            write_type1(buffer, IEI_RADIO_PRIORITY, prio, "radio_priority")?;
        }
        if let Some(pfi) = self.packet_flow_id {
            write_tlv(buffer, IEI_PACKET_FLOW_ID, "packet_flow_id", 1, |b| write_packet_flow_id(b, pfi))?;
        }
        if let Some(ref ambr) = self.apn_ambr {
            write_tlv(buffer, IEI_APN_AMBR, "apn_ambr", ApnAmbr::MAX_LEN, |b| ambr.to_bitbuf(b))?;
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
    use crate::esm::enums::tft_operation_code::TftOperationCode;
    use crate::esm::fields::tft::PacketFilterList;

    #[test]
    fn test_modify_delete_filters() {
        let mut msg = ModifyEpsBearerContextRequest::new(6, 0);
        msg.tft = Some(TrafficFlowTemplate {
            op_code: TftOperationCode::DeletePacketFilters,
            packet_filters: PacketFilterList::Ids(vec![1, 2]),
            parameters: vec![],
        });
        let mut buf = BitBuffer::new_autoexpand(64);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x62, 0x00, 0xC9, 0x36, 0x03, 0xA2, 0x01, 0x02]);
        buf.seek(0);
        assert_eq!(ModifyEpsBearerContextRequest::from_bitbuf(&mut buf).unwrap(), msg);
    }

    #[test]
    fn test_modify_ambr_only() {
        let mut buf = BitBuffer::from_hexstr("5200c95e020a0b");
        let msg = ModifyEpsBearerContextRequest::from_bitbuf(&mut buf).unwrap();
        assert_eq!(msg.eps_bearer_id, 5);
        assert_eq!(msg.apn_ambr, Some(ApnAmbr::new(0x0A, 0x0B)));
        assert!(msg.tft.is_none());
    }
}
