use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::eps_qos::EpsQos;
use crate::esm::fields::pco::ProtocolConfigOptions;
use crate::esm::fields::quality_of_service::QualityOfService;
use crate::esm::fields::tft::TrafficFlowTemplate;
use crate::esm::fields::transaction_identifier::TransactionIdentifier;
use super::bearer_ies::*;
use super::simple::IEI_PCO;


/// Representation of the ACTIVATE DEDICATED EPS BEARER CONTEXT REQUEST message (TS 24.301 8.3.3).
/// Response expected: ACTIVATE DEDICATED EPS BEARER CONTEXT ACCEPT or REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateDedicatedEpsBearerContextRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    /// Default bearer of the PDN connection this bearer belongs to
    pub linked_eps_bearer_id: Ebi,
    pub eps_qos: EpsQos,
    pub tft: TrafficFlowTemplate,
    pub transaction_identifier: Option<TransactionIdentifier>,
    pub negotiated_qos: Option<QualityOfService>,
    pub negotiated_llc_sapi: Option<u8>,
    pub radio_priority: Option<u8>,
    pub packet_flow_id: Option<u8>,
    pub pco: Option<ProtocolConfigOptions>,
}

impl ActivateDedicatedEpsBearerContextRequest {
    pub fn new(eps_bearer_id: Ebi, linked_eps_bearer_id: Ebi, eps_qos: EpsQos, tft: TrafficFlowTemplate) -> Self {
        ActivateDedicatedEpsBearerContextRequest {
            eps_bearer_id,
            proc_transaction_id: 0,
            linked_eps_bearer_id,
            eps_qos,
            tft,
            transaction_identifier: None,
            negotiated_qos: None,
            negotiated_llc_sapi: None,
            radio_priority: None,
            packet_flow_id: None,
            pco: None,
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (ebi, pti) = read_esm_header(buffer, EsmMessageType::ActivateDedicatedEpsBearerContextRequest)?;
        buffer.read_field(4, "spare")?;
        let linked_ebi = buffer.read_field(4, "linked_eps_bearer_id")? as u8;
        let eps_qos = parse_lv(buffer, "eps_qos", EpsQos::MAX_LEN, EpsQos::from_bitbuf)?;
        let tft = parse_lv(buffer, "tft", TrafficFlowTemplate::MAX_LEN, TrafficFlowTemplate::from_bitbuf)?;

        let mut msg = ActivateDedicatedEpsBearerContextRequest::new(ebi, linked_ebi, eps_qos, tft);
        msg.proc_transaction_id = pti;

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_TRANSACTION_IDENTIFIER => {
                    msg.transaction_identifier = Some(parse_tlv(
                        buffer,
                        "transaction_identifier",
                        TransactionIdentifier::MAX_LEN,
                        TransactionIdentifier::from_bitbuf,
                    )?)
                }
                IEI_QOS => msg.negotiated_qos = Some(parse_tlv(buffer, "negotiated_qos", QualityOfService::MAX_LEN, QualityOfService::from_bitbuf)?),
                IEI_LLC_SAPI => msg.negotiated_llc_sapi = Some(parse_tv(buffer, "negotiated_llc_sapi", parse_llc_sapi)?),
                IEI_RADIO_PRIORITY => msg.radio_priority = Some(parse_type1(buffer, "radio_priority")? & 0x07),
                IEI_PACKET_FLOW_ID => msg.packet_flow_id = Some(parse_tlv(buffer, "packet_flow_id", 1, parse_packet_flow_id)?),
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::ActivateDedicatedEpsBearerContextRequest)?;
        check_range(self.linked_eps_bearer_id as u64, 4, "linked_eps_bearer_id")?;
        buffer.write_bits(0, 4);
        buffer.write_bits(self.linked_eps_bearer_id as u64, 4);
        write_lv(buffer, "eps_qos", EpsQos::MAX_LEN, |b| self.eps_qos.to_bitbuf(b))?;
        write_lv(buffer, "tft", TrafficFlowTemplate::MAX_LEN, |b| self.tft.to_bitbuf(b))?;

        if let Some(ref ti) = self.transaction_identifier {
            write_tlv(buffer, IEI_TRANSACTION_IDENTIFIER, "transaction_identifier", TransactionIdentifier::MAX_LEN, |b| ti.to_bitbuf(b))?;
        }
        if let Some(ref qos) = self.negotiated_qos {
            write_tlv(buffer, IEI_QOS, "negotiated_qos", QualityOfService::MAX_LEN, |b| qos.to_bitbuf(b))?;
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
        if let Some(ref pco) = self.pco {
            write_tlv(buffer, IEI_PCO, "pco", ProtocolConfigOptions::MAX_LEN, |b| pco.to_bitbuf(b))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nas_core::debug;

    use super::*;
    use crate::esm::enums::packet_filter_direction::PacketFilterDirection;
    use crate::esm::enums::tft_operation_code::TftOperationCode;
    use crate::esm::fields::tft::{PacketFilterComponent, PacketFilterList};

    /// Captured from a live network, with the integrity protection header removed
    const VOICE_BEARER: &str = "6200c505010107213100034008ae5d0200c28134014d";

    #[test]
    fn test_voice_bearer_vector() {
        debug::setup_logging_verbose();
        let mut buf = BitBuffer::from_hexstr(VOICE_BEARER);
        let msg = ActivateDedicatedEpsBearerContextRequest::from_bitbuf(&mut buf).unwrap();
        tracing::info!("Parsed: {:?}", msg);

        assert_eq!(msg.eps_bearer_id, 6);
        assert_eq!(msg.proc_transaction_id, 0);
        assert_eq!(msg.linked_eps_bearer_id, 5);
        assert_eq!(msg.eps_qos.qci, 1);
        assert_eq!(msg.tft.op_code, TftOperationCode::CreateNewTft);
        let PacketFilterList::Filters(ref filters) = msg.tft.packet_filters else {
            panic!("expected full packet filters");
        };
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].direction, PacketFilterDirection::Bidirectional);
        assert_eq!(filters[0].id, 1);
        assert_eq!(filters[0].precedence, 0);
        assert_eq!(filters[0].components, vec![PacketFilterComponent::SingleLocalPort(2222)]);
        assert_eq!(msg.transaction_identifier, Some(TransactionIdentifier { ti_flag: false, ti_value: 0, ti_extension: Some(0x42) }));
        assert_eq!(msg.radio_priority, Some(1));
        assert_eq!(msg.packet_flow_id, Some(77));
        assert_eq!(msg.pco, None);

        let mut out = BitBuffer::new_autoexpand(256);
        msg.to_bitbuf(&mut out).unwrap();
        assert_eq!(out.to_bytes(), BitBuffer::from_hexstr(VOICE_BEARER).to_bytes());
    }

    #[test]
    fn test_truncated_tft() {
        // TFT length says 7 but only 3 octets follow
        let mut buf = BitBuffer::from_hexstr("6200c5 05 0101 07213100");
        assert!(ActivateDedicatedEpsBearerContextRequest::from_bitbuf(&mut buf).is_err());
    }
}
