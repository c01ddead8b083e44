use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_cause::EsmCause;
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::eps_qos::EpsQos;
use crate::esm::fields::pco::ProtocolConfigOptions;
use crate::esm::fields::tft::{TrafficFlowAggregate, TrafficFlowTemplate};
use super::pdn_connectivity_request::IEI_DEVICE_PROPERTIES;
use super::simple::IEI_PCO;


const IEI_REQUIRED_QOS: u8 = 0x5B;
const IEI_ESM_CAUSE: u8 = 0x58;

/// Representation of the BEARER RESOURCE MODIFICATION REQUEST message (TS 24.301 8.3.10).
/// Response expected: MODIFY EPS BEARER CONTEXT REQUEST, DEACTIVATE EPS BEARER CONTEXT REQUEST
/// or BEARER RESOURCE MODIFICATION REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerResourceModificationRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    /// Bearer whose packet filters are being modified
    pub eps_bearer_id_for_packet_filter: Ebi,
    pub traffic_flow_aggregate: TrafficFlowAggregate,
    pub required_qos: Option<EpsQos>,
    /// Present when the UE asks to release the bearer
    pub esm_cause: Option<EsmCause>,
    pub pco: Option<ProtocolConfigOptions>,
    pub device_properties: Option<bool>,
}

impl BearerResourceModificationRequest {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (eps_bearer_id, proc_transaction_id) = read_esm_header(buffer, EsmMessageType::BearerResourceModificationRequest)?;
        buffer.read_field(4, "spare")?;
        let eps_bearer_id_for_packet_filter = buffer.read_field(4, "eps_bearer_id_for_packet_filter")? as u8;
        let traffic_flow_aggregate = parse_lv(buffer, "traffic_flow_aggregate", TrafficFlowTemplate::MAX_LEN, TrafficFlowTemplate::from_bitbuf)?;

        let mut msg = BearerResourceModificationRequest {
            eps_bearer_id,
            proc_transaction_id,
            eps_bearer_id_for_packet_filter,
            traffic_flow_aggregate,
            required_qos: None,
            esm_cause: None,
            pco: None,
            device_properties: None,
        };
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_REQUIRED_QOS => msg.required_qos = Some(parse_tlv(buffer, "required_qos", EpsQos::MAX_LEN, EpsQos::from_bitbuf)?),
                IEI_ESM_CAUSE => msg.esm_cause = Some(parse_tv(buffer, "esm_cause", |b| Ok(EsmCause::from(b.read_u8_field("esm_cause")?)))?),
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                IEI_DEVICE_PROPERTIES => msg.device_properties = Some(parse_type1(buffer, "device_properties")? & 0x01 == 1),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::BearerResourceModificationRequest)?;
        check_range(self.eps_bearer_id_for_packet_filter as u64, 4, "eps_bearer_id_for_packet_filter")?;
        buffer.write_bits(0, 4);
        buffer.write_bits(self.eps_bearer_id_for_packet_filter as u64, 4);
        write_lv(buffer, "traffic_flow_aggregate", TrafficFlowTemplate::MAX_LEN, |b| self.traffic_flow_aggregate.to_bitbuf(b))?;
        if let Some(ref qos) = self.required_qos {
            write_tlv(buffer, IEI_REQUIRED_QOS, "required_qos", EpsQos::MAX_LEN, |b| qos.to_bitbuf(b))?;
        }
        if let Some(cause) = self.esm_cause {
            write_tv(buffer, IEI_ESM_CAUSE, |b| {
                b.write_u8(cause.into_raw());
                Ok(())
            })?;
        }
        if let Some(ref pco) = self.pco {
            write_tlv(buffer, IEI_PCO, "pco", ProtocolConfigOptions::MAX_LEN, |b| pco.to_bitbuf(b))?;
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
    use crate::esm::enums::tft_operation_code::TftOperationCode;
    use crate::esm::fields::tft::PacketFilterList;

    #[test]
    fn test_release_request() {
        // Delete packet filter 1 of bearer 6 with cause regular deactivation
        let mut buf = BitBuffer::from_hexstr("0205d606 02a101 5824");
        let msg = BearerResourceModificationRequest::from_bitbuf(&mut buf).unwrap();
        assert_eq!(msg.eps_bearer_id_for_packet_filter, 6);
        assert_eq!(msg.traffic_flow_aggregate.op_code, TftOperationCode::DeletePacketFilters);
        assert_eq!(msg.traffic_flow_aggregate.packet_filters, PacketFilterList::Ids(vec![1]));
        assert_eq!(msg.esm_cause, Some(EsmCause::RegularDeactivation));
        assert!(msg.required_qos.is_none());
    }
}
