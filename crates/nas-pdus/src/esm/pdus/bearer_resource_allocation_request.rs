use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::eps_qos::EpsQos;
use crate::esm::fields::pco::ProtocolConfigOptions;
use crate::esm::fields::tft::{TrafficFlowAggregate, TrafficFlowTemplate};
use super::pdn_connectivity_request::IEI_DEVICE_PROPERTIES;
use super::simple::IEI_PCO;


/// Representation of the BEARER RESOURCE ALLOCATION REQUEST message (TS 24.301 8.3.8).
/// Response expected: ACTIVATE DEDICATED EPS BEARER CONTEXT REQUEST or BEARER RESOURCE ALLOCATION REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerResourceAllocationRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    pub linked_eps_bearer_id: Ebi,
    pub traffic_flow_aggregate: TrafficFlowAggregate,
    pub required_qos: EpsQos,
    pub pco: Option<ProtocolConfigOptions>,
    pub device_properties: Option<bool>,
}

impl BearerResourceAllocationRequest {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (eps_bearer_id, proc_transaction_id) = read_esm_header(buffer, EsmMessageType::BearerResourceAllocationRequest)?;
        buffer.read_field(4, "spare")?;
        let linked_eps_bearer_id = buffer.read_field(4, "linked_eps_bearer_id")? as u8;
        let traffic_flow_aggregate = parse_lv(buffer, "traffic_flow_aggregate", TrafficFlowTemplate::MAX_LEN, TrafficFlowTemplate::from_bitbuf)?;
        let required_qos = parse_lv(buffer, "required_qos", EpsQos::MAX_LEN, EpsQos::from_bitbuf)?;

        let mut msg = BearerResourceAllocationRequest {
            eps_bearer_id,
            proc_transaction_id,
            linked_eps_bearer_id,
            traffic_flow_aggregate,
            required_qos,
            pco: None,
            device_properties: None,
        };
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                IEI_DEVICE_PROPERTIES => msg.device_properties = Some(parse_type1(buffer, "device_properties")? & 0x01 == 1),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::BearerResourceAllocationRequest)?;
        check_range(self.linked_eps_bearer_id as u64, 4, "linked_eps_bearer_id")?;
        buffer.write_bits(0, 4);
        buffer.write_bits(self.linked_eps_bearer_id as u64, 4);
        write_lv(buffer, "traffic_flow_aggregate", TrafficFlowTemplate::MAX_LEN, |b| self.traffic_flow_aggregate.to_bitbuf(b))?;
        write_lv(buffer, "required_qos", EpsQos::MAX_LEN, |b| self.required_qos.to_bitbuf(b))?;
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
    use crate::esm::enums::packet_filter_direction::PacketFilterDirection;
    use crate::esm::enums::tft_operation_code::TftOperationCode;
    use crate::esm::fields::tft::{PacketFilter, PacketFilterComponent};

    #[test]
    fn test_allocation_request_roundtrip() {
        let filter = PacketFilter {
            direction: PacketFilterDirection::Uplink,
            id: 0,
            precedence: 0x10,
            components: vec![PacketFilterComponent::ProtocolId(17), PacketFilterComponent::SingleRemotePort(5060)],
        };
        let msg = BearerResourceAllocationRequest {
            eps_bearer_id: 0,
            proc_transaction_id: 4,
            linked_eps_bearer_id: 5,
            traffic_flow_aggregate: TrafficFlowAggregate::new(TftOperationCode::CreateNewTft, vec![filter]),
            required_qos: EpsQos::from_qci(5),
            pco: None,
            device_properties: Some(false),
        };
        let mut buf = BitBuffer::new_autoexpand(64);
        msg.to_bitbuf(&mut buf).unwrap();
        let bytes = buf.to_bytes();
        assert_eq!(&bytes[..5], &[0x02, 0x04, 0xD4, 0x05, 0x09]);
        assert_eq!(*bytes.last().unwrap(), 0xC0);
        buf.seek(0);
        assert_eq!(BearerResourceAllocationRequest::from_bitbuf(&mut buf).unwrap(), msg);
    }
}
