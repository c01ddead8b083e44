//! TS 24.008 10.5.6.12 Traffic flow template, also used for the traffic flow aggregate
//! (TS 24.301 9.9.4.15) of bearer resource requests.

use nas_core::{BitBuffer, DecodeError, EncodeError};
use nas_core::codec_error::check_range;

use crate::esm::enums::packet_filter_direction::PacketFilterDirection;
use crate::esm::enums::tft_operation_code::TftOperationCode;


const MAX_PACKET_FILTERS: usize = 15;
const MAX_PARAMETERS: usize = 15;

const COMP_IPV4_REMOTE_ADDRESS: u8 = 0x10;
const COMP_IPV4_LOCAL_ADDRESS: u8 = 0x11;
const COMP_IPV6_REMOTE_ADDRESS: u8 = 0x20;
const COMP_IPV6_REMOTE_PREFIX: u8 = 0x21;
const COMP_IPV6_LOCAL_PREFIX: u8 = 0x23;
const COMP_PROTOCOL_ID: u8 = 0x30;
const COMP_SINGLE_LOCAL_PORT: u8 = 0x40;
const COMP_LOCAL_PORT_RANGE: u8 = 0x41;
const COMP_SINGLE_REMOTE_PORT: u8 = 0x50;
const COMP_REMOTE_PORT_RANGE: u8 = 0x51;
const COMP_SECURITY_PARAMETER_INDEX: u8 = 0x60;
const COMP_TYPE_OF_SERVICE: u8 = 0x70;
const COMP_FLOW_LABEL: u8 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketFilterComponent {
    Ipv4RemoteAddress { addr: [u8; 4], mask: [u8; 4] },
    Ipv4LocalAddress { addr: [u8; 4], mask: [u8; 4] },
    Ipv6RemoteAddress { addr: [u8; 16], mask: [u8; 16] },
    Ipv6RemotePrefix { addr: [u8; 16], prefix_len: u8 },
    Ipv6LocalPrefix { addr: [u8; 16], prefix_len: u8 },
    ProtocolId(u8),
    SingleLocalPort(u16),
    LocalPortRange { low: u16, high: u16 },
    SingleRemotePort(u16),
    RemotePortRange { low: u16, high: u16 },
    SecurityParameterIndex(u32),
    TypeOfService { value: u8, mask: u8 },
    /// 20 bits
    FlowLabel(u32),
    /// Unknown component type; its length is unknown, so it takes the rest of the filter
    Unknown { type_id: u8, contents: Vec<u8> },
}

impl PacketFilterComponent {
    pub fn type_id(&self) -> u8 {
        match self {
            PacketFilterComponent::Ipv4RemoteAddress { .. } => COMP_IPV4_REMOTE_ADDRESS,
            PacketFilterComponent::Ipv4LocalAddress { .. } => COMP_IPV4_LOCAL_ADDRESS,
            PacketFilterComponent::Ipv6RemoteAddress { .. } => COMP_IPV6_REMOTE_ADDRESS,
            PacketFilterComponent::Ipv6RemotePrefix { .. } => COMP_IPV6_REMOTE_PREFIX,
            PacketFilterComponent::Ipv6LocalPrefix { .. } => COMP_IPV6_LOCAL_PREFIX,
            PacketFilterComponent::ProtocolId(_) => COMP_PROTOCOL_ID,
            PacketFilterComponent::SingleLocalPort(_) => COMP_SINGLE_LOCAL_PORT,
            PacketFilterComponent::LocalPortRange { .. } => COMP_LOCAL_PORT_RANGE,
            PacketFilterComponent::SingleRemotePort(_) => COMP_SINGLE_REMOTE_PORT,
            PacketFilterComponent::RemotePortRange { .. } => COMP_REMOTE_PORT_RANGE,
            PacketFilterComponent::SecurityParameterIndex(_) => COMP_SECURITY_PARAMETER_INDEX,
            PacketFilterComponent::TypeOfService { .. } => COMP_TYPE_OF_SERVICE,
            PacketFilterComponent::FlowLabel(_) => COMP_FLOW_LABEL,
            PacketFilterComponent::Unknown { type_id, .. } => *type_id,
        }
    }

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let type_id = buffer.read_u8_field("component_type")?;
        let c = match type_id {
            COMP_IPV4_REMOTE_ADDRESS => {
                PacketFilterComponent::Ipv4RemoteAddress { addr: buffer.read_array::<4>("ipv4_addr")?, mask: buffer.read_array::<4>("ipv4_mask")? }
            }
            COMP_IPV4_LOCAL_ADDRESS => {
                PacketFilterComponent::Ipv4LocalAddress { addr: buffer.read_array::<4>("ipv4_addr")?, mask: buffer.read_array::<4>("ipv4_mask")? }
            }
            COMP_IPV6_REMOTE_ADDRESS => {
                PacketFilterComponent::Ipv6RemoteAddress { addr: buffer.read_array::<16>("ipv6_addr")?, mask: buffer.read_array::<16>("ipv6_mask")? }
            }
            COMP_IPV6_REMOTE_PREFIX => PacketFilterComponent::Ipv6RemotePrefix {
                addr: buffer.read_array::<16>("ipv6_addr")?,
                prefix_len: buffer.read_u8_field("ipv6_prefix_len")?,
            },
            COMP_IPV6_LOCAL_PREFIX => PacketFilterComponent::Ipv6LocalPrefix {
                addr: buffer.read_array::<16>("ipv6_addr")?,
                prefix_len: buffer.read_u8_field("ipv6_prefix_len")?,
            },
            COMP_PROTOCOL_ID => PacketFilterComponent::ProtocolId(buffer.read_u8_field("protocol_id")?),
            COMP_SINGLE_LOCAL_PORT => PacketFilterComponent::SingleLocalPort(buffer.read_field(16, "local_port")? as u16),
            COMP_LOCAL_PORT_RANGE => PacketFilterComponent::LocalPortRange {
                low: buffer.read_field(16, "local_port_low")? as u16,
                high: buffer.read_field(16, "local_port_high")? as u16,
            },
            COMP_SINGLE_REMOTE_PORT => PacketFilterComponent::SingleRemotePort(buffer.read_field(16, "remote_port")? as u16),
            COMP_REMOTE_PORT_RANGE => PacketFilterComponent::RemotePortRange {
                low: buffer.read_field(16, "remote_port_low")? as u16,
                high: buffer.read_field(16, "remote_port_high")? as u16,
            },
            COMP_SECURITY_PARAMETER_INDEX => PacketFilterComponent::SecurityParameterIndex(buffer.read_field(32, "spi")? as u32),
            COMP_TYPE_OF_SERVICE => {
                PacketFilterComponent::TypeOfService { value: buffer.read_u8_field("tos")?, mask: buffer.read_u8_field("tos_mask")? }
            }
            COMP_FLOW_LABEL => {
                buffer.read_field(4, "spare")?;
                PacketFilterComponent::FlowLabel(buffer.read_field(20, "flow_label")? as u32)
            }
            _ => {
                let n = buffer.get_len_remaining_bytes();
                tracing::debug!("unknown packet filter component 0x{:02x}, keeping {} octets", type_id, n);
                PacketFilterComponent::Unknown { type_id, contents: buffer.read_bytes(n, "component_contents")? }
            }
        };
        Ok(c)
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_u8(self.type_id());
        match self {
            PacketFilterComponent::Ipv4RemoteAddress { addr, mask } | PacketFilterComponent::Ipv4LocalAddress { addr, mask } => {
                buffer.write_bytes(addr);
                buffer.write_bytes(mask);
            }
            PacketFilterComponent::Ipv6RemoteAddress { addr, mask } => {
                buffer.write_bytes(addr);
                buffer.write_bytes(mask);
            }
            PacketFilterComponent::Ipv6RemotePrefix { addr, prefix_len } | PacketFilterComponent::Ipv6LocalPrefix { addr, prefix_len } => {
                buffer.write_bytes(addr);
                buffer.write_u8(*prefix_len);
            }
            PacketFilterComponent::ProtocolId(p) => buffer.write_u8(*p),
            PacketFilterComponent::SingleLocalPort(p) | PacketFilterComponent::SingleRemotePort(p) => buffer.write_bits(*p as u64, 16),
            PacketFilterComponent::LocalPortRange { low, high } | PacketFilterComponent::RemotePortRange { low, high } => {
                buffer.write_bits(*low as u64, 16);
                buffer.write_bits(*high as u64, 16);
            }
            PacketFilterComponent::SecurityParameterIndex(spi) => buffer.write_bits(*spi as u64, 32),
            PacketFilterComponent::TypeOfService { value, mask } => {
                buffer.write_u8(*value);
                buffer.write_u8(*mask);
            }
            PacketFilterComponent::FlowLabel(label) => {
                check_range(*label as u64, 20, "flow_label")?;
                buffer.write_bits(0, 4);
                buffer.write_bits(*label as u64, 20);
            }
            PacketFilterComponent::Unknown { contents, .. } => buffer.write_bytes(contents),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFilter {
    pub direction: PacketFilterDirection,
    /// 4 bits
    pub id: u8,
    pub precedence: u8,
    pub components: Vec<PacketFilterComponent>,
}

impl PacketFilter {
    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        buffer.read_field(2, "spare")?;
        let direction = PacketFilterDirection::from_raw(buffer.read_field(2, "packet_filter_direction")?, "packet_filter_direction")?;
        let id = buffer.read_field(4, "packet_filter_id")? as u8;
        let precedence = buffer.read_u8_field("packet_filter_precedence")?;
        let len = buffer.read_u8_field("packet_filter_len")? as usize;

        let mut contents = BitBuffer::from_vec(buffer.read_bytes(len, "packet_filter_contents")?);
        let mut components = Vec::new();
        while contents.get_len_remaining_bytes() > 0 {
            components.push(PacketFilterComponent::from_bitbuf(&mut contents)?);
        }
        Ok(PacketFilter { direction, id, precedence, components })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        check_range(self.id as u64, 4, "packet_filter_id")?;
        let mut contents = BitBuffer::new_autoexpand(64);
        for c in &self.components {
            c.to_bitbuf(&mut contents)?;
        }
        let contents = contents.to_bytes();
        if contents.len() > 255 {
            return Err(EncodeError::TooLong { field: "packet_filter_contents", max: 255, found: contents.len() });
        }
        buffer.write_bits(0, 2);
        buffer.write_bits(self.direction.into_raw(), 2);
        buffer.write_bits(self.id as u64, 4);
        buffer.write_u8(self.precedence);
        buffer.write_u8(contents.len() as u8);
        buffer.write_bytes(&contents);
        Ok(())
    }
}

/// Packet filter list: full filters for create/add/replace, bare identifiers for delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketFilterList {
    Filters(Vec<PacketFilter>),
    Ids(Vec<u8>),
}

impl PacketFilterList {
    pub fn len(&self) -> usize {
        match self {
            PacketFilterList::Filters(f) => f.len(),
            PacketFilterList::Ids(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TftParameter {
    /// 1 authorization token, 2 flow identifier, 3 packet filter identifier
    pub id: u8,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficFlowTemplate {
    pub op_code: TftOperationCode,
    pub packet_filters: PacketFilterList,
    pub parameters: Vec<TftParameter>,
}

/// TS 24.301 9.9.4.15, same coding as the TFT
pub type TrafficFlowAggregate = TrafficFlowTemplate;

impl TrafficFlowTemplate {
    pub const MAX_LEN: usize = 255;

    pub fn new(op_code: TftOperationCode, filters: Vec<PacketFilter>) -> Self {
        TrafficFlowTemplate { op_code, packet_filters: PacketFilterList::Filters(filters), parameters: Vec::new() }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let op_code = TftOperationCode::from_raw(buffer.read_field(3, "tft_operation_code")?, "tft_operation_code")?;
        let e_bit = buffer.read_field(1, "tft_e_bit")? == 1;
        let num_filters = buffer.read_field(4, "num_packet_filters")? as usize;

        let packet_filters = if op_code == TftOperationCode::DeletePacketFilters {
            let mut ids = Vec::with_capacity(num_filters);
            for _ in 0..num_filters {
                buffer.read_field(4, "spare")?;
                ids.push(buffer.read_field(4, "packet_filter_id")? as u8);
            }
            PacketFilterList::Ids(ids)
        } else {
            let mut filters = Vec::with_capacity(num_filters);
            for _ in 0..num_filters {
                filters.push(PacketFilter::from_bitbuf(buffer)?);
            }
            PacketFilterList::Filters(filters)
        };

        let mut parameters = Vec::new();
        if e_bit {
            while buffer.get_len_remaining_bytes() > 0 {
                if parameters.len() == MAX_PARAMETERS {
                    return Err(DecodeError::TooManyElements { field: "tft_parameters", max: MAX_PARAMETERS, found: parameters.len() + 1 });
                }
                let id = buffer.read_u8_field("tft_parameter_id")?;
                let len = buffer.read_u8_field("tft_parameter_len")? as usize;
                parameters.push(TftParameter { id, contents: buffer.read_bytes(len, "tft_parameter_contents")? });
            }
        }
        Ok(TrafficFlowTemplate { op_code, packet_filters, parameters })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if self.packet_filters.len() > MAX_PACKET_FILTERS {
            return Err(EncodeError::TooManyElements { field: "packet_filters", max: MAX_PACKET_FILTERS, found: self.packet_filters.len() });
        }
        if self.parameters.len() > MAX_PARAMETERS {
            return Err(EncodeError::TooManyElements { field: "tft_parameters", max: MAX_PARAMETERS, found: self.parameters.len() });
        }
        buffer.write_bits(self.op_code.into_raw(), 3);
        buffer.write_bit(!self.parameters.is_empty() as u8);
        buffer.write_bits(self.packet_filters.len() as u64, 4);
        match &self.packet_filters {
            PacketFilterList::Ids(ids) => {
                for id in ids {
                    check_range(*id as u64, 4, "packet_filter_id")?;
                    buffer.write_bits(0, 4);
                    buffer.write_bits(*id as u64, 4);
                }
            }
            PacketFilterList::Filters(filters) => {
                for f in filters {
                    f.to_bitbuf(buffer)?;
                }
            }
        }
        for p in &self.parameters {
            if p.contents.len() > 255 {
                return Err(EncodeError::TooLong { field: "tft_parameter_contents", max: 255, found: p.contents.len() });
            }
            buffer.write_u8(p.id);
            buffer.write_u8(p.contents.len() as u8);
            buffer.write_bytes(&p.contents);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tft_single_local_port() {
        let bytes = [0x21, 0x31, 0x00, 0x03, 0x40, 0x08, 0xAE];
        let mut buf = BitBuffer::from_bytes(&bytes);
        let tft = TrafficFlowTemplate::from_bitbuf(&mut buf).unwrap();
        assert_eq!(tft.op_code, TftOperationCode::CreateNewTft);
        let PacketFilterList::Filters(ref filters) = tft.packet_filters else { panic!("expected filters") };
        assert_eq!(filters[0].direction, PacketFilterDirection::Bidirectional);
        assert_eq!(filters[0].id, 1);
        assert_eq!(filters[0].components, vec![PacketFilterComponent::SingleLocalPort(2222)]);

        let mut out = BitBuffer::new_autoexpand(64);
        tft.to_bitbuf(&mut out).unwrap();
        assert_eq!(out.to_bytes(), bytes.to_vec());
    }

    #[test]
    fn test_delete_filters_and_parameters() {
        let tft = TrafficFlowTemplate {
            op_code: TftOperationCode::DeletePacketFilters,
            packet_filters: PacketFilterList::Ids(vec![1, 2]),
            parameters: vec![TftParameter { id: 2, contents: vec![0x00, 0x01, 0x00, 0x02] }],
        };
        let mut buf = BitBuffer::new_autoexpand(64);
        tft.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0xB2, 0x01, 0x02, 0x02, 0x04, 0x00, 0x01, 0x00, 0x02]);
        buf.seek(0);
        assert_eq!(TrafficFlowTemplate::from_bitbuf(&mut buf).unwrap(), tft);
    }

    #[test]
    fn test_unknown_component_takes_rest() {
        let bytes = [0x21, 0x12, 0x05, 0x04, 0x30, 0x11, 0x99, 0xAA];
        let mut buf = BitBuffer::from_bytes(&bytes);
        let tft = TrafficFlowTemplate::from_bitbuf(&mut buf).unwrap();
        let PacketFilterList::Filters(ref filters) = tft.packet_filters else { panic!("expected filters") };
        assert_eq!(
            filters[0].components,
            vec![PacketFilterComponent::ProtocolId(0x11), PacketFilterComponent::Unknown { type_id: 0x99, contents: vec![0xAA] }]
        );
    }

    #[test]
    fn test_filter_overruns_buffer() {
        let mut buf = BitBuffer::from_bytes(&[0x21, 0x31, 0x00, 0x08, 0x40, 0x08]);
        assert!(TrafficFlowTemplate::from_bitbuf(&mut buf).is_err());
    }
}
