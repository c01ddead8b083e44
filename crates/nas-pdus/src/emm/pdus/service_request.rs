use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};

use crate::common::header::{ProtocolDiscriminator, SecurityHeaderType};
use crate::emm::fields::ksi_and_sequence_number::KsiAndSequenceNumber;


/// Representation of the SERVICE REQUEST message (TS 24.301 8.2.25).
/// Uses the dedicated security header format of TS 24.301 9.3.1 (header type 12):
/// there is no message type octet, and only the two low octets of the MAC are sent.
/// Length: 4 octets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRequest {
    pub ksi_and_seq: KsiAndSequenceNumber,
    pub short_mac: u16,
}

impl ServiceRequest {
    pub const LEN: usize = 4;

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let sec_hdr = buffer.read_field(4, "security_header_type")?;
        if sec_hdr != SecurityHeaderType::ServiceRequest.into_raw() {
            return Err(DecodeError::UnsupportedSecurityHeader { found: sec_hdr });
        }
        let pd = buffer.read_field(4, "protocol_discriminator")?;
        if pd != ProtocolDiscriminator::EpsMobilityManagement.into_raw() {
            return Err(DecodeError::InvalidProtocolDiscriminator { found: pd });
        }
        let ksi_and_seq = KsiAndSequenceNumber::from_bitbuf(buffer)?;
        let short_mac = buffer.read_field(16, "short_mac")? as u16;
        Ok(ServiceRequest { ksi_and_seq, short_mac })
    }

    /// Fixed layout without an optional IE block, so the policy is unused
    pub fn from_bitbuf_with(buffer: &mut BitBuffer, _policy: IePolicy) -> Result<Self, DecodeError> {
        Self::from_bitbuf(buffer)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_bits(SecurityHeaderType::ServiceRequest.into_raw(), 4);
        buffer.write_bits(ProtocolDiscriminator::EpsMobilityManagement.into_raw(), 4);
        self.ksi_and_seq.to_bitbuf(buffer)?;
        buffer.write_bits(self.short_mac as u64, 16);
        Ok(())
    }

    /// The first two octets, which are the input to the short MAC
    pub fn mac_input(&self) -> Result<[u8; 2], EncodeError> {
        let mut buf = BitBuffer::new(16);
        buf.write_bits(SecurityHeaderType::ServiceRequest.into_raw(), 4);
        buf.write_bits(ProtocolDiscriminator::EpsMobilityManagement.into_raw(), 4);
        self.ksi_and_seq.to_bitbuf(&mut buf)?;
        let bytes = buf.into_bytes();
        Ok([bytes[0], bytes[1]])
    }
}
