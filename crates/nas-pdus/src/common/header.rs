use nas_core::{BitBuffer, DecodeError, expect_msg_type};

use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::esm::enums::esm_message_type::EsmMessageType;

wire_enum! {
    /// TS 24.007 11.2.3.1.1 Protocol discriminator
    /// Bits: 4
    pub enum ProtocolDiscriminator {
        EpsSessionManagement = 0x2,
        EpsMobilityManagement = 0x7,
    }
}

wire_enum! {
    /// TS 24.301 9.3.1 Security header type
    /// Bits: 4
    pub enum SecurityHeaderType {
        PlainNas = 0x0,
        IntegrityProtected = 0x1,
        IntegrityProtectedCiphered = 0x2,
        IntegrityProtectedNewContext = 0x3,
        IntegrityProtectedCipheredNewContext = 0x4,
        ServiceRequest = 0xC,
    }
}

impl SecurityHeaderType {
    pub fn is_ciphered(&self) -> bool {
        matches!(self, SecurityHeaderType::IntegrityProtectedCiphered | SecurityHeaderType::IntegrityProtectedCipheredNewContext)
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, SecurityHeaderType::PlainNas)
    }
}

/// Reads the plain EMM header (security header type 0, PD 7, message type) and checks the message type
pub fn read_emm_header(buffer: &mut BitBuffer, expected: EmmMessageType) -> Result<(), DecodeError> {
    let sec_hdr = buffer.read_field(4, "security_header_type")?;
    if sec_hdr != SecurityHeaderType::PlainNas.into_raw() {
        return Err(DecodeError::UnsupportedSecurityHeader { found: sec_hdr });
    }
    let pd = buffer.read_field(4, "protocol_discriminator")?;
    if pd != ProtocolDiscriminator::EpsMobilityManagement.into_raw() {
        return Err(DecodeError::InvalidProtocolDiscriminator { found: pd });
    }
    let msg_type = buffer.read_field(8, "message_type")?;
    expect_msg_type!(msg_type, expected)
}

pub fn write_emm_header(buffer: &mut BitBuffer, msg_type: EmmMessageType) {
    buffer.write_bits(SecurityHeaderType::PlainNas.into_raw(), 4);
    buffer.write_bits(ProtocolDiscriminator::EpsMobilityManagement.into_raw(), 4);
    buffer.write_bits(msg_type.into_raw(), 8);
}

/// Reads the ESM header (EPS bearer identity, PD 2, PTI, message type).
/// Returns (eps_bearer_id, proc_transaction_id).
pub fn read_esm_header(buffer: &mut BitBuffer, expected: EsmMessageType) -> Result<(u8, u8), DecodeError> {
    let eps_bearer_id = buffer.read_field(4, "eps_bearer_id")? as u8;
    let pd = buffer.read_field(4, "protocol_discriminator")?;
    if pd != ProtocolDiscriminator::EpsSessionManagement.into_raw() {
        return Err(DecodeError::InvalidProtocolDiscriminator { found: pd });
    }
    let proc_transaction_id = buffer.read_field(8, "proc_transaction_id")? as u8;
    let msg_type = buffer.read_field(8, "message_type")?;
    expect_msg_type!(msg_type, expected)?;
    Ok((eps_bearer_id, proc_transaction_id))
}

pub fn write_esm_header(buffer: &mut BitBuffer, eps_bearer_id: u8, proc_transaction_id: u8, msg_type: EsmMessageType) -> Result<(), nas_core::EncodeError> {
    nas_core::codec_error::check_range(eps_bearer_id as u64, 4, "eps_bearer_id")?;
    buffer.write_bits(eps_bearer_id as u64, 4);
    buffer.write_bits(ProtocolDiscriminator::EpsSessionManagement.into_raw(), 4);
    buffer.write_u8(proc_transaction_id);
    buffer.write_bits(msg_type.into_raw(), 8);
    Ok(())
}
