//! Optional IEs shared by the bearer activation and modification requests, mostly
//! for GERAN/UTRAN interworking

use nas_core::{BitBuffer, DecodeError, EncodeError};
use nas_core::codec_error::check_range;


pub(crate) const IEI_TRANSACTION_IDENTIFIER: u8 = 0x5D;
pub(crate) const IEI_QOS: u8 = 0x30;
pub(crate) const IEI_LLC_SAPI: u8 = 0x32;
pub(crate) const IEI_RADIO_PRIORITY: u8 = 0x80;
pub(crate) const IEI_PACKET_FLOW_ID: u8 = 0x34;
pub(crate) const IEI_APN_AMBR: u8 = 0x5E;

pub(crate) fn parse_llc_sapi(buffer: &mut BitBuffer) -> Result<u8, DecodeError> {
    buffer.read_field(4, "spare")?;
    Ok(buffer.read_field(4, "llc_sapi")? as u8)
}

pub(crate) fn write_llc_sapi(buffer: &mut BitBuffer, sapi: u8) -> Result<(), EncodeError> {
    check_range(sapi as u64, 4, "llc_sapi")?;
    buffer.write_bits(0, 4);
    buffer.write_bits(sapi as u64, 4);
    Ok(())
}

pub(crate) fn parse_packet_flow_id(buffer: &mut BitBuffer) -> Result<u8, DecodeError> {
    buffer.read_field(1, "spare")?;
    Ok(buffer.read_field(7, "packet_flow_id")? as u8)
}

pub(crate) fn write_packet_flow_id(buffer: &mut BitBuffer, pfi: u8) -> Result<(), EncodeError> {
    check_range(pfi as u64, 7, "packet_flow_id")?;
    buffer.write_bit(0);
    buffer.write_bits(pfi as u64, 7);
    Ok(())
}
