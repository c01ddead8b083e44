use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::enums::pdn_type::PdnType;
use crate::esm::enums::request_type::RequestType;
use crate::esm::fields::apn::Apn;
use crate::esm::fields::pco::ProtocolConfigOptions;
use super::simple::IEI_PCO;


const IEI_ESM_INFO_TRANSFER_FLAG: u8 = 0xD0;
pub(crate) const IEI_ACCESS_POINT_NAME: u8 = 0x28;
pub(crate) const IEI_DEVICE_PROPERTIES: u8 = 0xC0;

/// Representation of the PDN CONNECTIVITY REQUEST message (TS 24.301 8.3.20).
/// Carried in ATTACH REQUEST, or standalone for an additional PDN connection.
/// Response expected: ACTIVATE DEFAULT EPS BEARER CONTEXT REQUEST or PDN CONNECTIVITY REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdnConnectivityRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    /// V, high half octet
    pub pdn_type: PdnType,
    /// V, low half octet
    pub request_type: RequestType,
    /// When set, the UE holds back APN and PCO until ESM INFORMATION REQUEST
    pub esm_info_transfer_flag: Option<bool>,
    pub apn: Option<Apn>,
    pub pco: Option<ProtocolConfigOptions>,
    /// True when the UE is configured for low priority
    pub device_properties: Option<bool>,
}

impl PdnConnectivityRequest {
    pub fn new(proc_transaction_id: u8, pdn_type: PdnType, request_type: RequestType) -> Self {
        PdnConnectivityRequest {
            eps_bearer_id: 0,
            proc_transaction_id,
            pdn_type,
            request_type,
            esm_info_transfer_flag: None,
            apn: None,
            pco: None,
            device_properties: None,
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (ebi, pti) = read_esm_header(buffer, EsmMessageType::PdnConnectivityRequest)?;
        buffer.read_field(1, "spare")?;
        let pdn_type = PdnType::from(buffer.read_field(3, "pdn_type")? as u8);
        buffer.read_field(1, "spare")?;
        let request_type = RequestType::from(buffer.read_field(3, "request_type")? as u8);

        let mut msg = PdnConnectivityRequest::new(pti, pdn_type, request_type);
        msg.eps_bearer_id = ebi;

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_ESM_INFO_TRANSFER_FLAG => msg.esm_info_transfer_flag = Some(parse_type1(buffer, "esm_info_transfer_flag")? & 0x01 == 1),
                IEI_ACCESS_POINT_NAME => msg.apn = Some(parse_tlv(buffer, "apn", Apn::MAX_LEN, Apn::from_bitbuf)?),
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                IEI_DEVICE_PROPERTIES => msg.device_properties = Some(parse_type1(buffer, "device_properties")? & 0x01 == 1),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::PdnConnectivityRequest)?;
        let pdn_type = self.pdn_type.into_raw();
        let request_type = self.request_type.into_raw();
        check_range(pdn_type as u64, 3, "pdn_type")?;
        check_range(request_type as u64, 3, "request_type")?;
        buffer.write_bit(0);
        buffer.write_bits(pdn_type as u64, 3);
        buffer.write_bit(0);
        buffer.write_bits(request_type as u64, 3);

        if let Some(flag) = self.esm_info_transfer_flag {
            write_type1(buffer, IEI_ESM_INFO_TRANSFER_FLAG, flag as u8, "esm_info_transfer_flag")?;
        }
        if let Some(ref apn) = self.apn {
            write_tlv(buffer, IEI_ACCESS_POINT_NAME, "apn", Apn::MAX_LEN, |b| apn.to_bitbuf(b))?;
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
