use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::connectivity_type::ConnectivityType;
use crate::esm::enums::esm_cause::EsmCause;
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::apn::Apn;
use crate::esm::fields::apn_ambr::ApnAmbr;
use crate::esm::fields::eps_qos::EpsQos;
use crate::esm::fields::pco::ProtocolConfigOptions;
use crate::esm::fields::pdn_address::PdnAddress;
use crate::esm::fields::quality_of_service::QualityOfService;
use crate::esm::fields::transaction_identifier::TransactionIdentifier;
use super::bearer_ies::*;
use super::simple::IEI_PCO;


const IEI_ESM_CAUSE: u8 = 0x58;
const IEI_CONNECTIVITY_TYPE: u8 = 0xB0;

/// Representation of the ACTIVATE DEFAULT EPS BEARER CONTEXT REQUEST message (TS 24.301 8.3.6).
/// Sent to the UE embedded in ATTACH ACCEPT, or standalone for an additional PDN connection.
/// Response expected: ACTIVATE DEFAULT EPS BEARER CONTEXT ACCEPT or REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateDefaultEpsBearerContextRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    pub eps_qos: EpsQos,
    pub apn: Apn,
    pub pdn_address: PdnAddress,
    pub transaction_identifier: Option<TransactionIdentifier>,
    pub negotiated_qos: Option<QualityOfService>,
    pub negotiated_llc_sapi: Option<u8>,
    pub radio_priority: Option<u8>,
    pub packet_flow_id: Option<u8>,
    pub apn_ambr: Option<ApnAmbr>,
    /// Reason a requested dual-stack PDN type was narrowed
    pub esm_cause: Option<EsmCause>,
    pub pco: Option<ProtocolConfigOptions>,
    pub connectivity_type: Option<ConnectivityType>,
}

impl ActivateDefaultEpsBearerContextRequest {
    pub fn new(eps_bearer_id: Ebi, proc_transaction_id: u8, eps_qos: EpsQos, apn: Apn, pdn_address: PdnAddress) -> Self {
        ActivateDefaultEpsBearerContextRequest {
            eps_bearer_id,
            proc_transaction_id,
            eps_qos,
            apn,
            pdn_address,
            transaction_identifier: None,
            negotiated_qos: None,
            negotiated_llc_sapi: None,
            radio_priority: None,
            packet_flow_id: None,
            apn_ambr: None,
            esm_cause: None,
            pco: None,
            connectivity_type: None,
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (ebi, pti) = read_esm_header(buffer, EsmMessageType::ActivateDefaultEpsBearerContextRequest)?;
        let eps_qos = parse_lv(buffer, "eps_qos", EpsQos::MAX_LEN, EpsQos::from_bitbuf)?;
        let apn = parse_lv(buffer, "apn", Apn::MAX_LEN, Apn::from_bitbuf)?;
        let pdn_address = parse_lv(buffer, "pdn_address", PdnAddress::MAX_LEN, PdnAddress::from_bitbuf)?;
        let mut msg = ActivateDefaultEpsBearerContextRequest::new(ebi, pti, eps_qos, apn, pdn_address);

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
                IEI_APN_AMBR => msg.apn_ambr = Some(parse_tlv(buffer, "apn_ambr", ApnAmbr::MAX_LEN, ApnAmbr::from_bitbuf)?),
                IEI_ESM_CAUSE => msg.esm_cause = Some(parse_tv(buffer, "esm_cause", |b| Ok(EsmCause::from(b.read_u8_field("esm_cause")?)))?),
                IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                IEI_CONNECTIVITY_TYPE => msg.connectivity_type = Some(ConnectivityType::from(parse_type1(buffer, "connectivity_type")?)),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::ActivateDefaultEpsBearerContextRequest)?;
        write_lv(buffer, "eps_qos", EpsQos::MAX_LEN, |b| self.eps_qos.to_bitbuf(b))?;
        write_lv(buffer, "apn", Apn::MAX_LEN, |b| self.apn.to_bitbuf(b))?;
        write_lv(buffer, "pdn_address", PdnAddress::MAX_LEN, |b| self.pdn_address.to_bitbuf(b))?;

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
        if let Some(ref ambr) = self.apn_ambr {
            write_tlv(buffer, IEI_APN_AMBR, "apn_ambr", ApnAmbr::MAX_LEN, |b| ambr.to_bitbuf(b))?;
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
        if let Some(ct) = self.connectivity_type {
            write_type1(buffer, IEI_CONNECTIVITY_TYPE, ct.into_raw(), "connectivity_type")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use nas_core::debug;

    use super::*;
    use crate::esm::fields::pco::container_id;

    #[test]
    fn test_default_bearer_request_for_attach_accept() {
        debug::setup_logging_verbose();
        let mut msg = ActivateDefaultEpsBearerContextRequest::new(
            5,
            1,
            EpsQos::from_qci(9),
            Apn::new("internet"),
            PdnAddress::Ipv4(Ipv4Addr::new(172, 16, 0, 2)),
        );
        let mut pco = ProtocolConfigOptions::default();
        pco.push(container_id::DNS_SERVER_IPV4_ADDRESS, vec![8, 8, 8, 8]);
        msg.pco = Some(pco);
        msg.apn_ambr = Some(ApnAmbr::new(0xFE, 0xFE));

        let mut buf = BitBuffer::new_autoexpand(256);
        msg.to_bitbuf(&mut buf).unwrap();
        tracing::info!("Serialized: {}", buf.dump_hex());
        let bytes = buf.to_bytes();
        assert_eq!(&bytes[..6], &[0x52, 0x01, 0xC1, 0x01, 0x09, 0x09]);
        assert_eq!(&bytes[bytes.len() - 10..], &[0x27, 0x08, 0x80, 0x00, 0x0D, 0x04, 8, 8, 8, 8]);
        buf.seek(0);
        assert_eq!(ActivateDefaultEpsBearerContextRequest::from_bitbuf(&mut buf).unwrap(), msg);
    }
}
