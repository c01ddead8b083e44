use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::gprs_timer::{GprsTimer, GprsTimer3};
use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::lai::LocationAreaId;
use crate::common::mobile_identity::{EpsMobileIdentity, MobileIdentity};
use crate::common::opaque::{read_rest, write_raw};
use crate::common::plmn::PlmnList;
use crate::common::tai::TaiList;
use crate::emm::enums::additional_update::AdditionalUpdateResult;
use crate::emm::enums::emm_cause::EmmCause;
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::enums::eps_update_result::EpsUpdateResult;
use crate::emm::fields::eps_bearer_context_status::EpsBearerContextStatus;
use crate::emm::fields::eps_network_feature_support::EpsNetworkFeatureSupport;


const IEI_T3412: u8 = 0x5A;
const IEI_GUTI: u8 = 0x50;
const IEI_TAI_LIST: u8 = 0x54;
const IEI_EPS_BEARER_CONTEXT_STATUS: u8 = 0x57;
const IEI_LAI: u8 = 0x13;
const IEI_MS_IDENTITY: u8 = 0x23;
const IEI_EMM_CAUSE: u8 = 0x53;
const IEI_T3402: u8 = 0x17;
const IEI_T3423: u8 = 0x59;
const IEI_EQUIVALENT_PLMNS: u8 = 0x4A;
const IEI_EMERGENCY_NUMBER_LIST: u8 = 0x34;
const IEI_EPS_NETWORK_FEATURE_SUPPORT: u8 = 0x64;
const IEI_ADDITIONAL_UPDATE_RESULT: u8 = 0xF0;
const IEI_T3412_EXTENDED: u8 = 0x5E;

/// Representation of the TRACKING AREA UPDATE ACCEPT message (TS 24.301 8.2.26).
/// Response expected: TRACKING AREA UPDATE COMPLETE, if a GUTI was allocated
/// Response to: TRACKING AREA UPDATE REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingAreaUpdateAccept {
    pub eps_update_result: EpsUpdateResult,
    pub t3412: Option<GprsTimer>,
    pub guti: Option<EpsMobileIdentity>,
    pub tai_list: Option<TaiList>,
    pub eps_bearer_context_status: Option<EpsBearerContextStatus>,
    pub lai: Option<LocationAreaId>,
    pub ms_id: Option<MobileIdentity>,
    pub emm_cause: Option<EmmCause>,
    pub t3402: Option<GprsTimer>,
    pub t3423: Option<GprsTimer>,
    pub equivalent_plmns: Option<PlmnList>,
    pub emergency_number_list: Option<Vec<u8>>,
    pub eps_network_feature_support: Option<EpsNetworkFeatureSupport>,
    pub additional_update_result: Option<AdditionalUpdateResult>,
    pub t3412_extended: Option<GprsTimer3>,
}

impl TrackingAreaUpdateAccept {
    pub fn new(eps_update_result: EpsUpdateResult) -> Self {
        TrackingAreaUpdateAccept {
            eps_update_result,
            t3412: None,
            guti: None,
            tai_list: None,
            eps_bearer_context_status: None,
            lai: None,
            ms_id: None,
            emm_cause: None,
            t3402: None,
            t3423: None,
            equivalent_plmns: None,
            emergency_number_list: None,
            eps_network_feature_support: None,
            additional_update_result: None,
            t3412_extended: None,
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::TrackingAreaUpdateAccept)?;
        buffer.read_field(5, "spare")?;
        let result = EpsUpdateResult::from_raw(buffer.read_field(3, "eps_update_result")?, "eps_update_result")?;
        let mut msg = TrackingAreaUpdateAccept::new(result);

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_T3412 => msg.t3412 = Some(parse_tv(buffer, "t3412", GprsTimer::from_bitbuf)?),
                IEI_GUTI => msg.guti = Some(parse_tlv(buffer, "guti", EpsMobileIdentity::MAX_LEN, EpsMobileIdentity::from_bitbuf)?),
                IEI_TAI_LIST => msg.tai_list = Some(parse_tlv(buffer, "tai_list", TaiList::MAX_LEN, TaiList::from_bitbuf)?),
                IEI_EPS_BEARER_CONTEXT_STATUS => {
                    msg.eps_bearer_context_status = Some(parse_tlv(
                        buffer,
                        "eps_bearer_context_status",
                        EpsBearerContextStatus::LEN,
                        EpsBearerContextStatus::from_bitbuf,
                    )?)
                }
                IEI_LAI => msg.lai = Some(parse_tv(buffer, "lai", LocationAreaId::from_bitbuf)?),
                IEI_MS_IDENTITY => msg.ms_id = Some(parse_tlv(buffer, "ms_id", MobileIdentity::MAX_LEN, MobileIdentity::from_bitbuf)?),
                IEI_EMM_CAUSE => msg.emm_cause = Some(parse_tv(buffer, "emm_cause", |b| Ok(EmmCause::from(b.read_u8_field("emm_cause")?)))?),
                IEI_T3402 => msg.t3402 = Some(parse_tv(buffer, "t3402", GprsTimer::from_bitbuf)?),
                IEI_T3423 => msg.t3423 = Some(parse_tv(buffer, "t3423", GprsTimer::from_bitbuf)?),
                IEI_EQUIVALENT_PLMNS => {
                    msg.equivalent_plmns = Some(parse_tlv(buffer, "equivalent_plmns", PlmnList::MAX_LEN, PlmnList::from_bitbuf)?)
                }
                IEI_EMERGENCY_NUMBER_LIST => {
                    msg.emergency_number_list = Some(parse_tlv(buffer, "emergency_number_list", 48, |b| read_rest(b, "emergency_number_list"))?)
                }
                IEI_EPS_NETWORK_FEATURE_SUPPORT => {
                    msg.eps_network_feature_support = Some(parse_tlv(
                        buffer,
                        "eps_network_feature_support",
                        EpsNetworkFeatureSupport::MAX_LEN,
                        EpsNetworkFeatureSupport::from_bitbuf,
                    )?)
                }
                IEI_ADDITIONAL_UPDATE_RESULT => {
                    let v = parse_type1(buffer, "additional_update_result")? & 0x03;
                    msg.additional_update_result = Some(AdditionalUpdateResult::from(v));
                }
                IEI_T3412_EXTENDED => msg.t3412_extended = Some(parse_tlv(buffer, "t3412_extended", 1, GprsTimer3::from_bitbuf)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::TrackingAreaUpdateAccept);
        buffer.write_bits(0, 5);
        buffer.write_bits(self.eps_update_result.into_raw(), 3);

        if let Some(ref t) = self.t3412 {
            write_tv(buffer, IEI_T3412, |b| t.to_bitbuf(b))?;
        }
        if let Some(ref guti) = self.guti {
            write_tlv(buffer, IEI_GUTI, "guti", EpsMobileIdentity::MAX_LEN, |b| guti.to_bitbuf(b))?;
        }
        if let Some(ref tais) = self.tai_list {
            write_tlv(buffer, IEI_TAI_LIST, "tai_list", TaiList::MAX_LEN, |b| tais.to_bitbuf(b))?;
        }
        if let Some(ref status) = self.eps_bearer_context_status {
            write_tlv(buffer, IEI_EPS_BEARER_CONTEXT_STATUS, "eps_bearer_context_status", EpsBearerContextStatus::LEN, |b| status.to_bitbuf(b))?;
        }
        if let Some(ref lai) = self.lai {
            write_tv(buffer, IEI_LAI, |b| lai.to_bitbuf(b))?;
        }
        if let Some(ref id) = self.ms_id {
            write_tlv(buffer, IEI_MS_IDENTITY, "ms_id", MobileIdentity::MAX_LEN, |b| id.to_bitbuf(b))?;
        }
        if let Some(cause) = self.emm_cause {
            write_tv(buffer, IEI_EMM_CAUSE, |b| {
                b.write_u8(cause.into_raw());
                Ok(())
            })?;
        }
        if let Some(ref t) = self.t3402 {
            write_tv(buffer, IEI_T3402, |b| t.to_bitbuf(b))?;
        }
        if let Some(ref t) = self.t3423 {
            write_tv(buffer, IEI_T3423, |b| t.to_bitbuf(b))?;
        }
        if let Some(ref plmns) = self.equivalent_plmns {
            write_tlv(buffer, IEI_EQUIVALENT_PLMNS, "equivalent_plmns", PlmnList::MAX_LEN, |b| plmns.to_bitbuf(b))?;
        }
        if let Some(ref list) = self.emergency_number_list {
            write_tlv(buffer, IEI_EMERGENCY_NUMBER_LIST, "emergency_number_list", 48, write_raw(list))?;
        }
        if let Some(ref feat) = self.eps_network_feature_support {
            write_tlv(buffer, IEI_EPS_NETWORK_FEATURE_SUPPORT, "eps_network_feature_support", EpsNetworkFeatureSupport::MAX_LEN, |b| feat.to_bitbuf(b))?;
        }
        if let Some(res) = self.additional_update_result {
            write_type1(buffer, IEI_ADDITIONAL_UPDATE_RESULT, res.into_raw(), "additional_update_result")?;
        }
        if let Some(ref t) = self.t3412_extended {
            write_tlv(buffer, IEI_T3412_EXTENDED, "t3412_extended", 1, |b| t.to_bitbuf(b))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nas_core::debug;

    use super::*;
    use crate::common::guti::Guti;
    use crate::common::nas_key_set_id::NasKeySetId;
    use crate::common::plmn::PlmnId;
    use crate::common::tai::TrackingAreaId;
    use crate::emm::enums::eps_update_type::EpsUpdateTypeValue;
    use crate::emm::pdus::tracking_area_update_request::TrackingAreaUpdateRequest;

    #[test]
    fn test_tau_accept_with_new_guti() {
        debug::setup_logging_verbose();
        let plmn = PlmnId::from_digits(&[0, 0, 1], &[0, 1]).unwrap();
        let mut msg = TrackingAreaUpdateAccept::new(EpsUpdateResult::TaUpdated);
        msg.t3412 = Some(GprsTimer::minutes(54));
        msg.guti = Some(EpsMobileIdentity::Guti(Guti { plmn, mme_group_id: 2, mme_code: 3, m_tmsi: 0xCAFE }));
        msg.tai_list = Some(TaiList::single(TrackingAreaId { plmn, tac: 1 }));
        msg.eps_bearer_context_status = Some(EpsBearerContextStatus::from_ebis([5]));

        let mut buf = BitBuffer::new_autoexpand(128);
        msg.to_bitbuf(&mut buf).unwrap();
        tracing::info!("Serialized: {}", buf.dump_hex());
        let bytes = buf.to_bytes();
        assert_eq!(&bytes[..5], &[0x07, 0x49, 0x00, 0x5A, 0x49]);
        buf.seek(0);
        assert_eq!(TrackingAreaUpdateAccept::from_bitbuf(&mut buf).unwrap(), msg);
    }

    #[test]
    fn test_tau_request_roundtrip_with_optionals() {
        let plmn = PlmnId::from_digits(&[0, 0, 1], &[0, 1]).unwrap();
        let guti = EpsMobileIdentity::Guti(Guti { plmn, mme_group_id: 1, mme_code: 1, m_tmsi: 0x1234 });
        let mut msg = TrackingAreaUpdateRequest::new(EpsUpdateTypeValue::PeriodicUpdating, NasKeySetId::native(1), guti);
        msg.active_flag = true;
        msg.last_visited_registered_tai = Some(TrackingAreaId { plmn, tac: 7 });
        msg.eps_bearer_context_status = Some(EpsBearerContextStatus::from_ebis([5, 6]));
        msg.nonce_ue = Some(0xDEADBEEF);
        msg.device_properties = Some(true);

        let mut buf = BitBuffer::new_autoexpand(128);
        msg.to_bitbuf(&mut buf).unwrap();
        let bytes = buf.to_bytes();
        // KSI 1 in the high nibble, active flag and periodic updating in the low nibble
        assert_eq!(&bytes[..3], &[0x07, 0x48, 0x1B]);
        assert_eq!(*bytes.last().unwrap(), 0xD1);
        buf.seek(0);
        assert_eq!(TrackingAreaUpdateRequest::from_bitbuf(&mut buf).unwrap(), msg);
    }
}
