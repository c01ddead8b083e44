use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::lai::LocationAreaId;
use crate::common::mobile_identity::EpsMobileIdentity;
use crate::common::nas_key_set_id::NasKeySetId;
use crate::common::opaque::{read_rest, write_raw};
use crate::common::tai::TrackingAreaId;
use crate::emm::enums::additional_update::AdditionalUpdateType;
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::enums::eps_update_type::EpsUpdateTypeValue;
use crate::emm::enums::guti_type::GutiType;
use crate::emm::fields::drx_parameter::DrxParameter;
use crate::emm::fields::eps_bearer_context_status::EpsBearerContextStatus;
use crate::emm::fields::ue_network_capability::UeNetworkCapability;


const IEI_NON_CURRENT_NATIVE_KSI: u8 = 0xB0;
const IEI_GPRS_CKSN: u8 = 0x80;
const IEI_OLD_PTMSI_SIGNATURE: u8 = 0x19;
const IEI_ADDITIONAL_GUTI: u8 = 0x50;
const IEI_NONCE_UE: u8 = 0x55;
const IEI_UE_NETWORK_CAPABILITY: u8 = 0x58;
const IEI_LAST_VISITED_TAI: u8 = 0x52;
const IEI_DRX_PARAMETER: u8 = 0x5C;
const IEI_UE_RADIO_CAP_UPDATE_NEEDED: u8 = 0xA0;
const IEI_EPS_BEARER_CONTEXT_STATUS: u8 = 0x57;
const IEI_MS_NETWORK_CAPABILITY: u8 = 0x31;
const IEI_OLD_LAI: u8 = 0x13;
const IEI_TMSI_STATUS: u8 = 0x90;
const IEI_MS_CLASSMARK2: u8 = 0x11;
const IEI_MS_CLASSMARK3: u8 = 0x20;
const IEI_SUPPORTED_CODECS: u8 = 0x40;
const IEI_ADDITIONAL_UPDATE_TYPE: u8 = 0xF0;
const IEI_VOICE_DOMAIN_PREFERENCE: u8 = 0x5D;
const IEI_OLD_GUTI_TYPE: u8 = 0xE0;
const IEI_DEVICE_PROPERTIES: u8 = 0xD0;

/// Representation of the TRACKING AREA UPDATE REQUEST message (TS 24.301 8.2.29).
/// Response expected: TRACKING AREA UPDATE ACCEPT or TRACKING AREA UPDATE REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingAreaUpdateRequest {
    /// Bearer establishment requested
    pub active_flag: bool,
    pub eps_update_type: EpsUpdateTypeValue,
    pub nas_ksi: NasKeySetId,
    /// LV, always a GUTI on the wire
    pub old_guti: EpsMobileIdentity,
    pub non_current_native_nas_ksi: Option<NasKeySetId>,
    /// TV 0x8-, 3 bits
    pub gprs_ciphering_ksn: Option<u8>,
    pub old_p_tmsi_signature: Option<u32>,
    pub additional_guti: Option<EpsMobileIdentity>,
    pub nonce_ue: Option<u32>,
    pub ue_network_cap: Option<UeNetworkCapability>,
    pub last_visited_registered_tai: Option<TrackingAreaId>,
    pub drx_param: Option<DrxParameter>,
    pub ue_radio_cap_update_needed: Option<bool>,
    pub eps_bearer_context_status: Option<EpsBearerContextStatus>,
    pub ms_network_cap: Option<Vec<u8>>,
    pub old_lai: Option<LocationAreaId>,
    pub tmsi_status: Option<bool>,
    pub ms_cm2: Option<Vec<u8>>,
    pub ms_cm3: Option<Vec<u8>>,
    pub supported_codecs: Option<Vec<u8>>,
    pub additional_update_type: Option<AdditionalUpdateType>,
    pub voice_domain_pref_and_ue_usage_setting: Option<Vec<u8>>,
    pub old_guti_type: Option<GutiType>,
    pub device_properties: Option<bool>,
}

impl TrackingAreaUpdateRequest {
    pub fn new(eps_update_type: EpsUpdateTypeValue, nas_ksi: NasKeySetId, old_guti: EpsMobileIdentity) -> Self {
        TrackingAreaUpdateRequest {
            active_flag: false,
            eps_update_type,
            nas_ksi,
            old_guti,
            non_current_native_nas_ksi: None,
            gprs_ciphering_ksn: None,
            old_p_tmsi_signature: None,
            additional_guti: None,
            nonce_ue: None,
            ue_network_cap: None,
            last_visited_registered_tai: None,
            drx_param: None,
            ue_radio_cap_update_needed: None,
            eps_bearer_context_status: None,
            ms_network_cap: None,
            old_lai: None,
            tmsi_status: None,
            ms_cm2: None,
            ms_cm3: None,
            supported_codecs: None,
            additional_update_type: None,
            voice_domain_pref_and_ue_usage_setting: None,
            old_guti_type: None,
            device_properties: None,
        }
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::TrackingAreaUpdateRequest)?;
        let nas_ksi = NasKeySetId::from_nibble(buffer.read_field(4, "nas_ksi")? as u8)?;
        let active_flag = buffer.read_field(1, "active_flag")? == 1;
        let eps_update_type = EpsUpdateTypeValue::from(buffer.read_field(3, "eps_update_type")? as u8);
        let old_guti = parse_lv(buffer, "old_guti", EpsMobileIdentity::MAX_LEN, EpsMobileIdentity::from_bitbuf)?;

        let mut msg = TrackingAreaUpdateRequest::new(eps_update_type, nas_ksi, old_guti);
        msg.active_flag = active_flag;

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_NON_CURRENT_NATIVE_KSI => {
                    let v = parse_type1(buffer, "non_current_native_nas_ksi")?;
                    msg.non_current_native_nas_ksi = Some(NasKeySetId::from_nibble(v)?);
                }
                IEI_GPRS_CKSN => msg.gprs_ciphering_ksn = Some(parse_type1(buffer, "gprs_ciphering_ksn")? & 0x07),
                IEI_OLD_PTMSI_SIGNATURE => {
                    msg.old_p_tmsi_signature = Some(parse_tv(buffer, "old_p_tmsi_signature", |b| Ok(b.read_field(24, "old_p_tmsi_signature")? as u32))?)
                }
                IEI_ADDITIONAL_GUTI => {
                    msg.additional_guti = Some(parse_tlv(buffer, "additional_guti", EpsMobileIdentity::MAX_LEN, EpsMobileIdentity::from_bitbuf)?)
                }
                IEI_NONCE_UE => msg.nonce_ue = Some(parse_tv(buffer, "nonce_ue", |b| Ok(b.read_field(32, "nonce_ue")? as u32))?),
                IEI_UE_NETWORK_CAPABILITY => {
                    msg.ue_network_cap = Some(parse_tlv(buffer, "ue_network_cap", UeNetworkCapability::MAX_LEN, UeNetworkCapability::from_bitbuf)?)
                }
                IEI_LAST_VISITED_TAI => {
                    msg.last_visited_registered_tai = Some(parse_tv(buffer, "last_visited_registered_tai", TrackingAreaId::from_bitbuf)?)
                }
                IEI_DRX_PARAMETER => msg.drx_param = Some(parse_tv(buffer, "drx_param", DrxParameter::from_bitbuf)?),
                IEI_UE_RADIO_CAP_UPDATE_NEEDED => {
                    msg.ue_radio_cap_update_needed = Some(parse_type1(buffer, "ue_radio_cap_update_needed")? & 0x01 == 1)
                }
                IEI_EPS_BEARER_CONTEXT_STATUS => {
                    msg.eps_bearer_context_status = Some(parse_tlv(
                        buffer,
                        "eps_bearer_context_status",
                        EpsBearerContextStatus::LEN,
                        EpsBearerContextStatus::from_bitbuf,
                    )?)
                }
                IEI_MS_NETWORK_CAPABILITY => msg.ms_network_cap = Some(parse_tlv(buffer, "ms_network_cap", 8, |b| read_rest(b, "ms_network_cap"))?),
                IEI_OLD_LAI => msg.old_lai = Some(parse_tv(buffer, "old_lai", LocationAreaId::from_bitbuf)?),
                IEI_TMSI_STATUS => msg.tmsi_status = Some(parse_type1(buffer, "tmsi_status")? & 0x01 == 1),
                IEI_MS_CLASSMARK2 => msg.ms_cm2 = Some(parse_tlv(buffer, "ms_cm2", 3, |b| read_rest(b, "ms_cm2"))?),
                IEI_MS_CLASSMARK3 => msg.ms_cm3 = Some(parse_tlv(buffer, "ms_cm3", 32, |b| read_rest(b, "ms_cm3"))?),
                IEI_SUPPORTED_CODECS => msg.supported_codecs = Some(parse_tlv(buffer, "supported_codecs", 255, |b| read_rest(b, "supported_codecs"))?),
                IEI_ADDITIONAL_UPDATE_TYPE => {
                    let v = parse_type1(buffer, "additional_update_type")? & 0x01;
                    msg.additional_update_type = Some(AdditionalUpdateType::from_raw(v as u64, "additional_update_type")?);
                }
                IEI_VOICE_DOMAIN_PREFERENCE => {
                    msg.voice_domain_pref_and_ue_usage_setting = Some(parse_tlv(buffer, "voice_domain_pref", 1, |b| read_rest(b, "voice_domain_pref"))?)
                }
                IEI_OLD_GUTI_TYPE => {
                    let v = parse_type1(buffer, "old_guti_type")? & 0x01;
                    msg.old_guti_type = Some(GutiType::from_raw(v as u64, "old_guti_type")?);
                }
                IEI_DEVICE_PROPERTIES => msg.device_properties = Some(parse_type1(buffer, "device_properties")? & 0x01 == 1),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::TrackingAreaUpdateRequest);
        check_range(self.eps_update_type.into_raw() as u64, 3, "eps_update_type")?;
        buffer.write_bits(self.nas_ksi.to_nibble()? as u64, 4);
        buffer.write_bit(self.active_flag as u8);
        buffer.write_bits(self.eps_update_type.into_raw() as u64, 3);
        write_lv(buffer, "old_guti", EpsMobileIdentity::MAX_LEN, |b| self.old_guti.to_bitbuf(b))?;

        if let Some(ksi) = self.non_current_native_nas_ksi {
            write_type1(buffer, IEI_NON_CURRENT_NATIVE_KSI, ksi.to_nibble()?, "non_current_native_nas_ksi")?;
        }
        if let Some(cksn) = self.gprs_ciphering_ksn {
            check_range(cksn as u64, 3, "gprs_ciphering_ksn")?;
            write_type1(buffer, IEI_GPRS_CKSN, cksn, "gprs_ciphering_ksn")?;
        }
        if let Some(sig) = self.old_p_tmsi_signature {
            check_range(sig as u64, 24, "old_p_tmsi_signature")?;
            write_tv(buffer, IEI_OLD_PTMSI_SIGNATURE, |b| {
                b.write_bits(sig as u64, 24);
                Ok(())
            })?;
        }
        if let Some(ref guti) = self.additional_guti {
            write_tlv(buffer, IEI_ADDITIONAL_GUTI, "additional_guti", EpsMobileIdentity::MAX_LEN, |b| guti.to_bitbuf(b))?;
        }
        if let Some(nonce) = self.nonce_ue {
            write_tv(buffer, IEI_NONCE_UE, |b| {
                b.write_bits(nonce as u64, 32);
                Ok(())
            })?;
        }
        if let Some(ref cap) = self.ue_network_cap {
            write_tlv(buffer, IEI_UE_NETWORK_CAPABILITY, "ue_network_cap", UeNetworkCapability::MAX_LEN, |b| cap.to_bitbuf(b))?;
        }
        if let Some(ref tai) = self.last_visited_registered_tai {
            write_tv(buffer, IEI_LAST_VISITED_TAI, |b| tai.to_bitbuf(b))?;
        }
        if let Some(ref drx) = self.drx_param {
            write_tv(buffer, IEI_DRX_PARAMETER, |b| drx.to_bitbuf(b))?;
        }
        if let Some(needed) = self.ue_radio_cap_update_needed {
            write_type1(buffer, IEI_UE_RADIO_CAP_UPDATE_NEEDED, needed as u8, "ue_radio_cap_update_needed")?;
        }
        if let Some(ref status) = self.eps_bearer_context_status {
            write_tlv(buffer, IEI_EPS_BEARER_CONTEXT_STATUS, "eps_bearer_context_status", EpsBearerContextStatus::LEN, |b| status.to_bitbuf(b))?;
        }
        if let Some(ref cap) = self.ms_network_cap {
            write_tlv(buffer, IEI_MS_NETWORK_CAPABILITY, "ms_network_cap", 8, write_raw(cap))?;
        }
        if let Some(ref lai) = self.old_lai {
            write_tv(buffer, IEI_OLD_LAI, |b| lai.to_bitbuf(b))?;
        }
        if let Some(status) = self.tmsi_status {
            write_type1(buffer, IEI_TMSI_STATUS, status as u8, "tmsi_status")?;
        }
        if let Some(ref cm2) = self.ms_cm2 {
            write_tlv(buffer, IEI_MS_CLASSMARK2, "ms_cm2", 3, write_raw(cm2))?;
        }
        if let Some(ref cm3) = self.ms_cm3 {
            write_tlv(buffer, IEI_MS_CLASSMARK3, "ms_cm3", 32, write_raw(cm3))?;
        }
        if let Some(ref codecs) = self.supported_codecs {
            write_tlv(buffer, IEI_SUPPORTED_CODECS, "supported_codecs", 255, write_raw(codecs))?;
        }
        if let Some(t) = self.additional_update_type {
            write_type1(buffer, IEI_ADDITIONAL_UPDATE_TYPE, t.into_raw() as u8, "additional_update_type")?;
        }
        if let Some(ref pref) = self.voice_domain_pref_and_ue_usage_setting {
            write_tlv(buffer, IEI_VOICE_DOMAIN_PREFERENCE, "voice_domain_pref", 1, write_raw(pref))?;
        }
        if let Some(t) = self.old_guti_type {
            write_type1(buffer, IEI_OLD_GUTI_TYPE, t.into_raw() as u8, "old_guti_type")?;
        }
        if let Some(low_prio) = self.device_properties {
            write_type1(buffer, IEI_DEVICE_PROPERTIES, low_prio as u8, "device_properties")?;
        }
        Ok(())
    }
}
