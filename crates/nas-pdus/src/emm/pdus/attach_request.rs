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
use crate::emm::enums::eps_attach_type::EpsAttachType;
use crate::emm::enums::guti_type::GutiType;
use crate::emm::fields::drx_parameter::DrxParameter;
use crate::emm::fields::ue_network_capability::UeNetworkCapability;


const IEI_OLD_PTMSI_SIGNATURE: u8 = 0x19;
const IEI_ADDITIONAL_GUTI: u8 = 0x50;
const IEI_LAST_VISITED_TAI: u8 = 0x52;
const IEI_DRX_PARAMETER: u8 = 0x5C;
const IEI_MS_NETWORK_CAPABILITY: u8 = 0x31;
const IEI_OLD_LAI: u8 = 0x13;
const IEI_TMSI_STATUS: u8 = 0x90;
const IEI_MS_CLASSMARK2: u8 = 0x11;
const IEI_MS_CLASSMARK3: u8 = 0x20;
const IEI_SUPPORTED_CODECS: u8 = 0x40;
const IEI_ADDITIONAL_UPDATE_TYPE: u8 = 0xF0;
const IEI_VOICE_DOMAIN_PREFERENCE: u8 = 0x5D;
const IEI_DEVICE_PROPERTIES: u8 = 0xD0;
const IEI_OLD_GUTI_TYPE: u8 = 0xE0;

/// Representation of the ATTACH REQUEST message (TS 24.301 8.2.4).
/// Sent by the UE to the network to perform an attach procedure.
/// Response expected: AUTHENTICATION REQUEST, IDENTITY REQUEST, ATTACH ACCEPT or ATTACH REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachRequest {
    /// V, half octet
    pub eps_attach_type: EpsAttachType,
    /// V, half octet
    pub nas_ksi: NasKeySetId,
    /// LV, 5..12 octets
    pub eps_mobile_id: EpsMobileIdentity,
    /// LV, 3..14 octets
    pub ue_network_cap: UeNetworkCapability,
    /// LV-E, carries a PDN CONNECTIVITY REQUEST
    pub esm_msg: Vec<u8>,
    /// TV 0x19, 3 octets
    pub old_p_tmsi_signature: Option<u32>,
    /// TLV 0x50
    pub additional_guti: Option<EpsMobileIdentity>,
    /// TV 0x52
    pub last_visited_registered_tai: Option<TrackingAreaId>,
    /// TV 0x5C
    pub drx_param: Option<DrxParameter>,
    /// TLV 0x31, opaque
    pub ms_network_cap: Option<Vec<u8>>,
    /// TV 0x13
    pub old_lai: Option<LocationAreaId>,
    /// TV 0x9-, TMSI status flag
    pub tmsi_status: Option<bool>,
    /// TLV 0x11, opaque
    pub ms_cm2: Option<Vec<u8>>,
    /// TLV 0x20, opaque
    pub ms_cm3: Option<Vec<u8>>,
    /// TLV 0x40, opaque
    pub supported_codecs: Option<Vec<u8>>,
    /// TV 0xF-
    pub additional_update_type: Option<AdditionalUpdateType>,
    /// TLV 0x5D, opaque
    pub voice_domain_pref_and_ue_usage_setting: Option<Vec<u8>>,
    /// TV 0xD-, low priority flag
    pub device_properties: Option<bool>,
    /// TV 0xE-
    pub old_guti_type: Option<GutiType>,
}

impl AttachRequest {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::AttachRequest)?;

        let nas_ksi = NasKeySetId::from_nibble(buffer.read_field(4, "nas_ksi")? as u8)?;
        buffer.read_field(1, "spare")?;
        let eps_attach_type = EpsAttachType::from(buffer.read_field(3, "eps_attach_type")? as u8);
        let eps_mobile_id = parse_lv(buffer, "eps_mobile_id", EpsMobileIdentity::MAX_LEN, EpsMobileIdentity::from_bitbuf)?;
        let ue_network_cap = parse_lv(buffer, "ue_network_cap", UeNetworkCapability::MAX_LEN, UeNetworkCapability::from_bitbuf)?;
        let esm_msg = parse_lve_bytes(buffer, "esm_msg", 0xFFFF)?;

        let mut msg = AttachRequest {
            eps_attach_type,
            nas_ksi,
            eps_mobile_id,
            ue_network_cap,
            esm_msg,
            old_p_tmsi_signature: None,
            additional_guti: None,
            last_visited_registered_tai: None,
            drx_param: None,
            ms_network_cap: None,
            old_lai: None,
            tmsi_status: None,
            ms_cm2: None,
            ms_cm3: None,
            supported_codecs: None,
            additional_update_type: None,
            voice_domain_pref_and_ue_usage_setting: None,
            device_properties: None,
            old_guti_type: None,
        };

        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_OLD_PTMSI_SIGNATURE => {
                    msg.old_p_tmsi_signature = Some(parse_tv(buffer, "old_p_tmsi_signature", |b| Ok(b.read_field(24, "old_p_tmsi_signature")? as u32))?)
                }
                IEI_ADDITIONAL_GUTI => {
                    msg.additional_guti = Some(parse_tlv(buffer, "additional_guti", EpsMobileIdentity::MAX_LEN, EpsMobileIdentity::from_bitbuf)?)
                }
                IEI_LAST_VISITED_TAI => {
                    msg.last_visited_registered_tai = Some(parse_tv(buffer, "last_visited_registered_tai", TrackingAreaId::from_bitbuf)?)
                }
                IEI_DRX_PARAMETER => msg.drx_param = Some(parse_tv(buffer, "drx_param", DrxParameter::from_bitbuf)?),
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
                IEI_DEVICE_PROPERTIES => msg.device_properties = Some(parse_type1(buffer, "device_properties")? & 0x01 == 1),
                IEI_OLD_GUTI_TYPE => {
                    let v = parse_type1(buffer, "old_guti_type")? & 0x01;
                    msg.old_guti_type = Some(GutiType::from_raw(v as u64, "old_guti_type")?);
                }
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::AttachRequest);

        check_range(self.eps_attach_type.into_raw() as u64, 3, "eps_attach_type")?;
        buffer.write_bits(self.nas_ksi.to_nibble()? as u64, 4);
        buffer.write_bit(0);
        buffer.write_bits(self.eps_attach_type.into_raw() as u64, 3);
        write_lv(buffer, "eps_mobile_id", EpsMobileIdentity::MAX_LEN, |b| self.eps_mobile_id.to_bitbuf(b))?;
        write_lv(buffer, "ue_network_cap", UeNetworkCapability::MAX_LEN, |b| self.ue_network_cap.to_bitbuf(b))?;
        write_lve_bytes(buffer, "esm_msg", 0xFFFF, &self.esm_msg)?;

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
        if let Some(ref tai) = self.last_visited_registered_tai {
            write_tv(buffer, IEI_LAST_VISITED_TAI, |b| tai.to_bitbuf(b))?;
        }
        if let Some(ref drx) = self.drx_param {
            write_tv(buffer, IEI_DRX_PARAMETER, |b| drx.to_bitbuf(b))?;
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
        if let Some(low_prio) = self.device_properties {
            write_type1(buffer, IEI_DEVICE_PROPERTIES, low_prio as u8, "device_properties")?;
        }
        if let Some(t) = self.old_guti_type {
            write_type1(buffer, IEI_OLD_GUTI_TYPE, t.into_raw() as u8, "old_guti_type")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nas_core::{debug, Imsi};

    use super::*;

    fn sample() -> AttachRequest {
        AttachRequest {
            eps_attach_type: EpsAttachType::EpsAttach,
            nas_ksi: NasKeySetId::no_key(),
            eps_mobile_id: EpsMobileIdentity::Imsi(Imsi(1010123456789)),
            ue_network_cap: UeNetworkCapability { eea: 0xE0, eia: 0x60, uea: None, ucs2_uia: None, additional: vec![] },
            esm_msg: vec![0x02, 0x01, 0xD0, 0x11, 0xD1],
            old_p_tmsi_signature: None,
            additional_guti: None,
            last_visited_registered_tai: None,
            drx_param: Some(DrxParameter { split_pg_cycle_code: 0, cn_specific_drx_cycle_coefficient: 0, split_on_ccch: false, non_drx_timer: 0 }),
            ms_network_cap: Some(vec![0xE5, 0xE0, 0x34]),
            old_lai: None,
            tmsi_status: None,
            ms_cm2: None,
            ms_cm3: None,
            supported_codecs: None,
            additional_update_type: Some(AdditionalUpdateType::SmsOnly),
            voice_domain_pref_and_ue_usage_setting: None,
            device_properties: Some(false),
            old_guti_type: None,
        }
    }

    #[test]
    fn test_attach_request_layout() {
        debug::setup_logging_verbose();
        let msg = sample();
        let mut buf = BitBuffer::new_autoexpand(64);
        msg.to_bitbuf(&mut buf).unwrap();
        let bytes = buf.to_bytes();
        tracing::info!("Serialized: {}", buf.dump_hex());

        // Header, then KSI 7 in the high nibble and EPS attach in the low nibble
        assert_eq!(&bytes[..3], &[0x07, 0x41, 0x71]);
        // LV IMSI
        assert_eq!(&bytes[3..12], &[0x08, 0x09, 0x10, 0x10, 0x10, 0x32, 0x54, 0x76, 0x98]);
        // LV UE network capability, LV-E ESM container
        assert_eq!(&bytes[12..15], &[0x02, 0xE0, 0x60]);
        assert_eq!(&bytes[15..17], &[0x00, 0x05]);
        // Trailing type 1 IEs
        assert_eq!(&bytes[bytes.len() - 2..], &[0xF1, 0xD0]);

        buf.seek(0);
        let decoded = AttachRequest::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(buf.get_len_remaining(), 0);
    }

    #[test]
    fn test_unknown_optional_ie_policy() {
        let mut buf = BitBuffer::new_autoexpand(64);
        sample().to_bitbuf(&mut buf).unwrap();
        // MS network feature support (0xC-) is not decoded by this codec
        buf.write_u8(0xC1);
        let bytes = buf.to_bytes();

        let mut skip = BitBuffer::from_vec(bytes.clone());
        assert_eq!(AttachRequest::from_bitbuf(&mut skip).unwrap(), sample());

        let mut reject = BitBuffer::from_vec(bytes);
        assert_eq!(
            AttachRequest::from_bitbuf_with(&mut reject, IePolicy::Reject),
            Err(DecodeError::UnexpectedIe { iei: 0xC1 })
        );
    }

    #[test]
    fn test_wrong_message_type() {
        let mut buf = BitBuffer::from_bytes(&[0x07, 0x42, 0x71]);
        assert_eq!(
            AttachRequest::from_bitbuf(&mut buf),
            Err(DecodeError::InvalidMessageType { expected: 0x41, found: 0x42 })
        );
    }
}
