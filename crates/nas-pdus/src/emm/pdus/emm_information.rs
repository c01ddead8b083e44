use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::network_name::NetworkName;
use crate::common::time_zone::{DaylightSavingTime, TimeZone, TimeZoneAndTime};
use crate::emm::enums::emm_message_type::EmmMessageType;


const IEI_FULL_NAME: u8 = 0x43;
const IEI_SHORT_NAME: u8 = 0x45;
const IEI_LOCAL_TIME_ZONE: u8 = 0x46;
const IEI_UNIVERSAL_TIME: u8 = 0x47;
const IEI_DAYLIGHT_SAVING_TIME: u8 = 0x49;

/// Representation of the EMM INFORMATION message (TS 24.301 8.2.13).
/// Sent by the network after attach to tell the UE the network name and time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmmInformation {
    pub full_name: Option<NetworkName>,
    pub short_name: Option<NetworkName>,
    pub local_time_zone: Option<TimeZone>,
    pub universal_time: Option<TimeZoneAndTime>,
    pub daylight_saving_time: Option<DaylightSavingTime>,
}

impl EmmInformation {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::EmmInformation)?;
        let mut msg = EmmInformation::default();
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_FULL_NAME => msg.full_name = Some(parse_tlv(buffer, "full_name", NetworkName::MAX_LEN, NetworkName::from_bitbuf)?),
                IEI_SHORT_NAME => msg.short_name = Some(parse_tlv(buffer, "short_name", NetworkName::MAX_LEN, NetworkName::from_bitbuf)?),
                IEI_LOCAL_TIME_ZONE => msg.local_time_zone = Some(parse_tv(buffer, "local_time_zone", TimeZone::from_bitbuf)?),
                IEI_UNIVERSAL_TIME => msg.universal_time = Some(parse_tv(buffer, "universal_time", TimeZoneAndTime::from_bitbuf)?),
                IEI_DAYLIGHT_SAVING_TIME => {
                    msg.daylight_saving_time = Some(parse_tlv(buffer, "daylight_saving_time", 1, DaylightSavingTime::from_bitbuf)?)
                }
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::EmmInformation);
        if let Some(ref name) = self.full_name {
            write_tlv(buffer, IEI_FULL_NAME, "full_name", NetworkName::MAX_LEN, |b| name.to_bitbuf(b))?;
        }
        if let Some(ref name) = self.short_name {
            write_tlv(buffer, IEI_SHORT_NAME, "short_name", NetworkName::MAX_LEN, |b| name.to_bitbuf(b))?;
        }
        if let Some(ref tz) = self.local_time_zone {
            write_tv(buffer, IEI_LOCAL_TIME_ZONE, |b| tz.to_bitbuf(b))?;
        }
        if let Some(ref t) = self.universal_time {
            write_tv(buffer, IEI_UNIVERSAL_TIME, |b| t.to_bitbuf(b))?;
        }
        if let Some(ref dst) = self.daylight_saving_time {
            write_tlv(buffer, IEI_DAYLIGHT_SAVING_TIME, "daylight_saving_time", 1, |b| dst.to_bitbuf(b))?;
        }
        Ok(())
    }
}
