use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::codec_error::check_range;
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::mobile_identity::EpsMobileIdentity;
use crate::common::nas_key_set_id::NasKeySetId;
use crate::emm::enums::detach_type::{NetworkDetachType, UeDetachType};
use crate::emm::enums::emm_cause::EmmCause;
use crate::emm::enums::emm_message_type::EmmMessageType;


const IEI_EMM_CAUSE: u8 = 0x53;

/// Representation of the DETACH REQUEST message, UE originating detach (TS 24.301 8.2.11.1).
/// Response expected: DETACH ACCEPT, unless `switch_off` is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachRequestUeOriginating {
    pub switch_off: bool,
    pub detach_type: UeDetachType,
    pub nas_ksi: NasKeySetId,
    /// LV, 5..12 octets
    pub eps_mobile_id: EpsMobileIdentity,
}

impl DetachRequestUeOriginating {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::DetachRequest)?;
        let nas_ksi = NasKeySetId::from_nibble(buffer.read_field(4, "nas_ksi")? as u8)?;
        let switch_off = buffer.read_field(1, "switch_off")? == 1;
        let detach_type = UeDetachType::from(buffer.read_field(3, "detach_type")? as u8);
        let eps_mobile_id = parse_lv(buffer, "eps_mobile_id", EpsMobileIdentity::MAX_LEN, EpsMobileIdentity::from_bitbuf)?;
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(DetachRequestUeOriginating { switch_off, detach_type, nas_ksi, eps_mobile_id })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::DetachRequest);
        check_range(self.detach_type.into_raw() as u64, 3, "detach_type")?;
        buffer.write_bits(self.nas_ksi.to_nibble()? as u64, 4);
        buffer.write_bit(self.switch_off as u8);
        buffer.write_bits(self.detach_type.into_raw() as u64, 3);
        write_lv(buffer, "eps_mobile_id", EpsMobileIdentity::MAX_LEN, |b| self.eps_mobile_id.to_bitbuf(b))
    }
}

/// Representation of the DETACH REQUEST message, UE terminated detach (TS 24.301 8.2.11.2).
/// Response expected: DETACH ACCEPT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachRequestUeTerminated {
    pub detach_type: NetworkDetachType,
    /// TV 0x53
    pub emm_cause: Option<EmmCause>,
}

impl DetachRequestUeTerminated {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::DetachRequest)?;
        buffer.read_field(5, "spare")?;
        let detach_type = NetworkDetachType::from(buffer.read_field(3, "detach_type")? as u8);
        let mut emm_cause = None;
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_EMM_CAUSE => emm_cause = Some(parse_tv(buffer, "emm_cause", |b| Ok(EmmCause::from(b.read_u8_field("emm_cause")?)))?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(DetachRequestUeTerminated { detach_type, emm_cause })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::DetachRequest);
        check_range(self.detach_type.into_raw() as u64, 3, "detach_type")?;
        buffer.write_bits(0, 5);
        buffer.write_bits(self.detach_type.into_raw() as u64, 3);
        if let Some(cause) = self.emm_cause {
            write_tv(buffer, IEI_EMM_CAUSE, |b| {
                b.write_u8(cause.into_raw());
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nas_core::Imsi;

    use super::*;

    #[test]
    fn test_switch_off_detach() {
        let msg = DetachRequestUeOriginating {
            switch_off: true,
            detach_type: UeDetachType::EpsDetach,
            nas_ksi: NasKeySetId::native(1),
            eps_mobile_id: EpsMobileIdentity::Imsi(Imsi(1010000000001)),
        };
        let mut buf = BitBuffer::new_autoexpand(64);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(&buf.to_bytes()[..3], &[0x07, 0x45, 0x19]);
        buf.seek(0);
        assert_eq!(DetachRequestUeOriginating::from_bitbuf(&mut buf).unwrap(), msg);
    }

    #[test]
    fn test_network_detach() {
        let msg = DetachRequestUeTerminated { detach_type: NetworkDetachType::ReAttachRequired, emm_cause: None };
        let mut buf = BitBuffer::new_autoexpand(32);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x07, 0x45, 0x01]);
        buf.seek(0);
        assert_eq!(DetachRequestUeTerminated::from_bitbuf(&mut buf).unwrap(), msg);
    }
}
