use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::common::nas_key_set_id::NasKeySetId;
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::fields::nas_security_algorithms::NasSecurityAlgorithms;
use crate::emm::fields::ue_security_capability::UeSecurityCapability;


const IEI_IMEISV_REQUEST: u8 = 0xC0;
const IEI_REPLAYED_NONCE_UE: u8 = 0x55;
const IEI_NONCE_MME: u8 = 0x56;

/// Representation of the SECURITY MODE COMMAND message (TS 24.301 8.2.20).
/// Response expected: SECURITY MODE COMPLETE or SECURITY MODE REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityModeCommand {
    pub selected_algorithms: NasSecurityAlgorithms,
    pub nas_ksi: NasKeySetId,
    /// Capabilities echoed back as received from the UE
    pub replayed_ue_security_cap: UeSecurityCapability,
    pub imeisv_request: Option<bool>,
    pub replayed_nonce_ue: Option<u32>,
    pub nonce_mme: Option<u32>,
}

impl SecurityModeCommand {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::SecurityModeCommand)?;
        let selected_algorithms = NasSecurityAlgorithms::from_bitbuf(buffer)?;
        buffer.read_field(4, "spare")?;
        let nas_ksi = NasKeySetId::from_nibble(buffer.read_field(4, "nas_ksi")? as u8)?;
        let replayed_ue_security_cap =
            parse_lv(buffer, "replayed_ue_security_cap", UeSecurityCapability::MAX_LEN, UeSecurityCapability::from_bitbuf)?;

        let mut msg = SecurityModeCommand {
            selected_algorithms,
            nas_ksi,
            replayed_ue_security_cap,
            imeisv_request: None,
            replayed_nonce_ue: None,
            nonce_mme: None,
        };
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_IMEISV_REQUEST => msg.imeisv_request = Some(parse_type1(buffer, "imeisv_request")? & 0x07 == 1),
                IEI_REPLAYED_NONCE_UE => {
                    msg.replayed_nonce_ue = Some(parse_tv(buffer, "replayed_nonce_ue", |b| Ok(b.read_field(32, "replayed_nonce_ue")? as u32))?)
                }
                IEI_NONCE_MME => msg.nonce_mme = Some(parse_tv(buffer, "nonce_mme", |b| Ok(b.read_field(32, "nonce_mme")? as u32))?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(msg)
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::SecurityModeCommand);
        self.selected_algorithms.to_bitbuf(buffer)?;
        buffer.write_bits(0, 4);
        buffer.write_bits(self.nas_ksi.to_nibble()? as u64, 4);
        write_lv(buffer, "replayed_ue_security_cap", UeSecurityCapability::MAX_LEN, |b| self.replayed_ue_security_cap.to_bitbuf(b))?;

        if let Some(req) = self.imeisv_request {
            write_type1(buffer, IEI_IMEISV_REQUEST, req as u8, "imeisv_request")?;
        }
        if let Some(nonce) = self.replayed_nonce_ue {
            write_tv(buffer, IEI_REPLAYED_NONCE_UE, |b| {
                b.write_bits(nonce as u64, 32);
                Ok(())
            })?;
        }
        if let Some(nonce) = self.nonce_mme {
            write_tv(buffer, IEI_NONCE_MME, |b| {
                b.write_bits(nonce as u64, 32);
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emm::enums::security_algorithms::{CipheringAlgorithm, IntegrityAlgorithm};

    #[test]
    fn test_security_mode_command_layout() {
        let msg = SecurityModeCommand {
            selected_algorithms: NasSecurityAlgorithms { ciphering: CipheringAlgorithm::Eea0, integrity: IntegrityAlgorithm::Eia2 },
            nas_ksi: NasKeySetId::native(1),
            replayed_ue_security_cap: UeSecurityCapability { eea: 0xE0, eia: 0x60, uea: None, uia: None, gea: None },
            imeisv_request: Some(true),
            replayed_nonce_ue: None,
            nonce_mme: None,
        };
        let mut buf = BitBuffer::new_autoexpand(64);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x07, 0x5D, 0x02, 0x01, 0x02, 0xE0, 0x60, 0xC1]);
        buf.seek(0);
        assert_eq!(SecurityModeCommand::from_bitbuf(&mut buf).unwrap(), msg);
    }
}
