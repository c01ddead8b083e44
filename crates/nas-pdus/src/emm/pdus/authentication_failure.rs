use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::*;

use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_cause::EmmCause;
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::fields::auth_parameters::{AuthAuts, read_auts};


const IEI_AUTH_FAILURE_PARAM: u8 = 0x30;

/// Representation of the AUTHENTICATION FAILURE message (TS 24.301 8.2.5).
/// Response to: AUTHENTICATION REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationFailure {
    /// MAC failure, synch failure or non-EPS authentication unacceptable
    pub emm_cause: EmmCause,
    /// Present with synch failure only
    pub auts: Option<AuthAuts>,
}

impl AuthenticationFailure {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        read_emm_header(buffer, EmmMessageType::AuthenticationFailure)?;
        let emm_cause = EmmCause::from(buffer.read_u8_field("emm_cause")?);
        let mut auts = None;
        while let Some(iei) = peek_iei(buffer) {
            match iei_key(iei) {
                IEI_AUTH_FAILURE_PARAM => auts = Some(parse_tlv(buffer, "auts", 14, read_auts)?),
                _ => unknown_ie(buffer, policy)?,
            }
        }
        Ok(AuthenticationFailure { emm_cause, auts })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_emm_header(buffer, EmmMessageType::AuthenticationFailure);
        buffer.write_u8(self.emm_cause.into_raw());
        if let Some(ref auts) = self.auts {
            write_tlv(buffer, IEI_AUTH_FAILURE_PARAM, "auts", 14, |b| {
                b.write_bytes(auts);
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synch_failure_with_auts() {
        let mut bytes = vec![0x07, 0x5C, 0x15, 0x30, 0x0E];
        bytes.extend(1u8..=14);
        let mut buf = BitBuffer::from_vec(bytes);
        let msg = AuthenticationFailure::from_bitbuf(&mut buf).unwrap();
        assert_eq!(msg.emm_cause, EmmCause::SynchFailure);
        assert_eq!(msg.auts.unwrap()[13], 14);
    }

    #[test]
    fn test_mac_failure_without_auts() {
        let msg = AuthenticationFailure { emm_cause: EmmCause::MacFailure, auts: None };
        let mut buf = BitBuffer::new_autoexpand(24);
        msg.to_bitbuf(&mut buf).unwrap();
        assert_eq!(buf.to_bytes(), vec![0x07, 0x5C, 0x14]);
    }
}
