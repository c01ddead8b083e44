//! ESM messages whose contents are limited to an optional PCO, or an ESM cause with
//! an optional PCO and back-off timer

use nas_core::{BitBuffer, DecodeError, EncodeError, Ebi, IePolicy};
use nas_core::typed_ies::*;

use crate::common::gprs_timer::GprsTimer3;
use crate::common::header::{read_esm_header, write_esm_header};
use crate::esm::enums::esm_cause::EsmCause;
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::fields::pco::ProtocolConfigOptions;


pub(crate) const IEI_PCO: u8 = 0x27;
pub(crate) const IEI_T3396: u8 = 0x37;

macro_rules! esm_pco_message {
    ($(#[$meta:meta])* $name:ident, $msg_type:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub eps_bearer_id: Ebi,
            pub proc_transaction_id: u8,
            pub pco: Option<ProtocolConfigOptions>,
        }

        impl $name {
            pub fn new(eps_bearer_id: Ebi, proc_transaction_id: u8) -> Self {
                $name { eps_bearer_id, proc_transaction_id, pco: None }
            }

            pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
                Self::from_bitbuf_with(buffer, IePolicy::Skip)
            }

            pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
                let (eps_bearer_id, proc_transaction_id) = read_esm_header(buffer, $msg_type)?;
                let mut msg = $name::new(eps_bearer_id, proc_transaction_id);
                while let Some(iei) = peek_iei(buffer) {
                    match iei_key(iei) {
                        IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                        _ => unknown_ie(buffer, policy)?,
                    }
                }
                Ok(msg)
            }

            pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
                write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, $msg_type)?;
                if let Some(ref pco) = self.pco {
                    write_tlv(buffer, IEI_PCO, "pco", ProtocolConfigOptions::MAX_LEN, |b| pco.to_bitbuf(b))?;
                }
                Ok(())
            }
        }
    };
}

macro_rules! esm_reject_message {
    ($(#[$meta:meta])* $name:ident, $msg_type:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub eps_bearer_id: Ebi,
            pub proc_transaction_id: u8,
            pub esm_cause: EsmCause,
            pub pco: Option<ProtocolConfigOptions>,
        }

        impl $name {
            pub fn new(eps_bearer_id: Ebi, proc_transaction_id: u8, esm_cause: EsmCause) -> Self {
                $name { eps_bearer_id, proc_transaction_id, esm_cause, pco: None }
            }

            pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
                Self::from_bitbuf_with(buffer, IePolicy::Skip)
            }

            pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
                let (eps_bearer_id, proc_transaction_id) = read_esm_header(buffer, $msg_type)?;
                let esm_cause = EsmCause::from(buffer.read_u8_field("esm_cause")?);
                let mut msg = $name::new(eps_bearer_id, proc_transaction_id, esm_cause);
                while let Some(iei) = peek_iei(buffer) {
                    match iei_key(iei) {
                        IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                        _ => unknown_ie(buffer, policy)?,
                    }
                }
                Ok(msg)
            }

            pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
                write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, $msg_type)?;
                buffer.write_u8(self.esm_cause.into_raw());
                if let Some(ref pco) = self.pco {
                    write_tlv(buffer, IEI_PCO, "pco", ProtocolConfigOptions::MAX_LEN, |b| pco.to_bitbuf(b))?;
                }
                Ok(())
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, $msg_type:expr, backoff) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub eps_bearer_id: Ebi,
            pub proc_transaction_id: u8,
            pub esm_cause: EsmCause,
            pub pco: Option<ProtocolConfigOptions>,
            /// Back-off timer, TLV 0x37
            pub t3396: Option<GprsTimer3>,
        }

        impl $name {
            pub fn new(eps_bearer_id: Ebi, proc_transaction_id: u8, esm_cause: EsmCause) -> Self {
                $name { eps_bearer_id, proc_transaction_id, esm_cause, pco: None, t3396: None }
            }

            pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
                Self::from_bitbuf_with(buffer, IePolicy::Skip)
            }

            pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
                let (eps_bearer_id, proc_transaction_id) = read_esm_header(buffer, $msg_type)?;
                let esm_cause = EsmCause::from(buffer.read_u8_field("esm_cause")?);
                let mut msg = $name::new(eps_bearer_id, proc_transaction_id, esm_cause);
                while let Some(iei) = peek_iei(buffer) {
                    match iei_key(iei) {
                        IEI_PCO => msg.pco = Some(parse_tlv(buffer, "pco", ProtocolConfigOptions::MAX_LEN, ProtocolConfigOptions::from_bitbuf)?),
                        IEI_T3396 => msg.t3396 = Some(parse_tlv(buffer, "t3396", 1, GprsTimer3::from_bitbuf)?),
                        _ => unknown_ie(buffer, policy)?,
                    }
                }
                Ok(msg)
            }

            pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
                write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, $msg_type)?;
                buffer.write_u8(self.esm_cause.into_raw());
                if let Some(ref pco) = self.pco {
                    write_tlv(buffer, IEI_PCO, "pco", ProtocolConfigOptions::MAX_LEN, |b| pco.to_bitbuf(b))?;
                }
                if let Some(ref t) = self.t3396 {
                    write_tlv(buffer, IEI_T3396, "t3396", 1, |b| t.to_bitbuf(b))?;
                }
                Ok(())
            }
        }
    };
}

esm_pco_message! {
    /// ACTIVATE DEFAULT EPS BEARER CONTEXT ACCEPT (TS 24.301 8.3.1)
    ActivateDefaultEpsBearerContextAccept, EsmMessageType::ActivateDefaultEpsBearerContextAccept
}

esm_reject_message! {
    /// ACTIVATE DEFAULT EPS BEARER CONTEXT REJECT (TS 24.301 8.3.2)
    ActivateDefaultEpsBearerContextReject, EsmMessageType::ActivateDefaultEpsBearerContextReject
}

esm_pco_message! {
    /// ACTIVATE DEDICATED EPS BEARER CONTEXT ACCEPT (TS 24.301 8.3.1)
    ActivateDedicatedEpsBearerContextAccept, EsmMessageType::ActivateDedicatedEpsBearerContextAccept
}

esm_reject_message! {
    /// ACTIVATE DEDICATED EPS BEARER CONTEXT REJECT (TS 24.301 8.3.2)
    ActivateDedicatedEpsBearerContextReject, EsmMessageType::ActivateDedicatedEpsBearerContextReject
}

esm_pco_message! {
    /// MODIFY EPS BEARER CONTEXT ACCEPT (TS 24.301 8.3.16)
    ModifyEpsBearerContextAccept, EsmMessageType::ModifyEpsBearerContextAccept
}

esm_reject_message! {
    /// MODIFY EPS BEARER CONTEXT REJECT (TS 24.301 8.3.17)
    ModifyEpsBearerContextReject, EsmMessageType::ModifyEpsBearerContextReject
}

esm_pco_message! {
    /// DEACTIVATE EPS BEARER CONTEXT ACCEPT (TS 24.301 8.3.11)
    DeactivateEpsBearerContextAccept, EsmMessageType::DeactivateEpsBearerContextAccept
}

esm_reject_message! {
    /// PDN CONNECTIVITY REJECT (TS 24.301 8.3.19)
    PdnConnectivityReject, EsmMessageType::PdnConnectivityReject, backoff
}

esm_reject_message! {
    /// PDN DISCONNECT REJECT (TS 24.301 8.3.21)
    PdnDisconnectReject, EsmMessageType::PdnDisconnectReject
}

esm_reject_message! {
    /// BEARER RESOURCE ALLOCATION REJECT (TS 24.301 8.3.7)
    BearerResourceAllocationReject, EsmMessageType::BearerResourceAllocationReject, backoff
}

esm_reject_message! {
    /// BEARER RESOURCE MODIFICATION REJECT (TS 24.301 8.3.9)
    BearerResourceModificationReject, EsmMessageType::BearerResourceModificationReject, backoff
}

/// ESM INFORMATION REQUEST (TS 24.301 8.3.13). Header only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EsmInformationRequest {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
}

impl EsmInformationRequest {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (eps_bearer_id, proc_transaction_id) = read_esm_header(buffer, EsmMessageType::EsmInformationRequest)?;
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(EsmInformationRequest { eps_bearer_id, proc_transaction_id })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::EsmInformationRequest)
    }
}

/// ESM STATUS (TS 24.301 8.3.15), both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EsmStatus {
    pub eps_bearer_id: Ebi,
    pub proc_transaction_id: u8,
    pub esm_cause: EsmCause,
}

impl EsmStatus {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        Self::from_bitbuf_with(buffer, IePolicy::Skip)
    }

    pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
        let (eps_bearer_id, proc_transaction_id) = read_esm_header(buffer, EsmMessageType::EsmStatus)?;
        let esm_cause = EsmCause::from(buffer.read_u8_field("esm_cause")?);
        while peek_iei(buffer).is_some() {
            unknown_ie(buffer, policy)?;
        }
        Ok(EsmStatus { eps_bearer_id, proc_transaction_id, esm_cause })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        write_esm_header(buffer, self.eps_bearer_id, self.proc_transaction_id, EsmMessageType::EsmStatus)?;
        buffer.write_u8(self.esm_cause.into_raw());
        Ok(())
    }
}
