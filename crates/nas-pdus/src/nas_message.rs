//! Top-level NAS message routing: header peeking, and decode/encode dispatch over every
//! EMM and ESM message this stack knows.

use core::fmt;

use nas_core::{BitBuffer, DecodeError, Direction, EncodeError, IePolicy};

use crate::common::header::{ProtocolDiscriminator, SecurityHeaderType};
use crate::emm::enums::emm_message_type::EmmMessageType;
use crate::emm::pdus::attach_accept::AttachAccept;
use crate::emm::pdus::attach_complete::AttachComplete;
use crate::emm::pdus::attach_reject::AttachReject;
use crate::emm::pdus::attach_request::AttachRequest;
use crate::emm::pdus::authentication_failure::AuthenticationFailure;
use crate::emm::pdus::authentication_request::AuthenticationRequest;
use crate::emm::pdus::authentication_response::AuthenticationResponse;
use crate::emm::pdus::cs_service_notification::CsServiceNotification;
use crate::emm::pdus::detach_request::{DetachRequestUeOriginating, DetachRequestUeTerminated};
use crate::emm::pdus::emm_information::EmmInformation;
use crate::emm::pdus::emm_status::EmmStatus;
use crate::emm::pdus::extended_service_request::ExtendedServiceRequest;
use crate::emm::pdus::generic_nas_transport::{DownlinkGenericNasTransport, UplinkGenericNasTransport};
use crate::emm::pdus::guti_reallocation_command::GutiReallocationCommand;
use crate::emm::pdus::header_only::{AuthenticationReject, DetachAccept, GutiReallocationComplete, TrackingAreaUpdateComplete};
use crate::emm::pdus::identity_request::IdentityRequest;
use crate::emm::pdus::identity_response::IdentityResponse;
use crate::emm::pdus::nas_transport::{DownlinkNasTransport, UplinkNasTransport};
use crate::emm::pdus::security_mode_command::SecurityModeCommand;
use crate::emm::pdus::security_mode_complete::SecurityModeComplete;
use crate::emm::pdus::security_mode_reject::SecurityModeReject;
use crate::emm::pdus::service_reject::ServiceReject;
use crate::emm::pdus::service_request::ServiceRequest;
use crate::emm::pdus::tracking_area_update_accept::TrackingAreaUpdateAccept;
use crate::emm::pdus::tracking_area_update_reject::TrackingAreaUpdateReject;
use crate::emm::pdus::tracking_area_update_request::TrackingAreaUpdateRequest;
use crate::esm::enums::esm_message_type::EsmMessageType;
use crate::esm::pdus::activate_dedicated_eps_bearer_context_request::ActivateDedicatedEpsBearerContextRequest;
use crate::esm::pdus::activate_default_eps_bearer_context_request::ActivateDefaultEpsBearerContextRequest;
use crate::esm::pdus::bearer_resource_allocation_request::BearerResourceAllocationRequest;
use crate::esm::pdus::bearer_resource_modification_request::BearerResourceModificationRequest;
use crate::esm::pdus::deactivate_eps_bearer_context_request::DeactivateEpsBearerContextRequest;
use crate::esm::pdus::esm_information_response::EsmInformationResponse;
use crate::esm::pdus::modify_eps_bearer_context_request::ModifyEpsBearerContextRequest;
use crate::esm::pdus::pdn_connectivity_request::PdnConnectivityRequest;
use crate::esm::pdus::pdn_disconnect_request::PdnDisconnectRequest;
use crate::esm::pdus::simple::*;

/// Octets in front of the plain message in a security protected PDU: header, MAC (4), SQN (1)
pub const SECURITY_HEADER_LEN: usize = 6;

/// Generates `NasMessageType`, `NasMessage` and the dispatch between them. In the `emm`
/// and `esm` groups the variant, the message struct and the wire message type share a name.
macro_rules! nas_messages {
    (
        emm { $($emm:ident),* $(,)? }
        esm { $($esm:ident),* $(,)? }
        emm_special { $($sp:ident),* $(,)? }
    ) => {
        /// Every message known to the codec. Detach Request is split by direction since the
        /// two variants share a wire message type but not a layout.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum NasMessageType {
            $($emm,)*
            $($esm,)*
            $($sp,)*
        }

        impl NasMessageType {
            pub fn protocol_discriminator(&self) -> ProtocolDiscriminator {
                match self {
                    $(NasMessageType::$esm => ProtocolDiscriminator::EpsSessionManagement,)*
                    _ => ProtocolDiscriminator::EpsMobilityManagement,
                }
            }

            fn from_emm(raw: u64, direction: Direction) -> Option<Self> {
                let msg_type = EmmMessageType::from_raw(raw, "message_type").ok()?;
                match msg_type {
                    EmmMessageType::DetachRequest => Some(match direction {
                        Direction::Uplink => NasMessageType::DetachRequestUeOriginating,
                        Direction::Downlink => NasMessageType::DetachRequestUeTerminated,
                    }),
                    $(EmmMessageType::$emm => Some(NasMessageType::$emm),)*
                }
            }

            fn from_esm(raw: u64) -> Option<Self> {
                let msg_type = EsmMessageType::from_raw(raw, "message_type").ok()?;
                match msg_type {
                    $(EsmMessageType::$esm => Some(NasMessageType::$esm),)*
                }
            }
        }

        /// A decoded plain NAS message
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum NasMessage {
            $($emm($emm),)*
            $($esm($esm),)*
            $($sp($sp),)*
        }

        impl NasMessage {
            pub fn message_type(&self) -> NasMessageType {
                match self {
                    $(NasMessage::$emm(_) => NasMessageType::$emm,)*
                    $(NasMessage::$esm(_) => NasMessageType::$esm,)*
                    $(NasMessage::$sp(_) => NasMessageType::$sp,)*
                }
            }

            pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
                match self {
                    $(NasMessage::$emm(m) => m.to_bitbuf(buffer),)*
                    $(NasMessage::$esm(m) => m.to_bitbuf(buffer),)*
                    $(NasMessage::$sp(m) => m.to_bitbuf(buffer),)*
                }
            }
        }

        /// Decodes the message at the buffer position as `msg_type`. Mandatory IEs are read
        /// in order, then the optional IE block is handled according to `policy`.
        pub fn decode_message(msg_type: NasMessageType, buffer: &mut BitBuffer, policy: IePolicy) -> Result<NasMessage, DecodeError> {
            let msg = match msg_type {
                $(NasMessageType::$emm => NasMessage::$emm($emm::from_bitbuf_with(buffer, policy)?),)*
                $(NasMessageType::$esm => NasMessage::$esm($esm::from_bitbuf_with(buffer, policy)?),)*
                $(NasMessageType::$sp => NasMessage::$sp($sp::from_bitbuf_with(buffer, policy)?),)*
            };
            Ok(msg)
        }

        $(
            impl From<$emm> for NasMessage {
                fn from(m: $emm) -> Self {
                    NasMessage::$emm(m)
                }
            }
        )*
        $(
            impl From<$esm> for NasMessage {
                fn from(m: $esm) -> Self {
                    NasMessage::$esm(m)
                }
            }
        )*
        $(
            impl From<$sp> for NasMessage {
                fn from(m: $sp) -> Self {
                    NasMessage::$sp(m)
                }
            }
        )*
    };
}

nas_messages! {
    emm {
        AttachRequest,
        AttachAccept,
        AttachComplete,
        AttachReject,
        DetachAccept,
        TrackingAreaUpdateRequest,
        TrackingAreaUpdateAccept,
        TrackingAreaUpdateComplete,
        TrackingAreaUpdateReject,
        ExtendedServiceRequest,
        ServiceReject,
        GutiReallocationCommand,
        GutiReallocationComplete,
        AuthenticationRequest,
        AuthenticationResponse,
        AuthenticationReject,
        IdentityRequest,
        IdentityResponse,
        AuthenticationFailure,
        SecurityModeCommand,
        SecurityModeComplete,
        SecurityModeReject,
        EmmStatus,
        EmmInformation,
        DownlinkNasTransport,
        UplinkNasTransport,
        CsServiceNotification,
        DownlinkGenericNasTransport,
        UplinkGenericNasTransport,
    }
    esm {
        ActivateDefaultEpsBearerContextRequest,
        ActivateDefaultEpsBearerContextAccept,
        ActivateDefaultEpsBearerContextReject,
        ActivateDedicatedEpsBearerContextRequest,
        ActivateDedicatedEpsBearerContextAccept,
        ActivateDedicatedEpsBearerContextReject,
        ModifyEpsBearerContextRequest,
        ModifyEpsBearerContextAccept,
        ModifyEpsBearerContextReject,
        DeactivateEpsBearerContextRequest,
        DeactivateEpsBearerContextAccept,
        PdnConnectivityRequest,
        PdnConnectivityReject,
        PdnDisconnectRequest,
        PdnDisconnectReject,
        BearerResourceAllocationRequest,
        BearerResourceAllocationReject,
        BearerResourceModificationRequest,
        BearerResourceModificationReject,
        EsmInformationRequest,
        EsmInformationResponse,
        EsmStatus,
    }
    emm_special {
        DetachRequestUeOriginating,
        DetachRequestUeTerminated,
        ServiceRequest,
    }
}

impl fmt::Display for NasMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for NasMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message_type())
    }
}

impl NasMessage {
    /// Decodes a complete plain NAS PDU (or a Service Request), routing on its header
    pub fn from_bytes(pdu: &[u8], direction: Direction, policy: IePolicy) -> Result<NasMessage, DecodeError> {
        let mut buffer = BitBuffer::from_bytes(pdu);
        let header = parse_header(&buffer, direction)?;
        if header.security_header_type.is_protected() && header.security_header_type != SecurityHeaderType::ServiceRequest {
            return Err(DecodeError::UnsupportedSecurityHeader { found: header.security_header_type.into_raw() });
        }
        let Some(msg_type) = header.message_type else {
            return Err(DecodeError::InvalidValue { field: "message_type", value: header.raw_message_type.unwrap_or(0) as u64 });
        };
        decode_message(msg_type, &mut buffer, policy)
    }
}

/// Header fields of a NAS PDU, read without consuming anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NasHeader {
    /// Outer security header type. Always PlainNas for a bare ESM message.
    pub security_header_type: SecurityHeaderType,
    /// Protocol discriminator of the plain message, looking through an integrity-only header
    pub protocol_discriminator: ProtocolDiscriminator,
    /// None when the plain message is ciphered
    pub raw_message_type: Option<u8>,
    /// None when ciphered, or when the message type is not known to the codec
    pub message_type: Option<NasMessageType>,
}

impl NasHeader {
    /// The message type octet was readable but names no known message
    pub fn is_unknown_message_type(&self) -> bool {
        self.raw_message_type.is_some() && self.message_type.is_none()
    }
}

fn peek_octet(buffer: &BitBuffer, octet: usize, field: &'static str) -> Result<u64, DecodeError> {
    buffer.peek_bits_posoffset(octet * 8, 8).ok_or(DecodeError::BufferEnded { field: Some(field) })
}

fn read_pd(octet: u64) -> Result<ProtocolDiscriminator, DecodeError> {
    ProtocolDiscriminator::from_raw(octet & 0x0F, "protocol_discriminator")
        .map_err(|_| DecodeError::InvalidProtocolDiscriminator { found: octet & 0x0F })
}

/// Peeks the plain message header starting at `offset` octets into the buffer
fn peek_plain(buffer: &BitBuffer, offset: usize, direction: Direction) -> Result<(ProtocolDiscriminator, u8, Option<NasMessageType>), DecodeError> {
    let first = peek_octet(buffer, offset, "protocol_discriminator")?;
    let pd = read_pd(first)?;
    match pd {
        ProtocolDiscriminator::EpsMobilityManagement => {
            let raw = peek_octet(buffer, offset + 1, "message_type")?;
            Ok((pd, raw as u8, NasMessageType::from_emm(raw, direction)))
        }
        ProtocolDiscriminator::EpsSessionManagement => {
            let raw = peek_octet(buffer, offset + 2, "message_type")?;
            Ok((pd, raw as u8, NasMessageType::from_esm(raw)))
        }
    }
}

/// Reads the routing information of the PDU at the buffer position. Integrity protected
/// but unciphered PDUs are looked through to the plain message they carry.
pub fn parse_header(buffer: &BitBuffer, direction: Direction) -> Result<NasHeader, DecodeError> {
    let first = peek_octet(buffer, 0, "security_header_type")?;
    let pd = read_pd(first)?;
    if pd == ProtocolDiscriminator::EpsSessionManagement {
        let (pd, raw, message_type) = peek_plain(buffer, 0, direction)?;
        return Ok(NasHeader { security_header_type: SecurityHeaderType::PlainNas, protocol_discriminator: pd, raw_message_type: Some(raw), message_type });
    }

    let sht_raw = first >> 4;
    let sht = SecurityHeaderType::from_raw(sht_raw, "security_header_type").map_err(|_| DecodeError::UnsupportedSecurityHeader { found: sht_raw })?;
    let header = match sht {
        SecurityHeaderType::PlainNas => {
            let (pd, raw, message_type) = peek_plain(buffer, 0, direction)?;
            NasHeader { security_header_type: sht, protocol_discriminator: pd, raw_message_type: Some(raw), message_type }
        }
        SecurityHeaderType::ServiceRequest => NasHeader {
            security_header_type: sht,
            protocol_discriminator: pd,
            raw_message_type: None,
            message_type: Some(NasMessageType::ServiceRequest),
        },
        _ if sht.is_ciphered() => NasHeader { security_header_type: sht, protocol_discriminator: pd, raw_message_type: None, message_type: None },
        _ => {
            let (pd, raw, message_type) = peek_plain(buffer, SECURITY_HEADER_LEN, direction)?;
            NasHeader { security_header_type: sht, protocol_discriminator: pd, raw_message_type: Some(raw), message_type }
        }
    };
    tracing::trace!("parse_header: {:?}", header);
    Ok(header)
}

/// Returns the plain message carried in an unciphered PDU, skipping the security header
/// if one is present. The MAC is not checked here.
pub fn strip_security_header(pdu: &[u8]) -> Result<(SecurityHeaderType, &[u8]), DecodeError> {
    let first = *pdu.first().ok_or(DecodeError::BufferEnded { field: Some("security_header_type") })? as u64;
    if read_pd(first)? == ProtocolDiscriminator::EpsSessionManagement {
        return Ok((SecurityHeaderType::PlainNas, pdu));
    }
    let sht = SecurityHeaderType::from_raw(first >> 4, "security_header_type").map_err(|_| DecodeError::UnsupportedSecurityHeader { found: first >> 4 })?;
    match sht {
        SecurityHeaderType::PlainNas => Ok((sht, pdu)),
        SecurityHeaderType::ServiceRequest => Err(DecodeError::UnsupportedSecurityHeader { found: sht.into_raw() }),
        _ if sht.is_ciphered() => Err(DecodeError::UnsupportedSecurityHeader { found: sht.into_raw() }),
        _ => {
            if pdu.len() <= SECURITY_HEADER_LEN {
                return Err(DecodeError::BufferEnded { field: Some("plain_nas_message") });
            }
            Ok((sht, &pdu[SECURITY_HEADER_LEN..]))
        }
    }
}

/// Decodes a protected PDU whose body is known to be plain, such as one ciphered with EEA0.
/// The security header is skipped for every protected header type and the MAC is not checked.
pub fn decode_unciphered(pdu: &[u8], direction: Direction, policy: IePolicy) -> Result<(SecurityHeaderType, NasMessage), DecodeError> {
    let first = *pdu.first().ok_or(DecodeError::BufferEnded { field: Some("security_header_type") })? as u64;
    if read_pd(first)? == ProtocolDiscriminator::EpsSessionManagement {
        return Ok((SecurityHeaderType::PlainNas, NasMessage::from_bytes(pdu, direction, policy)?));
    }
    let sht = SecurityHeaderType::from_raw(first >> 4, "security_header_type").map_err(|_| DecodeError::UnsupportedSecurityHeader { found: first >> 4 })?;
    match sht {
        SecurityHeaderType::PlainNas | SecurityHeaderType::ServiceRequest => Ok((sht, NasMessage::from_bytes(pdu, direction, policy)?)),
        _ => {
            if pdu.len() <= SECURITY_HEADER_LEN {
                return Err(DecodeError::BufferEnded { field: Some("plain_nas_message") });
            }
            Ok((sht, NasMessage::from_bytes(&pdu[SECURITY_HEADER_LEN..], direction, policy)?))
        }
    }
}

/// Encodes a message into a fresh octet vector
pub fn encode_message(msg: &NasMessage) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = BitBuffer::new_autoexpand(256);
    msg.to_bitbuf(&mut buffer)?;
    tracing::trace!("encode_message {}: {}", msg, buffer.dump_hex());
    Ok(buffer.to_bytes())
}
