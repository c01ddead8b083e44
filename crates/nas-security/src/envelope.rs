//! Security protected NAS message envelope (TS 24.301 9.1, 4.4.3 to 4.4.5):
//! `[security header | PD][MAC 4][SQN 1][NAS message]`, MAC over `SQN ‖ NAS message`.

use nas_core::{DecodeError, Direction};
use nas_pdus::common::header::{ProtocolDiscriminator, SecurityHeaderType};
use nas_pdus::emm::fields::ksi_and_sequence_number::KsiAndSequenceNumber;
use nas_pdus::emm::pdus::service_request::ServiceRequest;
use nas_pdus::nas_message::SECURITY_HEADER_LEN;

use crate::algorithms::{apply_cipher, compute_mac};
use crate::context::SecurityContext;
use crate::error::SecurityError;
use crate::NAS_BEARER;

/// Result of removing the security envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unprotected {
    pub header_type: SecurityHeaderType,
    /// Estimated NAS COUNT of the PDU, None for plain PDUs
    pub count: Option<u32>,
    pub plain: Vec<u8>,
}

/// Wraps a plain NAS message sent in `direction`, taking the next COUNT of that direction.
/// A plain header type returns the message unchanged.
pub fn protect(
    ctx: &mut SecurityContext,
    plain: &[u8],
    header_type: SecurityHeaderType,
    direction: Direction,
) -> Result<Vec<u8>, SecurityError> {
    match header_type {
        SecurityHeaderType::PlainNas => return Ok(plain.to_vec()),
        SecurityHeaderType::ServiceRequest => {
            return Err(DecodeError::UnsupportedSecurityHeader { found: header_type.into_raw() }.into());
        }
        _ => {}
    }

    let count = ctx.advance(direction);
    let sqn = (count & 0xFF) as u8;

    let mut out = Vec::with_capacity(SECURITY_HEADER_LEN + plain.len());
    out.push(((header_type.into_raw() as u8) << 4) | ProtocolDiscriminator::EpsMobilityManagement.into_raw() as u8);
    out.extend_from_slice(&[0; 4]);
    out.push(sqn);
    out.extend_from_slice(plain);
    if header_type.is_ciphered() {
        apply_cipher(ctx.eea, &ctx.k_nas_enc, count, NAS_BEARER, direction, &mut out[SECURITY_HEADER_LEN..])?;
    }

    let mac = compute_mac(ctx.eia, &ctx.k_nas_int, count, NAS_BEARER, direction, &out[5..])?;
    out[1..5].copy_from_slice(&mac);
    tracing::trace!("protected {:?} count {} mac {:02x?}", header_type, count, mac);
    Ok(out)
}

/// Verifies and strips the envelope of a PDU received in `direction`. The COUNT is
/// accepted only after the MAC checked out.
pub fn unprotect(ctx: &mut SecurityContext, pdu: &[u8], direction: Direction) -> Result<Unprotected, SecurityError> {
    let Some(first) = pdu.first() else {
        return Err(SecurityError::Truncated { len: 0 });
    };
    let raw = (*first >> 4) as u64;
    let header_type =
        SecurityHeaderType::try_from(raw).map_err(|_| DecodeError::UnsupportedSecurityHeader { found: raw })?;
    match header_type {
        SecurityHeaderType::PlainNas => {
            return Ok(Unprotected { header_type, count: None, plain: pdu.to_vec() });
        }
        SecurityHeaderType::ServiceRequest => {
            return Err(DecodeError::UnsupportedSecurityHeader { found: raw }.into());
        }
        _ => {}
    }
    if pdu.len() <= SECURITY_HEADER_LEN {
        return Err(SecurityError::Truncated { len: pdu.len() });
    }

    let count = ctx.estimate_count(direction, pdu[5], 8);
    let mac = compute_mac(ctx.eia, &ctx.k_nas_int, count, NAS_BEARER, direction, &pdu[5..])?;
    if mac[..] != pdu[1..5] {
        tracing::debug!("MAC mismatch at count {}: got {:02x?} expected {:02x?}", count, &pdu[1..5], mac);
        return Err(SecurityError::MacMismatch);
    }

    let mut plain = pdu[SECURITY_HEADER_LEN..].to_vec();
    if header_type.is_ciphered() {
        apply_cipher(ctx.eea, &ctx.k_nas_enc, count, NAS_BEARER, direction, &mut plain)?;
    }
    ctx.accept(direction, count)?;
    Ok(Unprotected { header_type, count: Some(count), plain })
}

fn short_mac(ctx: &SecurityContext, octets: [u8; 2], count: u32) -> Result<u16, SecurityError> {
    let mac = compute_mac(ctx.eia, &ctx.k_nas_int, count, NAS_BEARER, Direction::Uplink, &octets)?;
    Ok(u16::from_be_bytes([mac[2], mac[3]]))
}

fn service_request_octets(ksi_and_seq: &KsiAndSequenceNumber) -> [u8; 2] {
    let first = ((SecurityHeaderType::ServiceRequest.into_raw() as u8) << 4)
        | ProtocolDiscriminator::EpsMobilityManagement.into_raw() as u8;
    [first, ((ksi_and_seq.ksi & 0x07) << 5) | (ksi_and_seq.sequence_number & 0x1F)]
}

/// Checks the short MAC of a SERVICE REQUEST and accepts its uplink COUNT, which is returned
pub fn verify_service_request(ctx: &mut SecurityContext, msg: &ServiceRequest) -> Result<u32, SecurityError> {
    let count = ctx.estimate_count(Direction::Uplink, msg.ksi_and_seq.sequence_number, 5);
    let expected = short_mac(ctx, service_request_octets(&msg.ksi_and_seq), count)?;
    if expected != msg.short_mac {
        tracing::debug!("short MAC mismatch at count {}: got {:04x} expected {:04x}", count, msg.short_mac, expected);
        return Err(SecurityError::MacMismatch);
    }
    ctx.accept(Direction::Uplink, count)?;
    Ok(count)
}

/// Builds a SERVICE REQUEST in the UE role, taking the next uplink COUNT
pub fn build_service_request(ctx: &mut SecurityContext) -> Result<ServiceRequest, SecurityError> {
    let count = ctx.advance_uplink();
    let ksi_and_seq = KsiAndSequenceNumber { ksi: ctx.ksi & 0x07, sequence_number: (count & 0x1F) as u8 };
    let short_mac = short_mac(ctx, service_request_octets(&ksi_and_seq), count)?;
    Ok(ServiceRequest { ksi_and_seq, short_mac })
}

#[cfg(test)]
mod tests {
    use nas_core::debug;
    use nas_pdus::emm::enums::security_algorithms::{CipheringAlgorithm, IntegrityAlgorithm};

    use super::*;
    use crate::context::AuthVector;

    fn context_pair(eea: CipheringAlgorithm, eia: IntegrityAlgorithm) -> (SecurityContext, SecurityContext) {
        let av = AuthVector { rand: [0x23; 16], autn: [0x55; 16], xres: vec![0x0F; 8], ck: [0xC4; 16], ik: [0x1E; 16] };
        let mut mme = SecurityContext::derive_from_vector(2, &av, [0x00, 0xF1, 0x10]);
        mme.set_algorithms(eea, eia).unwrap();
        (mme.clone(), mme)
    }

    // EMM INFORMATION with a short network name
    const PLAIN: [u8; 8] = [0x07, 0x61, 0x45, 0x04, 0x81, 0xC3, 0x74, 0x0A];

    #[test]
    fn test_protect_unprotect_ciphered() {
        debug::setup_logging_verbose();
        let (mut mme, mut ue) = context_pair(CipheringAlgorithm::Eea2, IntegrityAlgorithm::Eia2);

        for i in 0..3u32 {
            let pdu = protect(&mut mme, &PLAIN, SecurityHeaderType::IntegrityProtectedCiphered, Direction::Downlink).unwrap();
            tracing::info!("protected: {:02x?}", pdu);
            assert_eq!(pdu[0], 0x27);
            assert_eq!(pdu[5], i as u8);
            assert_ne!(&pdu[6..], &PLAIN[..]);

            let res = unprotect(&mut ue, &pdu, Direction::Downlink).unwrap();
            assert_eq!(res.plain, PLAIN.to_vec());
            assert_eq!(res.count, Some(i));
            assert_eq!(res.header_type, SecurityHeaderType::IntegrityProtectedCiphered);
        }
        assert_eq!(ue.downlink.last_accepted(), Some(2));
    }

    #[test]
    fn test_replay_rejected() {
        let (mut mme, mut ue) = context_pair(CipheringAlgorithm::Eea0, IntegrityAlgorithm::Eia2);
        let first = protect(&mut ue, &PLAIN, SecurityHeaderType::IntegrityProtected, Direction::Uplink).unwrap();
        let second = protect(&mut ue, &PLAIN, SecurityHeaderType::IntegrityProtected, Direction::Uplink).unwrap();

        unprotect(&mut mme, &first, Direction::Uplink).unwrap();
        assert_eq!(unprotect(&mut mme, &first, Direction::Uplink), Err(SecurityError::ReplayedOrStaleCount { count: 0, last: 0 }));
        unprotect(&mut mme, &second, Direction::Uplink).unwrap();
        assert_eq!(unprotect(&mut mme, &first, Direction::Uplink), Err(SecurityError::ReplayedOrStaleCount { count: 0, last: 1 }));
    }

    #[test]
    fn test_any_bit_flip_fails_mac() {
        debug::setup_logging_verbose();
        let (mut mme, ue) = context_pair(CipheringAlgorithm::Eea0, IntegrityAlgorithm::Eia2);
        let pdu = protect(&mut mme, &PLAIN, SecurityHeaderType::IntegrityProtected, Direction::Downlink).unwrap();

        for byte in 1..pdu.len() {
            for bit in 0..8 {
                let mut tampered = pdu.clone();
                tampered[byte] ^= 1 << bit;
                let mut rx = ue.clone();
                assert_eq!(unprotect(&mut rx, &tampered, Direction::Downlink), Err(SecurityError::MacMismatch), "byte {} bit {}", byte, bit);
                assert_eq!(rx.downlink.last_accepted(), None);
            }
        }
    }

    #[test]
    fn test_count_survives_sqn_wrap() {
        let (mut mme, mut ue) = context_pair(CipheringAlgorithm::Eea2, IntegrityAlgorithm::Eia2);
        for i in 0..300u32 {
            let pdu = protect(&mut ue, &PLAIN, SecurityHeaderType::IntegrityProtectedCiphered, Direction::Uplink).unwrap();
            // Drop a few in the middle, the receiver must still track the overflow
            if (250..255).contains(&i) {
                continue;
            }
            assert_eq!(unprotect(&mut mme, &pdu, Direction::Uplink).unwrap().count, Some(i));
        }
        assert_eq!(mme.uplink.next(), 300);
    }

    #[test]
    fn test_null_algorithms() {
        let (mut mme, mut ue) = context_pair(CipheringAlgorithm::Eea0, IntegrityAlgorithm::Eia0);
        let pdu = protect(&mut mme, &PLAIN, SecurityHeaderType::IntegrityProtectedCiphered, Direction::Downlink).unwrap();
        assert_eq!(&pdu[1..5], &[0, 0, 0, 0]);
        assert_eq!(&pdu[6..], &PLAIN[..]);
        assert_eq!(unprotect(&mut ue, &pdu, Direction::Downlink).unwrap().plain, PLAIN.to_vec());
    }

    #[test]
    fn test_plain_and_truncated() {
        let (mut mme, _) = context_pair(CipheringAlgorithm::Eea0, IntegrityAlgorithm::Eia2);
        let res = unprotect(&mut mme, &PLAIN, Direction::Uplink).unwrap();
        assert_eq!(res.count, None);
        assert_eq!(protect(&mut mme, &PLAIN, SecurityHeaderType::PlainNas, Direction::Downlink).unwrap(), PLAIN.to_vec());
        assert_eq!(mme.downlink.next(), 0);

        assert_eq!(unprotect(&mut mme, &[], Direction::Uplink), Err(SecurityError::Truncated { len: 0 }));
        assert_eq!(unprotect(&mut mme, &[0x17, 0, 0, 0, 0, 0], Direction::Uplink), Err(SecurityError::Truncated { len: 6 }));
        assert_eq!(
            unprotect(&mut mme, &[0x57, 0, 0, 0, 0, 0, 0], Direction::Uplink),
            Err(SecurityError::Decode(DecodeError::UnsupportedSecurityHeader { found: 5 }))
        );
    }

    #[test]
    fn test_service_request_short_mac() {
        debug::setup_logging_verbose();
        let (mut mme, mut ue) = context_pair(CipheringAlgorithm::Eea0, IntegrityAlgorithm::Eia2);
        // A few uplink messages already exchanged
        for _ in 0..3 {
            let pdu = protect(&mut ue, &PLAIN, SecurityHeaderType::IntegrityProtected, Direction::Uplink).unwrap();
            unprotect(&mut mme, &pdu, Direction::Uplink).unwrap();
        }

        let sr = build_service_request(&mut ue).unwrap();
        assert_eq!(sr.ksi_and_seq, KsiAndSequenceNumber { ksi: 2, sequence_number: 3 });
        assert_eq!(service_request_octets(&sr.ksi_and_seq), sr.mac_input().unwrap());

        let mut tampered = sr;
        tampered.short_mac ^= 0x0100;
        assert_eq!(verify_service_request(&mut mme.clone(), &tampered), Err(SecurityError::MacMismatch));

        assert_eq!(verify_service_request(&mut mme, &sr), Ok(3));
        assert_eq!(verify_service_request(&mut mme, &sr), Err(SecurityError::ReplayedOrStaleCount { count: 3, last: 3 }));
    }
}
