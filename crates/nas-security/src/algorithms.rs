use aes::Aes128;
use cmac::{Cmac, Mac};
use ctr::cipher::{KeyIvInit, StreamCipher};

use nas_core::Direction;
use nas_pdus::emm::enums::security_algorithms::{CipheringAlgorithm, IntegrityAlgorithm};
use nas_pdus::emm::fields::ue_security_capability::UeSecurityCapability;

use crate::error::SecurityError;

/// 128-bit K_NASenc or K_NASint
pub type NasKey = [u8; 16];

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// COUNT ‖ BEARER ‖ DIRECTION, the shared prefix of the EIA2 message and EEA2 counter block
fn count_block(count: u32, bearer: u8, direction: Direction) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[..4].copy_from_slice(&count.to_be_bytes());
    block[4] = ((bearer & 0x1F) << 3) | (direction.bit() << 2);
    block
}

/// 128-EIA2 (TS 33.401 B.2.3): AES-CMAC over COUNT ‖ BEARER ‖ DIRECTION ‖ 0^26 ‖ MESSAGE,
/// truncated to the leftmost 32 bits
fn eia2(key: &NasKey, count: u32, bearer: u8, direction: Direction, msg: &[u8]) -> [u8; 4] {
    let block = count_block(count, bearer, direction);
    let mut mac = <Cmac<Aes128> as Mac>::new(key.into());
    mac.update(&block[..8]);
    mac.update(msg);
    let out = mac.finalize().into_bytes();
    [out[0], out[1], out[2], out[3]]
}

/// 128-EEA2 (TS 33.401 B.1.3): AES-128 in CTR mode, counter block initialised with
/// COUNT ‖ BEARER ‖ DIRECTION ‖ 0^90. Encryption and decryption are the same operation.
fn eea2(key: &NasKey, count: u32, bearer: u8, direction: Direction, data: &mut [u8]) {
    let iv = count_block(count, bearer, direction);
    let mut cipher = Aes128Ctr::new(key.into(), &iv.into());
    cipher.apply_keystream(data);
}

pub fn ensure_integrity_supported(alg: IntegrityAlgorithm) -> Result<(), SecurityError> {
    match alg {
        IntegrityAlgorithm::Eia0 | IntegrityAlgorithm::Eia2 => Ok(()),
        other => Err(SecurityError::UnsupportedAlgorithm { kind: "integrity", id: other.into_raw() as u8 }),
    }
}

pub fn ensure_ciphering_supported(alg: CipheringAlgorithm) -> Result<(), SecurityError> {
    match alg {
        CipheringAlgorithm::Eea0 | CipheringAlgorithm::Eea2 => Ok(()),
        other => Err(SecurityError::UnsupportedAlgorithm { kind: "ciphering", id: other.into_raw() as u8 }),
    }
}

/// Computes the 32-bit NAS-MAC. EIA0 yields an all-zero MAC.
pub fn compute_mac(
    alg: IntegrityAlgorithm,
    key: &NasKey,
    count: u32,
    bearer: u8,
    direction: Direction,
    msg: &[u8],
) -> Result<[u8; 4], SecurityError> {
    ensure_integrity_supported(alg)?;
    match alg {
        IntegrityAlgorithm::Eia2 => Ok(eia2(key, count, bearer, direction, msg)),
        _ => Ok([0; 4]),
    }
}

/// Ciphers or deciphers `data` in place. EEA0 leaves it untouched.
pub fn apply_cipher(
    alg: CipheringAlgorithm,
    key: &NasKey,
    count: u32,
    bearer: u8,
    direction: Direction,
    data: &mut [u8],
) -> Result<(), SecurityError> {
    ensure_ciphering_supported(alg)?;
    if alg == CipheringAlgorithm::Eea2 {
        eea2(key, count, bearer, direction, data);
    }
    Ok(())
}

/// Picks the first algorithm of each preference list that the UE advertises (TS 33.401 7.2.4.3).
/// Preference lists hold 3-bit algorithm identifiers.
pub fn select_algorithms(
    ue_caps: &UeSecurityCapability,
    integrity_pref: &[u8],
    ciphering_pref: &[u8],
) -> Result<(CipheringAlgorithm, IntegrityAlgorithm), SecurityError> {
    let eia = integrity_pref
        .iter()
        .copied()
        .find(|id| ue_caps.supports_eia(*id))
        .ok_or(SecurityError::NoCommonAlgorithm { kind: "integrity" })?;
    let eea = ciphering_pref
        .iter()
        .copied()
        .find(|id| ue_caps.supports_eea(*id))
        .ok_or(SecurityError::NoCommonAlgorithm { kind: "ciphering" })?;

    let eia = IntegrityAlgorithm::from_raw(eia as u64, "integrity_algorithm")?;
    let eea = CipheringAlgorithm::from_raw(eea as u64, "ciphering_algorithm")?;
    ensure_integrity_supported(eia)?;
    ensure_ciphering_supported(eea)?;
    tracing::debug!("selected {} / {}", eea, eia);
    Ok((eea, eia))
}
