//! EPS key hierarchy (TS 33.401 Annex A) on top of the generic KDF of TS 33.220 B.2

use hmac::{Hmac, Mac};
use sha2::Sha256;

use nas_pdus::emm::enums::security_algorithms::{CipheringAlgorithm, IntegrityAlgorithm};

use crate::algorithms::{ensure_ciphering_supported, ensure_integrity_supported, NasKey};
use crate::error::SecurityError;

pub type Key256 = [u8; 32];

const FC_K_ASME: u8 = 0x10;
const FC_K_ENB: u8 = 0x11;
const FC_NAS_KEYS: u8 = 0x15;

const NAS_ENC_ALG: u8 = 0x01;
const NAS_INT_ALG: u8 = 0x02;

/// KDF(key, S) = HMAC-SHA-256(key, S), S = FC ‖ P0 ‖ L0 ‖ P1 ‖ L1 ‖ ...
/// with each Li the 16-bit big-endian length of Pi.
pub fn kdf(key: &[u8], fc: u8, params: &[&[u8]]) -> Key256 {
    let mut s = Vec::with_capacity(1 + params.iter().map(|p| p.len() + 2).sum::<usize>());
    s.push(fc);
    for p in params {
        s.extend_from_slice(p);
        s.extend_from_slice(&(p.len() as u16).to_be_bytes());
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(&s);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// The first 6 octets of AUTN hold SQN ⊕ AK
pub fn sqn_xor_ak(autn: &[u8; 16]) -> [u8; 6] {
    let mut out = [0u8; 6];
    out.copy_from_slice(&autn[..6]);
    out
}

/// K_ASME from CK ‖ IK, the serving network identity (encoded PLMN id) and SQN ⊕ AK (A.2)
pub fn derive_k_asme(ck: &[u8; 16], ik: &[u8; 16], serving_network: [u8; 3], sqn_xor_ak: [u8; 6]) -> Key256 {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(ck);
    key[16..].copy_from_slice(ik);
    kdf(&key, FC_K_ASME, &[&serving_network, &sqn_xor_ak])
}

/// K_eNB from K_ASME and the uplink NAS COUNT (A.3)
pub fn derive_k_enb(k_asme: &Key256, uplink_count: u32) -> Key256 {
    kdf(k_asme, FC_K_ENB, &[&uplink_count.to_be_bytes()])
}

fn nas_key(k_asme: &Key256, distinguisher: u8, alg_id: u8) -> NasKey {
    let full = kdf(k_asme, FC_NAS_KEYS, &[&[distinguisher], &[alg_id]]);
    let mut key = [0u8; 16];
    // 128-bit keys are the 128 least significant bits of the KDF output
    key.copy_from_slice(&full[16..]);
    key
}

/// K_NASenc and K_NASint (A.7). The algorithm identity is part of the KDF input, so
/// different algorithm choices give unrelated keys.
pub fn derive_nas_keys(
    k_asme: &Key256,
    eea: CipheringAlgorithm,
    eia: IntegrityAlgorithm,
) -> Result<(NasKey, NasKey), SecurityError> {
    ensure_ciphering_supported(eea)?;
    ensure_integrity_supported(eia)?;
    let k_nas_enc = nas_key(k_asme, NAS_ENC_ALG, eea.into_raw() as u8);
    let k_nas_int = nas_key(k_asme, NAS_INT_ALG, eia.into_raw() as u8);
    Ok((k_nas_enc, k_nas_int))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kdf_input_layout() {
        // Same S built by hand must give the same output
        let key = [0x42u8; 32];
        let manual = {
            let mut mac = Hmac::<Sha256>::new_from_slice(&key).unwrap();
            mac.update(&[0x15, 0x01, 0x00, 0x01, 0x02, 0x00, 0x01]);
            mac.finalize().into_bytes().to_vec()
        };
        assert_eq!(kdf(&key, 0x15, &[&[0x01], &[0x02]]).to_vec(), manual);
    }

    #[test]
    fn test_nas_keys_bound_to_algorithm() {
        let k_asme = [0x5Au8; 32];
        let (enc0, int2) = derive_nas_keys(&k_asme, CipheringAlgorithm::Eea0, IntegrityAlgorithm::Eia2).unwrap();
        let (enc2, int0) = derive_nas_keys(&k_asme, CipheringAlgorithm::Eea2, IntegrityAlgorithm::Eia0).unwrap();
        assert_ne!(enc0, enc2);
        assert_ne!(int0, int2);
        // Enc and int keys for the same id differ through the distinguisher
        assert_ne!(enc2, nas_key(&k_asme, NAS_INT_ALG, 2));
        assert_eq!(enc2, nas_key(&k_asme, NAS_ENC_ALG, 2));
        assert_eq!(derive_nas_keys(&k_asme, CipheringAlgorithm::Eea2, IntegrityAlgorithm::Eia0).unwrap(), (enc2, int0));
    }

    #[test]
    fn test_nas_keys_unsupported() {
        let k_asme = [0u8; 32];
        assert_eq!(
            derive_nas_keys(&k_asme, CipheringAlgorithm::Eea1, IntegrityAlgorithm::Eia2),
            Err(SecurityError::UnsupportedAlgorithm { kind: "ciphering", id: 1 })
        );
    }

    #[test]
    fn test_k_enb_depends_on_count() {
        let k_asme = [0x01u8; 32];
        assert_ne!(derive_k_enb(&k_asme, 0), derive_k_enb(&k_asme, 1));
        assert_eq!(derive_k_enb(&k_asme, 7), kdf(&k_asme, 0x11, &[&[0, 0, 0, 7]]));
    }

    #[test]
    fn test_k_asme_inputs() {
        let ck = [0x11u8; 16];
        let ik = [0x22u8; 16];
        let autn = [0xAAu8; 16];
        let a = derive_k_asme(&ck, &ik, [0x00, 0xF1, 0x10], sqn_xor_ak(&autn));
        let b = derive_k_asme(&ck, &ik, [0x00, 0xF1, 0x20], sqn_xor_ak(&autn));
        assert_ne!(a, b);
        assert_eq!(sqn_xor_ak(&autn), [0xAA; 6]);
    }
}
