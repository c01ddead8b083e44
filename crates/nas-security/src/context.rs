use core::fmt;

use nas_core::Direction;
use nas_pdus::emm::enums::security_algorithms::{CipheringAlgorithm, IntegrityAlgorithm};

use crate::algorithms::NasKey;
use crate::error::SecurityError;
use crate::kdf::{self, Key256};

/// EPS authentication vector as delivered by the HSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthVector {
    pub rand: [u8; 16],
    pub autn: [u8; 16],
    /// 4..16 octets
    pub xres: Vec<u8>,
    pub ck: [u8; 16],
    pub ik: [u8; 16],
}

/// NAS COUNT state for one direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NasCount {
    /// COUNT used for the next sent PDU
    next: u32,
    /// Highest COUNT accepted from the peer
    last_accepted: Option<u32>,
}

impl NasCount {
    pub fn next(&self) -> u32 {
        self.next
    }

    pub fn last_accepted(&self) -> Option<u32> {
        self.last_accepted
    }

    fn advance(&mut self) -> u32 {
        let count = self.next;
        self.next = self.next.wrapping_add(1);
        count
    }

    fn accept(&mut self, count: u32) -> Result<(), SecurityError> {
        if let Some(last) = self.last_accepted {
            if count <= last {
                return Err(SecurityError::ReplayedOrStaleCount { count, last });
            }
        }
        self.last_accepted = Some(count);
        if count >= self.next {
            self.next = count.wrapping_add(1);
        }
        Ok(())
    }

    /// Rebuilds the full COUNT from its `bits` least significant bits. A value that falls
    /// behind the last accepted COUNT by less than half the sequence space is taken as a
    /// replay and returned as is, so that the replay check rejects it.
    pub fn estimate(&self, sqn: u8, bits: u32) -> u32 {
        let modulus = 1u32 << bits;
        let mask = modulus - 1;
        let sqn = sqn as u32 & mask;
        let Some(last) = self.last_accepted else {
            let candidate = (self.next & !mask) | sqn;
            return if candidate < self.next { candidate.wrapping_add(modulus) } else { candidate };
        };
        let candidate = (last & !mask) | sqn;
        if candidate <= last && last - candidate >= modulus / 2 {
            candidate.wrapping_add(modulus)
        } else {
            candidate
        }
    }
}

/// EPS NAS security context of one UE
#[derive(Clone)]
pub struct SecurityContext {
    /// eKSI, 0..=6
    pub ksi: u8,
    pub k_asme: Key256,
    pub k_nas_enc: NasKey,
    pub k_nas_int: NasKey,
    pub k_enb: Key256,
    pub eea: CipheringAlgorithm,
    pub eia: IntegrityAlgorithm,
    pub uplink: NasCount,
    pub downlink: NasCount,
}

impl SecurityContext {
    /// New context from a fresh authentication vector. Counters start at zero and the
    /// null algorithms are selected until security mode control picks real ones.
    pub fn derive_from_vector(ksi: u8, av: &AuthVector, serving_network: [u8; 3]) -> Self {
        let k_asme = kdf::derive_k_asme(&av.ck, &av.ik, serving_network, kdf::sqn_xor_ak(&av.autn));
        tracing::trace!("ksi {} k_asme {}", ksi, hex(&k_asme));
        SecurityContext {
            ksi,
            k_asme,
            k_nas_enc: [0; 16],
            k_nas_int: [0; 16],
            k_enb: kdf::derive_k_enb(&k_asme, 0),
            eea: CipheringAlgorithm::Eea0,
            eia: IntegrityAlgorithm::Eia0,
            uplink: NasCount::default(),
            downlink: NasCount::default(),
        }
    }

    /// Derives the NAS keys for the chosen algorithms and makes them current
    pub fn set_algorithms(&mut self, eea: CipheringAlgorithm, eia: IntegrityAlgorithm) -> Result<(), SecurityError> {
        let (enc, int) = kdf::derive_nas_keys(&self.k_asme, eea, eia)?;
        self.k_nas_enc = enc;
        self.k_nas_int = int;
        self.eea = eea;
        self.eia = eia;
        tracing::trace!("k_nas_enc {} k_nas_int {}", hex(&enc), hex(&int));
        Ok(())
    }

    /// Regenerates K_eNB from the given uplink NAS COUNT
    pub fn refresh_k_enb(&mut self, uplink_count: u32) {
        self.k_enb = kdf::derive_k_enb(&self.k_asme, uplink_count);
        tracing::trace!("k_enb {} (ul count {})", hex(&self.k_enb), uplink_count);
    }

    pub fn reset_counts(&mut self) {
        self.uplink = NasCount::default();
        self.downlink = NasCount::default();
    }

    pub fn count(&self, direction: Direction) -> &NasCount {
        match direction {
            Direction::Uplink => &self.uplink,
            Direction::Downlink => &self.downlink,
        }
    }

    fn count_mut(&mut self, direction: Direction) -> &mut NasCount {
        match direction {
            Direction::Uplink => &mut self.uplink,
            Direction::Downlink => &mut self.downlink,
        }
    }

    /// Takes the COUNT for the next PDU sent in `direction`
    pub fn advance(&mut self, direction: Direction) -> u32 {
        self.count_mut(direction).advance()
    }

    /// Records a received COUNT, failing if it does not exceed the last accepted one
    pub fn accept(&mut self, direction: Direction, count: u32) -> Result<(), SecurityError> {
        self.count_mut(direction).accept(count)
    }

    pub fn estimate_count(&self, direction: Direction, sqn: u8, bits: u32) -> u32 {
        self.count(direction).estimate(sqn, bits)
    }

    pub fn advance_uplink(&mut self) -> u32 {
        self.advance(Direction::Uplink)
    }

    pub fn advance_downlink(&mut self) -> u32 {
        self.advance(Direction::Downlink)
    }

    pub fn accept_uplink(&mut self, count: u32) -> Result<(), SecurityError> {
        self.accept(Direction::Uplink, count)
    }

    pub fn accept_downlink(&mut self, count: u32) -> Result<(), SecurityError> {
        self.accept(Direction::Downlink, count)
    }
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityContext")
            .field("ksi", &self.ksi)
            .field("eea", &self.eea)
            .field("eia", &self.eia)
            .field("uplink", &self.uplink)
            .field("downlink", &self.downlink)
            .finish_non_exhaustive()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vector() -> AuthVector {
        AuthVector { rand: [0x01; 16], autn: [0x02; 16], xres: vec![0x03; 8], ck: [0x04; 16], ik: [0x05; 16] }
    }

    #[test]
    fn test_counters() {
        let mut ctx = SecurityContext::derive_from_vector(1, &test_vector(), [0x00, 0xF1, 0x10]);
        assert_eq!(ctx.advance_downlink(), 0);
        assert_eq!(ctx.advance_downlink(), 1);
        assert_eq!(ctx.downlink.next(), 2);

        ctx.accept_uplink(0).unwrap();
        ctx.accept_uplink(3).unwrap();
        assert_eq!(ctx.accept_uplink(3), Err(SecurityError::ReplayedOrStaleCount { count: 3, last: 3 }));
        assert_eq!(ctx.accept_uplink(2), Err(SecurityError::ReplayedOrStaleCount { count: 2, last: 3 }));
        assert_eq!(ctx.uplink.next(), 4);

        ctx.reset_counts();
        assert_eq!(ctx.uplink, NasCount::default());
    }

    #[test]
    fn test_count_estimation() {
        let mut c = NasCount::default();
        assert_eq!(c.estimate(5, 8), 5);
        c.accept(0xFE).unwrap();
        assert_eq!(c.estimate(0xFF, 8), 0xFF);
        // SQN wrapped past 255
        assert_eq!(c.estimate(0x01, 8), 0x101);
        // Behind the last accepted count: replay, estimate stays below
        assert_eq!(c.estimate(0xF0, 8), 0xF0);
        c.accept(0x101).unwrap();
        assert_eq!(c.estimate(0x02, 5), 0x102);
        assert_eq!(c.estimate(0x1F, 5), 0x11F);
    }

    #[test]
    fn test_algorithm_change_rekeys() {
        let mut ctx = SecurityContext::derive_from_vector(0, &test_vector(), [0x00, 0xF1, 0x10]);
        ctx.set_algorithms(CipheringAlgorithm::Eea0, IntegrityAlgorithm::Eia2).unwrap();
        let int_eia2 = ctx.k_nas_int;
        assert_ne!(int_eia2, [0; 16]);
        assert!(ctx.set_algorithms(CipheringAlgorithm::Eea3, IntegrityAlgorithm::Eia2).is_err());
        assert_eq!(ctx.eea, CipheringAlgorithm::Eea0);

        let before = ctx.k_enb;
        ctx.refresh_k_enb(5);
        assert_ne!(before, ctx.k_enb);
        assert!(!format!("{:?}", ctx).contains("k_asme"));
    }
}
