use nas_core::{DecodeError, EncodeError};


wire_enum! {
    /// TS 24.301 9.9.3.21 Type of security context flag
    /// Bits: 1
    pub enum TypeOfSecurityContext {
        Native = 0,
        Mapped = 1,
    }
}

/// TS 24.301 9.9.3.21 NAS key set identifier.
/// Length: half octet, always carried in a shared octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NasKeySetId {
    pub tsc: TypeOfSecurityContext,
    /// 0..=6, or [`NasKeySetId::NO_KEY_AVAILABLE`]
    pub ksi: u8,
}

impl NasKeySetId {
    pub const NO_KEY_AVAILABLE: u8 = 7;

    pub fn native(ksi: u8) -> Self {
        NasKeySetId { tsc: TypeOfSecurityContext::Native, ksi }
    }

    pub fn no_key() -> Self {
        Self::native(Self::NO_KEY_AVAILABLE)
    }

    pub fn is_no_key(&self) -> bool {
        self.ksi == Self::NO_KEY_AVAILABLE
    }

    pub fn from_nibble(nibble: u8) -> Result<Self, DecodeError> {
        let tsc = TypeOfSecurityContext::from_raw(((nibble >> 3) & 1) as u64, "type_of_security_context")?;
        Ok(NasKeySetId { tsc, ksi: nibble & 0x07 })
    }

    pub fn to_nibble(&self) -> Result<u8, EncodeError> {
        if self.ksi > 7 {
            return Err(EncodeError::ValueOutOfRange { field: "nas_key_set_id", value: self.ksi as u64 });
        }
        Ok(((self.tsc.into_raw() as u8) << 3) | self.ksi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nibble() {
        let k = NasKeySetId::from_nibble(0xF).unwrap();
        assert_eq!(k.tsc, TypeOfSecurityContext::Mapped);
        assert!(k.is_no_key());
        assert_eq!(k.to_nibble().unwrap(), 0xF);
        assert_eq!(NasKeySetId::native(3).to_nibble().unwrap(), 3);
        assert!(NasKeySetId::native(8).to_nibble().is_err());
    }
}
