use nas_core::{BitBuffer, DecodeError, EncodeError};


/// TS 24.301 9.9.3.3 Authentication parameter RAND, V format.
pub type AuthRand = [u8; 16];

/// TS 24.301 9.9.3.2 Authentication parameter AUTN, LV contents.
pub type AuthAutn = [u8; 16];

/// TS 24.301 9.9.3.4 Authentication response parameter (RES), LV contents of 4..16 octets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRes(pub Vec<u8>);

impl AuthRes {
    pub const MIN_LEN: usize = 4;
    pub const MAX_LEN: usize = 16;

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let n = buffer.get_len_remaining_bytes();
        if n < Self::MIN_LEN {
            return Err(DecodeError::InconsistentLength { field: "res", expected: Self::MIN_LEN, found: n });
        }
        Ok(AuthRes(buffer.read_bytes(n, "res")?))
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&self.0.len()) {
            return Err(EncodeError::TooLong { field: "res", max: Self::MAX_LEN, found: self.0.len() });
        }
        buffer.write_bytes(&self.0);
        Ok(())
    }
}

/// TS 24.301 9.9.3.1 Authentication failure parameter: AUTS, 14 octets
pub type AuthAuts = [u8; 14];

pub fn read_fixed_16(buffer: &mut BitBuffer) -> Result<[u8; 16], DecodeError> {
    buffer.read_array::<16>("authentication_parameter")
}

pub fn read_auts(buffer: &mut BitBuffer) -> Result<AuthAuts, DecodeError> {
    buffer.read_array::<14>("auts")
}
