use nas_core::{BitBuffer, DecodeError, EncodeError};


/// TS 24.008 10.5.6.5 Quality of service (pre-EPS), value part.
/// Sent alongside EPS QoS for interworking with GERAN/UTRAN. The octets are kept as received;
/// only the first octets are interpreted.
/// Length: 3..22 octets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityOfService(pub Vec<u8>);

impl QualityOfService {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 22;

    pub fn delay_class(&self) -> u8 {
        self.0.first().map_or(0, |o| (o >> 3) & 0x07)
    }

    pub fn reliability_class(&self) -> u8 {
        self.0.first().map_or(0, |o| o & 0x07)
    }

    pub fn peak_throughput(&self) -> u8 {
        self.0.get(1).map_or(0, |o| o >> 4)
    }

    pub fn precedence_class(&self) -> u8 {
        self.0.get(1).map_or(0, |o| o & 0x07)
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let n = buffer.get_len_remaining_bytes();
        if n < Self::MIN_LEN {
            return Err(DecodeError::InconsistentLength { field: "quality_of_service", expected: Self::MIN_LEN, found: n });
        }
        Ok(QualityOfService(buffer.read_bytes(n, "quality_of_service")?))
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if self.0.len() < Self::MIN_LEN {
            return Err(EncodeError::MissingField { field: "quality_of_service" });
        }
        buffer.write_bytes(&self.0);
        Ok(())
    }
}
