use nas_core::{BitBuffer, DecodeError, EncodeError};


/// TS 24.301 9.9.3.12A EPS network feature support, value part.
/// Length: 1..2 octets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EpsNetworkFeatureSupport {
    /// CP CIoT | ERw/oPDN | ESRPS | CS-LCS(2) | EPC-LCS | EMC BS | IMS VoPS
    pub octet3: u8,
    pub additional: Vec<u8>,
}

impl EpsNetworkFeatureSupport {
    pub const MAX_LEN: usize = 2;

    pub fn ims_vops(&self) -> bool {
        self.octet3 & 0x01 != 0
    }

    pub fn emergency_bearer_services(&self) -> bool {
        self.octet3 & 0x02 != 0
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        let octet3 = buffer.read_u8_field("eps_network_feature_support")?;
        let n = buffer.get_len_remaining_bytes();
        let additional = buffer.read_bytes(n, "eps_network_feature_support_additional")?;
        Ok(EpsNetworkFeatureSupport { octet3, additional })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        buffer.write_u8(self.octet3);
        buffer.write_bytes(&self.additional);
        Ok(())
    }
}
