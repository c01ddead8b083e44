use nas_core::{BitBuffer, DecodeError, EncodeError};


/// Container identifiers used by the MME
pub mod container_id {
    pub const PCSCF_IPV6_ADDRESS: u16 = 0x0001;
    pub const IM_CN_SUBSYSTEM_SIGNALING_FLAG: u16 = 0x0002;
    pub const DNS_SERVER_IPV6_ADDRESS: u16 = 0x0003;
    pub const IP_ADDRESS_ALLOCATION_VIA_NAS: u16 = 0x000A;
    pub const PCSCF_IPV4_ADDRESS: u16 = 0x000C;
    pub const DNS_SERVER_IPV4_ADDRESS: u16 = 0x000D;
    pub const IPV4_LINK_MTU: u16 = 0x0010;
    pub const IPCP: u16 = 0x8021;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcoOption {
    pub id: u16,
    pub contents: Vec<u8>,
}

/// TS 24.008 10.5.6.3 Protocol configuration options, value part.
/// Length: 1..253 octets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolConfigOptions {
    /// 3 bits, 0 is PPP with IP PDP type
    pub config_protocol: u8,
    pub options: Vec<PcoOption>,
}

impl ProtocolConfigOptions {
    pub const MAX_LEN: usize = 253;
    pub const MAX_OPTIONS: usize = 83;

    pub fn find(&self, id: u16) -> impl Iterator<Item = &PcoOption> {
        self.options.iter().filter(move |o| o.id == id)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.find(id).next().is_some()
    }

    pub fn push(&mut self, id: u16, contents: Vec<u8>) {
        self.options.push(PcoOption { id, contents });
    }

    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
        buffer.read_field(1, "ext")?;
        buffer.read_field(4, "spare")?;
        let config_protocol = buffer.read_field(3, "config_protocol")? as u8;
        let mut options = Vec::new();
        while buffer.get_len_remaining_bytes() > 0 {
            if options.len() == Self::MAX_OPTIONS {
                return Err(DecodeError::TooManyElements { field: "pco_options", max: Self::MAX_OPTIONS, found: options.len() + 1 });
            }
            let id = buffer.read_field(16, "pco_option_id")? as u16;
            let len = buffer.read_u8_field("pco_option_len")? as usize;
            let contents = buffer.read_bytes(len, "pco_option_contents")?;
            options.push(PcoOption { id, contents });
        }
        Ok(ProtocolConfigOptions { config_protocol, options })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
        if self.options.len() > Self::MAX_OPTIONS {
            return Err(EncodeError::TooManyElements { field: "pco_options", max: Self::MAX_OPTIONS, found: self.options.len() });
        }
        nas_core::codec_error::check_range(self.config_protocol as u64, 3, "config_protocol")?;
        buffer.write_bit(1);
        buffer.write_bits(0, 4);
        buffer.write_bits(self.config_protocol as u64, 3);
        for opt in &self.options {
            if opt.contents.len() > 255 {
                return Err(EncodeError::TooLong { field: "pco_option_contents", max: 255, found: opt.contents.len() });
            }
            buffer.write_bits(opt.id as u64, 16);
            buffer.write_u8(opt.contents.len() as u8);
            buffer.write_bytes(&opt.contents);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_request_from_ue() {
        // IPCP with primary/secondary DNS request, then DNS IPv4 request container
        let bytes = [
            0x80, 0x80, 0x21, 0x10, 0x01, 0x00, 0x00, 0x10, 0x81, 0x06, 0x00, 0x00, 0x00, 0x00, 0x83, 0x06, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x0D, 0x00,
        ];
        let mut buf = BitBuffer::from_bytes(&bytes);
        let pco = ProtocolConfigOptions::from_bitbuf(&mut buf).unwrap();
        assert_eq!(pco.config_protocol, 0);
        assert_eq!(pco.options.len(), 2);
        assert!(pco.contains(container_id::IPCP));
        assert!(pco.contains(container_id::DNS_SERVER_IPV4_ADDRESS));

        let mut out = BitBuffer::new_autoexpand(256);
        pco.to_bitbuf(&mut out).unwrap();
        assert_eq!(out.to_bytes(), bytes.to_vec());
    }

    #[test]
    fn test_truncated_option() {
        let mut buf = BitBuffer::from_bytes(&[0x80, 0x00, 0x0D, 0x04, 0x08]);
        assert!(ProtocolConfigOptions::from_bitbuf(&mut buf).is_err());
    }
}
