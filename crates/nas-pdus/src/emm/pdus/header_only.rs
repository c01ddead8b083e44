//! EMM messages that consist of the message header only

use nas_core::{BitBuffer, DecodeError, EncodeError, IePolicy};
use nas_core::typed_ies::{peek_iei, unknown_ie};

use crate::common::header::{read_emm_header, write_emm_header};
use crate::emm::enums::emm_message_type::EmmMessageType;


macro_rules! header_only_message {
    ($(#[$meta:meta])* $name:ident, $msg_type:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl $name {
            pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, DecodeError> {
                Self::from_bitbuf_with(buffer, IePolicy::Skip)
            }

            pub fn from_bitbuf_with(buffer: &mut BitBuffer, policy: IePolicy) -> Result<Self, DecodeError> {
                read_emm_header(buffer, $msg_type)?;
                while peek_iei(buffer).is_some() {
                    unknown_ie(buffer, policy)?;
                }
                Ok($name)
            }

            pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), EncodeError> {
                write_emm_header(buffer, $msg_type);
                Ok(())
            }
        }
    };
}

header_only_message! {
    /// DETACH ACCEPT (TS 24.301 8.2.10), both directions
    DetachAccept, EmmMessageType::DetachAccept
}

header_only_message! {
    /// TRACKING AREA UPDATE COMPLETE (TS 24.301 8.2.27)
    TrackingAreaUpdateComplete, EmmMessageType::TrackingAreaUpdateComplete
}

header_only_message! {
    /// AUTHENTICATION REJECT (TS 24.301 8.2.6)
    AuthenticationReject, EmmMessageType::AuthenticationReject
}

header_only_message! {
    /// GUTI REALLOCATION COMPLETE (TS 24.301 8.2.17)
    GutiReallocationComplete, EmmMessageType::GutiReallocationComplete
}
