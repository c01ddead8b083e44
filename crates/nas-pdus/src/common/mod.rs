pub mod gprs_timer;
pub mod guti;
pub mod header;
pub mod lai;
pub mod mobile_identity;
pub mod nas_key_set_id;
pub mod network_name;
pub mod opaque;
pub mod plmn;
pub mod tai;
pub mod time_zone;
