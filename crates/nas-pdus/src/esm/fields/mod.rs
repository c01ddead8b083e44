pub mod apn;
pub mod apn_ambr;
pub mod eps_qos;
pub mod pco;
pub mod pdn_address;
pub mod quality_of_service;
pub mod tft;
pub mod transaction_identifier;
