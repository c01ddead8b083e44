pub mod additional_update;
pub mod csfb_response;
pub mod detach_type;
pub mod emm_cause;
pub mod emm_message_type;
pub mod eps_attach_result;
pub mod eps_attach_type;
pub mod eps_update_result;
pub mod eps_update_type;
pub mod generic_msg_container_type;
pub mod guti_type;
pub mod identity_type2;
pub mod lcs_indicator;
pub mod paging_identity;
pub mod security_algorithms;
pub mod service_type;
