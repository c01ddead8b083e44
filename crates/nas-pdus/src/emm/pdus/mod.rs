pub mod attach_accept;
pub mod attach_complete;
pub mod attach_reject;
pub mod attach_request;
pub mod authentication_failure;
pub mod authentication_request;
pub mod authentication_response;
pub mod cs_service_notification;
pub mod detach_request;
pub mod emm_information;
pub mod emm_status;
pub mod extended_service_request;
pub mod generic_nas_transport;
pub mod guti_reallocation_command;
pub mod header_only;
pub mod identity_request;
pub mod identity_response;
pub mod nas_transport;
pub mod security_mode_command;
pub mod security_mode_complete;
pub mod security_mode_reject;
pub mod service_reject;
pub mod service_request;
pub mod tracking_area_update_accept;
pub mod tracking_area_update_reject;
pub mod tracking_area_update_request;
