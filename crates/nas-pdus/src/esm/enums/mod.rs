pub mod connectivity_type;
pub mod esm_cause;
pub mod esm_message_type;
pub mod packet_filter_direction;
pub mod pdn_type;
pub mod request_type;
pub mod tft_operation_code;
