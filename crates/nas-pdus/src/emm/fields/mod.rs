pub mod auth_parameters;
pub mod drx_parameter;
pub mod eps_bearer_context_status;
pub mod eps_network_feature_support;
pub mod ksi_and_sequence_number;
pub mod nas_security_algorithms;
pub mod ue_network_capability;
pub mod ue_security_capability;
