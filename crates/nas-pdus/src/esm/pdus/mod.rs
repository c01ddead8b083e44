pub mod activate_dedicated_eps_bearer_context_request;
pub mod activate_default_eps_bearer_context_request;
pub mod bearer_resource_allocation_request;
pub mod bearer_resource_modification_request;
pub mod deactivate_eps_bearer_context_request;
pub mod esm_information_response;
pub mod modify_eps_bearer_context_request;
pub mod pdn_connectivity_request;
pub mod pdn_disconnect_request;
pub mod simple;

mod bearer_ies;
