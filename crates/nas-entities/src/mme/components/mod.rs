pub mod registry;
pub mod timers;
pub mod ue_context;
