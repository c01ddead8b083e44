pub mod components;
pub mod mme_nas;
mod procedures;

pub use mme_nas::MmeNas;
