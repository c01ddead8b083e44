//! Procedure handlers. Each module adds the handlers of one procedure family to `MmeNas`.

mod attach;
mod authentication;
mod detach;
mod esm;
mod identity;
mod security_mode;
mod service;
mod status;
mod tau;
mod timers;
