use nas_core::UeId;


/// NAS retransmission and supervision timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NasTimer {
    /// Paging
    T3413,
    /// Network-initiated detach
    T3422,
    /// Attach accept, TAU accept, GUTI reallocation
    T3450,
    /// Authentication request, security mode command
    T3460,
    /// Identity request
    T3470,
    /// ESM information request
    T3489,
}

impl core::fmt::Display for NasTimer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            NasTimer::T3413 => "T3413",
            NasTimer::T3422 => "T3422",
            NasTimer::T3450 => "T3450",
            NasTimer::T3460 => "T3460",
            NasTimer::T3470 => "T3470",
            NasTimer::T3489 => "T3489",
        };
        write!(f, "{}", s)
    }
}

/// A timer for a UE expired. Delivered through the message queue so that expiry is
/// handled in order with the other events of that UE.
#[derive(Debug)]
pub struct MmeTimerExpiry {
    pub ue: UeId,
    pub timer: NasTimer,
    /// Arming generation; stale expiries of re-armed timers are ignored
    pub generation: u64,
}
