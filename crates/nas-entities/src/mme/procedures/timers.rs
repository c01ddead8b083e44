use nas_saps::control::{MmeTimerExpiry, NasTimer};
use nas_saps::s1ap::ReleaseCause;

use crate::error::ProcedureError;
use crate::mme::components::registry::lock_ue;
use crate::mme::components::ue_context::{Retransmit, UeNasContext};
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    pub(crate) fn rx_timer_expiry(&mut self, queue: &mut MessageQueue, prim: MmeTimerExpiry) -> Result<(), ProcedureError> {
        let Some(handle) = self.registry.get(prim.ue) else {
            tracing::trace!("{} expired for released ue {}", prim.timer, prim.ue);
            return Ok(());
        };
        let mut ue = lock_ue(&handle);
        let max = self.config.config().timers.max_retransmissions;

        let Some(armed) = ue.timer_mut(prim.timer) else {
            tracing::trace!(ue = prim.ue, "{} expired after being stopped", prim.timer);
            return Ok(());
        };
        if armed.generation != prim.generation {
            tracing::trace!(ue = prim.ue, "stale {} expiry (gen {} vs {})", prim.timer, prim.generation, armed.generation);
            return Ok(());
        }
        if armed.retries >= max {
            ue.stop_timer(prim.timer);
            return self.timer_exhausted(queue, &mut ue, prim.timer);
        }

        armed.retries += 1;
        let retries = armed.retries;
        let retransmit = armed.retransmit.clone();
        tracing::info!(ue = prim.ue, "{} expired, retransmission {}/{}", prim.timer, retries, max);
        match retransmit {
            Retransmit::Nas { plain, header } => self.send_plain(queue, &mut ue, &plain, header)?,
            Retransmit::Paging => self.send_paging(queue, &ue)?,
        }
        let deadline = self.now + self.timer_duration(prim.timer);
        self.timers.schedule(deadline, prim.ue, prim.timer, prim.generation);
        Ok(())
    }

    fn timer_exhausted(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext, timer: NasTimer) -> Result<(), ProcedureError> {
        tracing::warn!(ue = ue.id, "{} exhausted", timer);
        match timer {
            NasTimer::T3413 => self.paging_failed(queue, ue),
            NasTimer::T3422 => self.complete_network_detach(queue, ue),
            NasTimer::T3450 | NasTimer::T3460 | NasTimer::T3470 | NasTimer::T3489 => {
                self.abort_procedure(queue, ue, ReleaseCause::Unspecified)
            }
        }
        Ok(())
    }
}
