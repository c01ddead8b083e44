//! Tracking area update (TS 24.301 5.5.3). The MME serves a single tracking area, so
//! accepted updates only confirm the registration.

use nas_core::Direction;
use nas_pdus::common::gprs_timer::GprsTimer;
use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::common::mobile_identity::EpsMobileIdentity;
use nas_pdus::common::tai::{TaiList, TrackingAreaId};
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::enums::eps_update_result::EpsUpdateResult;
use nas_pdus::emm::fields::eps_bearer_context_status::EpsBearerContextStatus;
use nas_pdus::emm::pdus::tracking_area_update_accept::TrackingAreaUpdateAccept;
use nas_pdus::emm::pdus::tracking_area_update_reject::TrackingAreaUpdateReject;
use nas_pdus::emm::pdus::tracking_area_update_request::TrackingAreaUpdateRequest;
use nas_saps::s1ap::{ReleaseCause, S1apInitialUeMessage};
use nas_security::unprotect;

use crate::error::ProcedureError;
use crate::mme::components::registry::lock_ue;
use crate::mme::components::ue_context::EmmState;
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    pub(crate) fn rx_tau_request(
        &mut self,
        queue: &mut MessageQueue,
        prim: &S1apInitialUeMessage,
        header: SecurityHeaderType,
        req: TrackingAreaUpdateRequest,
    ) -> Result<(), ProcedureError> {
        let handle = match &req.old_guti {
            EpsMobileIdentity::Guti(guti) if self.is_own_guti(guti) => self.registry.find_by_m_tmsi(guti.m_tmsi),
            _ => None,
        };
        let Some(handle) = handle else {
            tracing::info!("{}: TAU from unknown UE", prim.ids);
            return self.reject_tau(queue, prim, EmmCause::ImplicitlyDetached);
        };

        let mut ue = lock_ue(&handle);
        let verified = match ue.security.as_mut() {
            Some(sec) if header.is_protected() => unprotect(sec, &prim.nas_pdu, Direction::Uplink).is_ok(),
            _ => false,
        };
        if ue.emm.state != EmmState::Registered {
            tracing::info!(ue = ue.id, "TAU from UE in {:?}, detaching implicitly", ue.emm.state);
            ue.stop_all_timers(false);
            ue.procedure = None;
            self.delete_session(&mut ue);
            ue.emm.state = EmmState::Deregistered;
            self.registry.remove(ue.id);
            return self.reject_tau(queue, prim, EmmCause::ImplicitlyDetached);
        }
        if !verified {
            // Replayed or forged. The registration and the UE's current connection stay as they are.
            tracing::warn!(ue = ue.id, "TAU failed integrity check on {}, rejecting", prim.ids);
            return self.reject_tau(queue, prim, EmmCause::ImplicitlyDetached);
        }

        self.connect(&mut ue, prim.ids);
        let cfg = self.config.config();
        let mut accept = TrackingAreaUpdateAccept::new(EpsUpdateResult::TaUpdated);
        accept.t3412 = Some(GprsTimer::minutes(cfg.timers.t3412_minutes));
        accept.tai_list = Some(TaiList::single(TrackingAreaId { plmn: self.plmn, tac: cfg.network.tac }));
        accept.eps_bearer_context_status = Some(EpsBearerContextStatus::from_ebis(ue.active_ebis()));
        tracing::info!(ue = ue.id, "TAU accepted (active flag {})", req.active_flag);
        self.send_nas(queue, &mut ue, accept.into(), SecurityHeaderType::IntegrityProtectedCiphered)?;

        if req.active_flag {
            self.send_initial_context_setup(queue, &mut ue, None)
        } else {
            self.release_connection(queue, &ue, ReleaseCause::NormalRelease);
            Ok(())
        }
    }

    fn reject_tau(&self, queue: &mut MessageQueue, prim: &S1apInitialUeMessage, cause: EmmCause) -> Result<(), ProcedureError> {
        self.send_to_connection(queue, prim.ids, TrackingAreaUpdateReject::new(cause).into())?;
        self.release_ids(queue, prim.ids, ReleaseCause::NormalRelease);
        Ok(())
    }
}
