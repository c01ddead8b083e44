//! Service request (TS 24.301 5.6.1), paging (5.6.2) and connection release

use nas_core::{NasEntity, S1apUeIds, Sap};
use nas_pdus::common::gprs_timer::GprsTimer;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::pdus::service_reject::ServiceReject;
use nas_pdus::emm::pdus::service_request::ServiceRequest;
use nas_saps::control::NasTimer;
use nas_saps::core_network::{GtpcDownlinkDataNotification, GtpcPagingFailed};
use nas_saps::s1ap::{ReleaseCause, S1apInitialUeMessage, S1apPaging, S1apUeContextReleased};
use nas_saps::{SapMsg, SapMsgInner};
use nas_security::verify_service_request;

use crate::error::ProcedureError;
use crate::mme::components::registry::lock_ue;
use crate::mme::components::ue_context::{EcmState, EmmState, EsmState, Retransmit, UeNasContext};
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    pub(crate) fn rx_service_request(
        &mut self,
        queue: &mut MessageQueue,
        prim: &S1apInitialUeMessage,
        req: ServiceRequest,
    ) -> Result<(), ProcedureError> {
        let Some(handle) = prim.m_tmsi.and_then(|m_tmsi| self.registry.find_by_m_tmsi(m_tmsi)) else {
            tracing::info!("{}: service request from unknown S-TMSI {:08x?}", prim.ids, prim.m_tmsi);
            return self.reject_service(queue, prim.ids, EmmCause::ImplicitlyDetached);
        };
        let mut ue = lock_ue(&handle);
        if ue.emm.state != EmmState::Registered {
            tracing::info!(ue = ue.id, "service request in {:?}", ue.emm.state);
            return self.reject_service(queue, prim.ids, EmmCause::ImplicitlyDetached);
        }
        let Some(sec) = ue.security.as_mut() else {
            tracing::info!(ue = ue.id, "service request without security context");
            return self.reject_service(queue, prim.ids, EmmCause::ImplicitlyDetached);
        };

        if let Err(e) = verify_service_request(sec, &req) {
            tracing::warn!(ue = ue.id, "service request rejected: {}", e);
            ue.security = None;
            return self.reject_service(queue, prim.ids, EmmCause::UeIdentityCannotBeDerived);
        }

        self.connect(&mut ue, prim.ids);
        if ue.stop_timer(NasTimer::T3413) {
            tracing::info!(ue = ue.id, "answered paging");
        }
        tracing::info!(ue = ue.id, "service request accepted");
        self.send_initial_context_setup(queue, &mut ue, None)
    }

    /// Service reject with T3442 deactivated and a zero T3346, then release
    fn reject_service(&self, queue: &mut MessageQueue, ids: S1apUeIds, cause: EmmCause) -> Result<(), ProcedureError> {
        let reject = ServiceReject {
            emm_cause: cause,
            t3442: Some(GprsTimer::DEACTIVATED),
            t3346: Some(GprsTimer::seconds(0)),
        };
        self.send_to_connection(queue, ids, reject.into())?;
        self.release_ids(queue, ids, ReleaseCause::NormalRelease);
        Ok(())
    }

    pub(crate) fn rx_downlink_data_notification(
        &mut self,
        queue: &mut MessageQueue,
        prim: GtpcDownlinkDataNotification,
    ) -> Result<(), ProcedureError> {
        let handle = self.registry.find_by_imsi(prim.imsi).ok_or(ProcedureError::UnknownUe)?;
        let mut ue = lock_ue(&handle);
        if ue.emm.state != EmmState::Registered {
            tracing::warn!(ue = ue.id, "downlink data for bearer {} in {:?}", prim.ebi, ue.emm.state);
            return Ok(());
        }
        if ue.ecm.state == EcmState::Connected {
            tracing::debug!(ue = ue.id, "downlink data while connected");
            return Ok(());
        }
        if ue.is_timer_running(NasTimer::T3413) {
            tracing::debug!(ue = ue.id, "paging already running");
            return Ok(());
        }
        tracing::info!(ue = ue.id, "paging for downlink data on bearer {}", prim.ebi);
        self.send_paging(queue, &ue)?;
        self.start_timer(&mut ue, NasTimer::T3413, Retransmit::Paging);
        Ok(())
    }

    pub(crate) fn send_paging(&self, queue: &mut MessageQueue, ue: &UeNasContext) -> Result<(), ProcedureError> {
        let m_tmsi = ue.m_tmsi().ok_or(ProcedureError::UnknownUe)?;
        let cfg = self.config.config();
        let paging = S1apPaging { m_tmsi, mme_code: cfg.network.mme_code, tac: cfg.network.tac };
        queue.push_back(SapMsg::new(Sap::S1apNas, NasEntity::Mme, NasEntity::S1ap, SapMsgInner::S1apPaging(paging)));
        Ok(())
    }

    pub(crate) fn paging_failed(&self, queue: &mut MessageQueue, ue: &UeNasContext) {
        tracing::warn!(ue = ue.id, "no answer to paging");
        if let Some(imsi) = ue.emm.imsi {
            queue.push_back(SapMsg::new(
                Sap::GtpcNas,
                NasEntity::Mme,
                NasEntity::Gtpc,
                SapMsgInner::GtpcPagingFailed(GtpcPagingFailed { imsi }),
            ));
        }
    }

    /// The signalling connection is gone. The UE stays registered but idle.
    pub(crate) fn rx_ue_context_released(&mut self, queue: &mut MessageQueue, prim: S1apUeContextReleased) -> Result<(), ProcedureError> {
        let Some(handle) = self.registry.find_by_s1ap(prim.ids.mme_ue_s1ap_id) else {
            tracing::debug!("{}: release of a connection without UE context", prim.ids);
            return Ok(());
        };
        let mut ue = lock_ue(&handle);
        tracing::info!(ue = ue.id, "connection {} released in {:?}", prim.ids, ue.emm.state);
        self.registry.unbind_s1ap(ue.id);
        ue.ecm.state = EcmState::Idle;
        ue.ecm.ids = None;
        ue.ecm.established_initially = false;
        ue.stop_all_timers(true);

        match ue.emm.state {
            EmmState::CommonProcedureInitiated => {
                ue.procedure = None;
                self.delete_session(&mut ue);
                ue.emm.state = EmmState::Deregistered;
            }
            EmmState::DeregisteredInitiated => self.complete_network_detach(queue, &mut ue),
            EmmState::Registered => {
                ue.procedure = None;
                ue.bearers.retain(|b| b.state == EsmState::Active);
                for bearer in ue.bearers.iter_mut() {
                    bearer.enb_s1u = None;
                }
                if let Some(imsi) = ue.emm.imsi {
                    if let Err(e) = self.gtpc.release_access_bearers(imsi) {
                        tracing::warn!(ue = ue.id, "release access bearers failed: {}", e);
                    }
                }
            }
            EmmState::Deregistered => ue.procedure = None,
        }
        Ok(())
    }
}
