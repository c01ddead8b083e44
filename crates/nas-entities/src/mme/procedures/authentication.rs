//! EPS authentication and key agreement (TS 24.301 5.4.2)

use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::common::nas_key_set_id::NasKeySetId;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::pdus::authentication_failure::AuthenticationFailure;
use nas_pdus::emm::pdus::authentication_request::AuthenticationRequest;
use nas_pdus::emm::pdus::authentication_response::AuthenticationResponse;
use nas_pdus::emm::pdus::header_only::AuthenticationReject;
use nas_pdus::NasMessageType;
use nas_saps::control::NasTimer;
use nas_saps::s1ap::ReleaseCause;
use nas_security::{AuthVector, SecurityContext};

use crate::error::ProcedureError;
use crate::mme::components::ue_context::{PendingProcedure, UeNasContext};
use crate::mme::MmeNas;
use crate::MessageQueue;

/// eKSI values cycle through 0..=6; 7 means no key
const KSI_SPACE: u8 = 7;

impl MmeNas {
    pub(crate) fn start_authentication(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext) -> Result<(), ProcedureError> {
        let imsi = ue.emm.imsi.ok_or(ProcedureError::UnknownUe)?;
        let vector = match self.hss.get_authentication_vector(imsi) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(ue = ue.id, "no authentication vector for {}: {}", imsi, e);
                self.reject_attach(queue, ue, EmmCause::NetworkFailure);
                return Err(e.into());
            }
        };
        let ksi = ue.next_ksi();
        self.send_authentication_request(queue, ue, vector, ksi, false)
    }

    fn send_authentication_request(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        vector: AuthVector,
        ksi: u8,
        resynced: bool,
    ) -> Result<(), ProcedureError> {
        tracing::info!(ue = ue.id, "authentication request, ksi {}{}", ksi, if resynced { " after resync" } else { "" });
        let req = AuthenticationRequest {
            nas_ksi: NasKeySetId::native(ksi),
            rand: vector.rand,
            autn: vector.autn,
        };
        ue.procedure = Some(PendingProcedure::Authentication { vector, ksi, resynced });
        self.send_supervised(queue, ue, req.into(), SecurityHeaderType::PlainNas, NasTimer::T3460)
    }

    pub(crate) fn rx_authentication_response(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: AuthenticationResponse,
    ) -> Result<(), ProcedureError> {
        let Some(PendingProcedure::Authentication { vector, ksi, .. }) = ue.procedure.clone() else {
            return Err(Self::unexpected(ue, NasMessageType::AuthenticationResponse));
        };
        ue.stop_timer(NasTimer::T3460);

        if msg.res.0 != vector.xres {
            tracing::warn!(ue = ue.id, "RES does not match XRES, rejecting");
            ue.procedure = None;
            if let Err(e) = self.send_nas(queue, ue, AuthenticationReject.into(), SecurityHeaderType::PlainNas) {
                tracing::warn!(ue = ue.id, "failed to send authentication reject: {}", e);
            }
            self.abort_procedure(queue, ue, ReleaseCause::AuthenticationFailure);
            return Ok(());
        }

        tracing::info!(ue = ue.id, "authenticated");
        let ctx = SecurityContext::derive_from_vector(ksi, &vector, self.plmn.to_bytes());
        self.start_security_mode(queue, ue, ctx)
    }

    pub(crate) fn rx_authentication_failure(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: AuthenticationFailure,
    ) -> Result<(), ProcedureError> {
        let Some(PendingProcedure::Authentication { vector, ksi, resynced }) = ue.procedure.clone() else {
            return Err(Self::unexpected(ue, NasMessageType::AuthenticationFailure));
        };
        ue.stop_timer(NasTimer::T3460);

        // One resynchronisation per attach; a second synch failure ends it
        let auts = match (msg.emm_cause, msg.auts, resynced) {
            (EmmCause::SynchFailure, Some(auts), false) => auts,
            (cause, _, _) => {
                tracing::warn!(ue = ue.id, "authentication failure {:?}", cause);
                ue.procedure = None;
                self.abort_procedure(queue, ue, ReleaseCause::AuthenticationFailure);
                return Ok(());
            }
        };

        let imsi = ue.emm.imsi.ok_or(ProcedureError::UnknownUe)?;
        tracing::info!(ue = ue.id, "synch failure, resynchronising {}", imsi);
        let fresh = self
            .hss
            .resync(imsi, &vector.rand, &auts)
            .and_then(|_| self.hss.get_authentication_vector(imsi));
        match fresh {
            Ok(v) => self.send_authentication_request(queue, ue, v, (ksi + 1) % KSI_SPACE, true),
            Err(e) => {
                tracing::error!(ue = ue.id, "resynchronisation failed: {}", e);
                self.reject_attach(queue, ue, EmmCause::NetworkFailure);
                Err(e.into())
            }
        }
    }
}
