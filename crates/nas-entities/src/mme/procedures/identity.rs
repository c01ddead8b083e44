//! Identification (TS 24.301 5.4.4), used when a GUTI cannot be resolved

use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::common::mobile_identity::MobileIdentity;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::enums::identity_type2::IdentityType2;
use nas_pdus::emm::pdus::identity_request::IdentityRequest;
use nas_pdus::emm::pdus::identity_response::IdentityResponse;
use nas_pdus::NasMessageType;
use nas_saps::control::NasTimer;

use crate::error::ProcedureError;
use crate::mme::components::ue_context::{PendingProcedure, UeNasContext};
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    pub(crate) fn start_identification(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext) -> Result<(), ProcedureError> {
        tracing::info!(ue = ue.id, "requesting IMSI");
        ue.procedure = Some(PendingProcedure::Identity);
        let req = IdentityRequest { identity_type: IdentityType2::Imsi };
        self.send_supervised(queue, ue, req.into(), SecurityHeaderType::PlainNas, NasTimer::T3470)
    }

    pub(crate) fn rx_identity_response(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: IdentityResponse,
    ) -> Result<(), ProcedureError> {
        if !matches!(ue.procedure, Some(PendingProcedure::Identity)) {
            return Err(Self::unexpected(ue, NasMessageType::IdentityResponse));
        }
        ue.stop_timer(NasTimer::T3470);
        ue.procedure = None;

        let MobileIdentity::Imsi(imsi) = msg.mobile_identity else {
            tracing::warn!(ue = ue.id, "identity response without IMSI: {:?}", msg.mobile_identity);
            self.reject_attach(queue, ue, EmmCause::UeIdentityCannotBeDerived);
            return Ok(());
        };
        tracing::info!(ue = ue.id, "identified as {}", imsi);

        // A context left over from an earlier registration of the same subscriber goes away
        if let Some(old) = self.registry.ue_for_imsi(imsi) {
            if old != ue.id {
                self.discard_context(old);
            }
        }
        ue.emm.imsi = Some(imsi);
        self.registry.bind_imsi(imsi, ue.id);
        self.start_authentication(queue, ue)
    }
}
