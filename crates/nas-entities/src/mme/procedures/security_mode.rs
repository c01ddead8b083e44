//! NAS security mode control (TS 24.301 5.4.3)

use nas_pdus::common::header::SecurityHeaderType;
use nas_pdus::common::nas_key_set_id::NasKeySetId;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::fields::nas_security_algorithms::NasSecurityAlgorithms;
use nas_pdus::emm::fields::ue_security_capability::UeSecurityCapability;
use nas_pdus::emm::pdus::security_mode_command::SecurityModeCommand;
use nas_pdus::emm::pdus::security_mode_complete::SecurityModeComplete;
use nas_pdus::emm::pdus::security_mode_reject::SecurityModeReject;
use nas_pdus::esm::pdus::simple::EsmInformationRequest;
use nas_pdus::NasMessageType;
use nas_saps::control::NasTimer;
use nas_saps::s1ap::ReleaseCause;
use nas_security::algorithms::select_algorithms;
use nas_security::{SecurityContext, SecurityError};

use crate::error::ProcedureError;
use crate::mme::components::ue_context::{PendingProcedure, UeNasContext};
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    /// Negotiates algorithms for `ctx` and proposes it to the UE. The context stays
    /// pending until the UE answers under it.
    pub(crate) fn start_security_mode(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        mut ctx: SecurityContext,
    ) -> Result<(), ProcedureError> {
        let caps = match &ue.emm.attach {
            Some(params) => UeSecurityCapability::from_network_capability(&params.ue_network_cap),
            None => return Err(SecurityError::NoSecurityContext.into()),
        };

        let cfg = self.config.config();
        let selected = select_algorithms(&caps, &cfg.security.integrity, &cfg.security.ciphering)
            .and_then(|(eea, eia)| ctx.set_algorithms(eea, eia).map(|_| (eea, eia)));
        let (eea, eia) = match selected {
            Ok(algs) => algs,
            Err(e) => {
                tracing::warn!(ue = ue.id, "no usable algorithms: {}", e);
                self.reject_attach(queue, ue, EmmCause::UeSecurityCapabilitiesMismatch);
                return Err(e.into());
            }
        };
        tracing::info!(ue = ue.id, "security mode command {} / {}, ksi {}", eea, eia, ctx.ksi);

        let smc = SecurityModeCommand {
            selected_algorithms: NasSecurityAlgorithms { ciphering: eea, integrity: eia },
            nas_ksi: NasKeySetId::native(ctx.ksi),
            replayed_ue_security_cap: caps,
            imeisv_request: None,
            replayed_nonce_ue: None,
            nonce_mme: None,
        };
        ue.procedure = Some(PendingProcedure::SecurityMode { new_ctx: Box::new(ctx) });
        self.send_supervised(queue, ue, smc.into(), SecurityHeaderType::IntegrityProtectedNewContext, NasTimer::T3460)
    }

    pub(crate) fn rx_security_mode_complete(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        _msg: SecurityModeComplete,
        header: SecurityHeaderType,
    ) -> Result<(), ProcedureError> {
        if !matches!(ue.procedure, Some(PendingProcedure::SecurityMode { .. })) || !header.is_protected() {
            return Err(Self::unexpected(ue, NasMessageType::SecurityModeComplete));
        }
        ue.stop_timer(NasTimer::T3460);
        if let Some(PendingProcedure::SecurityMode { new_ctx }) = ue.procedure.take() {
            tracing::info!(ue = ue.id, "security context ksi {} in use", new_ctx.ksi);
            ue.security = Some(*new_ctx);
        }
        self.continue_after_security(queue, ue)
    }

    pub(crate) fn rx_security_mode_reject(
        &mut self,
        queue: &mut MessageQueue,
        ue: &mut UeNasContext,
        msg: SecurityModeReject,
    ) -> Result<(), ProcedureError> {
        if !matches!(ue.procedure, Some(PendingProcedure::SecurityMode { .. })) {
            return Err(Self::unexpected(ue, NasMessageType::SecurityModeReject));
        }
        tracing::warn!(ue = ue.id, "security mode rejected ({:?})", msg.emm_cause);
        ue.stop_timer(NasTimer::T3460);
        ue.procedure = None;
        self.abort_procedure(queue, ue, ReleaseCause::Unspecified);
        Ok(())
    }

    /// Either asks for the held-back ESM information or goes straight to PDN setup
    fn continue_after_security(&mut self, queue: &mut MessageQueue, ue: &mut UeNasContext) -> Result<(), ProcedureError> {
        let Some(params) = &ue.emm.attach else {
            return Err(Self::unexpected(ue, NasMessageType::SecurityModeComplete));
        };
        if !params.esm_info_transfer {
            return self.allocate_default_bearer(queue, ue);
        }

        let req = EsmInformationRequest { eps_bearer_id: 0, proc_transaction_id: params.pti };
        ue.procedure = Some(PendingProcedure::EsmInformation);
        self.send_supervised(queue, ue, req.into(), SecurityHeaderType::IntegrityProtectedCiphered, NasTimer::T3489)
    }
}
