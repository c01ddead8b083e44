use nas_core::{BitBuffer, Direction, S1apUeIds};
use nas_pdus::common::header::ProtocolDiscriminator;
use nas_pdus::emm::enums::emm_cause::EmmCause;
use nas_pdus::emm::pdus::emm_status::EmmStatus;
use nas_pdus::parse_header;

use crate::error::ProcedureError;
use crate::mme::components::ue_context::UeNasContext;
use crate::mme::MmeNas;
use crate::MessageQueue;

impl MmeNas {
    /// EMM status cause for an EMM PDU that failed to decode. Nothing is answered to
    /// undecodable ESM PDUs or to PDUs whose header cannot even be read.
    pub(crate) fn status_cause_for(pdu: &[u8]) -> Option<EmmCause> {
        let header = parse_header(&BitBuffer::from_bytes(pdu), Direction::Uplink).ok()?;
        if header.protocol_discriminator != ProtocolDiscriminator::EpsMobilityManagement {
            return None;
        }
        if header.is_unknown_message_type() {
            Some(EmmCause::MessageTypeNonExistent)
        } else {
            Some(EmmCause::InvalidMandatoryInformation)
        }
    }

    pub(crate) fn send_emm_status(&self, queue: &mut MessageQueue, ue: &mut UeNasContext, cause: EmmCause) -> Result<(), ProcedureError> {
        tracing::info!(ue = ue.id, "EMM status {:?}", cause);
        let header = Self::downlink_protection(ue);
        self.send_nas(queue, ue, EmmStatus { emm_cause: cause }.into(), header)?;
        Ok(())
    }

    pub(crate) fn send_emm_status_to(&self, queue: &mut MessageQueue, ids: S1apUeIds, cause: EmmCause) -> Result<(), ProcedureError> {
        tracing::info!("{}: EMM status {:?}", ids, cause);
        self.send_to_connection(queue, ids, EmmStatus { emm_cause: cause }.into())
    }
}
