wire_enum! {
    /// TS 24.301 9.8 Message types for EPS session management
    /// Bits: 8
    pub enum EsmMessageType {
        ActivateDefaultEpsBearerContextRequest = 0xC1,
        ActivateDefaultEpsBearerContextAccept = 0xC2,
        ActivateDefaultEpsBearerContextReject = 0xC3,
        ActivateDedicatedEpsBearerContextRequest = 0xC5,
        ActivateDedicatedEpsBearerContextAccept = 0xC6,
        ActivateDedicatedEpsBearerContextReject = 0xC7,
        ModifyEpsBearerContextRequest = 0xC9,
        ModifyEpsBearerContextAccept = 0xCA,
        ModifyEpsBearerContextReject = 0xCB,
        DeactivateEpsBearerContextRequest = 0xCD,
        DeactivateEpsBearerContextAccept = 0xCE,
        PdnConnectivityRequest = 0xD0,
        PdnConnectivityReject = 0xD1,
        PdnDisconnectRequest = 0xD2,
        PdnDisconnectReject = 0xD3,
        BearerResourceAllocationRequest = 0xD4,
        BearerResourceAllocationReject = 0xD5,
        BearerResourceModificationRequest = 0xD6,
        BearerResourceModificationReject = 0xD7,
        EsmInformationRequest = 0xD9,
        EsmInformationResponse = 0xDA,
        EsmStatus = 0xE8,
    }
}
