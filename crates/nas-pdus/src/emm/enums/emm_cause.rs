wire_enum_open! {
    /// TS 24.301 9.9.3.9 EMM cause
    /// Bits: 8
    pub enum EmmCause {
        ImsiUnknownInHss = 2,
        IllegalUe = 3,
        ImeiNotAccepted = 5,
        IllegalMe = 6,
        EpsServicesNotAllowed = 7,
        EpsAndNonEpsServicesNotAllowed = 8,
        UeIdentityCannotBeDerived = 9,
        ImplicitlyDetached = 10,
        PlmnNotAllowed = 11,
        TrackingAreaNotAllowed = 12,
        RoamingNotAllowedInTa = 13,
        EpsServicesNotAllowedInPlmn = 14,
        NoSuitableCellsInTa = 15,
        MscTemporarilyNotReachable = 16,
        NetworkFailure = 17,
        CsDomainNotAvailable = 18,
        EsmFailure = 19,
        MacFailure = 20,
        SynchFailure = 21,
        Congestion = 22,
        UeSecurityCapabilitiesMismatch = 23,
        SecurityModeRejectedUnspecified = 24,
        NotAuthorizedForCsg = 25,
        NonEpsAuthenticationUnacceptable = 26,
        CsServiceTemporarilyNotAvailable = 39,
        NoEpsBearerContextActivated = 40,
        SevereNetworkFailure = 42,
        SemanticallyIncorrectMessage = 95,
        InvalidMandatoryInformation = 96,
        MessageTypeNonExistent = 97,
        MessageTypeNotCompatible = 98,
        InformationElementNonExistent = 99,
        ConditionalIeError = 100,
        MessageNotCompatible = 101,
        ProtocolErrorUnspecified = 111,
    }
}
