wire_enum_open! {
    /// TS 24.301 9.9.4.4 ESM cause
    /// Bits: 8
    pub enum EsmCause {
        OperatorDeterminedBarring = 8,
        InsufficientResources = 26,
        UnknownOrMissingApn = 27,
        UnknownPdnType = 28,
        UserAuthenticationFailed = 29,
        RequestRejectedByGateway = 30,
        RequestRejectedUnspecified = 31,
        ServiceOptionNotSupported = 32,
        RequestedServiceOptionNotSubscribed = 33,
        ServiceOptionTemporarilyOutOfOrder = 34,
        PtiAlreadyInUse = 35,
        RegularDeactivation = 36,
        EpsQosNotAccepted = 37,
        NetworkFailure = 38,
        ReactivationRequested = 39,
        SemanticErrorInTftOperation = 41,
        SyntacticalErrorInTftOperation = 42,
        InvalidEpsBearerIdentity = 43,
        SemanticErrorsInPacketFilters = 44,
        SyntacticalErrorsInPacketFilters = 45,
        PtiMismatch = 47,
        LastPdnDisconnectionNotAllowed = 49,
        PdnTypeIpv4OnlyAllowed = 50,
        PdnTypeIpv6OnlyAllowed = 51,
        SingleAddressBearersOnlyAllowed = 52,
        EsmInformationNotReceived = 53,
        PdnConnectionDoesNotExist = 54,
        MultiplePdnConnectionsNotAllowed = 55,
        CollisionWithNetworkInitiatedRequest = 56,
        UnsupportedQciValue = 59,
        BearerHandlingNotSupported = 60,
        InvalidPtiValue = 81,
        SemanticallyIncorrectMessage = 95,
        InvalidMandatoryInformation = 96,
        MessageTypeNonExistent = 97,
        MessageTypeNotCompatible = 98,
        InformationElementNonExistent = 99,
        ConditionalIeError = 100,
        MessageNotCompatible = 101,
        ProtocolErrorUnspecified = 111,
        ApnRestrictionIncompatible = 112,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_cause_roundtrip() {
        assert_eq!(EsmCause::from(36), EsmCause::RegularDeactivation);
        assert_eq!(EsmCause::from(200), EsmCause::Reserved(200));
        assert_eq!(EsmCause::Reserved(200).into_raw(), 200);
    }
}
