wire_enum! {
    /// TS 24.301 9.8 Message types for EPS mobility management
    /// Bits: 8
    pub enum EmmMessageType {
        AttachRequest = 0x41,
        AttachAccept = 0x42,
        AttachComplete = 0x43,
        AttachReject = 0x44,
        DetachRequest = 0x45,
        DetachAccept = 0x46,
        TrackingAreaUpdateRequest = 0x48,
        TrackingAreaUpdateAccept = 0x49,
        TrackingAreaUpdateComplete = 0x4A,
        TrackingAreaUpdateReject = 0x4B,
        ExtendedServiceRequest = 0x4C,
        ServiceReject = 0x4E,
        GutiReallocationCommand = 0x50,
        GutiReallocationComplete = 0x51,
        AuthenticationRequest = 0x52,
        AuthenticationResponse = 0x53,
        AuthenticationReject = 0x54,
        IdentityRequest = 0x55,
        IdentityResponse = 0x56,
        AuthenticationFailure = 0x5C,
        SecurityModeCommand = 0x5D,
        SecurityModeComplete = 0x5E,
        SecurityModeReject = 0x5F,
        EmmStatus = 0x60,
        EmmInformation = 0x61,
        DownlinkNasTransport = 0x62,
        UplinkNasTransport = 0x63,
        CsServiceNotification = 0x64,
        DownlinkGenericNasTransport = 0x68,
        UplinkGenericNasTransport = 0x69,
    }
}
