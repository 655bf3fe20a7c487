// MIT License - Copyright (c) 2026 Peter Wright
// Context-keyed response code interpretation

use std::fmt;

use crate::error::{AuthFailure, CommandFailure, HandshakeFailure, IsecError};

/// Exchange a response code was received in. The same numeric code means
/// different things in different contexts, so every lookup is keyed on both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseContext {
    /// Reply to the V1 cloud relay CONNECT
    HandshakeV1,
    /// Reply to an IP receiver GET_BYTE or APP_CONNECT
    HandshakeIpReceiver,
    /// Result byte of a V2 APP_CONNECT
    HandshakeV2Connect,
    /// Result byte of a V2 AUTHORIZE
    HandshakeV2Auth,
    /// Result byte of a V1 command reply
    CommandV1,
    /// Reason byte of a V2 NACK
    CommandV2Ack,
}

impl fmt::Display for ResponseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HandshakeV1 => "V1 handshake",
            Self::HandshakeIpReceiver => "IP receiver handshake",
            Self::HandshakeV2Connect => "V2 app connect",
            Self::HandshakeV2Auth => "V2 authorization",
            Self::CommandV1 => "V1 command",
            Self::CommandV2Ack => "V2 command",
        };
        f.write_str(s)
    }
}

/// Semantic failure, independent of which context produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Handshake(HandshakeFailure),
    Auth(AuthFailure),
    Command(CommandFailure),
}

/// Result of interpreting one response code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Accepted,
    /// Accepted, and the bytes after the code carry the firmware version
    AcceptedWithFirmware,
    Failed(Failure),
    /// Code not documented for this context. Always treated as a failure.
    Unrecognized { code: u8, context: ResponseContext },
}

impl ResponseOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedWithFirmware)
    }

    /// Collapse to a `Result`, failing loudly on anything not accepted.
    pub fn into_result(self) -> Result<(), IsecError> {
        match self {
            Self::Accepted | Self::AcceptedWithFirmware => Ok(()),
            Self::Failed(Failure::Handshake(f)) => Err(f.into()),
            Self::Failed(Failure::Auth(f)) => Err(f.into()),
            Self::Failed(Failure::Command(f)) => Err(f.into()),
            Self::Unrecognized { code, context } => {
                Err(IsecError::UnrecognizedResponse { code, context })
            }
        }
    }
}

/// Interpret `code` as received in `context`.
pub fn interpret(code: u8, context: ResponseContext) -> ResponseOutcome {
    use ResponseContext::*;
    use ResponseOutcome::{Accepted, AcceptedWithFirmware};

    let handshake = |f| ResponseOutcome::Failed(Failure::Handshake(f));
    let auth = |f| ResponseOutcome::Failed(Failure::Auth(f));
    let command = |f| ResponseOutcome::Failed(Failure::Command(f));

    match (context, code) {
        (HandshakeV1, 0xFE) => Accepted,
        (HandshakeV1, 0xE6) => AcceptedWithFirmware,
        (HandshakeV1, 0xE4) => handshake(HandshakeFailure::CentralNotConnected),
        (HandshakeV1, 0xE5) => handshake(HandshakeFailure::CentralBusy),
        (HandshakeV1, 0xE7) => handshake(HandshakeFailure::CentralNotFound),
        (HandshakeV1, 0xE1) => auth(AuthFailure::InvalidPassword),

        // 0xE6 is deliberately absent: it is only documented for the cloud relay.
        (HandshakeIpReceiver, 0x01) => Accepted,
        (HandshakeIpReceiver, 0x00) => handshake(HandshakeFailure::CentralNotConnected),

        (HandshakeV2Connect, 0) => Accepted,
        (HandshakeV2Connect, 1) => handshake(HandshakeFailure::CentralNotConnected),
        (HandshakeV2Connect, 2) => handshake(HandshakeFailure::CentralNotFound),
        (HandshakeV2Connect, 3) => handshake(HandshakeFailure::CentralBusy),
        (HandshakeV2Connect, 4) => handshake(HandshakeFailure::CentralOffline),

        (HandshakeV2Auth, 0) => Accepted,
        (HandshakeV2Auth, 1) => auth(AuthFailure::InvalidPassword),
        (HandshakeV2Auth, 2) => auth(AuthFailure::BlockedUser),
        (HandshakeV2Auth, 3) => auth(AuthFailure::NoPermission),

        (CommandV1, 0xFE) => Accepted,
        (CommandV1, 0x00) => command(CommandFailure::Unspecified),
        (CommandV1, 0xE0) => command(CommandFailure::InvalidPackage),
        (CommandV1, 0xE1) => auth(AuthFailure::InvalidPassword),
        (CommandV1, 0xE2) => command(CommandFailure::InvalidCommand),
        (CommandV1, 0xE3) => command(CommandFailure::NoPartitions),
        (CommandV1, 0xE4) => command(CommandFailure::OpenZones(Vec::new())),
        (CommandV1, 0xE5) => command(CommandFailure::Deprecated),
        (CommandV1, 0xE6) => command(CommandFailure::BypassDenied),
        (CommandV1, 0xE7) => command(CommandFailure::DeactivationDenied),
        (CommandV1, 0xE8) => command(CommandFailure::BypassWithCentralArmed),
        (CommandV1, 0xFF) => command(CommandFailure::InvalidModel),

        (CommandV2Ack, 1) => command(CommandFailure::OpenZones(Vec::new())),
        (CommandV2Ack, 2) => command(CommandFailure::LowBattery),
        (CommandV2Ack, 3) => auth(AuthFailure::NoPermission),

        (context, code) => ResponseOutcome::Unrecognized { code, context },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResponseContext::*;

    fn failed_command(f: CommandFailure) -> ResponseOutcome {
        ResponseOutcome::Failed(Failure::Command(f))
    }

    fn failed_handshake(f: HandshakeFailure) -> ResponseOutcome {
        ResponseOutcome::Failed(Failure::Handshake(f))
    }

    fn failed_auth(f: AuthFailure) -> ResponseOutcome {
        ResponseOutcome::Failed(Failure::Auth(f))
    }

    #[test]
    fn test_same_code_differs_by_context() {
        assert_eq!(
            interpret(0xE4, CommandV1),
            failed_command(CommandFailure::OpenZones(vec![]))
        );
        assert_eq!(
            interpret(0xE4, HandshakeV1),
            failed_handshake(HandshakeFailure::CentralNotConnected)
        );
        assert_eq!(interpret(0xE6, HandshakeV1), ResponseOutcome::AcceptedWithFirmware);
        assert_eq!(
            interpret(0xE6, CommandV1),
            failed_command(CommandFailure::BypassDenied)
        );
        assert_eq!(interpret(1, HandshakeIpReceiver), ResponseOutcome::Accepted);
        assert_eq!(
            interpret(1, HandshakeV2Connect),
            failed_handshake(HandshakeFailure::CentralNotConnected)
        );
        assert_eq!(interpret(1, HandshakeV2Auth), failed_auth(AuthFailure::InvalidPassword));
        assert_eq!(
            interpret(1, CommandV2Ack),
            failed_command(CommandFailure::OpenZones(vec![]))
        );
    }

    #[test]
    fn test_handshake_v1_table() {
        assert_eq!(interpret(0xFE, HandshakeV1), ResponseOutcome::Accepted);
        assert_eq!(interpret(0xE5, HandshakeV1), failed_handshake(HandshakeFailure::CentralBusy));
        assert_eq!(
            interpret(0xE7, HandshakeV1),
            failed_handshake(HandshakeFailure::CentralNotFound)
        );
        assert_eq!(interpret(0xE1, HandshakeV1), failed_auth(AuthFailure::InvalidPassword));
    }

    #[test]
    fn test_ip_receiver_firmware_code_fails_closed() {
        assert_eq!(
            interpret(0xE6, HandshakeIpReceiver),
            ResponseOutcome::Unrecognized {
                code: 0xE6,
                context: HandshakeIpReceiver
            }
        );
        assert_eq!(
            interpret(0x00, HandshakeIpReceiver),
            failed_handshake(HandshakeFailure::CentralNotConnected)
        );
    }

    #[test]
    fn test_v2_connect_table() {
        assert_eq!(interpret(0, HandshakeV2Connect), ResponseOutcome::Accepted);
        assert_eq!(
            interpret(2, HandshakeV2Connect),
            failed_handshake(HandshakeFailure::CentralNotFound)
        );
        assert_eq!(
            interpret(3, HandshakeV2Connect),
            failed_handshake(HandshakeFailure::CentralBusy)
        );
        assert_eq!(
            interpret(4, HandshakeV2Connect),
            failed_handshake(HandshakeFailure::CentralOffline)
        );
    }

    #[test]
    fn test_v2_auth_table() {
        assert_eq!(interpret(0, HandshakeV2Auth), ResponseOutcome::Accepted);
        assert_eq!(interpret(2, HandshakeV2Auth), failed_auth(AuthFailure::BlockedUser));
        assert_eq!(interpret(3, HandshakeV2Auth), failed_auth(AuthFailure::NoPermission));
    }

    #[test]
    fn test_command_v1_table() {
        let cases = [
            (0x00, CommandFailure::Unspecified),
            (0xE0, CommandFailure::InvalidPackage),
            (0xE2, CommandFailure::InvalidCommand),
            (0xE3, CommandFailure::NoPartitions),
            (0xE5, CommandFailure::Deprecated),
            (0xE7, CommandFailure::DeactivationDenied),
            (0xE8, CommandFailure::BypassWithCentralArmed),
            (0xFF, CommandFailure::InvalidModel),
        ];
        for (code, failure) in cases {
            assert_eq!(interpret(code, CommandV1), failed_command(failure));
        }
        assert_eq!(interpret(0xFE, CommandV1), ResponseOutcome::Accepted);
        assert_eq!(interpret(0xE1, CommandV1), failed_auth(AuthFailure::InvalidPassword));
    }

    #[test]
    fn test_command_v2_nack_table() {
        assert_eq!(interpret(2, CommandV2Ack), failed_command(CommandFailure::LowBattery));
        assert_eq!(interpret(3, CommandV2Ack), failed_auth(AuthFailure::NoPermission));
    }

    #[test]
    fn test_unknown_codes_are_unrecognized() {
        for context in [
            HandshakeV1,
            HandshakeIpReceiver,
            HandshakeV2Connect,
            HandshakeV2Auth,
            CommandV1,
            CommandV2Ack,
        ] {
            let outcome = interpret(0x7B, context);
            assert_eq!(outcome, ResponseOutcome::Unrecognized { code: 0x7B, context });
            assert!(!outcome.is_accepted());
            assert!(matches!(
                outcome.into_result(),
                Err(IsecError::UnrecognizedResponse { code: 0x7B, .. })
            ));
        }
    }

    #[test]
    fn test_into_result() {
        assert!(interpret(0xFE, CommandV1).into_result().is_ok());
        assert!(interpret(0xE6, HandshakeV1).into_result().is_ok());
        assert!(matches!(
            interpret(0xE3, CommandV1).into_result(),
            Err(IsecError::Command(CommandFailure::NoPartitions))
        ));
        assert!(matches!(
            interpret(4, HandshakeV2Connect).into_result(),
            Err(IsecError::Handshake(HandshakeFailure::CentralOffline))
        ));
        assert!(matches!(
            interpret(2, HandshakeV2Auth).into_result(),
            Err(IsecError::Auth(AuthFailure::BlockedUser))
        ));
    }
}
