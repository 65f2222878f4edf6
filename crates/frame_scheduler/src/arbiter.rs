//! Request arbiter: decides whether a registration must issue a frame request.

use crate::error::SchedulerError;

/// Whether a frame-clock request is currently outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum ArbiterState {
    /// No request outstanding (initial state, and again after every dispatch)
    #[default]
    NoRequest,
    /// Exactly one request outstanding; later registrations ride along
    PendingRequest,
}

/// What the caller must do after recording a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegistrationAction {
    /// First registration since the last dispatch: issue one frame request
    IssueRequest,
    /// A request is already in flight and covers this registration
    Covered,
}

impl ArbiterState {
    /// Registration arrived.
    pub(crate) fn on_registration(&mut self) -> RegistrationAction {
        match self {
            Self::NoRequest => {
                *self = Self::PendingRequest;
                RegistrationAction::IssueRequest
            }
            Self::PendingRequest => RegistrationAction::Covered,
        }
    }

    /// Frame fired. Resets to `NoRequest` before any evaluation happens.
    ///
    /// Firing with no outstanding request means the clock and the arbiter
    /// have desynchronized; the state is left untouched.
    pub(crate) fn on_frame(&mut self, timestamp: f64) -> Result<(), SchedulerError> {
        match self {
            Self::PendingRequest => {
                *self = Self::NoRequest;
                Ok(())
            }
            Self::NoRequest => Err(SchedulerError::FrameWithoutRequest { timestamp }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registration_issues_request() {
        let mut state = ArbiterState::default();
        assert_eq!(state.on_registration(), RegistrationAction::IssueRequest);
        assert_eq!(state, ArbiterState::PendingRequest);
    }

    #[test]
    fn test_burst_is_covered_by_one_request() {
        let mut state = ArbiterState::NoRequest;
        let issued = (0..100)
            .map(|_| state.on_registration())
            .filter(|a| *a == RegistrationAction::IssueRequest)
            .count();
        assert_eq!(issued, 1);
    }

    #[test]
    fn test_frame_resets_state() {
        let mut state = ArbiterState::PendingRequest;
        assert!(state.on_frame(16.0).is_ok());
        assert_eq!(state, ArbiterState::NoRequest);
        assert_eq!(state.on_registration(), RegistrationAction::IssueRequest);
    }

    #[test]
    fn test_frame_without_request_is_rejected() {
        let mut state = ArbiterState::NoRequest;
        let err = state.on_frame(42.0).unwrap_err();
        assert!(matches!(err, SchedulerError::FrameWithoutRequest { timestamp } if timestamp == 42.0));
        assert_eq!(state, ArbiterState::NoRequest);
    }
}
