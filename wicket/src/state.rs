//! Lifecycle of one sign-in attempt
//!
//! ```text
//! Idle --RedirectStarted--> AwaitingProviderCallback
//! AwaitingProviderCallback --CallbackSucceeded--> Authenticated
//! AwaitingProviderCallback --CallbackFailed--> Idle
//! Authenticated --SignedOut--> Idle
//! ```
//!
//! Any other pair leaves the state unchanged. The email flow has no visible
//! redirect step: the ticket in the link is the pending callback.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignInState {
    #[default]
    Idle,
    AwaitingProviderCallback,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignInEvent {
    RedirectStarted,
    CallbackSucceeded,
    CallbackFailed,
    SignedOut,
}

impl SignInState {
    pub fn on(self, event: SignInEvent) -> SignInState {
        use SignInEvent::*;
        use SignInState::*;

        match (self, event) {
            (Idle, RedirectStarted) => AwaitingProviderCallback,
            (AwaitingProviderCallback, CallbackSucceeded) => Authenticated,
            (AwaitingProviderCallback, CallbackFailed) => Idle,
            (Authenticated, SignedOut) => Idle,
            (state, _) => state,
        }
    }

    /// Apply `event` and log the transition.
    pub(crate) fn advance(self, event: SignInEvent, provider: Option<&str>) -> SignInState {
        let next = self.on(event);
        if next != self {
            tracing::debug!(
                from = %self,
                to = %next,
                ?event,
                provider = provider.unwrap_or("-"),
                "Sign-in state transition"
            );
        }
        next
    }
}

impl fmt::Display for SignInState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignInState::Idle => "idle",
            SignInState::AwaitingProviderCallback => "awaiting_provider_callback",
            SignInState::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = SignInState::default()
            .on(SignInEvent::RedirectStarted)
            .on(SignInEvent::CallbackSucceeded);
        assert_eq!(state, SignInState::Authenticated);
        assert_eq!(state.on(SignInEvent::SignedOut), SignInState::Idle);
    }

    #[test]
    fn test_failed_callback_returns_to_idle() {
        let state = SignInState::AwaitingProviderCallback.on(SignInEvent::CallbackFailed);
        assert_eq!(state, SignInState::Idle);
    }

    #[test]
    fn test_other_pairs_are_no_ops() {
        use SignInEvent::*;
        use SignInState::*;

        let no_ops = [
            (Idle, CallbackSucceeded),
            (Idle, CallbackFailed),
            (Idle, SignedOut),
            (AwaitingProviderCallback, RedirectStarted),
            (AwaitingProviderCallback, SignedOut),
            (Authenticated, RedirectStarted),
            (Authenticated, CallbackSucceeded),
            (Authenticated, CallbackFailed),
        ];
        for (state, event) in no_ops {
            assert_eq!(state.on(event), state, "{state} on {event:?}");
        }
    }
}
