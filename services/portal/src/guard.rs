//! Route guard: decides whether a route may render for the current session

use tracing::debug;

use crate::models::{AuthState, Session};

/// Access class of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Reachable by anyone
    Public,
    /// Needs a signed-in user
    AuthRequired,
    /// Needs a signed-in user with a completed profile
    AuthAndProfileRequired,
}

/// Outcome of guarding a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session state still loading; render nothing yet
    ShowSpinner,
    Allow,
    RedirectToLogin,
    RedirectToProfileSetup,
    RedirectToDashboard,
}

/// Evaluate the guard for a route class.
///
/// Once a session exists, public routes are never shown: the user goes to
/// profile setup or to the dashboard depending on profile completion.
pub fn evaluate(session: Option<&Session>, loading: bool, class: RouteClass) -> GuardDecision {
    if loading {
        return GuardDecision::ShowSpinner;
    }

    let decision = match (class, session) {
        (RouteClass::Public, None) => GuardDecision::Allow,
        (RouteClass::Public, Some(s)) if s.profile_completed => GuardDecision::RedirectToDashboard,
        (RouteClass::Public, Some(_)) => GuardDecision::RedirectToProfileSetup,
        (_, None) => GuardDecision::RedirectToLogin,
        (RouteClass::AuthRequired, Some(_)) => GuardDecision::Allow,
        (RouteClass::AuthAndProfileRequired, Some(s)) if s.profile_completed => {
            GuardDecision::Allow
        }
        (RouteClass::AuthAndProfileRequired, Some(_)) => GuardDecision::RedirectToProfileSetup,
    };

    debug!("Guard {:?} -> {:?}", class, decision);
    decision
}

/// Evaluate the guard against a published auth state
pub fn evaluate_state(state: &AuthState, class: RouteClass) -> GuardDecision {
    evaluate(state.session(), state.is_loading(), class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;

    fn session(profile_completed: bool) -> Session {
        Session {
            user_id: "u1".to_string(),
            email: "ana@renovar.org".to_string(),
            display_name: "Ana".to_string(),
            account_type: profile_completed.then_some(AccountType::Residential),
            profile_completed,
            user_code: None,
        }
    }

    #[test]
    fn test_loading_always_shows_spinner() {
        for class in [
            RouteClass::Public,
            RouteClass::AuthRequired,
            RouteClass::AuthAndProfileRequired,
        ] {
            assert_eq!(evaluate(None, true, class), GuardDecision::ShowSpinner);
            assert_eq!(
                evaluate(Some(&session(true)), true, class),
                GuardDecision::ShowSpinner
            );
        }
    }

    #[test]
    fn test_public_routes() {
        assert_eq!(evaluate(None, false, RouteClass::Public), GuardDecision::Allow);
        assert_eq!(
            evaluate(Some(&session(false)), false, RouteClass::Public),
            GuardDecision::RedirectToProfileSetup
        );
        assert_eq!(
            evaluate(Some(&session(true)), false, RouteClass::Public),
            GuardDecision::RedirectToDashboard
        );
    }

    #[test]
    fn test_auth_required_routes() {
        assert_eq!(
            evaluate(None, false, RouteClass::AuthRequired),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(
            evaluate(Some(&session(false)), false, RouteClass::AuthRequired),
            GuardDecision::Allow
        );
        assert_eq!(
            evaluate(Some(&session(true)), false, RouteClass::AuthRequired),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_profile_required_routes() {
        assert_eq!(
            evaluate(None, false, RouteClass::AuthAndProfileRequired),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(
            evaluate(Some(&session(false)), false, RouteClass::AuthAndProfileRequired),
            GuardDecision::RedirectToProfileSetup
        );
        assert_eq!(
            evaluate(Some(&session(true)), false, RouteClass::AuthAndProfileRequired),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_evaluate_state() {
        assert_eq!(
            evaluate_state(&AuthState::Loading, RouteClass::Public),
            GuardDecision::ShowSpinner
        );
        assert_eq!(
            evaluate_state(&AuthState::Unauthenticated, RouteClass::AuthRequired),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(
            evaluate_state(
                &AuthState::Authenticated(session(false)),
                RouteClass::AuthAndProfileRequired
            ),
            GuardDecision::RedirectToProfileSetup
        );
    }
}
