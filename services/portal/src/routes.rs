//! Route table and navigator

use std::fmt;

use tracing::{debug, info, warn};

use crate::guard::{self, GuardDecision, RouteClass};
use crate::models::AuthState;

/// Upper bound on redirect hops while settling a navigation
const MAX_REDIRECTS: usize = 4;

/// Portal routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    SignUp,
    SignUpConfirmation,
    /// Profile setup entry point: choose residential or business
    AccountType,
    CompleteResidential,
    CompleteBusiness,
    CompleteDone,
    Dashboard,
    Information,
    Onboarding,
    History,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::Login,
        Route::SignUp,
        Route::SignUpConfirmation,
        Route::AccountType,
        Route::CompleteResidential,
        Route::CompleteBusiness,
        Route::CompleteDone,
        Route::Dashboard,
        Route::Information,
        Route::Onboarding,
        Route::History,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::SignUp => "/signup",
            Route::SignUpConfirmation => "/signup/confirmation",
            Route::AccountType => "/account-type",
            Route::CompleteResidential => "/complete/residential",
            Route::CompleteBusiness => "/complete/business",
            Route::CompleteDone => "/complete/done",
            Route::Dashboard => "/dashboard",
            Route::Information => "/information",
            Route::Onboarding => "/onboarding",
            Route::History => "/history",
        }
    }

    pub fn class(&self) -> RouteClass {
        match self {
            Route::Login | Route::SignUp | Route::SignUpConfirmation => RouteClass::Public,
            Route::AccountType
            | Route::CompleteResidential
            | Route::CompleteBusiness
            | Route::CompleteDone => RouteClass::AuthRequired,
            Route::Dashboard | Route::Information | Route::Onboarding | Route::History => {
                RouteClass::AuthAndProfileRequired
            }
        }
    }

    /// Exact lookup. A trailing slash and any query string are ignored.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    /// Lookup falling back to the login route for unknown paths
    pub fn resolve(path: &str) -> Route {
        Route::from_path(path).unwrap_or_else(|| {
            debug!("Unknown path {}, resolving to login", path);
            Route::Login
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Result of a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Session still loading; the location did not change
    Pending,
    Landed(Route),
}

/// Tracks the requested route and where the user actually is
#[derive(Debug, Clone)]
pub struct Navigator {
    requested: Route,
    location: Option<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            requested: Route::Login,
            location: None,
        }
    }

    /// Current location, `None` until the first navigation settles
    pub fn location(&self) -> Option<Route> {
        self.location
    }

    pub fn requested(&self) -> Route {
        self.requested
    }

    /// Request a route and settle it against the current state
    pub fn navigate(
        &mut self,
        route: Route,
        state: &AuthState,
        onboarding_completed: bool,
    ) -> Navigation {
        self.requested = route;
        self.settle(state, onboarding_completed)
    }

    /// Re-evaluate the last request after a session change
    pub fn refresh(&mut self, state: &AuthState, onboarding_completed: bool) -> Navigation {
        self.settle(state, onboarding_completed)
    }

    fn settle(&mut self, state: &AuthState, onboarding_completed: bool) -> Navigation {
        let mut route = self.requested;

        for _ in 0..MAX_REDIRECTS {
            let next = match guard::evaluate_state(state, route.class()) {
                GuardDecision::ShowSpinner => return Navigation::Pending,
                GuardDecision::Allow if route == Route::Dashboard && !onboarding_completed => {
                    Route::Onboarding
                }
                GuardDecision::Allow => return self.land(route),
                GuardDecision::RedirectToLogin => Route::Login,
                GuardDecision::RedirectToProfileSetup => Route::AccountType,
                GuardDecision::RedirectToDashboard => Route::Dashboard,
            };
            debug!("Redirecting {} -> {}", route, next);
            route = next;
        }

        warn!("Too many redirects from {}, landing on login", self.requested);
        self.land(Route::Login)
    }

    fn land(&mut self, route: Route) -> Navigation {
        if self.location != Some(route) {
            info!("Navigated to {}", route);
        }
        self.requested = route;
        self.location = Some(route);
        Navigation::Landed(route)
    }
}
