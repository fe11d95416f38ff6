//! Session store: the portal's authentication state machine
//!
//! State starts as `Loading`, is resolved once from the persisted store by
//! [`SessionStore::initialize`], and afterwards changes only through the
//! sign-in, sign-up, profile completion and sign-out operations here.
//! Every change is published on a watch channel.

use common::error::StoreError;
use common::store::KeyValueStore;
use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{PortalError, PortalResult, ValidationErrors};
use crate::gateway::ProfileGateway;
use crate::jwt::{self, Claims};
use crate::models::{
    AccountType, AuthState, CompleteProfile, GoogleLoginRequest, LoginRequest, ProfileKind,
    ProfileResponse, Session, SignUpForm,
};
use crate::validation::validate_email;

/// Persisted raw session token
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Persisted serialized [`Session`]
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Fields the gateway reported about the account at sign-in
#[derive(Debug, Default)]
struct ServerProfile {
    profile_completed: Option<bool>,
    user_type: Option<AccountType>,
    name: Option<String>,
    email: Option<String>,
}

/// Build the session from gateway fields and token claims.
///
/// Gateway values win over claims. The profile-completion flag and account
/// type only ever come from the gateway.
fn merge_session(claims: &Claims, server: ServerProfile, fallback_email: &str) -> Option<Session> {
    let profile_completed = server.profile_completed.unwrap_or(false);
    let account_type = if profile_completed {
        Some(server.user_type.unwrap_or(AccountType::Business))
    } else {
        None
    };

    Some(Session {
        user_id: claims.subject()?,
        email: server
            .email
            .filter(|e| !e.is_empty())
            .or_else(|| claims.email())
            .unwrap_or_else(|| fallback_email.to_string()),
        display_name: server
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| claims.display_name())
            .unwrap_or_default(),
        account_type,
        profile_completed,
        user_code: None,
    })
}

fn is_duplicate_account(status: StatusCode, message: &str) -> bool {
    status == StatusCode::CONFLICT
        || message.to_lowercase().contains("already")
        || message.contains("já está cadastrado")
}

/// Session store
pub struct SessionStore<G, S> {
    gateway: G,
    store: S,
    state: watch::Sender<AuthState>,
}

impl<G, S> SessionStore<G, S>
where
    G: ProfileGateway,
    S: KeyValueStore,
{
    /// Create a new session store in the `Loading` state
    pub fn new(gateway: G, store: S) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            gateway,
            store,
            state,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve `Loading` from persisted state. Never fails and never leaves
    /// the store loading: unreadable state counts as signed out.
    pub async fn initialize(&self) -> AuthState {
        let resolved = match self.restore().await {
            Some(session) => {
                info!("Restored session for user {}", session.user_id);
                AuthState::Authenticated(session)
            }
            None => {
                info!("No persisted session");
                AuthState::Unauthenticated
            }
        };
        self.state.send_replace(resolved.clone());
        resolved
    }

    async fn restore(&self) -> Option<Session> {
        match self.store.get(CURRENT_USER_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) if session.is_consistent() => return Some(session),
                Ok(_) => warn!("Discarding persisted session with a completed profile but no account type"),
                Err(e) => warn!("Discarding unreadable persisted session: {}", e),
            },
            Ok(None) => {}
            Err(e) => error!("Failed to read persisted session: {}", e),
        }

        let token = match self.store.get(AUTH_TOKEN_KEY).await {
            Ok(token) => token?,
            Err(e) => {
                error!("Failed to read persisted token: {}", e);
                return None;
            }
        };

        let session = jwt::decode_claims(&token).and_then(|claims| Session::from_claims(&claims));
        if session.is_none() {
            warn!("Persisted token could not be decoded");
        }
        session
    }

    /// Persist the token and session, then publish `Authenticated`
    async fn establish(&self, token: &str, session: Session) -> PortalResult<Session> {
        self.store.set(AUTH_TOKEN_KEY, token).await?;
        if let Err(e) = self.persist(&session).await {
            // A lone token would restore this session on the next start
            if let Err(cleanup) = self.store.delete(AUTH_TOKEN_KEY).await {
                error!("Failed to roll back persisted token: {}", cleanup);
            }
            return Err(e);
        }
        info!("Signed in user {}", session.user_id);
        self.state
            .send_replace(AuthState::Authenticated(session.clone()));
        Ok(session)
    }

    async fn persist(&self, session: &Session) -> PortalResult<()> {
        let record = serde_json::to_string(session).map_err(StoreError::from)?;
        self.store.set(CURRENT_USER_KEY, &record).await?;
        Ok(())
    }

    /// Sign in with email and password.
    ///
    /// Any gateway failure is reported as [`PortalError::Authentication`];
    /// the state is left untouched.
    pub async fn sign_in(&self, email: &str, password: &str) -> PortalResult<Session> {
        let email = email.trim();
        let mut errors = ValidationErrors::new();
        if !validate_email(email) {
            errors.add("email", "Please enter a valid email");
        }
        if password.is_empty() {
            errors.add("password", "Please enter your password");
        }
        errors.into_result()?;

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.gateway.login(&request).await.map_err(|e| {
            warn!("Sign-in failed for {}: {}", email, e);
            PortalError::Authentication
        })?;

        let claims = jwt::decode_claims(&response.token).ok_or_else(|| {
            warn!("Sign-in for {} returned an undecodable token", email);
            PortalError::Authentication
        })?;
        let server = ServerProfile {
            profile_completed: response.profile_completed,
            user_type: response.user_type,
            name: response.name,
            email: None,
        };
        let session = merge_session(&claims, server, email).ok_or_else(|| {
            warn!("Sign-in for {} returned a token without a subject", email);
            PortalError::Authentication
        })?;

        self.establish(&response.token, session).await
    }

    /// Exchange a third-party credential for a session
    pub async fn sign_in_with_google(&self, credential: &str) -> PortalResult<Session> {
        if credential.trim().is_empty() {
            return Err(PortalError::validation("credential", "Missing credential"));
        }

        let request = GoogleLoginRequest {
            credential: credential.to_string(),
        };
        let response = self.gateway.google_login(&request).await.map_err(|e| {
            warn!("Third-party sign-in failed: {}", e);
            PortalError::Authentication
        })?;

        let claims = jwt::decode_claims(&response.token).ok_or(PortalError::Authentication)?;
        let account = response.user.unwrap_or_default();
        let server = ServerProfile {
            profile_completed: account.profile_completed,
            user_type: account.user_type,
            name: account.name,
            email: account.email,
        };
        let session = merge_session(&claims, server, "").ok_or(PortalError::Authentication)?;

        self.establish(&response.token, session).await
    }

    /// Register a new account. Does not sign in.
    pub async fn quick_sign_up(&self, form: &SignUpForm) -> PortalResult<()> {
        form.validate().into_result()?;

        let request = form.to_request();
        match self.gateway.register(&request).await {
            Ok(_) => {
                info!("Registered account for {}", request.email);
                Ok(())
            }
            Err(PortalError::Server { status, message })
                if is_duplicate_account(status, &message) =>
            {
                warn!("Registration conflict for {}", request.email);
                Err(PortalError::DuplicateAccount)
            }
            Err(e) => Err(e),
        }
    }

    /// Complete the signed-in user's profile and return the issued user code.
    ///
    /// The session is only updated after the gateway confirms.
    pub async fn complete_profile(&self, profile: &CompleteProfile) -> PortalResult<String> {
        let session = self
            .current_session()
            .ok_or(PortalError::NotAuthenticated)?;
        profile.validate().into_result()?;
        let token = self.auth_token().await?;

        let response: ProfileResponse = match &profile.kind {
            ProfileKind::Residential { .. } => {
                let request = profile
                    .residence_request()
                    .ok_or(PortalError::NotAuthenticated)?;
                self.gateway
                    .complete_residence_profile(&token, &request)
                    .await?
            }
            ProfileKind::Business { .. } => {
                let request = profile
                    .company_request()
                    .ok_or(PortalError::NotAuthenticated)?;
                self.gateway.complete_company_profile(&token, &request).await?
            }
        };

        let user_code = response.id.map(|id| id.to_string()).ok_or_else(|| {
            error!("Profile completion for {} returned no id", session.user_id);
            PortalError::Server {
                status: StatusCode::OK,
                message: "Profile completion response did not include an id".to_string(),
            }
        })?;

        let updated = Session {
            account_type: Some(profile.account_type()),
            profile_completed: true,
            user_code: Some(user_code.clone()),
            ..session
        };
        self.persist(&updated).await?;
        info!(
            "Completed {} profile for user {}",
            profile.account_type(),
            updated.user_id
        );
        self.state.send_replace(AuthState::Authenticated(updated));

        Ok(user_code)
    }

    /// Raw token for authenticated gateway calls
    pub async fn auth_token(&self) -> PortalResult<String> {
        self.store
            .get(AUTH_TOKEN_KEY)
            .await?
            .ok_or(PortalError::NotAuthenticated)
    }

    /// Sign out locally. Always succeeds; store failures are only logged.
    pub async fn sign_out(&self) {
        self.state.send_replace(AuthState::Unauthenticated);
        for key in [CURRENT_USER_KEY, AUTH_TOKEN_KEY] {
            if let Err(e) = self.store.delete(key).await {
                error!("Failed to remove {} from the store: {}", key, e);
            }
        }
        info!("Signed out");
    }
}
