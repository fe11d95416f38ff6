//! Portal facade tying the session store to navigation
//!
//! Every operation that changes the session re-evaluates the current route,
//! so callers always see where the donor lands afterwards.

use common::store::KeyValueStore;
use tokio::sync::watch;

use crate::dashboard::Dashboard;
use crate::error::PortalResult;
use crate::gateway::ProfileGateway;
use crate::models::{AuthState, CompleteProfile, Session, SignUpForm};
use crate::onboarding;
use crate::routes::{Navigation, Navigator, Route};
use crate::session::SessionStore;

pub struct Portal<G, S> {
    sessions: SessionStore<G, S>,
    navigator: Navigator,
    changes: watch::Receiver<AuthState>,
}

impl<G, S> Portal<G, S>
where
    G: ProfileGateway,
    S: KeyValueStore,
{
    pub fn new(gateway: G, store: S) -> Self {
        let sessions = SessionStore::new(gateway, store);
        let changes = sessions.subscribe();
        Self {
            sessions,
            navigator: Navigator::new(),
            changes,
        }
    }

    pub fn sessions(&self) -> &SessionStore<G, S> {
        &self.sessions
    }

    pub fn state(&self) -> AuthState {
        self.sessions.state()
    }

    pub fn location(&self) -> Option<Route> {
        self.navigator.location()
    }

    /// Restore the persisted session and open `path`
    pub async fn start(&mut self, path: &str) -> PortalResult<Navigation> {
        self.sessions.initialize().await;
        self.navigate(Route::resolve(path)).await
    }

    pub async fn navigate(&mut self, route: Route) -> PortalResult<Navigation> {
        let onboarded = onboarding::is_completed(self.sessions.store()).await?;
        let state = self.changes.borrow_and_update().clone();
        Ok(self.navigator.navigate(route, &state, onboarded))
    }

    /// Re-route if the session changed since the last evaluation, whoever
    /// changed it. `None` when nothing changed.
    pub async fn sync(&mut self) -> PortalResult<Option<Navigation>> {
        match self.changes.has_changed() {
            Ok(true) => self.refresh().await.map(Some),
            _ => Ok(None),
        }
    }

    async fn refresh(&mut self) -> PortalResult<Navigation> {
        let onboarded = onboarding::is_completed(self.sessions.store()).await?;
        let state = self.changes.borrow_and_update().clone();
        Ok(self.navigator.refresh(&state, onboarded))
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> PortalResult<Navigation> {
        self.sessions.sign_in(email, password).await?;
        self.refresh().await
    }

    pub async fn sign_in_with_google(&mut self, credential: &str) -> PortalResult<Navigation> {
        self.sessions.sign_in_with_google(credential).await?;
        self.refresh().await
    }

    /// Register and show the confirmation page. The donor still has to sign in.
    pub async fn quick_sign_up(&mut self, form: &SignUpForm) -> PortalResult<Navigation> {
        self.sessions.quick_sign_up(form).await?;
        self.navigate(Route::SignUpConfirmation).await
    }

    /// Complete the profile and return the issued code with the landing route
    pub async fn complete_profile(
        &mut self,
        profile: &CompleteProfile,
    ) -> PortalResult<(String, Navigation)> {
        let code = self.sessions.complete_profile(profile).await?;
        let navigation = self.navigate(Route::CompleteDone).await?;
        Ok((code, navigation))
    }

    pub async fn sign_out(&mut self) -> PortalResult<Navigation> {
        self.sessions.sign_out().await;
        self.refresh().await
    }

    pub async fn finish_onboarding(&mut self) -> PortalResult<Navigation> {
        let route = onboarding::finish(self.sessions.store()).await?;
        self.navigate(route).await
    }

    pub async fn review_onboarding(&mut self) -> PortalResult<Navigation> {
        let route = onboarding::reset(self.sessions.store()).await?;
        self.navigate(route).await
    }

    pub async fn dashboard(&self) -> PortalResult<Dashboard> {
        Dashboard::load(&self.sessions).await
    }

    pub fn current_session(&self) -> Option<Session> {
        self.sessions.current_session()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::HttpGateway;
    use crate::session::CURRENT_USER_KEY;
    use common::store::MemoryStore;

    const COMPLETED: &str = r#"{"userId":"u1","email":"a@b.com","displayName":"Ana","accountType":"residential","profileCompleted":true,"userCode":"42"}"#;

    #[tokio::test]
    async fn test_sync_follows_session_changes() {
        let store = MemoryStore::new();
        store.set(CURRENT_USER_KEY, COMPLETED).await.unwrap();
        onboarding::finish(&store).await.unwrap();

        // The gateway is never reached
        let mut portal = Portal::new(HttpGateway::new("http://127.0.0.1:9"), store);
        assert_eq!(
            portal.start("/history").await.unwrap(),
            Navigation::Landed(Route::History)
        );
        assert_eq!(portal.sync().await.unwrap(), None);

        portal.sessions().sign_out().await;
        assert_eq!(
            portal.sync().await.unwrap(),
            Some(Navigation::Landed(Route::Login))
        );
        assert_eq!(portal.sync().await.unwrap(), None);
        assert_eq!(portal.location(), Some(Route::Login));
    }
}
