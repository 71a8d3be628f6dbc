use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::AppError;
use crate::services::auth::claims::{ClaimPropagator, SessionToken, SessionView};
use crate::services::auth::events::LifecycleEvents;
use crate::services::auth::identity::ExternalIdentity;
use crate::services::auth::reconciler::{SignInDecision, SyncStatus, UserReconciler};
use crate::services::auth::session_token::SessionTokenCodec;

/// The callback surface an identity-provider integration drives:
/// `sign_in`, `jwt`, `session` and the lifecycle events, plus the HTTP-facing
/// flows built from them.
#[derive(Clone)]
pub struct AuthCallbacks {
    reconciler: UserReconciler,
    claims: ClaimPropagator,
    codec: SessionTokenCodec,
    events: Arc<dyn LifecycleEvents>,
}

impl std::fmt::Debug for AuthCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCallbacks")
            .field("reconciler", &self.reconciler)
            .field("claims", &self.claims)
            .field("codec", &self.codec)
            .finish()
    }
}

/// A successful sign-in: the signed token and the session it materializes.
#[derive(Clone, Debug)]
pub struct IssuedSession {
    pub token: String,
    pub expires_in: u64,
    pub session: SessionView,
}

impl AuthCallbacks {
    pub fn new(
        reconciler: UserReconciler,
        claims: ClaimPropagator,
        codec: SessionTokenCodec,
        events: Arc<dyn LifecycleEvents>,
    ) -> Self {
        Self {
            reconciler,
            claims,
            codec,
            events,
        }
    }

    pub fn codec(&self) -> &SessionTokenCodec {
        &self.codec
    }

    /// Session with no user yet, expiring one max-age from now.
    pub fn new_session_shell(&self) -> SessionView {
        self.claims.new_session_shell()
    }

    /// Sign-in decision callback. Emits `on_sign_in` / `on_sign_in_denied`.
    pub async fn sign_in(&self, identity: &ExternalIdentity) -> SignInDecision {
        let decision = self.reconciler.reconcile(identity).await;
        debug!(allowed = decision.is_allowed(), "sign-in decision");

        match (&decision, identity.email.as_deref()) {
            (SignInDecision::Authorized(_), Some(email)) => self.events.on_sign_in(email),
            (SignInDecision::Authorized(_), None) => {}
            (SignInDecision::Denied(reason), email) => {
                self.events.on_sign_in_denied(email, *reason)
            }
        }

        decision
    }

    /// Token-materialization callback.
    pub async fn jwt(
        &self,
        current: SessionToken,
        identity: Option<&ExternalIdentity>,
    ) -> SessionToken {
        self.claims.mint_or_refresh_token(current, identity).await
    }

    /// Session-materialization callback.
    pub fn session(&self, shell: SessionView, token: Option<&SessionToken>) -> SessionView {
        self.claims.project_session(shell, token)
    }

    /// Sign-out event. The token's email wins over the session's.
    pub fn sign_out(&self, token: Option<&SessionToken>, session: Option<&SessionView>) {
        let email = token
            .map(SessionToken::email)
            .filter(|email| !email.is_empty())
            .or_else(|| {
                session
                    .and_then(|s| s.user.as_ref())
                    .map(|u| u.email.as_str())
                    .filter(|email| !email.is_empty())
            });

        self.events.on_sign_out(email);
    }

    /// Full sign-in: decision, then mint and sign a token for this login.
    ///
    /// A denied identity gets `AccessDenied` and no token.
    pub async fn complete_sign_in(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<IssuedSession, AppError> {
        let decision = self.sign_in(identity).await;
        if let Some(reason) = decision.denial_reason() {
            return Err(AppError::access_denied(reason.as_str()));
        }
        if let SignInDecision::Authorized(SyncStatus::Synced(record)) = &decision {
            debug!(user_id = %record.id, "sign-in authorized with synced user");
        }

        let token = self
            .jwt(SessionToken::from_identity(identity), Some(identity))
            .await;
        let raw = self.codec.encode(&token)?;
        let session = self.session(self.new_session_shell(), Some(&token));

        Ok(IssuedSession {
            token: raw,
            expires_in: self.codec.max_age_seconds(),
            session,
        })
    }

    /// Session for a request carrying `raw` (if any).
    ///
    /// An invalid or expired token is logged and treated as no token: the empty
    /// shell comes back instead of an error.
    pub async fn current_session(&self, raw: Option<&str>) -> SessionView {
        let shell = self.new_session_shell();
        let Some(token) = self.verified_token(raw) else {
            return shell;
        };

        let token = self.jwt(token, None).await;
        if !token.is_bound() {
            debug!(email = %token.email(), "session token is not bound to a directory user");
        }
        self.session(shell, Some(&token))
    }

    /// Sign-out for a request carrying `raw` (if any).
    pub fn sign_out_raw(&self, raw: Option<&str>) {
        let token = self.verified_token(raw);
        self.sign_out(token.as_ref(), None);
    }

    fn verified_token(&self, raw: Option<&str>) -> Option<SessionToken> {
        let raw = raw?;
        match self.codec.decode(raw) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "ignoring unusable session token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::repos::{InMemoryUserRepo, NewUser, RepoError, RepoResult, UserRecord, UserStore};
    use crate::services::auth::domain_policy::DomainPolicy;
    use crate::services::auth::reconciler::DenialReason;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";
    const MAX_AGE: u64 = 30 * 24 * 60 * 60;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        SignIn(String),
        Denied(Option<String>, DenialReason),
        SignOut(Option<String>),
    }

    #[derive(Default)]
    struct RecordingEvents {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingEvents {
        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl LifecycleEvents for RecordingEvents {
        fn on_sign_in(&self, email: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::SignIn(email.to_string()));
        }

        fn on_sign_in_denied(&self, email: Option<&str>, reason: DenialReason) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Denied(email.map(str::to_string), reason));
        }

        fn on_sign_out(&self, email: Option<&str>) {
            self.events
                .lock()
                .unwrap()
                .push(Event::SignOut(email.map(str::to_string)));
        }
    }

    struct UnavailableStore;

    #[async_trait]
    impl UserStore for UnavailableStore {
        fn backend_name(&self) -> &'static str {
            "unavailable"
        }

        async fn create_or_update_user(&self, _input: NewUser) -> RepoResult<UserRecord> {
            Err(RepoError::Db(sqlx::Error::PoolTimedOut))
        }

        async fn get_user_by_email(&self, _email: &str) -> RepoResult<Option<UserRecord>> {
            Err(RepoError::Db(sqlx::Error::PoolTimedOut))
        }
    }

    fn callbacks_with(store: Arc<dyn UserStore>) -> (AuthCallbacks, Arc<RecordingEvents>) {
        let events = Arc::new(RecordingEvents::default());
        let callbacks = AuthCallbacks::new(
            UserReconciler::new(DomainPolicy::default(), store.clone()),
            ClaimPropagator::new(store, MAX_AGE),
            SessionTokenCodec::new(SECRET, MAX_AGE),
            events.clone(),
        );
        (callbacks, events)
    }

    fn callbacks() -> (AuthCallbacks, Arc<InMemoryUserRepo>, Arc<RecordingEvents>) {
        let store = Arc::new(InMemoryUserRepo::new());
        let (callbacks, events) = callbacks_with(store.clone());
        (callbacks, store, events)
    }

    fn identity(email: &str) -> ExternalIdentity {
        ExternalIdentity {
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_new_user_scenario() {
        let (callbacks, store, events) = callbacks();

        let issued = callbacks
            .complete_sign_in(&identity("alice@gmail.com"))
            .await
            .unwrap();

        let record = store
            .get_user_by_email("alice@gmail.com")
            .await
            .unwrap()
            .expect("record created");
        assert_eq!(record.name, "AL");

        let user = issued.session.user.expect("session user");
        assert_eq!(user.id, record.id.to_string());
        assert_eq!(user.user_id(), Some(record.id));
        assert_eq!(issued.expires_in, MAX_AGE);

        let token = callbacks.codec().decode(&issued.token).unwrap();
        assert_eq!(token.id(), record.id.to_string());

        assert_eq!(events.take(), vec![Event::SignIn("alice@gmail.com".into())]);
    }

    #[tokio::test]
    async fn test_failed_sync_still_issues_unbound_token() {
        let (callbacks, events) = callbacks_with(Arc::new(UnavailableStore));

        let issued = callbacks
            .complete_sign_in(&identity("alice@gmail.com"))
            .await
            .unwrap();

        let token = callbacks.codec().decode(&issued.token).unwrap();
        assert_eq!(token.id(), "");
        assert!(!token.is_bound());

        let user = issued.session.user.expect("session user");
        assert_eq!(user.id, "");
        assert_eq!(user.email, "alice@gmail.com");
        assert_eq!(user.user_id(), None);

        assert_eq!(events.take(), vec![Event::SignIn("alice@gmail.com".into())]);
    }

    #[tokio::test]
    async fn test_rejected_domain_scenario() {
        let (callbacks, store, events) = callbacks();

        let result = callbacks.complete_sign_in(&identity("bob@example.com")).await;

        assert!(matches!(
            result,
            Err(AppError::AccessDenied {
                reason: "domain_not_allowed"
            })
        ));
        assert!(store.get_user_by_email("bob@example.com").await.unwrap().is_none());
        assert_eq!(
            events.take(),
            vec![Event::Denied(
                Some("bob@example.com".into()),
                DenialReason::DomainNotAllowed
            )]
        );
    }

    #[tokio::test]
    async fn test_current_session_round_trips_issued_token() {
        let (callbacks, _store, _events) = callbacks();
        let issued = callbacks
            .complete_sign_in(&identity("john.doe@iitkgp.ac.in"))
            .await
            .unwrap();

        let view = callbacks.current_session(Some(&issued.token)).await;

        assert_eq!(view.user, issued.session.user);
    }

    #[tokio::test]
    async fn test_current_session_degrades_on_bad_token() {
        let (callbacks, _store, _events) = callbacks();

        assert!(callbacks.current_session(None).await.user.is_none());
        assert!(callbacks.current_session(Some("garbage")).await.user.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_prefers_token_email() {
        let (callbacks, _store, events) = callbacks();
        let token = SessionToken::from_identity(&identity("alice@gmail.com"));
        let session = callbacks.session(
            callbacks.new_session_shell(),
            Some(&SessionToken::from_identity(&identity("other@gmail.com"))),
        );

        callbacks.sign_out(Some(&token), Some(&session));
        callbacks.sign_out(None, Some(&session));
        callbacks.sign_out(None, None);

        assert_eq!(
            events.take(),
            vec![
                Event::SignOut(Some("alice@gmail.com".into())),
                Event::SignOut(Some("other@gmail.com".into())),
                Event::SignOut(None),
            ]
        );
    }

    #[tokio::test]
    async fn test_sign_out_raw_with_invalid_token_still_notifies() {
        let (callbacks, _store, events) = callbacks();
        callbacks.sign_out_raw(Some("garbage"));
        assert_eq!(events.take(), vec![Event::SignOut(None)]);
    }
}
