use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::{Credential, CredentialStore};
use crate::models::UserIdentity;

/// Capacity of the session event channel.
/// Subscribers drain after every page, a handful of events is the most they see.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Whether a credential is present for this process.
#[derive(Debug, Clone)]
pub enum SessionState {
    Anonymous,
    Authenticated(Credential),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(credential) => Some(&credential.identity),
        }
    }
}

/// Session transitions, published to subscribers of [`Session::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    /// The service rejected the credential; the user must sign in again
    Expired,
}

/// Token and generation captured when a request is issued.
#[derive(Debug)]
pub(crate) struct Ticket {
    pub token: Option<SecretString>,
    pub epoch: u64,
}

struct Inner {
    state: SessionState,
    /// Bumped on every transition so a late 401 cannot undo a newer login
    epoch: u64,
}

/// Process-wide session controller.
///
/// Owns the in-memory view of the credential and keeps the credential store
/// in step with it. Shared as `Arc<Session>` between the API client and the
/// application root.
pub struct Session {
    store: Arc<dyn CredentialStore>,
    inner: Mutex<Inner>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Rehydrate the session from the store. Makes no network call.
    pub fn init(store: Arc<dyn CredentialStore>) -> Arc<Self> {
        let state = match store.load() {
            Ok(Some(credential)) => {
                debug!(email = %credential.identity.email, "Restored session");
                SessionState::Authenticated(credential)
            }
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                warn!(error = %e, "Failed to load stored credential, starting signed out");
                SessionState::Anonymous
            }
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Arc::new(Self {
            store,
            inner: Mutex::new(Inner { state, epoch: 0 }),
            events,
        })
    }

    /// Persist the credential and mark the session authenticated.
    ///
    /// If the credential cannot be saved the session is left unchanged.
    pub async fn login_user(&self, credential: Credential) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let saved = credential.clone();
        self.with_store(move |store| store.save(&saved)).await?;
        info!(email = %credential.identity.email, "Signed in");
        inner.state = SessionState::Authenticated(credential);
        inner.epoch += 1;
        drop(inner);
        self.publish(SessionEvent::SignedIn);
        Ok(())
    }

    /// Forget the credential. The session is anonymous afterwards even if
    /// clearing the store fails; that failure is still returned.
    pub async fn logout_user(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Anonymous;
        inner.epoch += 1;
        let cleared = self.with_store(|store| store.clear()).await;
        drop(inner);
        info!("Signed out");
        self.publish(SessionEvent::SignedOut);
        cleared
    }

    /// Replace the identity snapshot of the current credential.
    pub async fn refresh_identity(&self, identity: UserIdentity) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let SessionState::Authenticated(ref credential) = inner.state {
            let updated = credential.with_identity(identity);
            let saved = updated.clone();
            self.with_store(move |store| store.save(&saved)).await?;
            inner.state = SessionState::Authenticated(updated);
        }
        Ok(())
    }

    pub async fn current_user(&self) -> Option<UserIdentity> {
        self.inner.lock().await.state.identity().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.state.is_authenticated()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Capture the token to send and the generation it belongs to.
    pub(crate) async fn ticket(&self) -> Ticket {
        let inner = self.inner.lock().await;
        let token = match inner.state {
            SessionState::Authenticated(ref credential)
                if !credential.token().expose_secret().is_empty() =>
            {
                Some(credential.token().clone())
            }
            _ => None,
        };
        Ticket {
            token,
            epoch: inner.epoch,
        }
    }

    /// Handle a 401 for a request issued at `epoch`.
    ///
    /// Only the first rejection of a generation clears the store and
    /// publishes [`SessionEvent::Expired`]; returns whether this call did.
    pub(crate) async fn expire(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!(epoch, current = inner.epoch, "Ignoring stale authentication failure");
            return false;
        }
        inner.state = SessionState::Anonymous;
        inner.epoch += 1;
        if let Err(e) = self.with_store(|store| store.clear()).await {
            warn!(error = %e, "Failed to clear stored credential after authentication failure");
        }
        drop(inner);
        warn!("Session expired, sign-in required");
        self.publish(SessionEvent::Expired);
        true
    }

    /// Run a store operation on the blocking pool. Stores do file or
    /// keychain I/O; the session lock stays held so transitions remain ordered.
    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CredentialStore) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .context("Credential store task failed")?
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::auth::{FileCredentialStore, MemoryCredentialStore};

    fn identity() -> UserIdentity {
        UserIdentity {
            name: "alice".to_string(),
            email: "a@b.com".to_string(),
            credit_limit: Some(1000.0),
        }
    }

    /// Memory store that counts `clear` calls
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryCredentialStore,
        clears: AtomicUsize,
    }

    impl CredentialStore for CountingStore {
        fn save(&self, credential: &Credential) -> Result<()> {
            self.inner.save(credential)
        }

        fn load(&self) -> Result<Option<Credential>> {
            self.inner.load()
        }

        fn clear(&self) -> Result<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            self.inner.clear()
        }
    }

    /// Store whose `save` waits for a signal sent from another task
    struct GatedStore {
        inner: MemoryCredentialStore,
        gate: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl CredentialStore for GatedStore {
        fn save(&self, credential: &Credential) -> Result<()> {
            self.gate
                .lock()
                .expect("gate lock")
                .recv_timeout(std::time::Duration::from_secs(5))
                .map_err(|_| anyhow::anyhow!("save ran on the runtime thread"))?;
            self.inner.save(credential)
        }

        fn load(&self) -> Result<Option<Credential>> {
            self.inner.load()
        }

        fn clear(&self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[tokio::test]
    async fn test_store_io_does_not_block_runtime() {
        let (signal, gate) = std::sync::mpsc::channel();
        let session = Session::init(Arc::new(GatedStore {
            inner: MemoryCredentialStore::new(),
            gate: std::sync::Mutex::new(gate),
        }));

        // Single-threaded runtime: this task only runs if the save yields it
        let sender = tokio::spawn(async move { signal.send(()).expect("send") });
        session
            .login_user(Credential::new("tok123", identity()))
            .await
            .expect("login");
        sender.await.expect("join");
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_starts_anonymous_without_credential() {
        let session = Session::init(Arc::new(MemoryCredentialStore::new()));
        assert!(!session.is_authenticated().await);
        assert!(session.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let store = Arc::new(MemoryCredentialStore::new());
        let session = Session::init(store.clone());
        let mut events = session.subscribe();

        session
            .login_user(Credential::new("tok123", identity()))
            .await
            .expect("login");
        assert!(session.is_authenticated().await);
        assert_eq!(session.current_user().await, Some(identity()));
        assert!(store.load().expect("load").is_some());

        session.logout_user().await.expect("logout");
        assert!(session.current_user().await.is_none());
        assert!(store.load().expect("load").is_none());

        assert_eq!(events.try_recv().ok(), Some(SessionEvent::SignedIn));
        assert_eq!(events.try_recv().ok(), Some(SessionEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_restores_persisted_credential() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().to_path_buf();

        let session = Session::init(Arc::new(FileCredentialStore::new(path.clone())));
        session
            .login_user(Credential::new("tok123", identity()))
            .await
            .expect("login");
        drop(session);

        let restarted = Session::init(Arc::new(FileCredentialStore::new(path.clone())));
        assert!(restarted.is_authenticated().await);
        assert_eq!(restarted.current_user().await, Some(identity()));

        restarted.logout_user().await.expect("logout");
        let again = Session::init(Arc::new(FileCredentialStore::new(path)));
        assert!(!again.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_corrupt_store_starts_anonymous() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), "{").expect("write");

        let session = Session::init(Arc::new(store));
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_concurrent_expiry_clears_once() {
        let store = Arc::new(CountingStore::default());
        let session = Session::init(store.clone());
        session
            .login_user(Credential::new("tok123", identity()))
            .await
            .expect("login");
        let mut events = session.subscribe();

        let epoch = session.ticket().await.epoch;
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = session.clone();
                tokio::spawn(async move { session.expire(epoch).await })
            })
            .collect();

        let mut transitions = 0;
        for handle in handles {
            if handle.await.expect("join") {
                transitions += 1;
            }
        }

        assert_eq!(transitions, 1);
        assert_eq!(store.clears.load(Ordering::SeqCst), 1);
        assert!(!session.is_authenticated().await);
        assert_eq!(events.try_recv().ok(), Some(SessionEvent::Expired));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_expiry_keeps_newer_login() {
        let session = Session::init(Arc::new(MemoryCredentialStore::new()));
        session
            .login_user(Credential::new("old", identity()))
            .await
            .expect("login");
        let stale = session.ticket().await.epoch;

        session
            .login_user(Credential::new("new", identity()))
            .await
            .expect("login again");

        assert!(!session.expire(stale).await);
        let ticket = session.ticket().await;
        assert_eq!(ticket.token.expect("token").expose_secret(), "new");
    }

    #[tokio::test]
    async fn test_empty_token_is_not_sent() {
        let session = Session::init(Arc::new(MemoryCredentialStore::new()));
        session
            .login_user(Credential::new("", identity()))
            .await
            .expect("login");
        assert!(session.ticket().await.token.is_none());
    }

    #[tokio::test]
    async fn test_refresh_identity_persists() {
        let store = Arc::new(MemoryCredentialStore::new());
        let session = Session::init(store.clone());

        // No-op while anonymous
        session.refresh_identity(identity()).await.expect("refresh");
        assert!(session.current_user().await.is_none());

        session
            .login_user(Credential::new("tok", UserIdentity::from_email("a@b.com")))
            .await
            .expect("login");
        session.refresh_identity(identity()).await.expect("refresh");

        assert_eq!(session.current_user().await, Some(identity()));
        let stored = store.load().expect("load").expect("present");
        assert_eq!(stored.identity, identity());
        assert_eq!(stored.token().expose_secret(), "tok");
    }
}
