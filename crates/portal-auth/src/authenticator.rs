//! Credential verification with per-client lockout

use async_trait::async_trait;
use portal_db::{Database, DbError, User, UserRole};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::lockout::{Clock, LockoutPolicy, LockoutStore, SystemClock};
use crate::password::{Argon2Hasher, SecretHasher};

/// Valid Argon2 hash that no password matches. Verified against when the
/// identifier is unknown so both failure paths do the same work.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Read/write access to credential records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential(&self, identifier: &str) -> Result<Option<User>, DbError>;

    async fn update_credential_secret(
        &self,
        identifier: &str,
        secret_hash: &str,
    ) -> Result<User, DbError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_credential(&self, identifier: &str) -> Result<Option<User>, DbError> {
        self.get_user_by_username(identifier).await
    }

    async fn update_credential_secret(
        &self,
        identifier: &str,
        secret_hash: &str,
    ) -> Result<User, DbError> {
        self.update_user_password(identifier, secret_hash).await
    }
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub username: String,
    pub role: UserRole,
}

/// Verifies credentials and throttles repeated failures
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    lockout: Arc<dyn LockoutStore>,
    hasher: Arc<dyn SecretHasher>,
    clock: Arc<dyn Clock>,
    policy: LockoutPolicy,
}

impl Authenticator {
    /// Create an authenticator using Argon2 and the system clock
    pub fn new(
        store: Arc<dyn CredentialStore>,
        lockout: Arc<dyn LockoutStore>,
        policy: LockoutPolicy,
    ) -> Self {
        Self {
            store,
            lockout,
            hasher: Arc::new(Argon2Hasher),
            clock: Arc::new(SystemClock),
            policy,
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn SecretHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Verify `identifier`/`secret`.
    ///
    /// With no `client_key` the lockout is neither consulted nor updated.
    pub async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
        client_key: Option<&str>,
    ) -> Result<Authenticated, AuthError> {
        let now = self.clock.now();
        if let Some(key) = client_key
            && let Some(entry) = self.lockout.read(key, now)
            && entry.is_locked(&self.policy, now)
        {
            warn!("Login from {} rejected: locked out after {} failures", key, entry.failures);
            return Err(AuthError::RateLimited);
        }

        debug!("Login attempt for user: {}", identifier);

        let user = match self.store.find_credential(identifier).await? {
            Some(user) => user,
            None => {
                let _ = self.hasher.verify(secret, DUMMY_HASH);
                self.record_failure(client_key);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(secret, &user.password_hash)? {
            self.record_failure(client_key);
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(key) = client_key {
            self.lockout.clear(key);
        }

        info!("User {} logged in successfully", user.username);
        Ok(Authenticated {
            username: user.username,
            role: user.role,
        })
    }

    /// Replace the secret of an admin account after re-verifying the old one
    pub async fn change_secret(
        &self,
        identifier: &str,
        old_secret: &str,
        new_secret: &str,
    ) -> Result<User, AuthError> {
        let user = self
            .store
            .find_credential(identifier)
            .await?
            .filter(|user| user.role.is_admin())
            .ok_or(AuthError::NotFound)?;

        if !self.hasher.verify(old_secret, &user.password_hash)? {
            warn!("Password change for {} rejected: old password mismatch", identifier);
            return Err(AuthError::InvalidCredentials);
        }

        let secret_hash = self.hasher.hash(new_secret)?;
        let updated = self
            .store
            .update_credential_secret(identifier, &secret_hash)
            .await?;

        info!("Password updated for admin {}", updated.username);
        Ok(updated)
    }

    fn record_failure(&self, client_key: Option<&str>) {
        if let Some(key) = client_key {
            let entry = self.lockout.increment(key, self.clock.now());
            debug!("Failed login from {} ({} recent failures)", key, entry.failures);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockout::{ManualClock, MemoryLockoutStore};
    use chrono::{DateTime, Duration, Utc};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Stores plaintext as its own "hash" so tests don't pay for Argon2
    struct PlainHasher;

    impl SecretHasher for PlainHasher {
        fn hash(&self, plain: &str) -> Result<String, AuthError> {
            Ok(format!("plain:{}", plain))
        }

        fn verify(&self, plain: &str, hash: &str) -> Result<bool, AuthError> {
            Ok(hash == format!("plain:{}", plain))
        }
    }

    #[derive(Default)]
    struct MemoryCredentials {
        users: Mutex<HashMap<String, User>>,
        lookups: Mutex<u32>,
    }

    impl MemoryCredentials {
        fn with_user(self, username: &str, secret: &str, role: UserRole) -> Self {
            let now = Utc::now();
            let id = self.users.lock().len() as i64 + 1;
            self.users.lock().insert(
                username.to_string(),
                User {
                    id,
                    username: username.to_string(),
                    password_hash: format!("plain:{}", secret),
                    role,
                    created_at: now,
                    updated_at: now,
                },
            );
            self
        }

        fn hash_of(&self, username: &str) -> String {
            self.users.lock()[username].password_hash.clone()
        }

        fn lookups(&self) -> u32 {
            *self.lookups.lock()
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryCredentials {
        async fn find_credential(&self, identifier: &str) -> Result<Option<User>, DbError> {
            *self.lookups.lock() += 1;
            Ok(self.users.lock().get(identifier).cloned())
        }

        async fn update_credential_secret(
            &self,
            identifier: &str,
            secret_hash: &str,
        ) -> Result<User, DbError> {
            let mut users = self.users.lock();
            let user = users
                .get_mut(identifier)
                .ok_or_else(|| DbError::NotFound(identifier.to_string()))?;
            user.password_hash = secret_hash.to_string();
            Ok(user.clone())
        }
    }

    struct Fixture {
        auth: Authenticator,
        store: Arc<MemoryCredentials>,
        lockout: Arc<MemoryLockoutStore>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(
            MemoryCredentials::default()
                .with_user("admin", "admin-secret", UserRole::Admin)
                .with_user("user1", "123456", UserRole::User),
        );
        let policy = LockoutPolicy::default();
        let lockout = Arc::new(MemoryLockoutStore::for_policy(&policy));
        let clock = Arc::new(ManualClock::default());
        let auth = Authenticator::new(store.clone(), lockout.clone(), policy)
            .with_hasher(Arc::new(PlainHasher))
            .with_clock(clock.clone());
        Fixture {
            auth,
            store,
            lockout,
            clock,
        }
    }

    #[tokio::test]
    async fn test_valid_credentials_return_role() {
        let f = fixture();
        let ok = f.auth.authenticate("user1", "123456", Some("1.2.3.4")).await.unwrap();
        assert_eq!(ok.role, UserRole::User);
        assert_eq!(ok.username, "user1");

        let ok = f.auth.authenticate("admin", "admin-secret", None).await.unwrap();
        assert_eq!(ok.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_invalid_credentials() {
        let f = fixture();
        for name in ["ghost", "admin2", "USER1"] {
            let err = f.auth.authenticate(name, "123456", Some("1.2.3.4")).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials), "{name}: {err:?}");
        }
        assert_eq!(f.lockout.read("1.2.3.4", f.clock.now()).unwrap().failures, 3);
    }

    #[tokio::test]
    async fn test_wrong_secret_is_invalid_credentials() {
        let f = fixture();
        let err = f.auth.authenticate("user1", "654321", Some("1.2.3.4")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(f.lockout.read("1.2.3.4", f.clock.now()).unwrap().failures, 1);
    }

    #[tokio::test]
    async fn test_lockout_after_five_failures_then_window_expiry() {
        let f = fixture();
        let key = Some("203.0.113.9");
        for _ in 0..5 {
            let err = f.auth.authenticate("user1", "wrong", key).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
            f.clock.advance(Duration::seconds(10));
        }

        let lookups_before = f.store.lookups();
        let err = f.auth.authenticate("user1", "123456", key).await.unwrap_err();
        assert!(matches!(err, AuthError::RateLimited));
        assert_eq!(f.store.lookups(), lookups_before, "store consulted while locked");

        // Other clients are unaffected
        assert!(f.auth.authenticate("user1", "123456", Some("198.51.100.1")).await.is_ok());

        f.clock.advance(Duration::minutes(5));
        let ok = f.auth.authenticate("user1", "123456", key).await.unwrap();
        assert_eq!(ok.role, UserRole::User);
    }

    /// Moves forward by `step` after every read
    struct SteppingClock {
        now: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut now = self.now.lock();
            let current = *now;
            *now = current + self.step;
            current
        }
    }

    #[tokio::test]
    async fn test_lockout_decision_uses_one_instant() {
        let store =
            Arc::new(MemoryCredentials::default().with_user("user1", "123456", UserRole::User));
        let policy = LockoutPolicy::default();
        let lockout = Arc::new(MemoryLockoutStore::for_policy(&policy));

        let failed_at = Utc::now();
        for _ in 0..policy.max_attempts {
            lockout.increment("k", failed_at);
        }

        // One second before the window closes; a second read would land on the boundary
        let clock = Arc::new(SteppingClock {
            now: Mutex::new(failed_at + policy.window - Duration::seconds(1)),
            step: Duration::seconds(1),
        });
        let auth = Authenticator::new(store, lockout, policy)
            .with_hasher(Arc::new(PlainHasher))
            .with_clock(clock);

        let err = auth.authenticate("user1", "123456", Some("k")).await.unwrap_err();
        assert!(matches!(err, AuthError::RateLimited));
    }

    #[tokio::test]
    async fn test_rate_limited_attempt_does_not_extend_lockout() {
        let f = fixture();
        let key = Some("k");
        for _ in 0..5 {
            let _ = f.auth.authenticate("user1", "wrong", key).await;
        }
        f.clock.advance(Duration::minutes(4));
        assert!(matches!(
            f.auth.authenticate("user1", "123456", key).await,
            Err(AuthError::RateLimited)
        ));

        f.clock.advance(Duration::minutes(1));
        assert!(f.auth.authenticate("user1", "123456", key).await.is_ok());
    }

    #[tokio::test]
    async fn test_success_clears_failure_count() {
        let f = fixture();
        let key = Some("10.1.1.1");
        for _ in 0..4 {
            let _ = f.auth.authenticate("user1", "wrong", key).await;
        }
        f.auth.authenticate("user1", "123456", key).await.unwrap();
        assert!(f.lockout.read("10.1.1.1", f.clock.now()).is_none());

        // Four more failures do not trip the lockout
        for _ in 0..4 {
            let _ = f.auth.authenticate("user1", "wrong", key).await;
        }
        assert!(f.auth.authenticate("user1", "123456", key).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_client_key_skips_lockout() {
        let f = fixture();
        for _ in 0..10 {
            let _ = f.auth.authenticate("user1", "wrong", None).await;
        }
        assert!(f.lockout.is_empty());
        assert!(f.auth.authenticate("user1", "123456", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_secret() {
        let f = fixture();
        f.auth
            .change_secret("admin", "admin-secret", "fresh-secret")
            .await
            .unwrap();

        assert!(f.auth.authenticate("admin", "fresh-secret", None).await.is_ok());
        assert!(matches!(
            f.auth.authenticate("admin", "admin-secret", None).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_change_secret_wrong_old_secret_keeps_hash() {
        let f = fixture();
        let before = f.store.hash_of("admin");

        let err = f.auth.change_secret("admin", "guess", "fresh").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(f.store.hash_of("admin"), before);
    }

    #[tokio::test]
    async fn test_change_secret_requires_admin_record() {
        let f = fixture();
        let err = f.auth.change_secret("ghost", "x", "y").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));

        let err = f.auth.change_secret("user1", "123456", "y").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
        assert_eq!(f.store.hash_of("user1"), "plain:123456");
    }
}
