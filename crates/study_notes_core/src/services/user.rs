//! crates/study_notes_core/src/services/user.rs
//!
//! Registration, login sessions, profile management and password recovery.

use crate::domain::{AuthSession, NewUser, User};
use crate::messages;
use crate::ports::{CredentialHasher, DatabaseService, PortError, PortResult, ResetNotifier};
use crate::services::{non_blank, required};
use chrono::{Duration, Utc};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
});

/// Tunables for sessions and password recovery.
#[derive(Debug, Clone)]
pub struct UserSettings {
    pub session_ttl: Duration,
    pub reset_token_ttl: Duration,
    /// The reset token is appended as `?token=...`.
    pub reset_url: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::days(30),
            reset_token_ttl: Duration::minutes(30),
            reset_url: "http://localhost:3000/reset-password".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<dyn DatabaseService>,
    hasher: Arc<dyn CredentialHasher>,
    notifier: Arc<dyn ResetNotifier>,
    settings: UserSettings,
}

impl UserService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        hasher: Arc<dyn CredentialHasher>,
        notifier: Arc<dyn ResetNotifier>,
        settings: UserSettings,
    ) -> Self {
        Self {
            db,
            hasher,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub async fn register(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> PortResult<User> {
        let username = required(username, messages::USERNAME_EMAIL_PASSWORD_REQUIRED)?;
        let email = required(email, messages::USERNAME_EMAIL_PASSWORD_REQUIRED)?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PortError::Validation(messages::USERNAME_EMAIL_PASSWORD_REQUIRED.to_string()))?;
        let email = normalize_email(email)?;
        validate_password(password)?;

        let hashed_password = self.hasher.hash_password(password)?;
        let user = self
            .db
            .create_user(NewUser {
                username: username.to_string(),
                email,
                hashed_password,
            })
            .await?;
        info!(user_id = %user.id, "Registered new user");
        Ok(user)
    }

    /// Verifies credentials and issues a new login session.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> PortResult<(User, AuthSession)> {
        let username = required(username, messages::USERNAME_PASSWORD_REQUIRED)?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PortError::Validation(messages::USERNAME_PASSWORD_REQUIRED.to_string()))?;

        let credentials = match self.db.get_credentials_by_username(username).await {
            Ok(c) => c,
            Err(PortError::NotFound(_)) => {
                return Err(PortError::Unauthorized(messages::INVALID_CREDENTIALS.to_string()))
            }
            Err(e) => return Err(e),
        };
        if !self
            .hasher
            .verify_password(password, &credentials.hashed_password)?
        {
            warn!(user_id = %credentials.user.id, "Login rejected: wrong password");
            return Err(PortError::Unauthorized(messages::INVALID_CREDENTIALS.to_string()));
        }

        let session_id = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.settings.session_ttl;
        let session = self
            .db
            .create_auth_session(&session_id, credentials.user.id, expires_at)
            .await?;
        info!(user_id = %credentials.user.id, "User logged in");
        Ok((credentials.user, session))
    }

    pub async fn logout(&self, session_id: &str) -> PortResult<()> {
        self.db.delete_auth_session(session_id).await
    }

    /// Maps a session id to its user, rejecting unknown or expired sessions.
    pub async fn resolve_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.db.validate_auth_session(session_id).await
    }

    pub async fn get(&self, requester: Uuid, user_id: Uuid) -> PortResult<User> {
        let user = self.db.get_user_by_id(user_id).await?;
        ensure_self(requester, user_id)?;
        Ok(user)
    }

    pub async fn update(
        &self,
        requester: Uuid,
        user_id: Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> PortResult<User> {
        let current = self.db.get_user_by_id(user_id).await?;
        ensure_self(requester, user_id)?;

        let username = non_blank(username);
        let email = non_blank(email).map(normalize_email).transpose()?;
        if username.is_none() && email.is_none() {
            return Ok(current);
        }
        self.db.update_user(user_id, username, email.as_deref()).await
    }

    /// Deletes the account and everything it owns.
    pub async fn delete(&self, requester: Uuid, user_id: Uuid) -> PortResult<()> {
        self.db.get_user_by_id(user_id).await?;
        ensure_self(requester, user_id)?;
        self.db.delete_user(user_id).await?;
        info!(%user_id, "Deleted user");
        Ok(())
    }

    /// Lists every account. Admins only.
    pub async fn list(&self, requester: Uuid) -> PortResult<Vec<User>> {
        let requesting_user = self.db.get_user_by_id(requester).await?;
        if !requesting_user.is_admin {
            return Err(PortError::Forbidden(messages::UNAUTHORIZED_ACCESS.to_string()));
        }
        self.db.list_users().await
    }

    /// Replaces the password and revokes every session other than `current_session`.
    pub async fn change_password(
        &self,
        requester: Uuid,
        user_id: Uuid,
        current_password: Option<&str>,
        new_password: Option<&str>,
        current_session: Option<&str>,
    ) -> PortResult<()> {
        let credentials = self.db.get_credentials_by_id(user_id).await?;
        ensure_self(requester, user_id)?;

        let (current_password, new_password) = match (current_password, new_password) {
            (Some(c), Some(n)) if !c.is_empty() && !n.is_empty() => (c, n),
            _ => {
                return Err(PortError::Validation(
                    messages::CURRENT_NEW_PASSWORD_REQUIRED.to_string(),
                ))
            }
        };
        if !self
            .hasher
            .verify_password(current_password, &credentials.hashed_password)?
        {
            return Err(PortError::Validation(messages::PASSWORD_INCORRECT.to_string()));
        }
        validate_password(new_password)?;

        let hashed = self.hasher.hash_password(new_password)?;
        self.db.update_password_hash(user_id, &hashed).await?;
        self.db
            .delete_auth_sessions_for_user(user_id, current_session)
            .await?;
        info!(%user_id, "Password changed");
        Ok(())
    }

    /// Issues a single-use reset token and hands the link to the notifier.
    pub async fn request_password_reset(&self, email: Option<&str>) -> PortResult<()> {
        let email = required(email, messages::EMAIL_REQUIRED)?;
        let user = self.db.get_user_by_email(&email.to_lowercase()).await?;

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + self.settings.reset_token_ttl;
        self.db.create_reset_token(&token, user.id, expires_at).await?;

        let link = format!("{}?token={}", self.settings.reset_url, token);
        self.notifier.send_reset_link(&user.email, &link).await?;
        info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: Option<&str>,
        new_password: Option<&str>,
        confirm_password: Option<&str>,
    ) -> PortResult<()> {
        let (token, new_password, confirm_password) = match (token, new_password, confirm_password)
        {
            (Some(t), Some(n), Some(c)) if !t.is_empty() && !n.is_empty() && !c.is_empty() => {
                (t, n, c)
            }
            _ => {
                return Err(PortError::Validation(
                    messages::TOKEN_PASSWORD_FIELDS_REQUIRED.to_string(),
                ))
            }
        };
        if new_password != confirm_password {
            return Err(PortError::Validation(messages::PASSWORD_MISMATCH.to_string()));
        }
        validate_password(new_password)?;

        let user_id = match self.db.consume_reset_token(token).await {
            Ok(id) => id,
            Err(PortError::NotFound(_)) => {
                return Err(PortError::Validation(messages::EXPIRED_INVALID_TOKEN.to_string()))
            }
            Err(e) => return Err(e),
        };
        let hashed = self.hasher.hash_password(new_password)?;
        self.db.update_password_hash(user_id, &hashed).await?;
        self.db.delete_auth_sessions_for_user(user_id, None).await?;
        info!(%user_id, "Password reset completed");
        Ok(())
    }
}

fn ensure_self(requester: Uuid, user_id: Uuid) -> PortResult<()> {
    if requester != user_id {
        warn!(%requester, %user_id, "Rejected access to another user's account");
        return Err(PortError::Forbidden(messages::UNAUTHORIZED_ACCESS.to_string()));
    }
    Ok(())
}

fn normalize_email(email: &str) -> PortResult<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(PortError::Validation(messages::INVALID_EMAIL.to_string()));
    }
    Ok(email)
}

fn validate_password(password: &str) -> PortResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PortError::Validation(messages::PASSWORD_TOO_SHORT.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryDatabase, PlainHasher, RecordingNotifier};

    struct Fixture {
        db: Arc<InMemoryDatabase>,
        notifier: Arc<RecordingNotifier>,
        users: UserService,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(InMemoryDatabase::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let users = UserService::new(
            db.clone(),
            Arc::new(PlainHasher),
            notifier.clone(),
            UserSettings::default(),
        );
        Fixture { db, notifier, users }
    }

    async fn register(users: &UserService, name: &str) -> User {
        users
            .register(Some(name), Some(&format!("{name}@example.com")), Some("password123"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_rejects_reused_email() {
        let f = fixture();
        register(&f.users, "alice").await;

        let err = f
            .users
            .register(Some("alice2"), Some("ALICE@example.com"), Some("password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(ref m) if m == messages::EMAIL_ALREADY_EXISTS));
    }

    #[tokio::test]
    async fn register_rejects_reused_username() {
        let f = fixture();
        register(&f.users, "alice").await;

        let err = f
            .users
            .register(Some("alice"), Some("other@example.com"), Some("password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(ref m) if m == messages::USER_ALREADY_EXISTS));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let f = fixture();
        let missing = f.users.register(Some("bob"), None, Some("password123")).await;
        assert!(matches!(missing, Err(PortError::Validation(_))));

        let bad_email = f
            .users
            .register(Some("bob"), Some("not-an-email"), Some("password123"))
            .await;
        assert!(matches!(bad_email, Err(PortError::Validation(ref m)) if m == messages::INVALID_EMAIL));

        let short = f
            .users
            .register(Some("bob"), Some("bob@example.com"), Some("short"))
            .await;
        assert!(matches!(short, Err(PortError::Validation(ref m)) if m == messages::PASSWORD_TOO_SHORT));
    }

    #[tokio::test]
    async fn login_issues_a_resolvable_session() {
        let f = fixture();
        let alice = register(&f.users, "alice").await;

        let (user, session) = f
            .users
            .login(Some("alice"), Some("password123"))
            .await
            .unwrap();
        assert_eq!(user.id, alice.id);
        assert_eq!(f.users.resolve_session(&session.id).await.unwrap(), alice.id);

        f.users.logout(&session.id).await.unwrap();
        assert!(matches!(
            f.users.resolve_session(&session.id).await,
            Err(PortError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials_uniformly() {
        let f = fixture();
        register(&f.users, "alice").await;

        let wrong_password = f.users.login(Some("alice"), Some("nope-nope")).await.unwrap_err();
        let unknown_user = f.users.login(Some("mallory"), Some("password123")).await.unwrap_err();
        for err in [wrong_password, unknown_user] {
            assert!(matches!(err, PortError::Unauthorized(ref m) if m == messages::INVALID_CREDENTIALS));
        }
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected() {
        let f = fixture();
        register(&f.users, "alice").await;
        let (_, session) = f.users.login(Some("alice"), Some("password123")).await.unwrap();

        f.db.expire_session(&session.id).unwrap();
        assert!(matches!(
            f.users.resolve_session(&session.id).await,
            Err(PortError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn users_cannot_touch_each_other() {
        let f = fixture();
        let alice = register(&f.users, "alice").await;
        let bob = register(&f.users, "bob").await;

        assert!(matches!(f.users.get(bob.id, alice.id).await, Err(PortError::Forbidden(_))));
        assert!(matches!(
            f.users.update(bob.id, alice.id, Some("eve"), None).await,
            Err(PortError::Forbidden(_))
        ));
        assert!(matches!(f.users.delete(bob.id, alice.id).await, Err(PortError::Forbidden(_))));
        assert!(matches!(
            f.users.get(alice.id, Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_checks_uniqueness_against_other_users() {
        let f = fixture();
        let alice = register(&f.users, "alice").await;
        register(&f.users, "bob").await;

        let err = f
            .users
            .update(alice.id, alice.id, None, Some("bob@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let same = f
            .users
            .update(alice.id, alice.id, Some("alice"), Some(" "))
            .await
            .unwrap();
        assert_eq!(same.username, "alice");

        let renamed = f
            .users
            .update(alice.id, alice.id, Some("alicia"), None)
            .await
            .unwrap();
        assert_eq!(renamed.username, "alicia");
        assert_eq!(renamed.email, "alice@example.com");
    }

    #[tokio::test]
    async fn listing_users_requires_admin() {
        let f = fixture();
        let alice = register(&f.users, "alice").await;
        register(&f.users, "bob").await;

        assert!(matches!(f.users.list(alice.id).await, Err(PortError::Forbidden(_))));
        f.db.make_admin(alice.id).unwrap();
        assert_eq!(f.users.list(alice.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn change_password_verifies_current_and_revokes_other_sessions() {
        let f = fixture();
        let alice = register(&f.users, "alice").await;
        let (_, keep) = f.users.login(Some("alice"), Some("password123")).await.unwrap();
        f.users.login(Some("alice"), Some("password123")).await.unwrap();
        assert_eq!(f.db.session_count(alice.id), 2);

        let wrong = f
            .users
            .change_password(alice.id, alice.id, Some("bad-password"), Some("newpassword1"), Some(&keep.id))
            .await;
        assert!(matches!(wrong, Err(PortError::Validation(ref m)) if m == messages::PASSWORD_INCORRECT));

        f.users
            .change_password(alice.id, alice.id, Some("password123"), Some("newpassword1"), Some(&keep.id))
            .await
            .unwrap();
        assert_eq!(f.db.session_count(alice.id), 1);
        assert!(f.users.login(Some("alice"), Some("newpassword1")).await.is_ok());
    }

    #[tokio::test]
    async fn password_reset_token_is_single_use() {
        let f = fixture();
        register(&f.users, "alice").await;

        f.users
            .request_password_reset(Some("alice@example.com"))
            .await
            .unwrap();
        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "alice@example.com");
        let token = sent[0].1.split("token=").nth(1).unwrap().to_string();

        let mismatch = f
            .users
            .reset_password(Some(&token), Some("brandnew123"), Some("different123"))
            .await;
        assert!(matches!(mismatch, Err(PortError::Validation(ref m)) if m == messages::PASSWORD_MISMATCH));

        f.users
            .reset_password(Some(&token), Some("brandnew123"), Some("brandnew123"))
            .await
            .unwrap();
        assert!(f.users.login(Some("alice"), Some("brandnew123")).await.is_ok());

        let reused = f
            .users
            .reset_password(Some(&token), Some("another123"), Some("another123"))
            .await;
        assert!(matches!(reused, Err(PortError::Validation(ref m)) if m == messages::EXPIRED_INVALID_TOKEN));
    }

    #[tokio::test]
    async fn password_reset_for_unknown_email_is_not_found() {
        let f = fixture();
        let err = f
            .users
            .request_password_reset(Some("ghost@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
        assert!(f.notifier.sent().is_empty());
    }
}
