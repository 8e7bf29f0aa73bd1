//! Session gate: who is signed in, and whether that is known yet.

use crate::backend::{
    BackendError, FirestoreClient, IdentityClient, IdentityService, StorageClient,
};
use crate::config::BackendConfig;
use crate::models::AuthUser;
use crate::storage::{clear_session, load_session, save_session};
use leptos::prelude::*;
use leptos::task::spawn_local;
use thiserror::Error;

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum LoginError {
    #[error("El correo es obligatorio")]
    MissingEmail,

    #[error("Correo no válido")]
    InvalidEmail,

    #[error("La contraseña es obligatoria")]
    MissingPassword,

    #[error("Mínimo 6 caracteres")]
    ShortPassword,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// `local@domain.tld`, no whitespace.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub(crate) fn validate_credentials(email: &str, password: &str) -> Result<(), LoginError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(LoginError::MissingEmail);
    }
    if !looks_like_email(email) {
        return Err(LoginError::InvalidEmail);
    }
    if password.is_empty() {
        return Err(LoginError::MissingPassword);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LoginError::ShortPassword);
    }
    Ok(())
}

/// Validates locally, then asks the identity service.
pub(crate) async fn authenticate<I: IdentityService>(
    identity: &I,
    email: &str,
    password: &str,
) -> Result<AuthUser, LoginError> {
    validate_credentials(email, password)?;
    Ok(identity.sign_in(email.trim(), password).await?)
}

/// Re-validates a stored session: lookup, then refresh, then give up.
pub(crate) async fn restore_session<I: IdentityService>(
    identity: &I,
    stored: Option<AuthUser>,
) -> Option<AuthUser> {
    let user = stored?;

    match identity.lookup(&user).await {
        Ok(()) => return Some(user),
        Err(e) => tracing::info!(error = %e, "stored session rejected, refreshing"),
    }

    match identity.refresh(&user).await {
        Ok(renewed) => Some(renewed),
        Err(e) => {
            tracing::warn!(error = %e, "stored session could not be refreshed");
            None
        }
    }
}

/// One refresh attempt for a session the document store rejected.
/// `None` means the session is over.
pub(crate) async fn renew_session<I: IdentityService>(
    identity: &I,
    user: &AuthUser,
) -> Option<AuthUser> {
    match identity.refresh(user).await {
        Ok(renewed) => {
            tracing::info!(uid = %renewed.uid, "id token refreshed");
            Some(renewed)
        }
        Err(e) => {
            tracing::warn!(error = %e, "token refresh failed, signing out");
            None
        }
    }
}

/// Lets one renewal run at a time.
#[derive(Debug, Default)]
pub(crate) struct RenewGate {
    busy: bool,
}

impl RenewGate {
    pub fn try_enter(&mut self) -> bool {
        !std::mem::replace(&mut self.busy, true)
    }

    pub fn leave(&mut self) {
        self.busy = false;
    }
}

/// What a finished restore or renewal does with its result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Settle {
    Adopt(Option<AuthUser>),
    /// A sign-in or sign-out happened while the call ran; it wins.
    KeepCurrent,
}

pub(crate) fn settle(started_epoch: u64, current_epoch: u64, result: Option<AuthUser>) -> Settle {
    if started_epoch == current_epoch {
        Settle::Adopt(result)
    } else {
        Settle::KeepCurrent
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RouteAccess {
    /// Initial auth check still running.
    Pending,
    Granted,
    RedirectToLogin,
}

pub(crate) fn route_access(is_loading: bool, signed_in: bool) -> RouteAccess {
    match (is_loading, signed_in) {
        (true, _) => RouteAccess::Pending,
        (false, true) => RouteAccess::Granted,
        (false, false) => RouteAccess::RedirectToLogin,
    }
}

/// Created once at startup and shared through `AppContext`.
#[derive(Clone, Copy)]
pub(crate) struct Session {
    config: StoredValue<BackendConfig>,
    pub current_user: RwSignal<Option<AuthUser>>,
    pub is_loading: RwSignal<bool>,
    renewing: StoredValue<RenewGate>,
    /// Bumped by every change of signed-in user.
    auth_epoch: StoredValue<u64>,
}

impl Session {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config: StoredValue::new(config),
            current_user: RwSignal::new(None),
            is_loading: RwSignal::new(true),
            renewing: StoredValue::new(RenewGate::default()),
            auth_epoch: StoredValue::new(0),
        }
    }

    pub fn config(&self) -> BackendConfig {
        self.config.get_value()
    }

    fn epoch(&self) -> u64 {
        self.auth_epoch.try_get_value().unwrap_or_default()
    }

    fn id_token(&self) -> Option<String> {
        self.current_user
            .with_untracked(|u| u.as_ref().map(|u| u.id_token.clone()))
    }

    pub fn identity(&self) -> IdentityClient {
        IdentityClient::new(self.config())
    }

    pub fn document_store(&self) -> FirestoreClient {
        FirestoreClient::new(self.config(), self.id_token())
    }

    pub fn blob_store(&self) -> StorageClient {
        StorageClient::new(self.config(), self.id_token())
    }

    /// Resolves the stored session, then clears `is_loading`.
    pub fn start(self) {
        let stored = load_session();
        let identity = self.identity();
        let started = self.epoch();
        spawn_local(async move {
            let user = restore_session(&identity, stored).await;
            match settle(started, self.epoch(), user) {
                Settle::Adopt(user) => self.adopt(user),
                Settle::KeepCurrent => tracing::debug!("session changed during restore, keeping it"),
            }
            self.is_loading.set(false);
            tracing::debug!(signed_in = self.current_user.with_untracked(Option::is_some), "auth check done");
        });
    }

    pub async fn login(self, email: String, password: String) -> Result<AuthUser, LoginError> {
        let user = authenticate(&self.identity(), &email, &password).await?;
        self.adopt(Some(user.clone()));
        tracing::info!(uid = %user.uid, "signed in");
        Ok(user)
    }

    /// Sign-out only drops local tokens.
    pub fn logout(self) {
        self.adopt(None);
        tracing::info!("signed out");
    }

    /// Tries one token refresh; signs out when that fails.
    pub fn renew_or_sign_out(self) {
        let Some(user) = self.current_user.get_untracked() else {
            return;
        };
        if !self.renewing.try_update_value(RenewGate::try_enter).unwrap_or(false) {
            return;
        }

        let identity = self.identity();
        let started = self.epoch();
        spawn_local(async move {
            let renewed = renew_session(&identity, &user).await;
            if let Settle::Adopt(user) = settle(started, self.epoch(), renewed) {
                self.adopt(user);
            }
            self.renewing.update_value(RenewGate::leave);
        });
    }

    /// Replaces the in-memory user and mirrors it to local storage.
    fn adopt(&self, user: Option<AuthUser>) {
        let persisted = match &user {
            Some(u) => save_session(u),
            None => clear_session(),
        };
        if let Err(e) = persisted {
            tracing::error!(error = %e, "session storage update failed");
        }
        self.auth_epoch.update_value(|n| *n += 1);
        self.current_user.set(user);
    }
}
