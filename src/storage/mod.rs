use crate::backend::{BackendError, BackendResult};
use crate::models::AuthUser;
use serde::{Deserialize, Serialize};

/// Persisted signed-in account (ID token and refresh token included).
pub(crate) const SESSION_KEY: &str = "inmobiliaria_session";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = local_storage()?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) -> BackendResult<()> {
    let json = serde_json::to_string(value).map_err(BackendError::parse)?;
    let storage = local_storage().ok_or(BackendError::Config("local storage"))?;
    storage.set_item(key, &json).map_err(BackendError::browser)
}

pub(crate) fn remove_from_storage(key: &str) -> BackendResult<()> {
    let storage = local_storage().ok_or(BackendError::Config("local storage"))?;
    storage.remove_item(key).map_err(BackendError::browser)
}

pub(crate) fn load_session() -> Option<AuthUser> {
    load_json_from_storage::<AuthUser>(SESSION_KEY)
        .filter(|u| !u.id_token.is_empty() && !u.uid.is_empty())
}

pub(crate) fn save_session(user: &AuthUser) -> BackendResult<()> {
    save_json_to_storage(SESSION_KEY, user)
}

pub(crate) fn clear_session() -> BackendResult<()> {
    remove_from_storage(SESSION_KEY)
}
