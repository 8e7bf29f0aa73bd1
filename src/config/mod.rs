use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub(crate) const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
pub(crate) const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
pub(crate) const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0";
pub(crate) const DEFAULT_POLL_INTERVAL_MS: u32 = 4000;

/// Hosted backend settings.
///
/// Read from `window.ENV` at startup, then from build-time environment
/// variables, then defaults. The base URLs can be pointed at local emulators.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct BackendConfig {
    pub api_key: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub auth_url: String,
    pub token_url: String,
    pub firestore_url: String,
    pub storage_url: String,
    pub poll_interval_ms: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: option_env!("FIREBASE_API_KEY").unwrap_or_default().to_string(),
            project_id: option_env!("FIREBASE_PROJECT_ID")
                .unwrap_or_default()
                .to_string(),
            storage_bucket: option_env!("FIREBASE_STORAGE_BUCKET")
                .unwrap_or_default()
                .to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl BackendConfig {
    pub fn from_window() -> Self {
        let mut config = Self::default();
        if let Some(env) = window_env() {
            config.apply(|key| read_env_key(&env, key));
        }
        config
    }

    /// Overrides fields from a key lookup. Both `API_KEY` (documented) and
    /// `api_key` (legacy) spellings are accepted; upper-case wins.
    pub(crate) fn apply(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |upper: &str| {
            lookup(upper)
                .or_else(|| lookup(&upper.to_ascii_lowercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = get("PROJECT_ID") {
            self.project_id = v;
        }
        if let Some(v) = get("STORAGE_BUCKET") {
            self.storage_bucket = v;
        }
        if let Some(v) = get("AUTH_URL") {
            self.auth_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("TOKEN_URL") {
            self.token_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("FIRESTORE_URL") {
            self.firestore_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("STORAGE_URL") {
            self.storage_url = v.trim_end_matches('/').to_string();
        }
        if let Some(ms) = get("POLL_INTERVAL_MS").and_then(|v| v.parse::<u32>().ok()) {
            // Sub-second polling would hammer the hosted quota.
            self.poll_interval_ms = ms.max(1000);
        }
    }

    /// Path prefix of every document in the default database.
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_url, self.project_id
        )
    }
}

fn window_env() -> Option<wasm_bindgen::JsValue> {
    let window = web_sys::window()?;
    let env = window.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }
    Some(env.into())
}

fn read_env_key(env: &wasm_bindgen::JsValue, key: &str) -> Option<String> {
    let value = js_sys::Reflect::get(env, &key.into()).ok()?;
    value
        .as_string()
        .or_else(|| value.as_f64().map(|n| n.to_string()))
}
