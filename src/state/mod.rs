mod session;

pub(crate) use session::{route_access, RouteAccess, Session};

use crate::config::BackendConfig;
use leptos::prelude::*;

#[derive(Clone)]
pub(crate) struct AppState {
    pub session: Session,

    /// Global UI state.
    pub sidebar_collapsed: RwSignal<bool>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: Session::new(BackendConfig::from_window()),
            sidebar_collapsed: RwSignal::new(false),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
