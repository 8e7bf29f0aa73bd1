use crate::models::{Attachment, Client, Contract, PortfolioEntry, Property};
use crate::pages::{record_page, HomePage, LoginPage, Protected};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();
    state.session.start();
    provide_context(AppContext(state));

    // Route paths are case-sensitive and kept as published links expect them.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Página no encontrada"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("inmuebles") view=move || view! {
                    <Protected>{record_page::<Property>()}</Protected>
                } />
                <Route path=path!("clientes") view=move || view! {
                    <Protected>{record_page::<Client>()}</Protected>
                } />
                <Route path=path!("Contratos") view=move || view! {
                    <Protected>{record_page::<Contract>()}</Protected>
                } />
                <Route path=path!("Cartera") view=move || view! {
                    <Protected>{record_page::<PortfolioEntry>()}</Protected>
                } />
                <Route path=path!("Anexos") view=move || view! {
                    <Protected>{record_page::<Attachment>()}</Protected>
                } />
                <Route path=path!("") view=move || view! {
                    <Protected>
                        <HomePage />
                    </Protected>
                } />
            </Routes>
        </Router>
    }
}
