mod records;

pub(crate) use records::record_page;

use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardTitle, Input, Label, Spinner,
};
use crate::state::{route_access, AppContext, RouteAccess};
use icons::{Building, FileText, House, LogOut, Paperclip, Users, Wallet};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::{use_location, use_navigate};
use leptos_router::NavigateOptions;

fn replace_history() -> NavigateOptions {
    NavigateOptions {
        replace: true,
        ..Default::default()
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let session = expect_context::<AppContext>().0.session;
    let navigate = StoredValue::new(use_navigate());

    // Already signed in (restored session): nothing to do here.
    Effect::new(move |_| {
        if !session.is_loading.get() && session.current_user.with(Option::is_some) {
            navigate.with_value(|nav| nav("/", replace_history()));
        }
    });

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let email_val = email.get_untracked();
        let password_val = password.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match session.login(email_val, password_val).await {
                Ok(_) => navigate.with_value(|nav| nav("/", Default::default())),
                Err(e) => {
                    tracing::warn!(error = %e, "login rejected");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Iniciar sesión"</CardTitle>
                        <CardDescription class="text-xs">"Ingresa tu correo y contraseña."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit novalidate=true>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Correo electrónico"</Label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    autocomplete="email"
                                    bind_value=email
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Contraseña"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    autocomplete="current-password"
                                    bind_value=password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                {move || {
                                    error.get().map(|e| {
                                        view! {
                                            <Alert class="border-destructive/30">
                                                <AlertDescription class="text-destructive text-xs">
                                                    {e}
                                                </AlertDescription>
                                            </Alert>
                                        }
                                    })
                                }}
                            </Show>

                            <Button
                                class="w-full"
                                size=ButtonSize::Sm
                                attr:disabled=move || loading.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Enviando..." } else { "Iniciar sesión" }}
                                </span>
                            </Button>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

/// Gate for every route but `/login`.
#[component]
pub fn Protected(children: ChildrenFn) -> impl IntoView {
    let session = expect_context::<AppContext>().0.session;
    let navigate = StoredValue::new(use_navigate());

    let access = Memo::new(move |_| {
        route_access(
            session.is_loading.get(),
            session.current_user.with(Option::is_some),
        )
    });

    Effect::new(move |_| {
        if access.get() == RouteAccess::RedirectToLogin {
            navigate.with_value(|nav| nav("/login", replace_history()));
        }
    });

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        {move || match access.get() {
            RouteAccess::Pending => view! {
                <div class="flex min-h-screen items-center justify-center text-muted-foreground">
                    <Spinner class="size-6" />
                </div>
            }
            .into_any(),
            RouteAccess::Granted => view! {
                <AppLayout>
                    {move || children.with_value(|c| c())}
                </AppLayout>
            }
            .into_any(),
            RouteAccess::RedirectToLogin => ().into_any(),
        }}
    }
}

const NAV_ITEMS: &[(&str, &str)] = &[
    ("/", "Inicio"),
    ("/inmuebles", "Inmuebles"),
    ("/clientes", "Clientes"),
    ("/Contratos", "Contratos"),
    ("/Cartera", "Cartera"),
    ("/Anexos", "Anexos"),
];

fn nav_icon(href: &str) -> AnyView {
    match href {
        "/inmuebles" => view! { <Building /> }.into_any(),
        "/clientes" => view! { <Users /> }.into_any(),
        "/Contratos" => view! { <FileText /> }.into_any(),
        "/Cartera" => view! { <Wallet /> }.into_any(),
        "/Anexos" => view! { <Paperclip /> }.into_any(),
        _ => view! { <House /> }.into_any(),
    }
}

#[component]
pub fn AppLayout(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let session = app_state.0.session;
    let sidebar_collapsed = app_state.0.sidebar_collapsed;

    let pathname = use_location().pathname;

    let sidebar_width_class = move || {
        if sidebar_collapsed.get() {
            "w-14"
        } else {
            "w-64"
        }
    };

    let on_logout = move |_: web_sys::MouseEvent| session.logout();

    view! {
        <div class="flex min-h-screen bg-background text-foreground">
            <aside class=move || {
                format!(
                    "sticky top-0 flex h-screen shrink-0 flex-col gap-4 border-r bg-card p-3 transition-[width] {}",
                    sidebar_width_class(),
                )
            }>
                <div class="flex items-center justify-between">
                    <Show when=move || !sidebar_collapsed.get() fallback=|| ().into_view()>
                        <span class="px-2 text-lg font-semibold">"Menú"</span>
                    </Show>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        attr:title="Contraer menú"
                        on:click=move |_| sidebar_collapsed.update(|c| *c = !*c)
                    >
                        {move || if sidebar_collapsed.get() { "»" } else { "«" }}
                    </Button>
                </div>

                <nav class="flex flex-col gap-1">
                    {NAV_ITEMS
                        .iter()
                        .map(|&(href, label)| {
                            let item_class = move || {
                                let base = "flex items-center gap-3 rounded-md px-3 py-2 text-sm transition-colors hover:bg-accent hover:text-accent-foreground";
                                if pathname.get() == href {
                                    format!("{base} bg-accent font-medium")
                                } else {
                                    base.to_string()
                                }
                            };
                            view! {
                                <A href=href attr:class=item_class>
                                    <span class="text-muted-foreground">{nav_icon(href)}</span>
                                    <Show when=move || !sidebar_collapsed.get() fallback=|| ().into_view()>
                                        <span>{label}</span>
                                    </Show>
                                </A>
                            }
                        })
                        .collect_view()}
                </nav>

                <div class="mt-auto flex flex-col gap-2">
                    <Show when=move || !sidebar_collapsed.get() fallback=|| ().into_view()>
                        <div class="truncate px-3 text-xs text-muted-foreground">
                            {move || session.current_user.with(|u| u.as_ref().map(|u| u.email.clone()).unwrap_or_default())}
                        </div>
                    </Show>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        class="w-full justify-start"
                        on:click=on_logout
                    >
                        <LogOut />
                        <Show when=move || !sidebar_collapsed.get() fallback=|| ().into_view()>
                            <span>"Cerrar sesión"</span>
                        </Show>
                    </Button>
                </div>
            </aside>

            <main class="min-w-0 flex-1 p-6">
                {move || children()}
            </main>
        </div>
    }
}

const FEATURES: &[&str] = &[
    "Gestión de inmuebles residenciales y comerciales",
    "Administración de arriendos y ocupación",
    "Control y digitalización de contratos y anexos",
];

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <div class="max-w-3xl space-y-6">
            <div class="space-y-3">
                <h1 class="text-3xl font-semibold">"Fernando Gómez e Hijos"</h1>
                <p class="text-muted-foreground">
                    "Bienvenido al sistema gestor de inmuebles. Administra propiedades, arriendos, contratos y cartera desde una plataforma centralizada."
                </p>
            </div>

            <ul class="space-y-3">
                {FEATURES
                    .iter()
                    .map(|f| {
                        view! {
                            <li class="flex items-center gap-3">
                                <span class="size-2 rounded-full bg-primary"></span>
                                <span>{*f}</span>
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>

            <div class="grid gap-3 sm:grid-cols-2 lg:grid-cols-3">
                {NAV_ITEMS
                    .iter()
                    .skip(1)
                    .map(|&(href, label)| {
                        view! {
                            <A href=href attr:class="block">
                                <Card class="transition-colors hover:bg-accent/50">
                                    <CardHeader>
                                        <CardTitle class="flex items-center gap-2 text-sm">
                                            {nav_icon(href)}
                                            {label}
                                        </CardTitle>
                                    </CardHeader>
                                </Card>
                            </A>
                        }
                    })
                    .collect_view()}
            </div>
        </div>
    }
}
