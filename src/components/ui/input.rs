use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

const INPUT_CLASS: &str = "file:text-foreground placeholder:text-muted-foreground selection:bg-primary selection:text-primary-foreground border-input flex h-9 w-full min-w-0 rounded-md border bg-transparent px-3 py-1 text-base shadow-xs transition-[color,box-shadow] outline-none file:inline-flex file:h-7 file:border-0 file:bg-transparent file:text-sm file:font-medium disabled:pointer-events-none disabled:cursor-not-allowed disabled:opacity-50 md:text-sm focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2";

fn event_input(ev: &web_sys::Event) -> Option<web_sys::HtmlInputElement> {
    ev.target()?.dyn_into::<web_sys::HtmlInputElement>().ok()
}

#[component]
pub fn Input(
    #[prop(into, optional)] class: String,

    #[prop(into, default = "text")] r#type: &'static str,
    #[prop(into, optional)] placeholder: String,
    #[prop(into, optional)] name: String,
    #[prop(into, optional)] id: String,
    #[prop(optional)] required: bool,
    #[prop(into, optional)] autocomplete: String,

    // Two-way binding, wired by hand rather than `bind:value`.
    #[prop(into)] bind_value: RwSignal<String>,
) -> impl IntoView {
    let merged_class = tw_merge!(INPUT_CLASS, class);

    let on_input = move |ev: web_sys::Event| {
        if let Some(input) = event_input(&ev) {
            bind_value.set(input.value());
        }
    };

    view! {
        <input
            data-name="Input"
            type=r#type
            class=merged_class
            placeholder=placeholder
            name=name
            id=id
            required=required
            autocomplete=autocomplete
            prop:value=move || bind_value.get()
            on:input=on_input
        />
    }
}

/// File picker. Emits the picked file, or `None` when the selection is cleared.
///
/// `reset` bumps whenever the owning form resets, which clears the native
/// picker (its value cannot be bound like a text input).
#[component]
pub fn FileInput(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] id: String,
    #[prop(into)] on_pick: Callback<Option<web_sys::File>>,
    #[prop(into)] reset: Signal<u64>,
) -> impl IntoView {
    let merged_class = tw_merge!(INPUT_CLASS, class);

    let on_change = move |ev: web_sys::Event| {
        let file = event_input(&ev)
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        on_pick.run(file);
    };

    view! {
        <input
            data-name="FileInput"
            type="file"
            accept="*/*"
            class=merged_class
            id=id
            prop:value=move || {
                reset.track();
                String::new()
            }
            on:change=on_change
        />
    }
}
