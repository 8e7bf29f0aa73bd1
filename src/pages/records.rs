//! One page per entity: search, edit form, paged table, export.

use crate::backend::BackendError;
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, FileInput, Input, Label, Spinner, Table,
    TableBody, TableCell, TableHead, TableHeader, TableRow, TableWrapper,
};
use crate::export::{export_docs, ExportFormat};
use crate::form::{delete_record, EditForm, SubmitOutcome};
use crate::listing::{filter_docs, page_view, ListingState};
use crate::mirror::use_record_mirror;
use crate::models::{Doc, Entity, FieldKind, FieldSpec};
use crate::state::{AppContext, Session};
use crate::upload::read_file;
use leptos::prelude::*;
use leptos::task::spawn_local;
use strum::IntoEnumIterator;

fn report_write_failure(session: Session, action: &'static str, err: &BackendError) {
    tracing::error!(%action, error = %err, "write failed");
    if err.needs_reauth() {
        session.renew_or_sign_out();
    }
}

/// Full management page for `E`.
pub(crate) fn record_page<E: Entity>() -> impl IntoView {
    let session = expect_context::<AppContext>().0.session;
    let mirror = use_record_mirror::<E>(session);

    let search: RwSignal<String> = RwSignal::new(String::new());
    let listing: RwSignal<ListingState> = RwSignal::new(ListingState::default());
    Effect::new(move |_| {
        let term = search.get();
        listing.update(|l| l.set_term(term));
    });

    let page = Memo::new(move |_| mirror.docs.with(|docs| listing.with(|l| page_view(docs, l))));
    let filtered = move || mirror.docs.with(|docs| listing.with(|l| filter_docs(docs, &l.term)));

    // Text fields are bound one signal each; the file field goes through `pending_file`.
    let fields: Vec<(FieldSpec, RwSignal<String>)> = E::FIELDS
        .iter()
        .map(|f| (*f, RwSignal::new(String::new())))
        .collect();
    let fields = StoredValue::new(fields);

    let form: RwSignal<EditForm<E>> = RwSignal::new(EditForm::default());
    let submitting: RwSignal<bool> = RwSignal::new(false);
    let uploading: RwSignal<bool> = RwSignal::new(false);
    let reads_in_flight: RwSignal<u32> = RwSignal::new(0);
    let file_reset: RwSignal<u64> = RwSignal::new(0);

    let load_fields = move |values: &E| {
        fields.with_value(|fs| {
            for (field, value) in fs {
                value.set(values.get(field.key).unwrap_or_default().to_string());
            }
        });
    };

    let collect_fields = move || {
        let mut values = E::default();
        fields.with_value(|fs| {
            for (field, value) in fs.iter().filter(|(s, _)| s.kind == FieldKind::Text) {
                values.set(field.key, value.get_untracked());
            }
        });
        values
    };

    let reset_form = move || {
        form.update(|f| f.cancel());
        load_fields(&E::default());
        file_reset.update(|n| *n += 1);
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if submitting.get_untracked() || reads_in_flight.get_untracked() > 0 {
            return;
        }

        let mut draft = form.get_untracked();
        draft.merge_text_inputs(collect_fields());

        submitting.set(true);
        uploading.set(draft.pending_file.is_some());

        let store = session.document_store();
        let blobs = session.blob_store();
        spawn_local(async move {
            match draft.submit(&store, &blobs).await {
                Ok(outcome) => {
                    match &outcome {
                        SubmitOutcome::Created(id) => {
                            tracing::info!(collection = E::COLLECTION, %id, "record created")
                        }
                        SubmitOutcome::Updated(id) => {
                            tracing::info!(collection = E::COLLECTION, %id, "record updated")
                        }
                    }
                    reset_form();
                    mirror.refresh.run(());
                }
                Err(e) => report_write_failure(session, "save", e.cause()),
            }
            submitting.set(false);
            uploading.set(false);
        });
    };

    let on_cancel = move |_: web_sys::MouseEvent| reset_form();

    let on_pick = Callback::new(move |file: Option<web_sys::File>| {
        let Some(file) = file else {
            form.update(|f| f.clear_file());
            return;
        };
        let Some(ticket) = form.try_update(|f| f.begin_file_read()) else {
            return;
        };
        reads_in_flight.update(|n| *n += 1);
        spawn_local(async move {
            match read_file(&file).await {
                Ok(payload) => {
                    let kept = form
                        .try_update(|f| f.finish_file_read(ticket, payload))
                        .unwrap_or(false);
                    if !kept {
                        tracing::debug!(collection = E::COLLECTION, "picked file superseded");
                    }
                }
                Err(e) => tracing::error!(error = %e, "could not read picked file"),
            }
            reads_in_flight.update(|n| *n = n.saturating_sub(1));
        });
    });

    let on_edit = move |doc: Doc<E>| {
        form.update(|f| f.begin_edit(&doc));
        load_fields(&doc.data);
        file_reset.update(|n| *n += 1);
    };

    let on_delete = move |id: String| {
        let store = session.document_store();
        spawn_local(async move {
            let confirm = |msg: &str| window().confirm_with_message(msg).unwrap_or(false);
            match delete_record::<E, _>(&store, &id, confirm).await {
                Ok(true) => {
                    tracing::info!(collection = E::COLLECTION, %id, "record deleted");
                    mirror.refresh.run(());
                }
                Ok(false) => {}
                Err(e) => report_write_failure(session, "delete", &e),
            }
        });
    };

    let on_export = move |format: ExportFormat| {
        let docs = filtered();
        if let Err(e) = export_docs::<E>(format, &docs) {
            tracing::error!(collection = E::COLLECTION, %format, error = %e, "export failed");
        }
    };

    let submit_label = move || {
        if uploading.get() {
            "Subiendo..."
        } else {
            form.with(|f| f.submit_label())
        }
    };
    let submit_disabled = move || submitting.get() || reads_in_flight.get() > 0;

    let columns = E::FIELDS.len() + 1;

    view! {
        <div class="space-y-6">
            <div class="flex flex-wrap items-center justify-between gap-3">
                <h1 class="text-2xl font-semibold">{format!("Gestión de {}", E::TITLE)}</h1>
                <div class="flex items-center gap-2">
                    {ExportFormat::iter()
                        .map(|format| {
                            view! {
                                <Button
                                    variant=ButtonVariant::Outline
                                    size=ButtonSize::Sm
                                    attr:r#type="button"
                                    attr:disabled=move || page.with(|p| p.filtered_count == 0)
                                    on:click=move |_| on_export(format)
                                >
                                    {format.button_label()}
                                </Button>
                            }
                        })
                        .collect_view()}
                </div>
            </div>

            <Input
                r#type="text"
                placeholder="Buscar por cualquier campo..."
                bind_value=search
                class="h-9"
            />

            <Card>
                <CardContent>
                    <form class="grid grid-cols-1 gap-4 md:grid-cols-3" on:submit=on_submit>
                        {fields
                            .get_value()
                            .into_iter()
                            .map(|(field, value)| {
                                let input_id = format!("{}-{}", E::COLLECTION, field.key);
                                let input = match field.kind {
                                    FieldKind::Text => view! {
                                        <Input id=input_id.clone() bind_value=value class="h-8 text-sm" />
                                    }
                                    .into_any(),
                                    FieldKind::File => view! {
                                        <FileInput
                                            id=input_id.clone()
                                            on_pick=on_pick
                                            reset=file_reset
                                            class="h-8 text-sm"
                                        />
                                    }
                                    .into_any(),
                                };
                                view! {
                                    <div class="flex flex-col gap-1.5">
                                        <Label html_for=input_id class="text-xs">{field.label}</Label>
                                        {input}
                                    </div>
                                }
                            })
                            .collect_view()}

                        <div class="col-span-1 flex justify-end gap-3 md:col-span-3">
                            <Button size=ButtonSize::Sm attr:r#type="submit" attr:disabled=submit_disabled>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=submit_disabled fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {submit_label}
                                </span>
                            </Button>
                            <Button
                                variant=ButtonVariant::Secondary
                                size=ButtonSize::Sm
                                attr:r#type="button"
                                on:click=on_cancel
                            >
                                "Cancelar"
                            </Button>
                        </div>
                    </form>
                </CardContent>
            </Card>

            <TableWrapper>
                <Table>
                    <TableHeader>
                        <TableRow>
                            {E::FIELDS
                                .iter()
                                .map(|f| view! { <TableHead>{f.label}</TableHead> })
                                .collect_view()}
                            <TableHead>"Acciones"</TableHead>
                        </TableRow>
                    </TableHeader>
                    <TableBody>
                        {move || {
                            let rows = page.with(|p| p.rows.clone());
                            if rows.is_empty() {
                                return view! {
                                    <TableRow>
                                        <TableCell
                                            class="py-6 text-center text-muted-foreground"
                                            attr:colspan=columns.to_string()
                                        >
                                            "No se encontraron resultados."
                                        </TableCell>
                                    </TableRow>
                                }
                                .into_any();
                            }

                            rows.into_iter()
                                .map(|doc| {
                                    let cells = E::FIELDS
                                        .iter()
                                        .map(|f| {
                                            let value = doc.data.get(f.key).unwrap_or_default().to_string();
                                            match f.kind {
                                                FieldKind::File if !value.is_empty() => view! {
                                                    <TableCell>
                                                        <a
                                                            class="text-primary underline underline-offset-4"
                                                            href=value
                                                            target="_blank"
                                                            rel="noopener noreferrer"
                                                        >
                                                            "Ver archivo"
                                                        </a>
                                                    </TableCell>
                                                }
                                                .into_any(),
                                                _ => view! { <TableCell>{value}</TableCell> }.into_any(),
                                            }
                                        })
                                        .collect_view();

                                    let id_for_delete = doc.id.clone();
                                    let doc_for_edit = doc.clone();
                                    view! {
                                        <TableRow>
                                            {cells}
                                            <TableCell>
                                                <div class="flex items-center gap-2">
                                                    <Button
                                                        variant=ButtonVariant::Success
                                                        size=ButtonSize::Xs
                                                        attr:r#type="button"
                                                        on:click=move |_| on_edit(doc_for_edit.clone())
                                                    >
                                                        "Editar"
                                                    </Button>
                                                    <Button
                                                        variant=ButtonVariant::Destructive
                                                        size=ButtonSize::Xs
                                                        attr:r#type="button"
                                                        on:click=move |_| on_delete(id_for_delete.clone())
                                                    >
                                                        "Eliminar"
                                                    </Button>
                                                </div>
                                            </TableCell>
                                        </TableRow>
                                    }
                                })
                                .collect_view()
                                .into_any()
                        }}
                    </TableBody>
                </Table>
            </TableWrapper>

            <div class="flex items-center justify-center gap-4 text-sm">
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:r#type="button"
                    attr:disabled=move || page.with(|p| p.page <= 1)
                    on:click=move |_| {
                        let current = page.with_untracked(|p| p.page);
                        listing.update(|l| {
                            l.page = current;
                            l.prev();
                        });
                    }
                >
                    "Anterior"
                </Button>
                <span class="text-muted-foreground">
                    {move || page.with(|p| format!("Página {} de {}", p.page, p.total_pages.max(1)))}
                </span>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:r#type="button"
                    attr:disabled=move || page.with(|p| p.page >= p.total_pages)
                    on:click=move |_| {
                        let (current, total) = page.with_untracked(|p| (p.page, p.total_pages));
                        listing.update(|l| {
                            l.page = current;
                            l.next(total);
                        });
                    }
                >
                    "Siguiente"
                </Button>
            </div>
        </div>
    }
}
