//! Spreadsheet and PDF reports of the filtered record list.

mod pdf;
mod xlsx;

pub(crate) use pdf::PdfLayout;

use crate::models::{Doc, Entity};
use thiserror::Error;
use wasm_bindgen::JsCast;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ExportFormat {
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Self::Xlsx => "Exportar Excel",
            Self::Pdf => "Exportar PDF",
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ExportError {
    #[error("nothing to export")]
    Empty,

    #[error("spreadsheet encoding failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("pdf encoding failed: {0}")]
    Pdf(String),

    #[error("download failed: {0}")]
    Browser(String),
}

impl ExportError {
    fn browser(e: wasm_bindgen::JsValue) -> Self {
        Self::Browser(format!("{e:?}"))
    }
}

/// Records flattened to strings, identifier omitted, declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ExportTable {
    pub title: &'static str,
    pub collection: &'static str,
    pub keys: Vec<&'static str>,
    pub labels: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn from_docs<E: Entity>(docs: &[Doc<E>]) -> Self {
        Self {
            title: E::TITLE,
            collection: E::COLLECTION,
            keys: E::FIELDS.iter().map(|f| f.key).collect(),
            labels: E::FIELDS.iter().map(|f| f.label).collect(),
            rows: docs
                .iter()
                .map(|d| d.data.values().into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    pub fn file_name(&self, format: ExportFormat) -> String {
        format!("{}.{}", self.collection, format)
    }
}

/// "19/10/2026", local time.
pub(crate) fn generated_on() -> String {
    chrono::Local::now().format("%-d/%-m/%Y").to_string()
}

pub(crate) fn encode(format: ExportFormat, table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    if table.rows.is_empty() {
        return Err(ExportError::Empty);
    }
    match format {
        ExportFormat::Xlsx => xlsx::render(table),
        ExportFormat::Pdf => pdf::render(table, &generated_on(), &PdfLayout::default()),
    }
}

/// Encodes and hands the file to the browser as a download.
pub(crate) fn export_docs<E: Entity>(format: ExportFormat, docs: &[Doc<E>]) -> Result<(), ExportError> {
    let table = ExportTable::from_docs(docs);
    let bytes = encode(format, &table)?;
    let name = table.file_name(format);
    download_bytes(&name, format.mime_type(), &bytes)?;
    tracing::info!(file = %name, rows = table.rows.len(), size = bytes.len(), "export downloaded");
    Ok(())
}

fn download_bytes(file_name: &str, mime: &str, bytes: &[u8]) -> Result<(), ExportError> {
    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes));

    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(ExportError::browser)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(ExportError::browser)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ExportError::Browser("no document".to_string()))?;
    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")
        .map_err(ExportError::browser)?
        .dyn_into()
        .map_err(|_| ExportError::Browser("anchor cast".to_string()))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    web_sys::Url::revoke_object_url(&url).map_err(ExportError::browser)
}
