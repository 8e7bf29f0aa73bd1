use super::{ExportError, ExportTable};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use std::ops::Range;

const HEADER_FILL: (u8, u8, u8) = (59, 130, 246);
const STRIPE_FILL: (u8, u8, u8) = (245, 245, 245);

/// Approximate Helvetica advance, as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const PT_TO_MM: f32 = 0.352_778;

/// Page geometry of the report, in millimetres (landscape A4).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PdfLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub title_size: f32,
    pub subtitle_size: f32,
    pub cell_size: f32,
    pub cell_padding: f32,
    /// Distance from the top edge to the table on the first page.
    pub first_table_offset: f32,
    pub row_height: f32,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            page_width: 297.0,
            page_height: 210.0,
            margin: 14.0,
            title_size: 18.0,
            subtitle_size: 12.0,
            cell_size: 6.0,
            cell_padding: 1.0,
            first_table_offset: 40.0,
            row_height: 5.0,
        }
    }
}

impl PdfLayout {
    fn table_top(&self, first_page: bool) -> f32 {
        if first_page {
            self.page_height - self.first_table_offset
        } else {
            self.page_height - self.margin
        }
    }

    /// Body rows that fit under the header on a page.
    pub fn rows_per_page(&self, first_page: bool) -> usize {
        let usable = self.table_top(first_page) - self.margin - self.row_height;
        ((usable / self.row_height).floor() as usize).max(1)
    }

    /// Splits `rows` body rows into per-page ranges.
    pub fn paginate(&self, rows: usize) -> Vec<Range<usize>> {
        let mut pages = Vec::new();
        let mut start = 0;
        while start < rows {
            let end = (start + self.rows_per_page(pages.is_empty())).min(rows);
            pages.push(start..end);
            start = end;
        }
        pages
    }

    pub fn column_width(&self, columns: usize) -> f32 {
        (self.page_width - 2.0 * self.margin) / columns.max(1) as f32
    }

    /// Longest text, in characters, that fits one cell.
    pub fn cell_chars(&self, columns: usize) -> usize {
        let glyph = self.cell_size * AVG_GLYPH_WIDTH * PT_TO_MM;
        let room = self.column_width(columns) - 2.0 * self.cell_padding;
        ((room / glyph).floor() as usize).max(1)
    }
}

fn fit(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn black() -> Color {
    rgb((0, 0, 0))
}

struct Painter<'a> {
    layout: &'a PdfLayout,
    columns: usize,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Painter<'_> {
    fn fill_row(&self, layer: &PdfLayerReference, top: f32, fill: (u8, u8, u8)) {
        let l = self.layout;
        layer.set_fill_color(rgb(fill));
        layer.add_rect(
            Rect::new(
                Mm(l.margin),
                Mm(top - l.row_height),
                Mm(l.page_width - l.margin),
                Mm(top),
            )
            .with_mode(PaintMode::Fill),
        );
    }

    fn write_row(&self, layer: &PdfLayerReference, top: f32, cells: &[String], font: &IndirectFontRef) {
        let l = self.layout;
        let width = l.column_width(self.columns);
        let max = l.cell_chars(self.columns);
        let baseline = top - l.row_height + 1.5;
        for (i, text) in cells.iter().enumerate() {
            let x = l.margin + i as f32 * width + l.cell_padding;
            layer.use_text(fit(text, max), l.cell_size, Mm(x), Mm(baseline), font);
        }
    }

    fn header(&self, layer: &PdfLayerReference, top: f32, labels: &[String]) {
        self.fill_row(layer, top, HEADER_FILL);
        layer.set_fill_color(rgb((255, 255, 255)));
        self.write_row(layer, top, labels, &self.bold);
        layer.set_fill_color(black());
    }

    fn body(&self, layer: &PdfLayerReference, top: f32, index: usize, cells: &[String]) {
        if index % 2 == 1 {
            self.fill_row(layer, top, STRIPE_FILL);
        }
        layer.set_fill_color(black());
        self.write_row(layer, top, cells, &self.regular);
    }
}

/// Title, generation date, then the table; the header repeats on every page.
pub(super) fn render(
    table: &ExportTable,
    generated_on: &str,
    layout: &PdfLayout,
) -> Result<Vec<u8>, ExportError> {
    let pdf_err = |e: printpdf::Error| ExportError::Pdf(e.to_string());
    let title = format!("Reporte de {}", table.title);

    let (doc, first_page, first_layer) = PdfDocument::new(
        title.as_str(),
        Mm(layout.page_width),
        Mm(layout.page_height),
        "Tabla",
    );
    let painter = Painter {
        layout,
        columns: table.labels.len(),
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
    };

    let first = doc.get_page(first_page).get_layer(first_layer);
    first.use_text(
        title.as_str(),
        layout.title_size,
        Mm(layout.margin),
        Mm(layout.page_height - 22.0),
        &painter.bold,
    );
    first.use_text(
        format!("Generado el: {generated_on}"),
        layout.subtitle_size,
        Mm(layout.margin),
        Mm(layout.page_height - 32.0),
        &painter.regular,
    );

    let labels: Vec<String> = table.labels.iter().map(|l| l.to_string()).collect();
    for (page_no, range) in layout.paginate(table.rows.len()).into_iter().enumerate() {
        let layer = if page_no == 0 {
            first.clone()
        } else {
            let (page, layer) = doc.add_page(
                Mm(layout.page_width),
                Mm(layout.page_height),
                format!("Tabla {}", page_no + 1),
            );
            doc.get_page(page).get_layer(layer)
        };

        let mut top = layout.table_top(page_no == 0);
        painter.header(&layer, top, &labels);
        top -= layout.row_height;

        for index in range {
            painter.body(&layer, top, index, &table.rows[index]);
            top -= layout.row_height;
        }
    }

    doc.save_to_bytes().map_err(pdf_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contract, Doc};

    fn table(n: usize) -> ExportTable {
        let docs: Vec<Doc<Contract>> = (0..n)
            .map(|i| {
                Doc::new(
                    format!("id-{i}"),
                    Contract {
                        contrato: format!("C-{i}"),
                        ..Default::default()
                    },
                )
            })
            .collect();
        ExportTable::from_docs(&docs)
    }

    #[test]
    fn test_pagination_covers_every_row_once() {
        let layout = PdfLayout::default();
        for n in [1, 5, 29, 30, 31, 120] {
            let pages = layout.paginate(n);
            let total: usize = pages.iter().map(|r| r.len()).sum();
            assert_eq!(total, n, "rows for n={n}");
            assert_eq!(pages.first().map(|r| r.start), Some(0));
            assert!(pages.windows(2).all(|w| w[0].end == w[1].start));
        }
        assert!(layout.paginate(0).is_empty());
    }

    #[test]
    fn test_later_pages_hold_more_rows() {
        let layout = PdfLayout::default();
        assert!(layout.rows_per_page(false) > layout.rows_per_page(true));

        let n = layout.rows_per_page(true) + 1;
        let pages = layout.paginate(n);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].len(), 1);
    }

    #[test]
    fn test_long_cells_are_shortened() {
        assert_eq!(fit("corto", 10), "corto");
        assert_eq!(fit("una descripción muy larga", 10), "una des...");
        assert_eq!(fit("una descripción muy larga", 10).chars().count(), 10);
    }

    #[test]
    fn test_multi_page_report_renders() {
        let layout = PdfLayout::default();
        let n = layout.rows_per_page(true) + layout.rows_per_page(false) + 3;
        let bytes = render(&table(n), "19/10/2026", &layout).expect("pdf should render");
        assert_eq!(&bytes[..5], b"%PDF-");
        assert_eq!(layout.paginate(n).len(), 3);
    }
}
