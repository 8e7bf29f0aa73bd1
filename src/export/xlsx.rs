use super::{ExportError, ExportTable};
use rust_xlsxwriter::{Format, Workbook};

const MAX_SHEET_NAME: usize = 31;

/// One cell write: row 0 is the header of field keys.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Cell<'a> {
    pub row: u32,
    pub col: u16,
    pub text: &'a str,
    pub header: bool,
}

pub(super) fn cells(table: &ExportTable) -> Vec<Cell<'_>> {
    let header = table.keys.iter().enumerate().map(|(c, key)| Cell {
        row: 0,
        col: c as u16,
        text: key,
        header: true,
    });
    let body = table.rows.iter().enumerate().flat_map(|(r, values)| {
        values.iter().enumerate().map(move |(c, v)| Cell {
            row: r as u32 + 1,
            col: c as u16,
            text: v.as_str(),
            header: false,
        })
    });
    header.chain(body).collect()
}

/// Worksheet names are capped at 31 characters and exclude `[]:*?/\`.
pub(super) fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();
    if cleaned.trim().is_empty() {
        "Hoja1".to_string()
    } else {
        cleaned
    }
}

pub(super) fn render(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(table.title))?;
    for cell in cells(table) {
        if cell.header {
            sheet.write_string_with_format(cell.row, cell.col, cell.text, &bold)?;
        } else {
            sheet.write_string(cell.row, cell.col, cell.text)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, Doc};

    fn table(n: usize) -> ExportTable {
        let docs: Vec<Doc<Client>> = (0..n)
            .map(|i| {
                Doc::new(
                    format!("id-{i}"),
                    Client {
                        nombre: format!("Cliente {i}"),
                        ..Default::default()
                    },
                )
            })
            .collect();
        ExportTable::from_docs(&docs)
    }

    #[test]
    fn test_one_data_row_per_record() {
        let t = table(7);
        let cells = cells(&t);
        let max_row = cells.iter().map(|c| c.row).max().unwrap_or_default();
        assert_eq!(max_row, 7);

        let header: Vec<&str> = cells.iter().filter(|c| c.header).map(|c| c.text).collect();
        assert_eq!(header, t.keys);
        assert!(cells.iter().filter(|c| c.header).all(|c| c.row == 0));
        assert_eq!(cells.len(), t.keys.len() * 8);
    }

    #[test]
    fn test_values_follow_declaration_order() {
        let t = table(1);
        let nombre_col = t.keys.iter().position(|k| *k == "nombre").expect("nombre column");
        let cell = cells(&t)
            .into_iter()
            .find(|c| c.row == 1 && c.col as usize == nombre_col)
            .expect("nombre cell");
        assert_eq!(cell.text, "Cliente 0");
    }

    #[test]
    fn test_sheet_name_rules() {
        assert_eq!(sheet_name("Cartera"), "Cartera");
        assert_eq!(sheet_name("A/B: [x]"), "AB x");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sheet_name("??"), "Hoja1");
    }
}
