use crate::Sheet;

/// A sheet laid out for display: every row has the same number of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTable {
    pub sheet_name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PreviewTable {
    /// `None` for a sheet with no rows. The first row is the header; blank or
    /// missing header cells are named `Column N`.
    pub fn from_sheet(sheet: &Sheet) -> Option<Self> {
        let (first, rest) = sheet.rows.split_first()?;
        let column_count = sheet.max_row_len().max(1);

        let header = (0..column_count)
            .map(|col| {
                let text = first.get(col).map(ToString::to_string).unwrap_or_default();
                if text.is_empty() {
                    format!("Column {}", col + 1)
                } else {
                    text
                }
            })
            .collect();

        let rows = rest
            .iter()
            .map(|row| {
                (0..column_count)
                    .map(|col| row.get(col).map(ToString::to_string).unwrap_or_default())
                    .collect()
            })
            .collect();

        Some(Self {
            sheet_name: sheet.name.clone(),
            header,
            rows,
        })
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Plain-text rendering with left-aligned, space-padded columns.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render_row = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(render_row(&self.header));
        lines.push(
            widths
                .iter()
                .map(|width| "-".repeat(*width))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        lines.extend(self.rows.iter().map(|row| render_row(row)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellValue;

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    #[test]
    fn pads_ragged_rows_to_widest_row() {
        let sheet = Sheet::new(
            "Jan",
            vec![
                vec![text("Region"), text("Units")],
                vec![text("North"), CellValue::Number(12.0), text("late")],
                vec![],
                vec![text("South")],
            ],
        );

        let table = PreviewTable::from_sheet(&sheet).expect("table");
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.header, vec!["Region", "Units", "Column 3"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["North".to_string(), "12".to_string(), "late".to_string()],
                vec![String::new(), String::new(), String::new()],
                vec!["South".to_string(), String::new(), String::new()],
            ]
        );
    }

    #[test]
    fn blank_header_cells_get_placeholder_names() {
        let sheet = Sheet::new(
            "Data",
            vec![vec![CellValue::Empty, text("Total")], vec![CellValue::Number(0.0)]],
        );
        let table = PreviewTable::from_sheet(&sheet).expect("table");
        assert_eq!(table.header, vec!["Column 1", "Total"]);
        assert_eq!(table.rows, vec![vec!["0".to_string(), String::new()]]);
    }

    #[test]
    fn empty_sheet_has_no_table() {
        assert!(PreviewTable::from_sheet(&Sheet::new("Blank", Vec::new())).is_none());
    }

    #[test]
    fn empty_header_row_still_has_placeholder_columns() {
        let sheet = Sheet::new("S", vec![vec![], vec![CellValue::Number(1.0)]]);
        let table = PreviewTable::from_sheet(&sheet).expect("table");
        assert_eq!(table.header, vec!["Column 1"]);
        assert_eq!(table.rows, vec![vec!["1".to_string()]]);
    }

    #[test]
    fn sheet_of_only_blank_rows_has_no_table() {
        let sheet = Sheet::new("S", vec![vec![], vec![CellValue::Empty]]);
        assert!(PreviewTable::from_sheet(&sheet).is_none());
    }

    #[test]
    fn renders_aligned_text() {
        let sheet = Sheet::new(
            "Feb",
            vec![
                vec![text("Item"), text("Qty")],
                vec![text("Widget"), CellValue::Number(2.5)],
                vec![text("Gear"), CellValue::Bool(true)],
            ],
        );
        let rendered = PreviewTable::from_sheet(&sheet).expect("table").to_text();
        assert_eq!(
            rendered,
            "Item   | Qty\n-------+-----\nWidget | 2.5\nGear   | TRUE"
        );
    }
}
