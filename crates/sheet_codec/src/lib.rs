//! In-memory spreadsheet codec: container bytes to ordered named sheets and back.

use std::{collections::HashMap, fmt, io::Cursor};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use rust_xlsxwriter::{Workbook as XlsxWorkbook, XlsxError};
use thiserror::Error;
use tracing::debug;

pub mod preview;

pub use preview::PreviewTable;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("not a readable spreadsheet container: {0}")]
    Container(String),
    #[error("failed to read sheet '{sheet}': {reason}")]
    Sheet { sheet: String, reason: String },
    #[error("duplicate sheet name '{0}'")]
    DuplicateSheet(String),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("workbook has no sheets")]
    NoSheets,
    #[error("cell ({row}, {col}) in sheet '{sheet}' is outside the writable grid")]
    OutOfBounds {
        sheet: String,
        row: usize,
        col: usize,
    },
    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] XlsxError),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<&Data> for CellValue {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(n) => CellValue::Number(*n),
            Data::Int(n) => CellValue::Number(*n as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            // Dates stay as their serial number, the way the container stores them.
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::String(e.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::String(s) => f.write_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
        }
    }
}

/// One named grid. Rows keep their own length; nothing is padded here.
///
/// Rows are held in canonical form: `String("")` is stored as `Empty`,
/// trailing empty cells are trimmed and trailing empty rows dropped. A
/// container cannot tell those shapes apart, so this is the form `decode`
/// returns and the form `encode` round-trips.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut sheet = Self {
            name: name.into(),
            rows,
        };
        sheet.normalize();
        sheet
    }

    fn normalize(&mut self) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if matches!(cell, CellValue::String(text) if text.is_empty()) {
                    *cell = CellValue::Empty;
                }
            }
            while row.last().is_some_and(CellValue::is_empty) {
                row.pop();
            }
        }
        while self.rows.last().is_some_and(Vec::is_empty) {
            self.rows.pop();
        }
    }

    pub fn max_row_len(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    by_name: HashMap<String, usize>,
}

impl Workbook {
    /// Sheets are re-normalized here, so rows edited after `Sheet::new`
    /// cannot leave a workbook in a shape the container cannot hold.
    pub fn from_sheets(mut sheets: Vec<Sheet>) -> Result<Self, FormatError> {
        let mut by_name = HashMap::with_capacity(sheets.len());
        for (idx, sheet) in sheets.iter_mut().enumerate() {
            sheet.normalize();
            if by_name.insert(sheet.name.clone(), idx).is_some() {
                return Err(FormatError::DuplicateSheet(sheet.name.clone()));
            }
        }
        Ok(Self { sheets, by_name })
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.by_name.get(name).map(|&idx| &self.sheets[idx])
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Decodes an `.xlsx`, `.xls`, `.xlsb` or `.ods` container held in memory.
///
/// Empty input is an empty workbook, not an error.
pub fn decode(bytes: &[u8]) -> Result<Workbook, FormatError> {
    if bytes.is_empty() {
        return Ok(Workbook::default());
    }

    let mut container: Sheets<Cursor<Vec<u8>>> = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| FormatError::Container(e.to_string()))?;

    let sheet_names: Vec<String> = container.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in sheet_names {
        let range = container
            .worksheet_range(&sheet_name)
            .map_err(|e| FormatError::Sheet {
                sheet: sheet_name.clone(),
                reason: e.to_string(),
            })?;

        let mut rows = Vec::new();
        if let Some((start_row, start_col)) = range.start() {
            rows.resize_with(start_row as usize, Vec::new);
            for source_row in range.rows() {
                rows.push(
                    std::iter::repeat(CellValue::Empty)
                        .take(start_col as usize)
                        .chain(source_row.iter().map(CellValue::from))
                        .collect(),
                );
            }
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "decoded sheet");
        sheets.push(Sheet::new(sheet_name, rows));
    }

    Workbook::from_sheets(sheets)
}

/// base64 text to raw bytes to workbook.
pub fn decode_base64(payload: &str) -> Result<Workbook, FormatError> {
    let bytes = decode_base64_bytes(payload)?;
    decode(&bytes)
}

pub fn decode_base64_bytes(payload: &str) -> Result<Vec<u8>, FormatError> {
    Ok(STANDARD.decode(payload.trim())?)
}

pub fn encode_base64_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Writes the workbook as an `.xlsx` container.
pub fn encode(workbook: &Workbook) -> Result<Vec<u8>, EncodeError> {
    if workbook.is_empty() {
        return Err(EncodeError::NoSheets);
    }

    let mut xlsx = XlsxWorkbook::new();
    for sheet in workbook.sheets() {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let out_of_bounds = || EncodeError::OutOfBounds {
                    sheet: sheet.name.clone(),
                    row: row_idx,
                    col: col_idx,
                };
                let row32 = u32::try_from(row_idx).map_err(|_| out_of_bounds())?;
                let col16 = u16::try_from(col_idx).map_err(|_| out_of_bounds())?;

                match cell {
                    CellValue::Empty => {}
                    CellValue::String(s) => {
                        worksheet.write_string(row32, col16, s)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(row32, col16, *n)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row32, col16, *b)?;
                    }
                }
            }
        }
    }

    Ok(xlsx.save_to_buffer()?)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
