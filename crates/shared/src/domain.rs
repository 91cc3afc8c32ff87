use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(EntryId);

pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME_TYPE: &str = "application/vnd.ms-excel";

pub const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];
pub const ACCEPTED_MIME_TYPES: &[&str] = &[XLSX_MIME_TYPE, XLS_MIME_TYPE];

pub const PROCESS_ROUTE: &str = "/api/processExcel";

/// Who authored a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Error,
}

/// True when the file name or MIME type names one of the two spreadsheet
/// container formats the backend accepts.
pub fn is_accepted_spreadsheet(file_name: &str, mime_type: Option<&str>) -> bool {
    if let Some(mime) = mime_type {
        if ACCEPTED_MIME_TYPES
            .iter()
            .any(|accepted| mime.trim().eq_ignore_ascii_case(accepted))
        {
            return true;
        }
    }

    file_extension(file_name)
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

/// File name with a trailing `.xlsx` / `.xls` removed.
pub fn spreadsheet_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && ACCEPTED_EXTENSIONS
                    .iter()
                    .any(|accepted| ext.eq_ignore_ascii_case(accepted)) =>
        {
            stem
        }
        _ => file_name,
    }
}

fn file_extension(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    base.rsplit_once('.').map(|(_, ext)| ext)
}
