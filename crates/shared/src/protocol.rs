use serde::{Deserialize, Serialize};

/// Body of `POST /api/processExcel`.
///
/// The aliases accept the field names older clients used; new clients always
/// send the canonical camelCase names. A body carrying both a canonical name
/// and one of its aliases (`userText` and `userInput`, say) is rejected as a
/// duplicate field rather than having one silently win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default, alias = "userInput", alias = "input")]
    pub user_text: String,
    #[serde(default, alias = "excelFile", alias = "fileData", alias = "base64file")]
    pub attached_file_base64: Option<String>,
}

impl ProcessRequest {
    pub fn new(user_text: impl Into<String>, attached_file_base64: Option<String>) -> Self {
        Self {
            user_text: user_text.into(),
            attached_file_base64,
        }
    }

    /// The attached payload, ignoring an empty string.
    pub fn attachment(&self) -> Option<&str> {
        self.attached_file_base64
            .as_deref()
            .filter(|payload| !payload.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.user_text.trim().is_empty() && self.attachment().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub message: String,
    #[serde(default)]
    pub processed_file_base64: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    pub success: bool,
}

impl ProcessResponse {
    pub fn reply(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            processed_file_base64: None,
            file_name: None,
            success: true,
        }
    }

    pub fn with_file(message: impl Into<String>, processed_file_base64: String) -> Self {
        Self {
            message: message.into(),
            processed_file_base64: Some(processed_file_base64),
            file_name: None,
            success: true,
        }
    }
}
