//! Tolerant parsing of processing-endpoint responses.
//!
//! The canonical response fields come first in every table below; the rest are
//! names older backends used and can go once every backend speaks the canonical
//! envelope.

use serde_json::{Map, Value};
use shared::protocol::ProcessResponse;
use tracing::debug;

use crate::error::TransportError;

pub const DEFAULT_REPLY: &str = "Request processed successfully";
pub const EMPTY_BODY_REPLY: &str = "Request sent successfully";
pub const FAILED_TO_PROCESS: &str = "Failed to process file";

/// A named lookup of a string at a (possibly nested) path.
pub struct Extractor {
    pub name: &'static str,
    path: &'static [&'static str],
    map: fn(&str) -> Option<String>,
}

impl Extractor {
    const fn field(name: &'static str, path: &'static [&'static str]) -> Self {
        Self {
            name,
            path,
            map: verbatim,
        }
    }

    const fn basename(name: &'static str, path: &'static [&'static str]) -> Self {
        Self {
            name,
            path,
            map: last_path_segment,
        }
    }

    fn extract(&self, root: &Map<String, Value>) -> Option<String> {
        let (last, parents) = self.path.split_last()?;
        let mut node = root;
        for key in parents {
            node = node.get(*key)?.as_object()?;
        }
        let raw = node.get(*last)?.as_str()?;
        if raw.trim().is_empty() {
            return None;
        }
        (self.map)(raw)
    }
}

fn verbatim(raw: &str) -> Option<String> {
    Some(raw.to_string())
}

fn last_path_segment(raw: &str) -> Option<String> {
    raw.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

pub const FILE_EXTRACTORS: &[Extractor] = &[
    Extractor::field("processedFileBase64", &["processedFileBase64"]),
    Extractor::field("processedFile", &["processedFile"]),
    Extractor::field("processed_file", &["processed_file"]),
    Extractor::field("base64file", &["base64file"]),
    Extractor::field("fileData", &["fileData"]),
    Extractor::field("data.processedFileBase64", &["data", "processedFileBase64"]),
    Extractor::field("data.processedFile", &["data", "processedFile"]),
    Extractor::field("data.processed_file", &["data", "processed_file"]),
    Extractor::field("data.base64file", &["data", "base64file"]),
    Extractor::field("data.fileData", &["data", "fileData"]),
];

pub const MESSAGE_EXTRACTORS: &[Extractor] = &[
    Extractor::field("message", &["message"]),
    Extractor::field("content", &["content"]),
    Extractor::field("data.message", &["data", "message"]),
    Extractor::field("data.content", &["data", "content"]),
];

pub const FILE_NAME_EXTRACTORS: &[Extractor] = &[
    Extractor::field("fileName", &["fileName"]),
    Extractor::field("filename", &["filename"]),
    Extractor::basename("current_file_path", &["current_file_path"]),
    Extractor::field("data.fileName", &["data", "fileName"]),
    Extractor::field("data.filename", &["data", "filename"]),
    Extractor::basename("data.current_file_path", &["data", "current_file_path"]),
];

const SUCCESS_FIELDS: &[&str] = &["success", "ok"];

/// First extractor that yields a non-empty string wins.
pub fn first_match(root: &Map<String, Value>, extractors: &[Extractor]) -> Option<String> {
    extractors.iter().find_map(|extractor| {
        let value = extractor.extract(root)?;
        debug!(field = extractor.name, "response field matched");
        Some(value)
    })
}

/// Parses a 2xx response body into the canonical envelope.
///
/// `fileName` stays `None` when the body names no file; the conversation
/// applies its own fallback naming.
pub fn parse_response_body(body: &str) -> Result<ProcessResponse, TransportError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(ProcessResponse::reply(EMPTY_BODY_REPLY));
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(nested @ Value::Object(_)) => nested,
            _ if inner.trim().is_empty() => return Ok(ProcessResponse::reply(EMPTY_BODY_REPLY)),
            _ => return Ok(ProcessResponse::reply(inner)),
        },
        Ok(value) => value,
        Err(_) => return Ok(ProcessResponse::reply(trimmed)),
    };

    let Value::Object(root) = value else {
        return Err(TransportError::UnexpectedBody(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    };

    let success = SUCCESS_FIELDS
        .iter()
        .find_map(|field| root.get(*field).and_then(Value::as_bool))
        .unwrap_or(true);

    Ok(ProcessResponse {
        message: first_match(&root, MESSAGE_EXTRACTORS).unwrap_or_else(|| DEFAULT_REPLY.to_string()),
        processed_file_base64: first_match(&root, FILE_EXTRACTORS),
        file_name: first_match(&root, FILE_NAME_EXTRACTORS),
        success,
    })
}

/// Best-effort error text from a non-2xx body.
pub fn extract_error_message(body: &str) -> String {
    let root = match serde_json::from_str::<Value>(body.trim()) {
        Ok(Value::Object(root)) => root,
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(root)) => root,
            _ => return FAILED_TO_PROCESS.to_string(),
        },
        _ => return FAILED_TO_PROCESS.to_string(),
    };

    first_match(
        &root,
        &[
            Extractor::field("message", &["message"]),
            Extractor::field("error", &["error"]),
            Extractor::field("error.message", &["error", "message"]),
        ],
    )
    .unwrap_or_else(|| FAILED_TO_PROCESS.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "tests/envelope_tests.rs"]
mod tests;
