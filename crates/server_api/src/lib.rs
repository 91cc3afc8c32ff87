use std::sync::Arc;

use shared::{
    error::{ApiError, ApiException, ErrorCode},
    protocol::{ProcessRequest, ProcessResponse},
};
use sheet_codec::{decode, decode_base64_bytes, encode_base64_bytes};
use tracing::{debug, info, warn};

pub const FILE_PROCESSED_MESSAGE: &str = "File processed successfully";

/// Transformation applied to an uploaded workbook. The echo processor is the
/// only one shipped; real transformations plug in here.
pub trait WorkbookProcessor: Send + Sync {
    fn process(&self, workbook: &[u8], instructions: &str) -> Result<Vec<u8>, ApiException>;
}

pub struct EchoProcessor;

impl WorkbookProcessor for EchoProcessor {
    fn process(&self, workbook: &[u8], _instructions: &str) -> Result<Vec<u8>, ApiException> {
        Ok(workbook.to_vec())
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub processor: Arc<dyn WorkbookProcessor>,
}

impl Default for ApiContext {
    fn default() -> Self {
        Self {
            processor: Arc::new(EchoProcessor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    AttachGuidance,
    DownloadGuidance,
    GeneralHelp,
    Greeting,
    WorkingWithFile,
    Default,
}

impl ReplyKind {
    pub fn message(self) -> &'static str {
        match self {
            ReplyKind::AttachGuidance => {
                "To process a spreadsheet, attach an Excel file (.xlsx or .xls) and send it \
                 together with your instructions."
            }
            ReplyKind::DownloadGuidance => {
                "Open the file card under a processed reply to download the result. It is saved \
                 as <original name>_processed.xlsx."
            }
            ReplyKind::GeneralHelp => {
                "I process Excel workbooks. Attach a .xlsx or .xls file with instructions and I \
                 will send back the processed workbook for preview and download."
            }
            ReplyKind::Greeting => "Hello! Attach an Excel file or ask me about the processed file.",
            ReplyKind::WorkingWithFile => {
                "I'm working with your file. Attach a spreadsheet to process it, or ask how to \
                 download the result."
            }
            ReplyKind::Default => "I can help you with the processed file.",
        }
    }
}

/// Keyword buckets in priority order. The first bucket with any keyword
/// contained in the text wins, regardless of where in the text it appears.
const KEYWORD_RULES: &[(ReplyKind, &[&str])] = &[
    (ReplyKind::AttachGuidance, &["send", "upload", "attach"]),
    (ReplyKind::DownloadGuidance, &["download", "get", "file"]),
    (ReplyKind::GeneralHelp, &["help", "what", "how"]),
    (ReplyKind::Greeting, &["hi", "hello", "hey"]),
];

pub fn classify(text: &str) -> ReplyKind {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return ReplyKind::Default;
    }

    KEYWORD_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| normalized.contains(keyword)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ReplyKind::WorkingWithFile)
}

/// Handles one envelope. Stateless: nothing survives between calls.
pub fn process_request(
    ctx: &ApiContext,
    request: &ProcessRequest,
) -> Result<ProcessResponse, ApiError> {
    let Some(payload) = request.attachment() else {
        let kind = classify(&request.user_text);
        debug!(?kind, "answering text-only request");
        return Ok(ProcessResponse::reply(kind.message()));
    };

    let bytes = decode_base64_bytes(payload).map_err(|e| {
        ApiError::validation(format!("attachedFileBase64 is not valid base64: {e}"))
    })?;
    ensure_readable(&bytes).map_err(|reason| {
        ApiError::new(
            ErrorCode::UnreadableSpreadsheet,
            format!("attached file is not a readable spreadsheet: {reason}"),
        )
    })?;

    let processed = ctx
        .processor
        .process(&bytes, request.user_text.trim())
        .map_err(ApiError::from)?;
    ensure_readable(&processed).map_err(|reason| {
        warn!(%reason, "processor produced an unreadable workbook");
        ApiError::new(
            ErrorCode::Internal,
            "processing produced an unreadable workbook",
        )
    })?;

    info!(
        input_bytes = bytes.len(),
        output_bytes = processed.len(),
        "processed attached workbook"
    );
    Ok(ProcessResponse::with_file(
        FILE_PROCESSED_MESSAGE,
        encode_base64_bytes(&processed),
    ))
}

fn ensure_readable(bytes: &[u8]) -> Result<(), String> {
    let workbook = decode(bytes).map_err(|e| e.to_string())?;
    if workbook.is_empty() {
        return Err("workbook has no sheets".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_codec::{encode, CellValue, Sheet, Workbook};

    fn workbook_b64() -> String {
        let workbook = Workbook::from_sheets(vec![
            Sheet::new("Jan", vec![vec![CellValue::String("Units".into())]]),
            Sheet::new("Feb", vec![vec![CellValue::Number(3.0)]]),
        ])
        .expect("workbook");
        encode_base64_bytes(&encode(&workbook).expect("encode"))
    }

    struct CorruptingProcessor;

    impl WorkbookProcessor for CorruptingProcessor {
        fn process(&self, _workbook: &[u8], _instructions: &str) -> Result<Vec<u8>, ApiException> {
            Ok(b"broken".to_vec())
        }
    }

    struct RejectingProcessor;

    impl WorkbookProcessor for RejectingProcessor {
        fn process(&self, _workbook: &[u8], _instructions: &str) -> Result<Vec<u8>, ApiException> {
            Err(ApiException::new(ErrorCode::Validation, "instructions not understood"))
        }
    }

    #[test]
    fn classification_follows_bucket_priority() {
        assert_eq!(classify("can I upload a file?"), ReplyKind::AttachGuidance);
        assert_eq!(classify("hello, how do I download it"), ReplyKind::DownloadGuidance);
        assert_eq!(classify("What is this?"), ReplyKind::GeneralHelp);
        assert_eq!(classify("  HEY  "), ReplyKind::Greeting);
        assert_eq!(classify("Hi"), ReplyKind::Greeting);
        assert_eq!(classify("sum column b"), ReplyKind::WorkingWithFile);
    }

    #[test]
    fn blank_text_skips_keyword_matching() {
        assert_eq!(classify(""), ReplyKind::Default);
        assert_eq!(classify("   \n\t"), ReplyKind::Default);
    }

    #[test]
    fn text_only_request_gets_canned_reply_without_file() {
        let response = process_request(&ApiContext::default(), &ProcessRequest::new("Hi", None))
            .expect("response");
        assert_eq!(response.message, ReplyKind::Greeting.message());
        assert!(response.processed_file_base64.is_none());
        assert!(response.file_name.is_none());
        assert!(response.success);
    }

    #[test]
    fn attached_file_is_echoed_unchanged() {
        let payload = workbook_b64();
        let response = process_request(
            &ApiContext::default(),
            &ProcessRequest::new("please process", Some(payload.clone())),
        )
        .expect("response");
        assert_eq!(response.message, FILE_PROCESSED_MESSAGE);
        assert_eq!(response.processed_file_base64.as_deref(), Some(payload.as_str()));
        assert!(response.success);
    }

    #[test]
    fn empty_attachment_falls_back_to_text_reply() {
        let response = process_request(
            &ApiContext::default(),
            &ProcessRequest::new("", Some(String::new())),
        )
        .expect("response");
        assert_eq!(response.message, ReplyKind::Default.message());
        assert!(response.processed_file_base64.is_none());
    }

    #[test]
    fn invalid_base64_is_a_validation_error() {
        let err = process_request(
            &ApiContext::default(),
            &ProcessRequest::new("", Some("%%%".to_string())),
        )
        .expect_err("must fail");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[test]
    fn unreadable_container_is_rejected() {
        let err = process_request(
            &ApiContext::default(),
            &ProcessRequest::new("", Some(encode_base64_bytes(b"plain text, not excel"))),
        )
        .expect_err("must fail");
        assert_eq!(err.code, ErrorCode::UnreadableSpreadsheet);
    }

    #[test]
    fn unreadable_processor_output_is_internal_error() {
        let ctx = ApiContext {
            processor: Arc::new(CorruptingProcessor),
        };
        let err = process_request(&ctx, &ProcessRequest::new("", Some(workbook_b64())))
            .expect_err("must fail");
        assert_eq!(err.code, ErrorCode::Internal);
    }

    #[test]
    fn processor_errors_pass_through() {
        let ctx = ApiContext {
            processor: Arc::new(RejectingProcessor),
        };
        let err = process_request(&ctx, &ProcessRequest::new("pivot", Some(workbook_b64())))
            .expect_err("must fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "instructions not understood");
    }
}
