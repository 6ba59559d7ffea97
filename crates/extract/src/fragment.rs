//! User-facing Markdown fragments written in place of extracted content.

use crate::consts::EMPTY_ANSWER;
use crate::service::error::ErrorKind as ServiceErrorKind;
use time::UtcDateTime;
use time::format_description::well_known::Rfc3339;

const HEADING: &str = "## Content Processing Error";

/// Trim a service answer, substituting a placeholder when nothing is left.
pub(crate) fn answer(text: &str) -> String {
    match text.trim() {
        "" => EMPTY_ANSWER.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Written when the attachment exceeds the size limit; nothing was sent.
pub(crate) fn too_large(size_mb: f64, limit_mb: u64) -> String {
    error(
        &format!("File is too large to process (exceeds {limit_mb}MB limit)"),
        &format!("File size {size_mb:.2}MB is over the {limit_mb}MB limit, so it was not sent for processing"),
        size_mb,
    )
}

/// Written when the service refused the request.
pub(crate) fn service_error(err: &ServiceErrorKind, size_mb: f64) -> String {
    let summary = match err {
        ServiceErrorKind::Rejected(detail) if detail.contains("payload size exceeds") => {
            "File is too large to process".to_string()
        },
        ServiceErrorKind::MissingCredential => "No API key configured for the content service".to_string(),
        _ => "Failed to process content with the content service".to_string(),
    };
    error(&summary, err.detail(), size_mb)
}

fn error(summary: &str, details: &str, size_mb: f64) -> String {
    let timestamp = UtcDateTime::now().format(&Rfc3339).unwrap_or_default();
    format!(
        "{HEADING}\n\n**Error**: {summary}\n\n**Technical Details**: {details}\n\n**Timestamp**: {timestamp}\n\n**File Size**: {size_mb:.2}MB"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  A cat.\n", "A cat.")]
    #[case("", "No content found")]
    #[case(" \n\t", "No content found")]
    fn test_answer(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(answer(input), expected);
    }

    #[test]
    fn test_too_large() {
        let fragment = too_large(50.0, 30);
        assert!(fragment.starts_with("## Content Processing Error\n\n**Error**: File is too large"));
        assert!(fragment.contains("exceeds 30MB limit"));
        assert!(fragment.contains("**Timestamp**: "));
        assert!(fragment.ends_with("**File Size**: 50.00MB"));
    }

    #[test]
    fn test_service_error() {
        let fragment = service_error(&ServiceErrorKind::Rejected("Invalid image".into()), 0.123);
        assert!(fragment.contains("**Error**: Failed to process content"));
        assert!(fragment.contains("**Technical Details**: Invalid image"));
        assert!(fragment.ends_with("**File Size**: 0.12MB"));

        let fragment =
            service_error(&ServiceErrorKind::Rejected("Request payload size exceeds the limit".into()), 25.0);
        assert!(fragment.contains("**Error**: File is too large to process"));
    }
}
