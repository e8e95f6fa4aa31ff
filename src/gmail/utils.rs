//! Gmail utility functions
//!
//! RFC822 message assembly, base64url codecs, and the post-fetch
//! processing pass that decodes message bodies for tool output.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::{GmailApiError, GmailMcpError, McpError, Result};
use crate::gmail::types::{Message, MessagePart};

/// Headers kept when a fetched message is prepared for tool output.
/// Everything else (routing metadata, DKIM, ARC chains) is dropped.
pub const RESPONSE_HEADERS: &[&str] = &[
    "Date",
    "From",
    "To",
    "Subject",
    "Message-ID",
    "In-Reply-To",
    "References",
];

/// Validate an email address
pub fn validate_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);

    !local.is_empty()
        && !domain.is_empty()
        && !local.contains(' ')
        && !domain.contains(' ')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Encode text for a MIME header (RFC 2047)
pub fn encode_mime_header(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && c != '\r' && c != '\n') {
        return text.to_string();
    }

    // MIME Words encoding (RFC 2047), Base64 variant
    format!(
        "=?UTF-8?B?{}?=",
        base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
    )
}

/// Encode a raw email message for the Gmail API (base64url, no padding)
pub fn encode_raw_message(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

/// Decode base64url data from the Gmail API.
/// Handles both padded and non-padded base64url encoding.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(data))
        .or_else(|_| base64::engine::general_purpose::STANDARD.decode(data))
        .map_err(|e| {
            GmailMcpError::Gmail(GmailApiError::InvalidResponse {
                message: format!("invalid base64 body data: {}", e),
            })
        })
}

/// Decode base64url data to a string
pub fn decode_base64url_string(data: &str) -> Result<String> {
    let bytes = decode_base64url(data)?;
    String::from_utf8(bytes).map_err(|e| {
        GmailMcpError::Gmail(GmailApiError::InvalidResponse {
            message: format!("body data is not valid UTF-8: {}", e),
        })
    })
}

/// Find a header value by name (case-insensitive)
pub fn find_header<'a>(part: &'a MessagePart, name: &str) -> Option<&'a str> {
    part.headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Prepare a fetched message for tool output: decode text bodies in
/// place and drop headers outside [`RESPONSE_HEADERS`]. HTML bodies are
/// decoded only when `include_body_html` is set; parts left undecoded
/// (HTML without the flag, attachments) keep their base64 payload.
pub fn process_message(mut message: Message, include_body_html: bool) -> Message {
    if let Some(payload) = message.payload.take() {
        message.payload = Some(process_part(payload, include_body_html));
    }
    message
}

fn process_part(mut part: MessagePart, include_body_html: bool) -> MessagePart {
    let mime_type = part.mime_type.as_deref().unwrap_or("").to_string();

    if let Some(body) = part.body.as_mut() {
        if let Some(data) = body.data.take() {
            let decode = mime_type.starts_with("text/")
                && (mime_type != "text/html" || include_body_html);
            if decode {
                match decode_base64url_string(&data) {
                    Ok(decoded) => body.data = Some(decoded),
                    Err(e) => {
                        tracing::debug!("failed to decode {} part: {}", mime_type, e);
                        body.data = Some(data);
                    }
                }
            } else {
                body.data = Some(data);
            }
        }
    }

    part.headers
        .retain(|h| RESPONSE_HEADERS.iter().any(|k| h.name.eq_ignore_ascii_case(k)));

    part.parts = part
        .parts
        .into_iter()
        .map(|p| process_part(p, include_body_html))
        .collect();

    part
}

/// Parameters for assembling an outgoing email
#[derive(Debug, Clone, Default)]
pub struct EmailParams {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub html_body: Option<String>,
    pub thread_id: Option<String>,
    pub in_reply_to: Option<String>,
    /// Pre-assembled RFC822 message; when set, the structured fields
    /// above are ignored.
    pub raw: Option<String>,
}

/// Assemble an RFC822 email message. When `raw` is provided it is used
/// verbatim; otherwise the message is built from the structured fields.
pub fn create_email_message(params: &EmailParams) -> Result<String> {
    if let Some(raw) = &params.raw {
        return Ok(raw.clone());
    }

    for email in params.to.iter().chain(&params.cc).chain(&params.bcc) {
        if !validate_email(email) {
            return Err(GmailMcpError::Mcp(McpError::InvalidArguments {
                message: format!("invalid email address: {}", email),
            }));
        }
    }

    let mut lines = Vec::new();

    lines.push("From: me".to_string());
    lines.push(format!("To: {}", params.to.join(", ")));

    if !params.cc.is_empty() {
        lines.push(format!("Cc: {}", params.cc.join(", ")));
    }
    if !params.bcc.is_empty() {
        lines.push(format!("Bcc: {}", params.bcc.join(", ")));
    }

    lines.push(format!("Subject: {}", encode_mime_header(&params.subject)));

    if let Some(in_reply_to) = &params.in_reply_to {
        lines.push(format!("In-Reply-To: {}", in_reply_to));
        lines.push(format!("References: {}", in_reply_to));
    }

    lines.push("MIME-Version: 1.0".to_string());

    if let Some(html_body) = &params.html_body {
        // Text + HTML alternatives
        let boundary = format!("----=_NextPart_{}", generate_boundary());
        lines.push(format!(
            "Content-Type: multipart/alternative; boundary=\"{}\"",
            boundary
        ));
        lines.push(String::new());

        lines.push(format!("--{}", boundary));
        lines.push("Content-Type: text/plain; charset=UTF-8".to_string());
        lines.push("Content-Transfer-Encoding: 7bit".to_string());
        lines.push(String::new());
        lines.push(params.body.clone());
        lines.push(String::new());

        lines.push(format!("--{}", boundary));
        lines.push("Content-Type: text/html; charset=UTF-8".to_string());
        lines.push("Content-Transfer-Encoding: 7bit".to_string());
        lines.push(String::new());
        lines.push(html_body.clone());
        lines.push(String::new());

        lines.push(format!("--{}--", boundary));
    } else {
        lines.push("Content-Type: text/plain; charset=UTF-8".to_string());
        lines.push("Content-Transfer-Encoding: 7bit".to_string());
        lines.push(String::new());
        lines.push(params.body.clone());
    }

    Ok(lines.join("\r\n"))
}

/// Generate a boundary string for multipart messages
fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:x}", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::types::{Header, MessagePartBody};

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com"));
        assert!(validate_email("user.name@domain.co.uk"));
        assert!(validate_email("a@b.co"));
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email("user@.com"));
        assert!(!validate_email("user@domain."));
    }

    #[test]
    fn test_encode_mime_header_ascii() {
        let text = "Hello World";
        assert_eq!(encode_mime_header(text), text);
    }

    #[test]
    fn test_encode_mime_header_unicode() {
        let text = "Héllo Wörld";
        let encoded = encode_mime_header(text);
        assert!(encoded.starts_with("=?UTF-8?B?"));
        assert!(encoded.ends_with("?="));
    }

    #[test]
    fn test_decode_base64url() {
        let encoded = "SGVsbG8gV29ybGQ"; // "Hello World" without padding
        let decoded = decode_base64url_string(encoded).unwrap();
        assert_eq!(decoded, "Hello World");
    }

    #[test]
    fn test_create_email_message_plain() {
        let params = EmailParams {
            to: vec!["test@example.com".to_string()],
            subject: "Test Subject".to_string(),
            body: "Test body".to_string(),
            ..Default::default()
        };
        let message = create_email_message(&params).unwrap();
        assert!(message.contains("To: test@example.com"));
        assert!(message.contains("Subject: Test Subject"));
        assert!(message.contains("Test body"));
    }

    #[test]
    fn test_create_email_message_html_alternative() {
        let params = EmailParams {
            to: vec!["test@example.com".to_string()],
            subject: "Hi".to_string(),
            body: "plain".to_string(),
            html_body: Some("<b>rich</b>".to_string()),
            ..Default::default()
        };
        let message = create_email_message(&params).unwrap();
        assert!(message.contains("multipart/alternative"));
        assert!(message.contains("plain"));
        assert!(message.contains("<b>rich</b>"));
    }

    #[test]
    fn test_create_email_message_raw_passthrough() {
        let params = EmailParams {
            raw: Some("From: me\r\n\r\nhand-built".to_string()),
            ..Default::default()
        };
        let message = create_email_message(&params).unwrap();
        assert_eq!(message, "From: me\r\n\r\nhand-built");
    }

    #[test]
    fn test_create_email_message_rejects_bad_address() {
        let params = EmailParams {
            to: vec!["nope".to_string()],
            ..Default::default()
        };
        assert!(create_email_message(&params).is_err());
    }

    fn text_part(mime: &str, data: &str) -> MessagePart {
        MessagePart {
            mime_type: Some(mime.to_string()),
            body: Some(MessagePartBody {
                data: Some(encode_raw_message(data)),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_process_message_decodes_text_body() {
        let message = Message {
            id: "m1".to_string(),
            thread_id: None,
            label_ids: vec![],
            snippet: None,
            payload: Some(text_part("text/plain", "hello there")),
            size_estimate: None,
            internal_date: None,
        };
        let processed = process_message(message, false);
        let body = processed.payload.unwrap().body.unwrap();
        assert_eq!(body.data.as_deref(), Some("hello there"));
    }

    #[test]
    fn test_process_message_skips_html_by_default() {
        let encoded = encode_raw_message("<p>hi</p>");
        let message = Message {
            id: "m1".to_string(),
            thread_id: None,
            label_ids: vec![],
            snippet: None,
            payload: Some(text_part("text/html", "<p>hi</p>")),
            size_estimate: None,
            internal_date: None,
        };
        let processed = process_message(message.clone(), false);
        let body = processed.payload.unwrap().body.unwrap();
        assert_eq!(body.data.as_deref(), Some(encoded.as_str()));

        let processed = process_message(message, true);
        let body = processed.payload.unwrap().body.unwrap();
        assert_eq!(body.data.as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn test_process_message_retains_attachment_data() {
        let encoded = encode_raw_message("binary-ish payload");
        let message = Message {
            id: "m1".to_string(),
            thread_id: None,
            label_ids: vec![],
            snippet: None,
            payload: Some(text_part("application/pdf", "binary-ish payload")),
            size_estimate: None,
            internal_date: None,
        };
        let processed = process_message(message, false);
        let body = processed.payload.unwrap().body.unwrap();
        assert_eq!(body.data.as_deref(), Some(encoded.as_str()));
    }

    #[test]
    fn test_process_message_filters_headers() {
        let mut part = text_part("text/plain", "x");
        part.headers = vec![
            Header {
                name: "Subject".to_string(),
                value: "keep".to_string(),
            },
            Header {
                name: "X-Spam-Status".to_string(),
                value: "drop".to_string(),
            },
            Header {
                name: "from".to_string(),
                value: "keep lowercase".to_string(),
            },
        ];
        let message = Message {
            id: "m1".to_string(),
            thread_id: None,
            label_ids: vec![],
            snippet: None,
            payload: Some(part),
            size_estimate: None,
            internal_date: None,
        };
        let processed = process_message(message, false);
        let headers = processed.payload.unwrap().headers;
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|h| h.name != "X-Spam-Status"));
    }
}
