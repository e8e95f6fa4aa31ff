//! Integration tests for the Gmail MCP server
//!
//! These tests exercise the protocol layer end to end through the
//! dispatcher. No Gmail API calls are made: the authenticator is given
//! an unroutable token endpoint, so any tool that would hit the network
//! fails fast with an auth error instead.

use std::sync::Arc;

use serde_json::{json, Value};

use gmail_mcp::config::Config;
use gmail_mcp::gmail::auth::{Authenticator, OAuthKeys};
use gmail_mcp::gmail::client::GmailClient;
use gmail_mcp::mcp::dispatcher::ToolDispatcher;

fn test_dispatcher() -> ToolDispatcher {
    let config = Config::new().expect("config");
    let keys = OAuthKeys {
        client_id: "test-id".to_string(),
        client_secret: "test-secret".to_string(),
        auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_uri: "http://127.0.0.1:1/token".to_string(),
    };
    let authenticator = Authenticator::with_keys(config, keys);
    ToolDispatcher::new(Arc::new(GmailClient::new(Arc::new(authenticator))))
}

async fn roundtrip(dispatcher: &ToolDispatcher, request: Value) -> Option<Value> {
    let response = dispatcher.handle_message(&request.to_string()).await?;
    Some(serde_json::to_value(&response).expect("serialize response"))
}

mod protocol_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_handshake() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "clientInfo": {"name": "test-client", "version": "1.0.0"},
                    "capabilities": {}
                }
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["serverInfo"]["name"], "gmail-mcp");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_initialized_notification_is_silent() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(&dispatcher, json!({"jsonrpc": "2.0", "id": 42, "method": "ping"}))
            .await
            .unwrap();

        assert_eq!(response["id"], 42);
        assert!(response["result"].is_object());
        assert!(response["error"].is_null());
    }

    #[tokio::test]
    async fn test_string_correlation_id_echoed() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({"jsonrpc": "2.0", "id": "req-abc", "method": "ping"}),
        )
        .await
        .unwrap();

        assert_eq!(response["id"], "req-abc");
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}),
        )
        .await
        .unwrap();

        assert_eq!(response["error"]["code"], -32601);
        assert!(response["result"].is_null());
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let dispatcher = test_dispatcher();
        let response = dispatcher.handle_message("{ not json").await.unwrap();
        let value = serde_json::to_value(&response).unwrap();

        assert!(value["id"].is_null());
        assert_eq!(value["error"]["code"], -32700);
    }
}

mod tool_surface_tests {
    use super::*;

    async fn list_tool_names(dispatcher: &ToolDispatcher) -> Vec<String> {
        let response = roundtrip(
            dispatcher,
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        )
        .await
        .unwrap();

        response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_full_tool_surface_registered() {
        let dispatcher = test_dispatcher();
        let names = list_tool_names(&dispatcher).await;

        assert!(names.len() > 60);
        for expected in [
            "send_message",
            "get_message",
            "list_messages",
            "batch_modify_messages",
            "get_attachment",
            "create_draft",
            "send_draft",
            "get_thread",
            "modify_thread",
            "create_label",
            "update_label",
            "patch_label",
            "create_filter",
            "delete_filter",
            "update_vacation_settings",
            "get_imap_settings",
            "update_auto_forwarding",
            "add_delegate",
            "list_delegates",
            "create_forwarding_address",
            "list_forwarding_addresses",
            "create_send_as",
            "patch_send_as",
            "verify_send_as",
            "insert_smime_info",
            "set_default_smime_info",
            "get_profile",
            "watch_mailbox",
            "stop_mail_watch",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[tokio::test]
    async fn test_every_tool_has_object_schema() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        )
        .await
        .unwrap();

        for tool in response["result"]["tools"].as_array().unwrap() {
            assert_eq!(tool["inputSchema"]["type"], "object", "tool {}", tool["name"]);
            assert!(tool["description"].is_string());
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "not_a_tool", "arguments": {}}
            }),
        )
        .await
        .unwrap();

        // Tool failures come back as results, not protocol errors
        assert!(response["error"].is_null());
        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_error_result() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "trash_message", "arguments": {}}
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("messageId"));
    }

    #[tokio::test]
    async fn test_watch_mailbox_requires_topic_name() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "tools/call",
                "params": {"name": "watch_mailbox", "arguments": {"labelIds": ["INBOX"]}}
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("topicName"));
    }

    #[tokio::test]
    async fn test_patch_send_as_requires_alias() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({
                "jsonrpc": "2.0",
                "id": 9,
                "method": "tools/call",
                "params": {"name": "patch_send_as", "arguments": {"displayName": "Me"}}
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("sendAsEmail"));
    }

    #[tokio::test]
    async fn test_send_message_requires_recipient_or_raw() {
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": {"name": "send_message", "arguments": {"subject": "hi", "body": "x"}}
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_network_tool_failure_mentions_reauth() {
        // The authenticator has no access token and an unroutable token
        // endpoint, so the refresh fails and surfaces as an auth error.
        let dispatcher = test_dispatcher();
        let response = roundtrip(
            &dispatcher,
            json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "tools/call",
                "params": {"name": "list_labels", "arguments": {}}
            }),
        )
        .await
        .unwrap();

        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("gmail-mcp auth"));
    }
}

mod email_utils_tests {
    use gmail_mcp::gmail::utils::*;

    #[test]
    fn test_validate_email_addresses() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("user.name@example.co.uk"));
        assert!(validate_email("user+tag@example.com"));

        assert!(!validate_email("invalid"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email("user@.com"));
    }

    #[test]
    fn test_encode_mime_header_unicode() {
        let result = encode_mime_header("Héllo Wörld 你好");
        assert!(result.starts_with("=?UTF-8?B?"));
        assert!(result.ends_with("?="));
    }

    #[test]
    fn test_create_email_with_reply_headers() {
        let params = EmailParams {
            to: vec!["to@example.com".to_string()],
            subject: "Re: Original".to_string(),
            body: "Reply body".to_string(),
            thread_id: Some("thread123".to_string()),
            in_reply_to: Some("<original@example.com>".to_string()),
            ..Default::default()
        };

        let result = create_email_message(&params).unwrap();
        assert!(result.contains("In-Reply-To: <original@example.com>"));
        assert!(result.contains("References: <original@example.com>"));
    }

    #[test]
    fn test_create_email_with_cc_bcc() {
        let params = EmailParams {
            to: vec!["to@example.com".to_string()],
            cc: vec!["cc@example.com".to_string()],
            bcc: vec!["bcc@example.com".to_string()],
            subject: "Test".to_string(),
            body: "Body".to_string(),
            ..Default::default()
        };

        let result = create_email_message(&params).unwrap();
        assert!(result.contains("Cc: cc@example.com"));
        assert!(result.contains("Bcc: bcc@example.com"));
    }
}

mod types_serialization_tests {
    use gmail_mcp::gmail::types::*;

    #[test]
    fn test_message_serialization() {
        let message = Message {
            id: "msg123".to_string(),
            thread_id: Some("thread456".to_string()),
            label_ids: vec!["INBOX".to_string(), "UNREAD".to_string()],
            snippet: Some("Email preview...".to_string()),
            payload: None,
            size_estimate: Some(1024),
            internal_date: None,
        };

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("msg123"));
        assert!(json.contains("threadId"));
        assert!(json.contains("INBOX"));
    }

    #[test]
    fn test_thread_with_messages_roundtrip() {
        let json = r#"{
            "id": "t1",
            "historyId": "99",
            "messages": [
                {"id": "m1", "threadId": "t1"},
                {"id": "m2", "threadId": "t1"}
            ]
        }"#;
        let thread: Thread = serde_json::from_str(json).unwrap();
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(thread.history_id.as_deref(), Some("99"));
    }

    #[test]
    fn test_filter_criteria_camel_case() {
        let criteria = FilterCriteria {
            negated_query: Some("spam".to_string()),
            has_attachment: Some(true),
            size_comparison: Some("larger".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&criteria).unwrap();
        assert!(json.contains("negatedQuery"));
        assert!(json.contains("hasAttachment"));
        assert!(json.contains("sizeComparison"));
    }
}

mod mcp_types_tests {
    use gmail_mcp::mcp::types::*;

    #[test]
    fn test_tool_result_error() {
        let result = CallToolResult::error("Something went wrong");
        assert!(result.is_error);

        if let ToolResultContent::Text { text } = &result.content[0] {
            assert!(text.contains("Error:"));
            assert!(text.contains("Something went wrong"));
        } else {
            panic!("Expected text content");
        }
    }

    #[test]
    fn test_request_id_variants() {
        let id_num = RequestId::Number(42);
        let id_str = RequestId::String("req-123".to_string());

        assert_eq!(serde_json::to_string(&id_num).unwrap(), "42");
        assert_eq!(serde_json::to_string(&id_str).unwrap(), "\"req-123\"");
    }

    #[test]
    fn test_error_response_keeps_null_id() {
        let response = JsonRpcResponse::error(None, JsonRpcError::parse_error("bad"));
        let json = serde_json::to_string(&response).unwrap();
        // The id field must be present and null, not omitted
        assert!(json.contains("\"id\":null"));
    }

    #[test]
    fn test_success_response_echoes_id() {
        let response = JsonRpcResponse::success(
            Some(RequestId::Number(1)),
            serde_json::json!({"status": "ok"}),
        );
        assert!(response.result.is_some());
        assert!(response.error.is_none());
        assert_eq!(response.id, Some(RequestId::Number(1)));
    }
}
