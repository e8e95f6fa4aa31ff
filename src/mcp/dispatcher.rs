//! Tool dispatcher
//!
//! Routes a decoded JSON-RPC envelope to the matching handler and wraps
//! the outcome in a response envelope. Shared by the stdio and HTTP
//! transports: every request produces exactly one response carrying the
//! request's correlation id, notifications produce none, and no handler
//! fault crosses the transport boundary unwrapped.

use std::sync::Arc;

use serde_json::Value;

use crate::gmail::client::GmailClient;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP server info
const SERVER_NAME: &str = "gmail-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Method router for MCP requests
pub struct ToolDispatcher {
    /// Tool handler
    tool_handler: ToolHandler,
}

impl ToolDispatcher {
    /// Create a new dispatcher
    pub fn new(gmail_client: Arc<GmailClient>) -> Self {
        Self {
            tool_handler: ToolHandler::new(gmail_client),
        }
    }

    /// Handle a raw message string. A body that does not parse yields a
    /// parse-error response with a null correlation id.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a decoded request envelope
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Requests without an id are notifications: handled, never answered
        let id = request.id.clone();

        let response = match request.method.as_str() {
            methods::INITIALIZE => {
                JsonRpcResponse::success(id.clone(), self.initialize_result())
            }
            methods::INITIALIZED => return None,
            methods::PING => JsonRpcResponse::success(id.clone(), serde_json::json!({})),
            methods::LIST_TOOLS => {
                let result = ListToolsResult {
                    tools: self.tool_handler.list_tools(),
                };
                JsonRpcResponse::success(id.clone(), value_or_internal_error(&result))
            }
            methods::CALL_TOOL => {
                let result = self.handle_call_tool(request.params).await;
                JsonRpcResponse::success(id.clone(), result)
            }
            other => JsonRpcResponse::error(id.clone(), JsonRpcError::method_not_found(other)),
        };

        if id.is_none() {
            None
        } else {
            Some(response)
        }
    }

    fn initialize_result(&self) -> Value {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
        };

        value_or_internal_error(&result)
    }

    /// Handle a tools/call request; all failures become structured error
    /// results, never faults.
    async fn handle_call_tool(&self, params: Option<Value>) -> Value {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return value_or_internal_error(&CallToolResult::error(format!(
                        "Invalid tool parameters: {}",
                        e
                    )));
                }
            },
            None => {
                return value_or_internal_error(&CallToolResult::error("Missing tool parameters"));
            }
        };

        let result = self
            .tool_handler
            .call_tool(&params.name, params.arguments)
            .await;
        value_or_internal_error(&result)
    }
}

fn value_or_internal_error<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        serde_json::json!({
            "content": [{"type": "text", "text": format!("Error: {}", e)}],
            "isError": true,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::gmail::auth::{Authenticator, OAuthKeys};

    fn test_dispatcher() -> ToolDispatcher {
        let config = Config::new().unwrap();
        let keys = OAuthKeys {
            client_id: "test-id".to_string(),
            client_secret: "test-secret".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_uri: "http://127.0.0.1:1/token".to_string(),
        };
        let authenticator = Authenticator::with_keys(config, keys);
        ToolDispatcher::new(Arc::new(GmailClient::new(Arc::new(authenticator))))
    }

    #[tokio::test]
    async fn test_ping_echoes_id() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .handle_message(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#)
            .await
            .unwrap();

        assert_eq!(response.id, Some(RequestId::Number(7)));
        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"does/not/exist"}"#)
            .await
            .unwrap();

        assert_eq!(response.id, Some(RequestId::Number(1)));
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_notification_produces_no_response() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_parse_failure_yields_null_id() {
        let dispatcher = test_dispatcher();
        let response = dispatcher.handle_message("not json at all").await.unwrap();

        assert!(response.id.is_none());
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_initialize_reports_tools_capability() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "gmail-mcp");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_structured_error() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .handle_message(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
            )
            .await
            .unwrap();

        // Still a success envelope: tool failures ride in the result
        assert_eq!(response.id, Some(RequestId::Number(2)));
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_list_tools_nonempty() {
        let dispatcher = test_dispatcher();
        let response = dispatcher
            .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#)
            .await
            .unwrap();

        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert!(tools > 60);
    }
}
