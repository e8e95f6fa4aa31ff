//! MCP Tool definitions and handlers
//!
//! Defines all available tools and their implementations. Every handler
//! returns a structured result; Gmail failures become error results with
//! a re-authentication hint appended when the token is the problem.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{GmailMcpError, REAUTH_HINT};
use crate::gmail::client::GmailClient;
use crate::gmail::types::{FilterAction, FilterCriteria, LabelColor, LabelRequest};
use crate::gmail::utils::EmailParams;
use crate::mcp::types::{CallToolResult, Tool};

/// Tool handler
pub struct ToolHandler {
    gmail_client: Arc<GmailClient>,
}

/// Map an operation failure to a tool error result. Auth-shaped
/// failures carry the remediation hint so the caller knows how to
/// recover.
fn tool_error(err: GmailMcpError) -> CallToolResult {
    if err.requires_reauth() {
        CallToolResult::error(format!("{}. {}", err, REAUTH_HINT))
    } else {
        CallToolResult::error(err.to_string())
    }
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(gmail_client: Arc<GmailClient>) -> Self {
        Self { gmail_client }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            // Messages
            tool_def("send_message", "Sends a new email message", compose_schema()),
            tool_def("get_message", "Retrieves a specific message with decoded text bodies", get_message_schema()),
            tool_def("list_messages", "Lists messages, optionally filtered by a Gmail search query", list_schema()),
            tool_def("modify_message", "Adds or removes labels on a message", modify_labels_schema("messageId")),
            tool_def("trash_message", "Moves a message to trash", id_schema("messageId")),
            tool_def("untrash_message", "Removes a message from trash", id_schema("messageId")),
            tool_def("delete_message", "Permanently deletes a message, bypassing trash", id_schema("messageId")),
            tool_def("batch_modify_messages", "Adds or removes labels on many messages at once", batch_modify_schema()),
            tool_def("batch_delete_messages", "Permanently deletes many messages at once", batch_delete_schema()),
            tool_def("get_attachment", "Retrieves a message attachment body", get_attachment_schema()),
            // Drafts
            tool_def("create_draft", "Creates a draft email message", compose_schema()),
            tool_def("get_draft", "Retrieves a specific draft", id_schema("draftId")),
            tool_def("list_drafts", "Lists drafts in the mailbox", list_drafts_schema()),
            tool_def("send_draft", "Sends an existing draft", id_schema("draftId")),
            tool_def("delete_draft", "Deletes a draft", id_schema("draftId")),
            // Threads
            tool_def("get_thread", "Retrieves a conversation thread with all its messages", get_thread_schema()),
            tool_def("list_threads", "Lists threads, optionally filtered by a Gmail search query", list_schema()),
            tool_def("modify_thread", "Adds or removes labels on every message in a thread", modify_labels_schema("threadId")),
            tool_def("trash_thread", "Moves a thread to trash", id_schema("threadId")),
            tool_def("untrash_thread", "Removes a thread from trash", id_schema("threadId")),
            tool_def("delete_thread", "Permanently deletes a thread, bypassing trash", id_schema("threadId")),
            // Labels
            tool_def("create_label", "Creates a new label", create_label_schema()),
            tool_def("get_label", "Retrieves a specific label", id_schema("labelId")),
            tool_def("list_labels", "Lists all labels in the mailbox", empty_schema()),
            tool_def("update_label", "Replaces an existing label's definition", update_label_schema()),
            tool_def("patch_label", "Patches an existing label; only the supplied fields change", update_label_schema()),
            tool_def("delete_label", "Deletes a label", id_schema("labelId")),
            // Filters
            tool_def("create_filter", "Creates a new filter with criteria and actions", create_filter_schema()),
            tool_def("get_filter", "Retrieves a specific filter", id_schema("filterId")),
            tool_def("list_filters", "Lists all filters", empty_schema()),
            tool_def("delete_filter", "Deletes a filter", id_schema("filterId")),
            // Settings
            tool_def("get_vacation_settings", "Gets the vacation responder settings", empty_schema()),
            tool_def("update_vacation_settings", "Updates the vacation responder settings", vacation_settings_schema()),
            tool_def("get_imap_settings", "Gets the IMAP settings", empty_schema()),
            tool_def("update_imap_settings", "Updates the IMAP settings", imap_settings_schema()),
            tool_def("get_pop_settings", "Gets the POP settings", empty_schema()),
            tool_def("update_pop_settings", "Updates the POP settings", pop_settings_schema()),
            tool_def("get_language_settings", "Gets the display language setting", empty_schema()),
            tool_def("update_language_settings", "Updates the display language setting", language_settings_schema()),
            tool_def("get_auto_forwarding", "Gets the auto-forwarding settings", empty_schema()),
            tool_def("update_auto_forwarding", "Updates the auto-forwarding settings", auto_forwarding_schema()),
            // Delegates
            tool_def("add_delegate", "Adds a delegate to the mailbox", delegate_schema()),
            tool_def("remove_delegate", "Removes a delegate from the mailbox", delegate_schema()),
            tool_def("get_delegate", "Retrieves a specific delegate", delegate_schema()),
            tool_def("list_delegates", "Lists the mailbox delegates", empty_schema()),
            // Forwarding addresses
            tool_def("create_forwarding_address", "Registers a forwarding address", id_schema("forwardingEmail")),
            tool_def("get_forwarding_address", "Retrieves a specific forwarding address", id_schema("forwardingEmail")),
            tool_def("list_forwarding_addresses", "Lists the registered forwarding addresses", empty_schema()),
            tool_def("delete_forwarding_address", "Deletes a forwarding address", id_schema("forwardingEmail")),
            // Send-as aliases
            tool_def("create_send_as", "Creates a custom send-as alias", send_as_schema()),
            tool_def("get_send_as", "Retrieves a specific send-as alias", id_schema("sendAsEmail")),
            tool_def("list_send_as", "Lists the send-as aliases", empty_schema()),
            tool_def("update_send_as", "Replaces a send-as alias", send_as_schema()),
            tool_def("patch_send_as", "Patches a send-as alias; only the supplied fields change", send_as_schema()),
            tool_def("delete_send_as", "Deletes a send-as alias", id_schema("sendAsEmail")),
            tool_def("verify_send_as", "Sends a verification email to a send-as alias", id_schema("sendAsEmail")),
            // S/MIME
            tool_def("insert_smime_info", "Uploads an S/MIME config for a send-as alias", insert_smime_schema()),
            tool_def("get_smime_info", "Retrieves a specific S/MIME config", smime_id_schema()),
            tool_def("list_smime_info", "Lists S/MIME configs for a send-as alias", id_schema("sendAsEmail")),
            tool_def("set_default_smime_info", "Sets the default S/MIME config for a send-as alias", smime_id_schema()),
            tool_def("delete_smime_info", "Deletes an S/MIME config", smime_id_schema()),
            // Mailbox
            tool_def("get_profile", "Gets the user's Gmail profile", empty_schema()),
            tool_def("watch_mailbox", "Starts pushing mailbox change notifications to a Pub/Sub topic", watch_mailbox_schema()),
            tool_def("stop_mail_watch", "Stops mailbox push notifications", empty_schema()),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        match name {
            "send_message" => self.handle_compose(args, false).await,
            "get_message" => self.handle_get_message(args).await,
            "list_messages" => self.handle_list_messages(args).await,
            "modify_message" => self.handle_modify_message(args).await,
            "trash_message" => self.handle_trash_message(args).await,
            "untrash_message" => self.handle_untrash_message(args).await,
            "delete_message" => self.handle_delete_message(args).await,
            "batch_modify_messages" => self.handle_batch_modify(args).await,
            "batch_delete_messages" => self.handle_batch_delete(args).await,
            "get_attachment" => self.handle_get_attachment(args).await,
            "create_draft" => self.handle_compose(args, true).await,
            "get_draft" => self.handle_get_draft(args).await,
            "list_drafts" => self.handle_list_drafts(args).await,
            "send_draft" => self.handle_send_draft(args).await,
            "delete_draft" => self.handle_delete_draft(args).await,
            "get_thread" => self.handle_get_thread(args).await,
            "list_threads" => self.handle_list_threads(args).await,
            "modify_thread" => self.handle_modify_thread(args).await,
            "trash_thread" => self.handle_trash_thread(args).await,
            "untrash_thread" => self.handle_untrash_thread(args).await,
            "delete_thread" => self.handle_delete_thread(args).await,
            "create_label" => self.handle_create_label(args).await,
            "get_label" => self.handle_get_label(args).await,
            "list_labels" => self.handle_list_labels().await,
            "update_label" => self.handle_update_label(args, false).await,
            "patch_label" => self.handle_update_label(args, true).await,
            "delete_label" => self.handle_delete_label(args).await,
            "create_filter" => self.handle_create_filter(args).await,
            "get_filter" => self.handle_get_filter(args).await,
            "list_filters" => self.handle_list_filters().await,
            "delete_filter" => self.handle_delete_filter(args).await,
            "get_vacation_settings" => self.handle_get_setting("vacation").await,
            "update_vacation_settings" => self.handle_update_setting("vacation", args).await,
            "get_imap_settings" => self.handle_get_setting("imap").await,
            "update_imap_settings" => self.handle_update_setting("imap", args).await,
            "get_pop_settings" => self.handle_get_setting("pop").await,
            "update_pop_settings" => self.handle_update_setting("pop", args).await,
            "get_language_settings" => self.handle_get_setting("language").await,
            "update_language_settings" => self.handle_update_setting("language", args).await,
            "get_auto_forwarding" => self.handle_get_setting("autoForwarding").await,
            "update_auto_forwarding" => self.handle_update_setting("autoForwarding", args).await,
            "add_delegate" => self.handle_add_delegate(args).await,
            "remove_delegate" => self.handle_remove_delegate(args).await,
            "get_delegate" => self.handle_get_delegate(args).await,
            "list_delegates" => self.handle_list_delegates().await,
            "create_forwarding_address" => self.handle_create_forwarding_address(args).await,
            "get_forwarding_address" => self.handle_get_forwarding_address(args).await,
            "list_forwarding_addresses" => self.handle_list_forwarding_addresses().await,
            "delete_forwarding_address" => self.handle_delete_forwarding_address(args).await,
            "create_send_as" => self.handle_create_send_as(args).await,
            "get_send_as" => self.handle_get_send_as(args).await,
            "list_send_as" => self.handle_list_send_as().await,
            "update_send_as" => self.handle_modify_send_as(args, false).await,
            "patch_send_as" => self.handle_modify_send_as(args, true).await,
            "delete_send_as" => self.handle_delete_send_as(args).await,
            "verify_send_as" => self.handle_verify_send_as(args).await,
            "insert_smime_info" => self.handle_insert_smime_info(args).await,
            "get_smime_info" => self.handle_get_smime_info(args).await,
            "list_smime_info" => self.handle_list_smime_info(args).await,
            "set_default_smime_info" => self.handle_set_default_smime_info(args).await,
            "delete_smime_info" => self.handle_delete_smime_info(args).await,
            "get_profile" => self.handle_get_profile().await,
            "watch_mailbox" => self.handle_watch_mailbox(args).await,
            "stop_mail_watch" => self.handle_stop_mail_watch().await,
            _ => CallToolResult::error(format!("Unknown tool: {}", name)),
        }
    }

    // ==================== Messages ====================

    async fn handle_compose(&self, args: Value, draft: bool) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            #[serde(default)]
            to: Vec<String>,
            #[serde(default)]
            cc: Vec<String>,
            #[serde(default)]
            bcc: Vec<String>,
            #[serde(default)]
            subject: String,
            #[serde(default)]
            body: String,
            html_body: Option<String>,
            thread_id: Option<String>,
            in_reply_to: Option<String>,
            raw: Option<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        if args.raw.is_none() && args.to.is_empty() {
            return CallToolResult::error("Either 'to' recipients or a 'raw' message is required");
        }

        let params = EmailParams {
            to: args.to,
            cc: args.cc,
            bcc: args.bcc,
            subject: args.subject,
            body: args.body,
            html_body: args.html_body,
            thread_id: args.thread_id,
            in_reply_to: args.in_reply_to,
            raw: args.raw,
        };

        let result = if draft {
            self.gmail_client.create_draft(params).await
        } else {
            self.gmail_client.send_message(params).await
        };

        match result {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_get_message(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
            #[serde(default)]
            include_body_html: bool,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .get_message(&args.message_id, args.include_body_html)
            .await
        {
            Ok(message) => match serde_json::to_value(&message) {
                Ok(value) => CallToolResult::json(&value),
                Err(e) => CallToolResult::error(e.to_string()),
            },
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_messages(&self, args: Value) -> CallToolResult {
        let args: ListArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .list_messages(
                args.query.as_deref(),
                args.max_results,
                &args.label_ids,
                args.page_token.as_deref(),
            )
            .await
        {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_modify_message(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
            add_label_ids: Option<Vec<String>>,
            remove_label_ids: Option<Vec<String>>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .modify_message(&args.message_id, args.add_label_ids, args.remove_label_ids)
            .await
        {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_trash_message(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "messageId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.trash_message(&id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_untrash_message(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "messageId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.untrash_message(&id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_delete_message(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "messageId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.delete_message(&id).await {
            Ok(_) => CallToolResult::text(format!("Message {} deleted", id)),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_batch_modify(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            ids: Vec<String>,
            add_label_ids: Option<Vec<String>>,
            remove_label_ids: Option<Vec<String>>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        if args.ids.is_empty() {
            return CallToolResult::error("At least one message ID is required");
        }

        let count = args.ids.len();
        match self
            .gmail_client
            .batch_modify_messages(args.ids, args.add_label_ids, args.remove_label_ids)
            .await
        {
            Ok(_) => CallToolResult::text(format!("Modified labels on {} messages", count)),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_batch_delete(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            ids: Vec<String>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        if args.ids.is_empty() {
            return CallToolResult::error("At least one message ID is required");
        }

        let count = args.ids.len();
        match self.gmail_client.batch_delete_messages(args.ids).await {
            Ok(_) => CallToolResult::text(format!("Deleted {} messages", count)),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_get_attachment(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            message_id: String,
            attachment_id: String,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .get_attachment(&args.message_id, &args.attachment_id)
            .await
        {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Drafts ====================

    async fn handle_get_draft(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "draftId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.get_draft(&id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_drafts(&self, args: Value) -> CallToolResult {
        let args: ListArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .list_drafts(
                args.query.as_deref(),
                args.max_results,
                args.page_token.as_deref(),
            )
            .await
        {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_send_draft(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "draftId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.send_draft(&id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_delete_draft(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "draftId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.delete_draft(&id).await {
            Ok(_) => CallToolResult::text(format!("Draft {} deleted", id)),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Threads ====================

    async fn handle_get_thread(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            thread_id: String,
            #[serde(default)]
            include_body_html: bool,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .get_thread(&args.thread_id, args.include_body_html)
            .await
        {
            Ok(thread) => match serde_json::to_value(&thread) {
                Ok(value) => CallToolResult::json(&value),
                Err(e) => CallToolResult::error(e.to_string()),
            },
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_threads(&self, args: Value) -> CallToolResult {
        let args: ListArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .list_threads(
                args.query.as_deref(),
                args.max_results,
                &args.label_ids,
                args.page_token.as_deref(),
            )
            .await
        {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_modify_thread(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            thread_id: String,
            add_label_ids: Option<Vec<String>>,
            remove_label_ids: Option<Vec<String>>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .modify_thread(&args.thread_id, args.add_label_ids, args.remove_label_ids)
            .await
        {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_trash_thread(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "threadId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.trash_thread(&id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_untrash_thread(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "threadId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.untrash_thread(&id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_delete_thread(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "threadId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.delete_thread(&id).await {
            Ok(_) => CallToolResult::text(format!("Thread {} deleted", id)),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Labels ====================

    async fn handle_create_label(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            name: String,
            message_list_visibility: Option<String>,
            label_list_visibility: Option<String>,
            color: Option<LabelColor>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        let request = LabelRequest {
            name: Some(args.name),
            message_list_visibility: args.message_list_visibility,
            label_list_visibility: args.label_list_visibility,
            color: args.color,
        };

        match self.gmail_client.create_label(request).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_get_label(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "labelId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.get_label(&id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_labels(&self) -> CallToolResult {
        match self.gmail_client.list_labels().await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_update_label(&self, args: Value, patch: bool) -> CallToolResult {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            label_id: String,
            name: Option<String>,
            message_list_visibility: Option<String>,
            label_list_visibility: Option<String>,
            color: Option<LabelColor>,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        let request = LabelRequest {
            name: args.name,
            message_list_visibility: args.message_list_visibility,
            label_list_visibility: args.label_list_visibility,
            color: args.color,
        };

        let result = if patch {
            self.gmail_client.patch_label(&args.label_id, request).await
        } else {
            self.gmail_client.update_label(&args.label_id, request).await
        };

        match result {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_delete_label(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "labelId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.delete_label(&id).await {
            Ok(_) => CallToolResult::text(format!("Label {} deleted", id)),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Filters ====================

    async fn handle_create_filter(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            criteria: FilterCriteria,
            action: FilterAction,
        }

        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };

        match self
            .gmail_client
            .create_filter(args.criteria, args.action)
            .await
        {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_get_filter(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "filterId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.get_filter(&id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_filters(&self) -> CallToolResult {
        match self.gmail_client.list_filters().await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_delete_filter(&self, args: Value) -> CallToolResult {
        let id = match required_id(args, "filterId") {
            Ok(id) => id,
            Err(result) => return result,
        };
        match self.gmail_client.delete_filter(&id).await {
            Ok(_) => CallToolResult::text(format!("Filter {} deleted", id)),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Settings ====================

    async fn handle_get_setting(&self, setting: &str) -> CallToolResult {
        let result = match setting {
            "vacation" => self.gmail_client.get_vacation_settings().await,
            "imap" => self.gmail_client.get_imap_settings().await,
            "pop" => self.gmail_client.get_pop_settings().await,
            "language" => self.gmail_client.get_language_settings().await,
            "autoForwarding" => self.gmail_client.get_auto_forwarding().await,
            _ => return CallToolResult::error(format!("Unknown setting: {}", setting)),
        };
        match result {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_update_setting(&self, setting: &str, args: Value) -> CallToolResult {
        if !args.is_object() {
            return CallToolResult::error("Settings arguments must be an object");
        }
        let result = match setting {
            "vacation" => self.gmail_client.update_vacation_settings(args).await,
            "imap" => self.gmail_client.update_imap_settings(args).await,
            "pop" => self.gmail_client.update_pop_settings(args).await,
            "language" => self.gmail_client.update_language_settings(args).await,
            "autoForwarding" => self.gmail_client.update_auto_forwarding(args).await,
            _ => return CallToolResult::error(format!("Unknown setting: {}", setting)),
        };
        match result {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Delegates ====================

    async fn handle_add_delegate(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "delegateEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.add_delegate(&email).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_remove_delegate(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "delegateEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.remove_delegate(&email).await {
            Ok(_) => CallToolResult::text(format!("Delegate {} removed", email)),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_get_delegate(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "delegateEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.get_delegate(&email).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_delegates(&self) -> CallToolResult {
        match self.gmail_client.list_delegates().await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Forwarding addresses ====================

    async fn handle_create_forwarding_address(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "forwardingEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.create_forwarding_address(&email).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_get_forwarding_address(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "forwardingEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.get_forwarding_address(&email).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_forwarding_addresses(&self) -> CallToolResult {
        match self.gmail_client.list_forwarding_addresses().await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_delete_forwarding_address(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "forwardingEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.delete_forwarding_address(&email).await {
            Ok(_) => CallToolResult::text(format!("Forwarding address {} deleted", email)),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Send-as aliases ====================

    async fn handle_create_send_as(&self, args: Value) -> CallToolResult {
        if required_id(args.clone(), "sendAsEmail").is_err() {
            return CallToolResult::error("sendAsEmail is required");
        }
        match self.gmail_client.create_send_as(args).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_get_send_as(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "sendAsEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.get_send_as(&email).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_send_as(&self) -> CallToolResult {
        match self.gmail_client.list_send_as().await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    // The alias address routes the call; the remaining fields form the
    // request body.
    async fn handle_modify_send_as(&self, mut args: Value, patch: bool) -> CallToolResult {
        let email = match required_id(args.clone(), "sendAsEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        if let Some(obj) = args.as_object_mut() {
            obj.remove("sendAsEmail");
        }

        let result = if patch {
            self.gmail_client.patch_send_as(&email, args).await
        } else {
            self.gmail_client.update_send_as(&email, args).await
        };

        match result {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_delete_send_as(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "sendAsEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.delete_send_as(&email).await {
            Ok(_) => CallToolResult::text(format!("Send-as alias {} deleted", email)),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_verify_send_as(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "sendAsEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.verify_send_as(&email).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    // ==================== S/MIME ====================

    async fn handle_insert_smime_info(&self, mut args: Value) -> CallToolResult {
        let email = match required_id(args.clone(), "sendAsEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        if let Some(obj) = args.as_object_mut() {
            obj.remove("sendAsEmail");
        }
        match self.gmail_client.insert_smime_info(&email, args).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_get_smime_info(&self, args: Value) -> CallToolResult {
        let (email, id) = match smime_ids(args) {
            Ok(pair) => pair,
            Err(result) => return result,
        };
        match self.gmail_client.get_smime_info(&email, &id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_list_smime_info(&self, args: Value) -> CallToolResult {
        let email = match required_id(args, "sendAsEmail") {
            Ok(email) => email,
            Err(result) => return result,
        };
        match self.gmail_client.list_smime_info(&email).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_set_default_smime_info(&self, args: Value) -> CallToolResult {
        let (email, id) = match smime_ids(args) {
            Ok(pair) => pair,
            Err(result) => return result,
        };
        match self.gmail_client.set_default_smime_info(&email, &id).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_delete_smime_info(&self, args: Value) -> CallToolResult {
        let (email, id) = match smime_ids(args) {
            Ok(pair) => pair,
            Err(result) => return result,
        };
        match self.gmail_client.delete_smime_info(&email, &id).await {
            Ok(_) => CallToolResult::text(format!("S/MIME config {} deleted", id)),
            Err(e) => tool_error(e),
        }
    }

    // ==================== Mailbox ====================

    async fn handle_get_profile(&self) -> CallToolResult {
        match self.gmail_client.get_profile().await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_watch_mailbox(&self, args: Value) -> CallToolResult {
        if required_id(args.clone(), "topicName").is_err() {
            return CallToolResult::error("topicName is required");
        }
        match self.gmail_client.watch_mailbox(args).await {
            Ok(value) => CallToolResult::json(&value),
            Err(e) => tool_error(e),
        }
    }

    async fn handle_stop_mail_watch(&self) -> CallToolResult {
        match self.gmail_client.stop_mail_watch().await {
            Ok(_) => CallToolResult::text("Mailbox watch stopped"),
            Err(e) => tool_error(e),
        }
    }
}

/// Pull one required string field out of the arguments object
fn required_id(args: Value, field: &str) -> std::result::Result<String, CallToolResult> {
    match args.get(field).and_then(|v| v.as_str()) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(CallToolResult::error(format!("{} is required", field))),
    }
}

/// Pull the send-as alias and config id used by the S/MIME tools
fn smime_ids(args: Value) -> std::result::Result<(String, String), CallToolResult> {
    let email = required_id(args.clone(), "sendAsEmail")?;
    let id = required_id(args, "id")?;
    Ok((email, id))
}

/// Shared list arguments for messages, threads, and drafts
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListArgs {
    #[serde(alias = "q")]
    query: Option<String>,
    max_results: Option<u32>,
    #[serde(default)]
    label_ids: Vec<String>,
    page_token: Option<String>,
}

// ==================== Schema Definitions ====================

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

fn id_schema(field: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            field: {"type": "string"}
        },
        "required": [field]
    })
}

fn compose_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of recipient email addresses"
            },
            "cc": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of CC recipients"
            },
            "bcc": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of BCC recipients"
            },
            "subject": {
                "type": "string",
                "description": "Email subject"
            },
            "body": {
                "type": "string",
                "description": "Plain text email body"
            },
            "htmlBody": {
                "type": "string",
                "description": "HTML version of the email body"
            },
            "threadId": {
                "type": "string",
                "description": "Thread ID to reply to"
            },
            "inReplyTo": {
                "type": "string",
                "description": "Message ID being replied to"
            },
            "raw": {
                "type": "string",
                "description": "Pre-assembled RFC822 message; overrides the structured fields"
            }
        }
    })
}

fn get_message_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {
                "type": "string",
                "description": "ID of the message to retrieve"
            },
            "includeBodyHtml": {
                "type": "boolean",
                "description": "Whether to decode HTML bodies in the response"
            }
        },
        "required": ["messageId"]
    })
}

fn get_thread_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "threadId": {
                "type": "string",
                "description": "ID of the thread to retrieve"
            },
            "includeBodyHtml": {
                "type": "boolean",
                "description": "Whether to decode HTML bodies in the response"
            }
        },
        "required": ["threadId"]
    })
}

fn list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Gmail search query"
            },
            "maxResults": {
                "type": "number",
                "description": "Maximum number of results"
            },
            "labelIds": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Only return items with all of these labels"
            },
            "pageToken": {
                "type": "string",
                "description": "Page token from a previous list call"
            }
        }
    })
}

fn list_drafts_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Gmail search query"
            },
            "maxResults": {
                "type": "number",
                "description": "Maximum number of results"
            },
            "pageToken": {
                "type": "string",
                "description": "Page token from a previous list call"
            }
        }
    })
}

fn modify_labels_schema(id_field: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            id_field: {"type": "string"},
            "addLabelIds": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Label IDs to add"
            },
            "removeLabelIds": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Label IDs to remove"
            }
        },
        "required": [id_field]
    })
}

fn batch_modify_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "ids": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Message IDs to modify"
            },
            "addLabelIds": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Label IDs to add"
            },
            "removeLabelIds": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Label IDs to remove"
            }
        },
        "required": ["ids"]
    })
}

fn batch_delete_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "ids": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Message IDs to delete"
            }
        },
        "required": ["ids"]
    })
}

fn get_attachment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {
                "type": "string",
                "description": "ID of the message containing the attachment"
            },
            "attachmentId": {
                "type": "string",
                "description": "ID of the attachment"
            }
        },
        "required": ["messageId", "attachmentId"]
    })
}

fn label_color_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "textColor": {
                "type": "string",
                "description": "Text color as a hex string"
            },
            "backgroundColor": {
                "type": "string",
                "description": "Background color as a hex string"
            }
        },
        "required": ["textColor", "backgroundColor"]
    })
}

fn create_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Name for the new label"
            },
            "messageListVisibility": {
                "type": "string",
                "enum": ["show", "hide"]
            },
            "labelListVisibility": {
                "type": "string",
                "enum": ["labelShow", "labelShowIfUnread", "labelHide"]
            },
            "color": label_color_schema()
        },
        "required": ["name"]
    })
}

fn update_label_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "labelId": {
                "type": "string",
                "description": "ID of the label to update"
            },
            "name": {
                "type": "string",
                "description": "New name for the label"
            },
            "messageListVisibility": {
                "type": "string",
                "enum": ["show", "hide"]
            },
            "labelListVisibility": {
                "type": "string",
                "enum": ["labelShow", "labelShowIfUnread", "labelHide"]
            },
            "color": label_color_schema()
        },
        "required": ["labelId"]
    })
}

fn create_filter_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "criteria": {
                "type": "object",
                "properties": {
                    "from": {"type": "string"},
                    "to": {"type": "string"},
                    "subject": {"type": "string"},
                    "query": {"type": "string"},
                    "negatedQuery": {"type": "string"},
                    "hasAttachment": {"type": "boolean"},
                    "excludeChats": {"type": "boolean"},
                    "size": {"type": "number"},
                    "sizeComparison": {"type": "string", "enum": ["smaller", "larger"]}
                }
            },
            "action": {
                "type": "object",
                "properties": {
                    "addLabelIds": {"type": "array", "items": {"type": "string"}},
                    "removeLabelIds": {"type": "array", "items": {"type": "string"}},
                    "forward": {"type": "string"}
                }
            }
        },
        "required": ["criteria", "action"]
    })
}

fn vacation_settings_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "enableAutoReply": {"type": "boolean"},
            "responseSubject": {"type": "string"},
            "responseBodyPlainText": {"type": "string"},
            "responseBodyHtml": {"type": "string"},
            "restrictToContacts": {"type": "boolean"},
            "restrictToDomain": {"type": "boolean"},
            "startTime": {"type": "string"},
            "endTime": {"type": "string"}
        }
    })
}

fn imap_settings_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "enabled": {"type": "boolean"},
            "autoExpunge": {"type": "boolean"},
            "expungeBehavior": {"type": "string", "enum": ["archive", "trash", "deleteForever"]},
            "maxFolderSize": {"type": "number"}
        }
    })
}

fn pop_settings_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "accessWindow": {"type": "string", "enum": ["disabled", "fromNowOn", "allMail"]},
            "disposition": {"type": "string", "enum": ["leaveInInbox", "archive", "trash", "markRead"]}
        }
    })
}

fn language_settings_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "displayLanguage": {
                "type": "string",
                "description": "RFC 3066 language code, e.g. en or fr"
            }
        },
        "required": ["displayLanguage"]
    })
}

fn auto_forwarding_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "enabled": {"type": "boolean"},
            "emailAddress": {"type": "string"},
            "disposition": {"type": "string", "enum": ["leaveInInbox", "archive", "trash", "markRead"]}
        }
    })
}

fn delegate_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "delegateEmail": {
                "type": "string",
                "description": "Email address of the delegate"
            }
        },
        "required": ["delegateEmail"]
    })
}

fn send_as_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sendAsEmail": {
                "type": "string",
                "description": "The email address that appears in the From header"
            },
            "displayName": {
                "type": "string",
                "description": "Name that appears in the From header"
            },
            "replyToAddress": {
                "type": "string",
                "description": "Address included in a Reply-To header"
            },
            "signature": {
                "type": "string",
                "description": "HTML signature appended to outgoing mail"
            },
            "isPrimary": {"type": "boolean"},
            "treatAsAlias": {"type": "boolean"}
        },
        "required": ["sendAsEmail"]
    })
}

fn smime_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sendAsEmail": {
                "type": "string",
                "description": "The send-as alias the config belongs to"
            },
            "id": {
                "type": "string",
                "description": "Immutable ID of the S/MIME config"
            }
        },
        "required": ["sendAsEmail", "id"]
    })
}

fn insert_smime_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sendAsEmail": {
                "type": "string",
                "description": "The send-as alias the config belongs to"
            },
            "encryptedKeyPassword": {
                "type": "string",
                "description": "Encrypted key password"
            },
            "pkcs12": {
                "type": "string",
                "description": "PKCS#12 bundle with the key pair and certificate chain"
            }
        },
        "required": ["sendAsEmail", "encryptedKeyPassword", "pkcs12"]
    })
}

fn watch_mailbox_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "topicName": {
                "type": "string",
                "description": "Cloud Pub/Sub topic to publish notifications to"
            },
            "labelIds": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Label IDs to restrict notifications to"
            },
            "labelFilterAction": {
                "type": "string",
                "enum": ["include", "exclude"]
            }
        },
        "required": ["topicName"]
    })
}
