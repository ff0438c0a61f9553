//! Chat view of request and response payloads
//!
//! Decodes the OpenAI-style `messages`/`tools` of a request and the first
//! choice of a response, then renders the tool definitions (marking the
//! ones the response called) followed by one block per message. Payloads
//! that do not decode contribute nothing.

use crate::payload::{too_large, truncate_display};
use litelog_core::types::Payload;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

/// Shown when neither payload carries messages or tools
pub const NO_CONVERSATION: &str = "No messages or tool definitions found in payload.";

#[derive(Debug, Deserialize)]
struct ChatRequestPayload {
    messages: Vec<ChatMessage>,
    #[serde(default)]
    tools: Vec<ToolDefinition>,
}

#[derive(Debug, Deserialize)]
struct ChatResponsePayload {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<MessageContent>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// Plain string content or a list of typed parts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON-encoded arguments, kept verbatim
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ToolDefinition {
    function: FunctionDefinition,
}

#[derive(Debug, Deserialize)]
struct FunctionDefinition {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ParametersDefinition>,
}

#[derive(Debug, Deserialize)]
struct ParametersDefinition {
    #[serde(default)]
    properties: BTreeMap<String, PropertyDefinition>,
    #[serde(default)]
    required: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyDefinition {
    #[serde(rename = "type", default)]
    kind: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
}

impl MessageContent {
    fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .map(|part| match (&part.text, &part.kind) {
                    (Some(text), _) => text.clone(),
                    (None, Some(kind)) => format!("[{kind}]"),
                    (None, None) => String::new(),
                })
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(payload: Option<&Payload>) -> Option<T> {
    serde_json::from_slice(payload?.as_bytes()).ok()
}

fn capitalize(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn type_name(kind: Option<&serde_json::Value>) -> String {
    match kind {
        Some(serde_json::Value::String(kind)) => kind.clone(),
        Some(other) => other.to_string(),
        None => "any".to_string(),
    }
}

/// Render the chat view of one entry's payloads
pub fn format_conversation(request: Option<&Payload>, response: Option<&Payload>) -> String {
    for payload in [request, response].into_iter().flatten() {
        if let Some(notice) = too_large(payload) {
            return notice;
        }
    }

    let request: Option<ChatRequestPayload> = decode(request);
    let response: Option<ChatResponsePayload> = decode(response);
    let reply = response.and_then(|r| r.choices.into_iter().next()).map(|c| c.message);

    let called: HashSet<&str> = reply
        .as_ref()
        .filter(|message| message.role == "assistant")
        .and_then(|message| message.tool_calls.as_ref())
        .map(|calls| calls.iter().map(|c| c.function.name.as_str()).collect())
        .unwrap_or_default();

    let (mut messages, tools) = match &request {
        Some(request) => (request.messages.iter().collect::<Vec<_>>(), &request.tools[..]),
        None => (Vec::new(), &[][..]),
    };
    messages.extend(reply.as_ref());

    if messages.is_empty() && tools.is_empty() {
        return NO_CONVERSATION.to_string();
    }

    let mut output = String::new();
    if !tools.is_empty() {
        output.push_str("Tools:\n");
        for tool in tools {
            push_tool(&mut output, tool, called.contains(tool.function.name.as_str()));
        }
    }
    if !messages.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str("Messages:\n");
        for message in messages {
            push_message(&mut output, message);
        }
    }
    truncate_display(output.trim_end().to_string())
}

fn push_tool(output: &mut String, tool: &ToolDefinition, called: bool) {
    let function = &tool.function;
    let marker = if called { "  [CALLED]" } else { "" };
    output.push_str(&format!("  {}{marker}\n", function.name));
    if let Some(description) = function.description.as_deref().filter(|d| !d.is_empty()) {
        output.push_str(&format!("    {description}\n"));
    }
    if let Some(parameters) = &function.parameters {
        for (name, property) in &parameters.properties {
            let required = if parameters.required.contains(name) {
                ", required"
            } else {
                ""
            };
            let mut line = format!(
                "    - {name} ({}{required})",
                type_name(property.kind.as_ref())
            );
            if let Some(description) = property.description.as_deref().filter(|d| !d.is_empty()) {
                line.push_str(&format!(": {description}"));
            }
            output.push_str(&line);
            output.push('\n');
        }
    }
}

fn push_message(output: &mut String, message: &ChatMessage) {
    output.push_str(&format!("  [{}]\n", capitalize(&message.role)));

    let content = message
        .content
        .as_ref()
        .map(MessageContent::text)
        .filter(|text| !text.is_empty());
    let tool_calls = message.tool_calls.as_deref().filter(|calls| !calls.is_empty());

    match (content, tool_calls) {
        (Some(text), _) => {
            for line in text.lines() {
                output.push_str(&format!("  {line}\n"));
            }
        }
        (None, Some(calls)) => {
            for call in calls {
                output.push_str(&format!(
                    "  -> {} {}\n",
                    call.function.name, call.function.arguments
                ));
            }
        }
        (None, None) => output.push_str("  (empty message)\n"),
    }
}
