//! Minimal model of the `claude --output-format stream-json` protocol.
//!
//! Only the parts the roaster reads are typed: assistant text (forwarded to
//! the log) and the terminal result. Everything else deserializes to
//! `Other` and is ignored.

use serde::Deserialize;

/// One JSONL line emitted by the agent CLI.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Assistant { message: AssistantBody },
    Result(ResultSummary),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AssistantBody {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { name: String },
    #[serde(other)]
    Other,
}

/// Terminal `result` message.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResultSummary {
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub num_turns: Option<u32>,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
}

impl StreamMessage {
    /// Parse one line; blank lines yield `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(trimmed).map(Some)
    }

    /// Text blocks of an assistant message, in order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            StreamMessage::Assistant { message } => message
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Tool names invoked by an assistant message.
    pub fn tool_uses(&self) -> Vec<&str> {
        match self {
            StreamMessage::Assistant { message } => message
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { name } => Some(name.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The stream-json user message that carries the prompt on stdin.
pub fn user_message(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "user",
        "message": {
            "role": "user",
            "content": [{"type": "text", "text": prompt}]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT_LINE: &str = r#"{"type":"system","subtype":"init","session_id":"s1","model":"m","tools":[],"cwd":"/tmp"}"#;
    const ASSISTANT_LINE: &str = r#"{"type":"assistant","session_id":"s1","message":{"role":"assistant","content":[{"type":"text","text":"Looking at PRs"},{"type":"tool_use","id":"t1","name":"Bash","input":{"command":"gh pr list"}},{"type":"thinking","thinking":"hm"}]}}"#;
    const RESULT_LINE: &str = r#"{"type":"result","subtype":"success","session_id":"s1","result":"done","is_error":false,"num_turns":4,"total_cost_usd":0.12}"#;

    #[test]
    fn unknown_types_parse_as_other() {
        let msg = StreamMessage::parse_line(INIT_LINE).expect("parse").expect("message");
        assert_eq!(msg, StreamMessage::Other);
        let rate = StreamMessage::parse_line(r#"{"type":"rate_limit_event"}"#)
            .expect("parse")
            .expect("message");
        assert_eq!(rate, StreamMessage::Other);
    }

    #[test]
    fn assistant_text_and_tools_are_extracted() {
        let msg = StreamMessage::parse_line(ASSISTANT_LINE).expect("parse").expect("message");
        assert_eq!(msg.texts(), vec!["Looking at PRs"]);
        assert_eq!(msg.tool_uses(), vec!["Bash"]);
    }

    #[test]
    fn result_fields_are_read() {
        let msg = StreamMessage::parse_line(RESULT_LINE).expect("parse").expect("message");
        let StreamMessage::Result(summary) = msg else {
            panic!("expected result");
        };
        assert!(!summary.is_error);
        assert_eq!(summary.num_turns, Some(4));
        assert_eq!(summary.result.as_deref(), Some("done"));
    }

    #[test]
    fn blank_lines_are_skipped_and_garbage_errors() {
        assert!(StreamMessage::parse_line("   ").expect("blank").is_none());
        assert!(StreamMessage::parse_line("not json").is_err());
    }

    #[test]
    fn user_message_wraps_prompt() {
        let value = user_message("hello");
        assert_eq!(value["type"], "user");
        assert_eq!(value["message"]["content"][0]["text"], "hello");
    }
}
