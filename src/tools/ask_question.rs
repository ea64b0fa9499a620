//! `ask_question` tool implementation.
//!
//! The single tool this server provides. It takes a required `question`
//! string and returns a deterministic placeholder answer that echoes the
//! question verbatim. No validation is performed on the question's content
//! or length; the empty string is accepted.

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::core::server::{ToolDescriptor, ToolHandler, ToolRegistry};

/// Fixed prefix prepended to every answer.
pub const ANSWER_PREFIX: &str =
    "This is a placeholder answer from the MCP server. Your question was: ";

/// Typed parameters for `ask_question`.
#[derive(Deserialize, Debug)]
struct AskQuestionParams {
    question: String,
}

/// Register the `ask_question` tool with the tool registry.
///
/// Called during server initialization. Defines the tool's catalog entry
/// (name, description, parameter schema) and its handler function.
pub fn register(registry: &mut ToolRegistry) {
    let tool = ToolDescriptor {
        name: "ask_question".to_string(),
        description: "Ask a question and get an answer".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to ask"
                }
            },
            "required": ["question"]
        }),
    };

    // Decode failures surface as `Invalid parameters: ...` entries for this
    // call only; after a successful decode the handler cannot fail.
    let handler: ToolHandler = Box::new(|raw: &RawValue| {
        let params: AskQuestionParams = serde_json::from_str(raw.get())?;
        let answer = format!("{ANSWER_PREFIX}{}", params.question);
        Ok(serde_json::json!({ "answer": answer }))
    });

    registry.register(tool, handler);
}
