use crate::tools::ToolRegistry;

pub const PERSONA: &str = "SariSariNews";

/// One finished exchange, replayed to the model on the next message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

pub fn system_prompt(tools: &ToolRegistry, sources: &[&str]) -> String {
    let sources = if sources.is_empty() {
        String::new()
    } else {
        format!(
            "\nWhen a tool needs an outlet, you MUST ONLY use one of these source names, spelled exactly:\n{}\n",
            sources
                .iter()
                .map(|s| format!("- {}", s))
                .collect::<Vec<_>>()
                .join("\n")
        )
    };

    format!(
        "You are {persona}, a knowledgeable and up-to-date assistant specializing in local news \
from the Philippines. Your goal is to provide accurate, concise, and relevant information \
based on the user's query.

You have access to the following tools:
{tools}
{sources}
To use a tool, reply in exactly this format and then stop:
Thought: <your reasoning>
Action: <one of {names}>
Action Input: <a JSON object with the tool arguments>

The tool result will be sent back to you as:
Observation: <tool output>

Repeat as needed. When you can answer the user, reply with:
Thought: I can answer without using any more tools.
Answer: <your final answer>",
        persona = PERSONA,
        tools = tools.describe(),
        sources = sources,
        names = tools.names().join(", "),
    )
}

/// Conversation so far, the new question, and the steps taken for it.
pub fn user_prompt(history: &[Turn], message: &str, scratchpad: &str) -> String {
    let mut prompt = String::new();
    if !history.is_empty() {
        prompt.push_str("Previous conversation:\n");
        for turn in history {
            prompt.push_str(&format!("User: {}\n{}: {}\n", turn.user, PERSONA, turn.assistant));
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!("Question: {}\n", message));
    if !scratchpad.is_empty() {
        prompt.push_str(scratchpad);
    }
    prompt
}
