use std::sync::Arc;
use serde::Serialize;
use serde_json::Value;
use ss_core::{Error, InferenceModel, Result};
use tokio::sync::Mutex;
use tracing::{debug, info};
use crate::prompt::{system_prompt, user_prompt, Turn};
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_ITERATIONS: usize = 6;

/// What the model asked for in one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Action {
        thought: Option<String>,
        tool: String,
        input: Value,
    },
    Answer {
        thought: Option<String>,
        answer: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCall {
    pub tool: String,
    pub input: Value,
    pub observation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    pub answer: String,
    pub steps: Vec<ToolCall>,
}

enum State {
    AwaitingThought,
    AwaitingAction(Step),
    AwaitingObservation { tool: String, input: Value },
    Done(String),
}

/// Thought / Action / Observation loop over a tool registry.
pub struct ReactAgent {
    model: Arc<dyn InferenceModel>,
    tools: Arc<ToolRegistry>,
    system: String,
    max_iterations: usize,
    history: Mutex<Vec<Turn>>,
}

impl ReactAgent {
    pub fn new(model: Arc<dyn InferenceModel>, tools: Arc<ToolRegistry>, sources: &[&str]) -> Self {
        let system = system_prompt(&tools, sources);
        Self {
            model,
            tools,
            system,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.history.lock().await.clone()
    }

    pub async fn reset(&self) {
        self.history.lock().await.clear();
    }

    /// Answer `message`, calling tools as the model requests.
    ///
    /// Fails with `Error::Agent` when no answer arrives within the iteration
    /// cap; model errors propagate. Successful turns join the history.
    pub async fn chat(&self, message: &str) -> Result<AgentReply> {
        let history = self.history().await;
        let mut scratchpad = String::new();
        let mut steps = Vec::new();
        let mut iterations = 0;
        let mut state = State::AwaitingThought;

        let answer = loop {
            state = match state {
                State::AwaitingThought => {
                    if iterations >= self.max_iterations {
                        return Err(Error::Agent(format!(
                            "No answer after {} reasoning steps",
                            self.max_iterations
                        )));
                    }
                    iterations += 1;
                    let prompt = user_prompt(&history, message, &scratchpad);
                    let reply = self.model.complete(Some(&self.system), &prompt).await?;
                    debug!("Step {}: {}", iterations, reply);
                    State::AwaitingAction(parse_reply(&reply))
                }
                State::AwaitingAction(Step::Action { thought, tool, input }) => {
                    if let Some(thought) = thought {
                        scratchpad.push_str(&format!("Thought: {}\n", thought));
                    }
                    scratchpad.push_str(&format!("Action: {}\nAction Input: {}\n", tool, input));
                    State::AwaitingObservation { tool, input }
                }
                State::AwaitingAction(Step::Answer { answer, .. }) => State::Done(answer),
                State::AwaitingObservation { tool, input } => {
                    info!("🔧 {} {}", tool, input);
                    let observation = self.tools.call(&tool, input.clone()).await;
                    scratchpad.push_str(&format!("Observation: {}\n", observation));
                    steps.push(ToolCall {
                        tool,
                        input,
                        observation,
                    });
                    State::AwaitingThought
                }
                State::Done(answer) => break answer,
            };
        };

        self.history.lock().await.push(Turn {
            user: message.to_string(),
            assistant: answer.clone(),
        });
        Ok(AgentReply { answer, steps })
    }
}

/// Read one model reply.
///
/// Anything after a line the model wrote as `Observation:` is ignored, since
/// observations only come from tools. A reply with neither an action nor an
/// answer is taken as the answer.
pub fn parse_reply(reply: &str) -> Step {
    let reply = match find_marker(reply, &["Observation:"]) {
        Some((start, _)) => &reply[..start],
        None => reply,
    };

    let thought = find_marker(reply, &["Thought:"]).map(|(_, end)| {
        let rest = &reply[end..];
        let stop = find_marker(rest, &["Action:", "Final Answer:", "Answer:"])
            .map_or(rest.len(), |(s, _)| s);
        rest[..stop].trim().to_string()
    });
    let thought = thought.filter(|t| !t.is_empty());

    let action = find_marker(reply, &["Action:"]);
    let answer = find_marker(reply, &["Final Answer:", "Answer:"]);

    if let Some((action_start, action_end)) = action {
        if answer.map_or(true, |(answer_start, _)| action_start < answer_start) {
            let rest = &reply[action_end..];
            let (tool, input) = match find_marker(rest, &["Action Input:"]) {
                Some((s, e)) => (&rest[..s], rest[e..].trim()),
                None => (rest, ""),
            };
            return Step::Action {
                thought,
                tool: tool.trim().trim_matches('`').to_string(),
                input: parse_input(input),
            };
        }
    }

    let answer = match answer {
        Some((_, end)) => reply[end..].trim().to_string(),
        None => reply.trim().to_string(),
    };
    Step::Answer { thought, answer }
}

/// First line starting with any of `markers`, as (line start, end of marker).
fn find_marker(text: &str, markers: &[&str]) -> Option<(usize, usize)> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        for marker in markers {
            if trimmed.starts_with(marker) {
                return Some((offset, offset + indent + marker.len()));
            }
        }
        offset += line.len();
    }
    None
}

/// JSON if the model wrote JSON (possibly fenced), else the raw text.
fn parse_input(raw: &str) -> Value {
    let raw = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if raw.is_empty() {
        return Value::Object(Default::default());
    }
    if let Ok(value) = serde_json::from_str(raw) {
        return value;
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&raw[start..=end]) {
                return value;
            }
        }
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use ss_inference::models::DummyModel;

    /// Replays canned replies and records the prompts it was sent.
    #[derive(Debug)]
    struct ScriptedModel {
        replies: StdMutex<VecDeque<String>>,
        prompts: StdMutex<Vec<String>>,
        repeat_last: bool,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: StdMutex::new(replies.iter().map(|r| r.to_string()).collect()),
                prompts: StdMutex::new(Vec::new()),
                repeat_last: false,
            }
        }

        fn forever(reply: &str) -> Self {
            Self {
                repeat_last: true,
                ..Self::new(&[reply])
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceModel for ScriptedModel {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
            assert!(system.unwrap().contains("SariSariNews"));
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut replies = self.replies.lock().unwrap();
            match (replies.len(), self.repeat_last) {
                (1, true) => Ok(replies[0].clone()),
                _ => replies
                    .pop_front()
                    .ok_or_else(|| Error::Inference("script exhausted".to_string())),
            }
        }
    }

    struct Headlines;

    #[async_trait]
    impl Tool for Headlines {
        fn name(&self) -> &str {
            "get_latest_specific_news"
        }

        fn description(&self) -> &str {
            "Headlines from one outlet"
        }

        async fn call(&self, input: Value) -> String {
            match input["source"].as_str() {
                Some("GMA") => r#"[{"title":"Typhoon hits Luzon"}]"#.to_string(),
                _ => "[]".to_string(),
            }
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Headlines));
        Arc::new(registry)
    }

    #[test]
    fn test_parse_action() {
        let step = parse_reply(
            "Thought: I should check GMA.\nAction: get_latest_specific_news\nAction Input: {\"source\": \"GMA\"}\nObservation: made up",
        );
        assert_eq!(
            step,
            Step::Action {
                thought: Some("I should check GMA.".to_string()),
                tool: "get_latest_specific_news".to_string(),
                input: json!({"source": "GMA"}),
            }
        );
    }

    #[test]
    fn test_parse_fenced_and_plain_inputs() {
        match parse_reply("Action: url_based_qa\nAction Input: ```json\n{\"url\": \"https://x.ph\", \"query\": \"why\"}\n```") {
            Step::Action { input, .. } => assert_eq!(input["url"], "https://x.ph"),
            other => panic!("unexpected step: {:?}", other),
        }
        match parse_reply("Action: get_latest_specific_news\nAction Input: Rappler") {
            Step::Action { input, .. } => assert_eq!(input, json!("Rappler")),
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(
            parse_reply("Thought: I can answer without using any more tools.\nAnswer: Typhoon Kristine hit Luzon.\nIt weakened later."),
            Step::Answer {
                thought: Some("I can answer without using any more tools.".to_string()),
                answer: "Typhoon Kristine hit Luzon.\nIt weakened later.".to_string(),
            }
        );
        assert_eq!(
            parse_reply("Final Answer: Walang balita."),
            Step::Answer {
                thought: None,
                answer: "Walang balita.".to_string()
            }
        );
    }

    #[test]
    fn test_parse_plain_reply_is_answer() {
        assert_eq!(
            parse_reply("  Magandang araw! How can I help?  "),
            Step::Answer {
                thought: None,
                answer: "Magandang araw! How can I help?".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_chat_runs_tool_then_answers() {
        let model = Arc::new(ScriptedModel::new(&[
            "Thought: Check GMA.\nAction: get_latest_specific_news\nAction Input: {\"source\": \"GMA\"}",
            "Thought: I can answer without using any more tools.\nAnswer: GMA reports a typhoon hitting Luzon.",
        ]));
        let agent = ReactAgent::new(model.clone(), registry(), &["GMA"]);

        let reply = agent.chat("What's new on GMA?").await.unwrap();
        assert_eq!(reply.answer, "GMA reports a typhoon hitting Luzon.");
        assert_eq!(reply.steps.len(), 1);
        assert_eq!(reply.steps[0].tool, "get_latest_specific_news");
        assert!(reply.steps[0].observation.contains("Typhoon hits Luzon"));

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Observation: [{\"title\":\"Typhoon hits Luzon\"}]"));
        assert_eq!(agent.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_observation() {
        let model = Arc::new(ScriptedModel::new(&[
            "Action: fetch_news\nAction Input: {\"source\": \"GMA\"}",
            "Answer: Sorry.",
        ]));
        let agent = ReactAgent::new(model.clone(), registry(), &[]);
        let reply = agent.chat("News?").await.unwrap();
        assert!(reply.steps[0].observation.contains("Valid tools: get_latest_specific_news"));
        assert_eq!(reply.answer, "Sorry.");
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let model = Arc::new(ScriptedModel::forever(
            "Action: get_latest_specific_news\nAction Input: {\"source\": \"GMA\"}",
        ));
        let agent = ReactAgent::new(model.clone(), registry(), &[]).with_max_iterations(3);

        let result = agent.chat("Loop forever").await;
        assert!(matches!(result, Err(Error::Agent(_))));
        assert_eq!(model.prompts().len(), 3);
        assert!(agent.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_carries_into_next_turn() {
        let model = Arc::new(ScriptedModel::new(&["Answer: Kristine.", "Answer: Isabela."]));
        let agent = ReactAgent::new(model.clone(), registry(), &[]);
        agent.chat("Which typhoon?").await.unwrap();
        agent.chat("Where is landfall?").await.unwrap();

        let prompts = model.prompts();
        assert!(prompts[1].contains("User: Which typhoon?\nSariSariNews: Kristine."));
        assert_eq!(agent.history().await.len(), 2);

        agent.reset().await;
        assert!(agent.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_dummy_model_answers_directly() {
        let agent = ReactAgent::new(Arc::new(DummyModel::new()), registry(), &["GMA"]);
        let reply = agent.chat("Kumusta?").await.unwrap();
        assert!(reply.steps.is_empty());
        assert!(reply.answer.contains("Kumusta?"));
    }
}
