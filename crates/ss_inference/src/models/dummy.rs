use std::fmt;
use ss_core::{InferenceModel, Result};

const ANSWER_WORDS: usize = 40;

/// Offline stand-in for a language model.
///
/// Answers with the opening words of the last context block in the prompt,
/// which is enough to exercise the agent and QA pipelines end to end.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, _system: Option<&str>, prompt: &str) -> Result<String> {
        let tail = prompt
            .rsplit("---------------------")
            .nth(1)
            .or_else(|| prompt.rsplit("Observation:").next())
            .unwrap_or(prompt);
        let words: Vec<&str> = tail.split_whitespace().take(ANSWER_WORDS).collect();
        Ok(format!("Answer: {}", words.join(" ")))
    }
}
