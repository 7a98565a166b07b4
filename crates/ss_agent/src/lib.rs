pub mod prompt;
pub mod qa;
pub mod react;
pub mod tools;

pub use qa::{ArticleQa, QaAnswer, QaConfig, ARTICLE_FETCH_FAILED, QA_FAILED};
pub use react::{AgentReply, ReactAgent, Step, ToolCall};
pub use tools::{Tool, ToolRegistry};

pub mod prelude {
    pub use super::{AgentReply, ArticleQa, ReactAgent, Tool, ToolRegistry};
    pub use ss_core::{Error, Result};
}
