use async_trait::async_trait;
use hindsight_ai::{
  ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
};
use hindsight_shared::AppError;

/// One chat turn, transport-agnostic so callers aren't coupled to
/// `async-openai`'s message types.
#[derive(Debug, Clone)]
pub struct LlmMessage {
  pub role: LlmRole,
  pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmRole {
  System,
  User,
}

impl LlmMessage {
  #[must_use]
  pub fn system(content: impl Into<String>) -> Self {
    Self {
      role: LlmRole::System,
      content: content.into(),
    }
  }

  #[must_use]
  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: LlmRole::User,
      content: content.into(),
    }
  }
}

fn to_chat_messages(messages: Vec<LlmMessage>) -> Vec<ChatCompletionRequestMessage> {
  messages
    .into_iter()
    .map(|m| match m.role {
      LlmRole::System => {
        ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(m.content))
      }
      LlmRole::User => {
        ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(m.content))
      }
    })
    .collect()
}

/// Error taxonomy for a structured LLM call, per the contract's three
/// distinguishable outcomes: completion truncated, invalid JSON, or a bare
/// transport failure that must propagate verbatim.
#[derive(Debug)]
pub enum LlmCallError {
  /// The completion was cut off by the token cap; the caller should split
  /// its input and retry rather than trust the response.
  OutputTooLong,
  /// The completion parsed as a string but not as valid JSON.
  InvalidJson(AppError),
  /// Network/auth/rate-limit/etc — propagate to the caller unchanged.
  Transport(AppError),
}

impl std::fmt::Display for LlmCallError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::OutputTooLong => write!(f, "llm output exceeded the token limit"),
      Self::InvalidJson(e) => write!(f, "llm returned invalid json: {e}"),
      Self::Transport(e) => write!(f, "{e}"),
    }
  }
}

impl std::error::Error for LlmCallError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::OutputTooLong => None,
      Self::InvalidJson(e) | Self::Transport(e) => Some(e),
    }
  }
}

impl From<AppError> for LlmCallError {
  fn from(err: AppError) -> Self {
    Self::Transport(err)
  }
}

/// The LLM transport black box: turn a structured-output request into a
/// parsed JSON value, or a distinguishable failure.
#[async_trait]
pub trait LlmClient: Send + Sync {
  async fn call_json(
    &self,
    messages: Vec<LlmMessage>,
    schema_name: &str,
    schema_description: Option<String>,
    schema: serde_json::Value,
  ) -> Result<serde_json::Value, LlmCallError>;
}

/// Default `LlmClient` backed by an OpenAI-compatible chat completions API.
pub struct OpenAiLlmClient;

#[async_trait]
impl LlmClient for OpenAiLlmClient {
  async fn call_json(
    &self,
    messages: Vec<LlmMessage>,
    schema_name: &str,
    schema_description: Option<String>,
    schema: serde_json::Value,
  ) -> Result<serde_json::Value, LlmCallError> {
    let (content, truncated) = hindsight_ai::generate_json(
      to_chat_messages(messages),
      schema_name.to_owned(),
      schema_description,
      schema,
    )
    .await?;

    if truncated {
      return Err(LlmCallError::OutputTooLong);
    }

    serde_json::from_str(&content).map_err(|e| LlmCallError::InvalidJson(AppError::new(e)))
  }
}
