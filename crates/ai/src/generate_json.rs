use anyhow::anyhow;
use async_openai::{
  Client,
  config::OpenAIConfig,
  types::chat::{
    ChatCompletionRequestMessage, CreateChatCompletionRequestArgs, FinishReason, ResponseFormat,
    ResponseFormatJsonSchema,
  },
};
use hindsight_shared::{APP_ENV, AppError};

use crate::schema_strict::fix_schema_for_strict;

/// Runs a strict-JSON-schema chat completion and returns the raw response
/// text for the caller to parse itself (lenient, per-field parsing rather
/// than strict deserialization).
///
/// Returns `(response_text, was_truncated)`. `was_truncated` is `true` when
/// the model's `finish_reason` is `length` — the caller's cue to split its
/// input and retry rather than trust the (likely incomplete) JSON.
pub async fn generate_json(
  messages: Vec<ChatCompletionRequestMessage>,
  schema_name: String,
  schema_description: Option<String>,
  mut schema: serde_json::Value,
) -> Result<(String, bool), AppError> {
  fix_schema_for_strict(&mut schema);

  let config = OpenAIConfig::new()
    .with_api_key(&APP_ENV.openai_api_key)
    .with_api_base(&APP_ENV.openai_base_url);

  let client = Client::with_config(config);

  let request = CreateChatCompletionRequestArgs::default()
    .model(&APP_ENV.openai_chat_model)
    .messages(messages)
    .response_format(ResponseFormat::JsonSchema {
      json_schema: ResponseFormatJsonSchema {
        description: schema_description,
        name: schema_name,
        schema: Some(schema),
        strict: Some(true),
      },
    })
    .build()?;

  let response = client.chat().create(request).await?;

  let choice = response
    .choices
    .into_iter()
    .next()
    .ok_or_else(|| anyhow!("empty choices"))?;

  let truncated = matches!(choice.finish_reason, Some(FinishReason::Length));
  let content = choice.message.content.unwrap_or_default();

  Ok((content, truncated))
}
