// Re-export async_openai types for consumers
pub use async_openai::types::chat::{
  ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
  ChatCompletionRequestUserMessage,
};

mod embed;
pub use embed::embed;

mod embed_many;
pub use embed_many::embed_many;

mod embed_shared;

mod generate_json;
pub use generate_json::generate_json;

mod schema_strict;
