use chrono::{DateTime, Utc};
use hindsight_shared::{AppError, ErrorPhase};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use crate::chunker::chunk_text;
use crate::llm::{LlmCallError, LlmClient, LlmMessage};
use crate::types::{CausalRelationKind, ChunkExtraction, Fact, FactType, RawCausalRelation, RawEntity};

/// Chunks larger than this are split before extraction, to stay well under
/// the model's output token cap for a single completion.
const EXTRACTION_CHUNK_CHARS: usize = 3000;

/// Separators tried, in order, when splitting a chunk that produced a
/// truncated completion.
const SPLIT_SEPARATORS: &[&str] = &[". ", "! ", "? ", "\n\n"];

/// Same-prompt retries on a JSON-validation failure before giving up.
const MAX_JSON_RETRIES: usize = 2;

#[derive(Debug, Deserialize, JsonSchema)]
struct SchemaEntity {
  text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SchemaCausalRelation {
  target_fact_index: i64,
  relation_type: String,
  strength: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SchemaFact {
  factual_core: String,
  emotional_significance: Option<String>,
  reasoning_motivation: Option<String>,
  preferences_opinions: Option<String>,
  sensory_details: Option<String>,
  observations: Option<String>,
  fact_kind: Option<String>,
  occurred_start: Option<String>,
  occurred_end: Option<String>,
  fact_type: String,
  entities: Option<Vec<SchemaEntity>>,
  causal_relations: Option<Vec<SchemaCausalRelation>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SchemaResponse {
  facts: Vec<SchemaFact>,
}

fn extraction_schema() -> serde_json::Value {
  serde_json::to_value(schemars::schema_for!(SchemaResponse))
    .expect("schemars output is always valid json")
}

fn build_messages(chunk: &str, context: &str, agent_name: Option<&str>, extract_opinions: bool) -> Vec<LlmMessage> {
  let fact_types_instruction = if extract_opinions {
    "Extract ONLY 'opinion' type facts (formed opinions, beliefs, and perspectives). \
     Do not extract 'world' or 'assistant' facts."
  } else {
    "Extract ONLY 'world' and 'assistant' type facts. Opinions are extracted separately."
  };
  let agent_line = agent_name.map(|n| format!("\n- Agent name: {n}")).unwrap_or_default();
  let context_line = if context.is_empty() { "no additional context provided" } else { context };

  let system = format!(
    "You extract comprehensive, self-contained facts from text for a long-term memory system.\n\n\
     {fact_types_instruction}\n\n\
     Context: {context_line}{agent_line}\n\n\
     Each fact must be self-contained, readable without the source text, and preserve specific \
     content rather than vague summaries. Combine a question and its answer into one fact. \
     Split a user request and the assistant's response into two separate facts. Convert relative \
     time expressions to absolute dates when a reference date is available. Only set \
     occurred_start/occurred_end for datable events, using fact_kind=\"event\"; otherwise use \
     fact_kind=\"conversation\" or \"other\".\n\n\
     fact_type is \"world\" for anything not involving the assistant, or \"assistant\" for \
     requests to, or actions by, the assistant. Only include named entities (people, \
     organizations, specific places) in `entities` — not pronouns or generic roles. Report any \
     causal relationship between two facts in this response via causal_relations, indexing the \
     target fact by its position in the facts array."
  );

  vec![LlmMessage::system(system), LlmMessage::user(chunk.to_owned())]
}

/// One chunk's extraction, with causal relation indices still local to this
/// chunk's own `facts` array.
struct ChunkFacts {
  facts: Vec<LocalFact>,
}

struct LocalFact {
  fact_text: String,
  fact_type: FactType,
  occurred_start: Option<DateTime<Utc>>,
  occurred_end: Option<DateTime<Utc>>,
  emotional_significance: Option<String>,
  reasoning_motivation: Option<String>,
  preferences_opinions: Option<String>,
  sensory_details: Option<String>,
  observations: Option<String>,
  entities: Vec<RawEntity>,
  causal_relations: Vec<RawCausalRelation>,
}

/// Lenient parse of one structured-output JSON value into `LocalFact`s.
/// Skips (and logs) individually defective facts rather than failing the
/// whole chunk — only `factual_core` is treated as truly required.
fn parse_chunk_facts(value: &serde_json::Value, chunk_index: usize) -> Vec<LocalFact> {
  let Some(raw_facts) = value.get("facts").and_then(|v| v.as_array()) else {
    warn!(chunk_index, "extraction response missing a `facts` array");
    return vec![];
  };

  let mut out = Vec::with_capacity(raw_facts.len());

  for (i, raw) in raw_facts.iter().enumerate() {
    let Some(factual_core) = raw.get("factual_core").and_then(|v| v.as_str()).filter(|s| !s.is_empty())
    else {
      warn!(chunk_index, fact_index = i, "skipping fact: missing factual_core");
      continue;
    };

    let raw_fact_type = raw.get("fact_type").and_then(|v| v.as_str());
    let fact_kind_hint = raw.get("fact_kind").and_then(|v| v.as_str());

    let fact_type = match raw_fact_type {
      Some("assistant") => FactType::Bank,
      Some("world") => FactType::World,
      Some("opinion") => FactType::Opinion,
      _ => match fact_kind_hint {
        Some("assistant") => FactType::Bank,
        Some("world") => FactType::World,
        Some("opinion") => FactType::Opinion,
        _ => {
          warn!(chunk_index, fact_index = i, "defaulting to fact_type=world");
          FactType::World
        }
      },
    };

    let fact_kind = match fact_kind_hint {
      Some("event") => "event",
      Some("other") => "other",
      _ => "conversation",
    };

    let mut parts = vec![factual_core.to_owned()];
    let mut push_dim = |field: &str| -> Option<String> {
      raw.get(field).and_then(|v| v.as_str()).filter(|s| !s.is_empty()).map(str::to_owned)
    };
    let emotional_significance = push_dim("emotional_significance");
    let reasoning_motivation = push_dim("reasoning_motivation");
    let preferences_opinions = push_dim("preferences_opinions");
    let sensory_details = push_dim("sensory_details");
    let observations = push_dim("observations");
    for dim in [
      &emotional_significance,
      &reasoning_motivation,
      &preferences_opinions,
      &sensory_details,
      &observations,
    ] {
      if let Some(d) = dim {
        parts.push(d.clone());
      }
    }

    let fact_text = if parts.len() == 1 {
      parts.remove(0)
    } else {
      format!("{} - {}", parts[0], parts[1..].join(" - "))
    };

    let (occurred_start, occurred_end) = if fact_kind == "event" {
      (
        raw.get("occurred_start").and_then(|v| v.as_str()).and_then(hindsight_shared::parse_datetime_lenient),
        raw.get("occurred_end").and_then(|v| v.as_str()).and_then(hindsight_shared::parse_datetime_lenient),
      )
    } else {
      (None, None)
    };

    let entities = raw
      .get("entities")
      .and_then(|v| v.as_array())
      .map(|arr| {
        arr
          .iter()
          .filter_map(|e| {
            if let Some(s) = e.as_str() {
              Some(RawEntity { text: s.to_owned() })
            } else {
              e.get("text").and_then(|v| v.as_str()).map(|s| RawEntity { text: s.to_owned() })
            }
          })
          .collect()
      })
      .unwrap_or_default();

    let causal_relations = raw
      .get("causal_relations")
      .and_then(|v| v.as_array())
      .map(|arr| {
        arr
          .iter()
          .filter_map(|r| {
            let target = r.get("target_fact_index").and_then(serde_json::Value::as_i64)?;
            let kind = r.get("relation_type").and_then(|v| v.as_str()).and_then(CausalRelationKind::parse)?;
            let strength = r.get("strength").and_then(serde_json::Value::as_f64).unwrap_or(1.0) as f32;
            usize::try_from(target).ok().map(|target_fact_index| RawCausalRelation {
              target_fact_index,
              relation_type: kind,
              strength: strength.clamp(0.0, 1.0),
            })
          })
          .collect()
      })
      .unwrap_or_default();

    out.push(LocalFact {
      fact_text,
      fact_type,
      occurred_start,
      occurred_end,
      emotional_significance,
      reasoning_motivation,
      preferences_opinions,
      sensory_details,
      observations,
      entities,
      causal_relations,
    });
  }

  out
}

async fn extract_chunk_once(
  llm: &dyn LlmClient,
  chunk: &str,
  chunk_index: usize,
  context: &str,
  agent_name: Option<&str>,
  extract_opinions: bool,
) -> Result<ChunkFacts, LlmCallError> {
  let mut last_err = None;

  for attempt in 0..MAX_JSON_RETRIES {
    let messages = build_messages(chunk, context, agent_name, extract_opinions);
    match llm
      .call_json(messages, "fact_extraction", Some("Extracted facts from a text chunk".to_owned()), extraction_schema())
      .await
    {
      Ok(value) => return Ok(ChunkFacts { facts: parse_chunk_facts(&value, chunk_index) }),
      Err(LlmCallError::OutputTooLong) => return Err(LlmCallError::OutputTooLong),
      Err(LlmCallError::Transport(e)) => return Err(LlmCallError::Transport(e)),
      Err(LlmCallError::InvalidJson(e)) => {
        warn!(chunk_index, attempt, error = %e, "extraction response failed json validation, retrying");
        last_err = Some(e);
      }
    }
  }

  Err(LlmCallError::InvalidJson(last_err.unwrap_or_else(|| {
    AppError::in_phase(ErrorPhase::Extraction, anyhow::anyhow!("exhausted retries"))
  })))
}

/// Find the sentence boundary nearest `chunk`'s midpoint (within a ±20%
/// search window) and split there, falling back to a hard midpoint split.
fn split_at_midpoint(chunk: &str) -> (String, String) {
  let mid = chunk.len() / 2;
  let window = (chunk.len() as f64 * 0.2) as usize;
  let search_start = mid.saturating_sub(window);
  let search_end = (mid + window).min(chunk.len());

  let mut best_split = mid;
  for separator in SPLIT_SEPARATORS {
    if let Some(window_text) = chunk.get(search_start..search_end) {
      if let Some(pos) = window_text.rfind(separator) {
        best_split = search_start + pos + separator.len();
        break;
      }
    }
  }

  let split_at = (0..=best_split.min(chunk.len())).rev().find(|&i| chunk.is_char_boundary(i)).unwrap_or(0);
  (chunk[..split_at].trim().to_owned(), chunk[split_at..].trim().to_owned())
}

/// Extract facts from a chunk, recursively splitting in half on
/// `OutputTooLong` and retrying both halves in parallel.
async fn extract_chunk_with_auto_split(
  llm: &dyn LlmClient,
  chunk: String,
  chunk_index: usize,
  context: &str,
  agent_name: Option<&str>,
  extract_opinions: bool,
) -> Result<ChunkFacts, AppError> {
  match extract_chunk_once(llm, &chunk, chunk_index, context, agent_name, extract_opinions).await {
    Ok(facts) => Ok(facts),
    Err(LlmCallError::OutputTooLong) => {
      warn!(chunk_index, chars = chunk.len(), "output too long, splitting chunk and retrying");
      let (first_half, second_half) = split_at_midpoint(&chunk);

      let (first, second) = futures::future::join(
        Box::pin(extract_chunk_with_auto_split(llm, first_half, chunk_index, context, agent_name, extract_opinions)),
        Box::pin(extract_chunk_with_auto_split(llm, second_half, chunk_index, context, agent_name, extract_opinions)),
      )
      .await;

      let mut facts = first?.facts;
      facts.extend(second?.facts);
      Ok(ChunkFacts { facts })
    }
    Err(LlmCallError::InvalidJson(e)) => Err(e.with_phase(ErrorPhase::Extraction)),
    Err(LlmCallError::Transport(e)) => Err(e.with_phase(ErrorPhase::Extraction)),
  }
}

/// Extract semantic facts from free-form text for one content item.
///
/// Chunks long text, extracts each chunk in parallel (splitting further on
/// output overrun), and rebases each chunk's causal relation indices into a
/// single fact list global to this content item.
pub async fn extract_facts_from_text(
  llm: &dyn LlmClient,
  text: &str,
  event_date: DateTime<Utc>,
  content_index: usize,
  agent_name: Option<&str>,
  context: &str,
  extract_opinions: bool,
) -> Result<(Vec<Fact>, Vec<ChunkExtraction>), AppError> {
  let chunks = chunk_text(text, EXTRACTION_CHUNK_CHARS);

  let tasks = chunks.iter().enumerate().map(|(i, chunk)| {
    extract_chunk_with_auto_split(llm, chunk.clone(), i, context, agent_name, extract_opinions)
  });
  let chunk_results = futures::future::try_join_all(tasks).await?;

  let mut facts = Vec::new();
  let mut chunk_metadata = Vec::with_capacity(chunks.len());
  let mut offsets = Vec::with_capacity(chunks.len());

  for (chunk_index, (chunk_text, chunk_facts)) in chunks.into_iter().zip(chunk_results.iter()).enumerate() {
    offsets.push(facts.len());
    chunk_metadata.push(ChunkExtraction {
      chunk_text,
      chunk_index,
      fact_count: chunk_facts.facts.len(),
    });
    for local in &chunk_facts.facts {
      facts.push(Fact {
        content_index,
        chunk_index,
        fact_text: local.fact_text.clone(),
        fact_type: local.fact_type,
        mentioned_at: event_date,
        occurred_start: local.occurred_start,
        occurred_end: local.occurred_end,
        emotional_significance: local.emotional_significance.clone(),
        reasoning_motivation: local.reasoning_motivation.clone(),
        preferences_opinions: local.preferences_opinions.clone(),
        sensory_details: local.sensory_details.clone(),
        observations: local.observations.clone(),
        entities: local.entities.clone(),
        causal_relations: Vec::new(),
      });
    }
  }

  // Rebase each chunk's locally-indexed causal relations onto the global
  // fact list now that every chunk's offset is known.
  for (chunk_index, chunk_facts) in chunk_results.iter().enumerate() {
    let offset = offsets[chunk_index];
    for (local_idx, local) in chunk_facts.facts.iter().enumerate() {
      let global_idx = offset + local_idx;
      let rebased: Vec<RawCausalRelation> = local
        .causal_relations
        .iter()
        .filter(|r| offset + r.target_fact_index < facts.len())
        .map(|r| RawCausalRelation {
          target_fact_index: offset + r.target_fact_index,
          relation_type: r.relation_type,
          strength: r.strength,
        })
        .collect();
      facts[global_idx].causal_relations = rebased;
    }
  }

  Ok((facts, chunk_metadata))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_chunk_facts_skips_entries_missing_factual_core() {
    let value = serde_json::json!({
      "facts": [
        { "fact_type": "world" },
        { "factual_core": "Alice works at Acme", "fact_type": "world" },
      ]
    });

    let facts = parse_chunk_facts(&value, 0);
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].fact_text, "Alice works at Acme");
  }

  #[test]
  fn parse_chunk_facts_recovers_fact_type_from_fact_kind_before_defaulting() {
    let value = serde_json::json!({
      "facts": [
        { "factual_core": "Bob asked a question", "fact_kind": "assistant" },
        { "factual_core": "something unlabeled" },
      ]
    });

    let facts = parse_chunk_facts(&value, 0);
    assert_eq!(facts[0].fact_type, FactType::Bank);
    assert_eq!(facts[1].fact_type, FactType::World);
  }

  #[test]
  fn parse_chunk_facts_joins_present_dimensions_and_skips_absent() {
    let value = serde_json::json!({
      "facts": [{
        "factual_core": "Alice felt proud",
        "fact_type": "world",
        "emotional_significance": "pride",
        "sensory_details": "",
      }]
    });

    let facts = parse_chunk_facts(&value, 0);
    assert_eq!(facts[0].fact_text, "Alice felt proud - pride");
  }

  #[test]
  fn parse_chunk_facts_accepts_entities_as_strings_or_objects() {
    let value = serde_json::json!({
      "facts": [{
        "factual_core": "Alice met Bob",
        "fact_type": "world",
        "entities": ["Alice", { "text": "Bob" }],
      }]
    });

    let facts = parse_chunk_facts(&value, 0);
    let names: Vec<_> = facts[0].entities.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
  }

  #[test]
  fn parse_chunk_facts_only_sets_occurred_range_for_event_kind() {
    let value = serde_json::json!({
      "facts": [{
        "factual_core": "Alice graduated",
        "fact_type": "world",
        "fact_kind": "event",
        "occurred_start": "2020-03-15T00:00:00Z",
      }]
    });

    let facts = parse_chunk_facts(&value, 0);
    assert!(facts[0].occurred_start.is_some());
  }

  #[test]
  fn split_at_midpoint_prefers_sentence_boundary_near_center() {
    let chunk =
      "Alice went to the busy market today. Bob stayed home and read a book about gardening techniques and methods.";
    let (first, second) = split_at_midpoint(chunk);
    assert!(first.ends_with('.'));
    assert!(!second.is_empty());
    assert_eq!(format!("{first} {second}"), chunk);
  }

  #[test]
  fn split_at_midpoint_falls_back_to_hard_split_without_separator() {
    let chunk = "a".repeat(40);
    let (first, second) = split_at_midpoint(&chunk);
    assert_eq!(first.len() + second.len(), chunk.len());
    assert!(!first.is_empty());
    assert!(!second.is_empty());
  }
}
