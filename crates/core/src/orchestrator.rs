use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Duration as StdDuration;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use chrono_humanize::HumanTime;
use hindsight_entities::bank;
use hindsight_shared::{AppError, ErrorPhase};
use sea_orm::{DatabaseConnection, DatabaseTransaction, EntityTrait, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RetainConfig;
use crate::dedup::{DuplicateChecker, check_duplicates_batch, filter_duplicates};
use crate::embedder::{Embedder, augment_batch};
use crate::entity_processing::{EntityResolver, insert_entity_links_batch, process_entities_batch};
use crate::fact_store::{ensure_bank_exists, handle_document_tracking, insert_facts_batch};
use crate::chunk_store::{map_facts_to_chunks, store_chunks_batch};
use crate::link_builder::{
  compute_causal_links, compute_semantic_links, compute_temporal_links, compute_temporal_query_bounds,
  fetch_semantic_candidates, fetch_temporal_candidates, insert_links_batch,
};
use crate::llm::LlmClient;
use crate::task_backend::{BackgroundTask, TaskBackend};
use crate::types::{ChunkExtraction, Fact, FactType, ProcessedFact, RetainContent};

/// Seconds of synthetic spacing applied between facts of the same content
/// item, preserving their extraction order in every temporal field
/// (spec invariant 3).
const EXTRACTION_ORDER_SPACING_SECS: i64 = 10;

/// Bounded retries for the initial transaction acquisition, covering
/// transient pool exhaustion / connection resets — the retry loop itself is
/// core retain-transaction behavior, not the excluded "connection
/// bootstrap" concern.
const TRANSACTION_ACQUIRE_RETRIES: u32 = 3;

/// A single content item to retain, before defaults are applied.
#[derive(Debug, Clone)]
pub struct RetainContentInput {
  pub content: String,
  pub context: Option<String>,
  pub event_date: Option<DateTime<Utc>>,
  pub metadata: Option<serde_json::Value>,
}

/// Arguments to [`retain_batch`]. `bank_name` seeds a brand-new bank's
/// profile; it is ignored if the bank already exists.
#[derive(Debug, Clone)]
pub struct RetainBatchRequest {
  pub bank_id: String,
  pub bank_name: String,
  pub contents: Vec<RetainContentInput>,
  pub document_id: Option<String>,
  pub is_first_batch: bool,
  pub fact_type_override: Option<FactType>,
  pub confidence_score: Option<f32>,
}

/// The process-wide collaborators the pipeline is built from (spec §9
/// "global process state" — constructed once by the caller, passed
/// explicitly, never ambient).
pub struct RetainDeps<'a> {
  pub db: &'a DatabaseConnection,
  pub llm: &'a dyn LlmClient,
  pub embedder: &'a dyn Embedder,
  pub duplicate_checker: &'a dyn DuplicateChecker,
  pub entity_resolver: &'a dyn EntityResolver,
  pub task_backend: &'a dyn TaskBackend,
  pub config: RetainConfig,
}

/// Absolute date prefix used to augment fact text before embedding.
/// Deliberately not relative-to-now — a relative string baked into a
/// stored embedding would go stale as time passes.
#[must_use]
pub fn default_format_date(dt: DateTime<Utc>) -> String {
  dt.format("%Y-%m-%d").to_string()
}

/// Retains a single content item, returning the unit ids created for it.
pub async fn retain(
  bank_id: &str,
  bank_name: &str,
  content: String,
  context: Option<String>,
  event_date: Option<DateTime<Utc>>,
  document_id: Option<String>,
  is_first_batch: bool,
  fact_type_override: Option<FactType>,
  confidence_score: Option<f32>,
  deps: &RetainDeps<'_>,
) -> Result<Vec<Uuid>, AppError> {
  let request = RetainBatchRequest {
    bank_id: bank_id.to_owned(),
    bank_name: bank_name.to_owned(),
    contents: vec![RetainContentInput {
      content,
      context,
      event_date,
      metadata: None,
    }],
    document_id,
    is_first_batch,
    fact_type_override,
    confidence_score,
  };

  let mut results = retain_batch(request, deps).await?;
  Ok(results.pop().unwrap_or_default())
}

/// Drives the full retain pipeline for a batch of content items (spec §4.9).
pub async fn retain_batch(
  request: RetainBatchRequest,
  deps: &RetainDeps<'_>,
) -> Result<Vec<Vec<Uuid>>, AppError> {
  let RetainBatchRequest {
    bank_id,
    bank_name,
    contents,
    document_id,
    is_first_batch,
    fact_type_override,
    confidence_score,
  } = request;

  if contents.is_empty() {
    return Ok(Vec::new());
  }

  // 1-2. Build immutable RetainContent objects.
  let now = Utc::now();
  let contents: Vec<RetainContent> = contents
    .into_iter()
    .map(|c| RetainContent {
      content: c.content,
      context: c.context.unwrap_or_default(),
      event_date: c.event_date.unwrap_or(now),
      metadata: c.metadata.unwrap_or(serde_json::Value::Null),
    })
    .collect();

  let total_chars: usize = contents.iter().map(|c| c.content.len()).sum();
  let oldest = contents.iter().map(|c| c.event_date).min().unwrap_or(now);
  info!(
    bank_id = %bank_id,
    contents = contents.len(),
    total_chars,
    oldest_content_age = %HumanTime::from(now.signed_duration_since(oldest)),
    "retain_batch start"
  );

  // Derived rather than accepted as a separate argument, so it can never
  // disagree with fact_type_override.
  let extract_opinions = fact_type_override == Some(FactType::Opinion);

  // 3. Fan out one fact-extraction task per content item.
  let step_start = std::time::Instant::now();
  let extraction_tasks = contents.iter().enumerate().map(|(content_index, content)| {
    crate::fact_extraction::extract_facts_from_text(
      deps.llm,
      &content.content,
      content.event_date,
      content_index,
      Some(bank_name.as_str()),
      &content.context,
      extract_opinions,
    )
  });
  let per_content_results = futures::future::try_join_all(extraction_tasks)
    .await
    .map_err(|e| e.with_phase(ErrorPhase::Extraction))?;

  let merged = merge_extractions(per_content_results);
  let mut facts = merged.facts;
  let chunks = merged.chunks;

  info!(
    bank_id = %bank_id,
    facts = facts.len(),
    chunks = chunks.len(),
    elapsed_ms = step_start.elapsed().as_millis() as u64,
    "[1] extract facts"
  );

  if facts.is_empty() {
    return Ok(contents.iter().map(|_| Vec::new()).collect());
  }

  // 4. Apply fact_type_override.
  if let Some(override_type) = fact_type_override {
    for fact in &mut facts {
      fact.fact_type = override_type;
    }
  }

  // Invariant 2 and invariant 3: normalize occurred ranges, then apply the
  // per-content extraction-order spacing to every temporal field.
  for fact in &mut facts {
    normalize_occurred_range(fact);
  }
  apply_temporal_offsets(&mut facts);

  // 5. Augment + embed in one batch call.
  let step_start = std::time::Instant::now();
  let augmented = augment_batch(&facts, default_format_date);
  let embeddings = deps
    .embedder
    .embed_batch(&augmented)
    .await
    .map_err(|e| e.with_phase(ErrorPhase::Embedding))?;

  if embeddings.len() != facts.len() {
    return Err(AppError::in_phase(
      ErrorPhase::Embedding,
      anyhow!(
        "embedder returned {} vectors for {} facts",
        embeddings.len(),
        facts.len()
      ),
    ));
  }

  info!(
    bank_id = %bank_id,
    embeddings = embeddings.len(),
    elapsed_ms = step_start.elapsed().as_millis() as u64,
    "[2] generate embeddings"
  );

  // Step 3 (spec numbering): ProcessedFact list, chunk_id filled in below.
  let mut processed: Vec<ProcessedFact> = facts
    .iter()
    .zip(embeddings)
    .map(|(fact, embedding)| ProcessedFact::from_fact(fact.clone(), embedding, confidence_score))
    .collect();

  // 6-16. Single transaction.
  let txn = begin_with_retry(deps.db, TRANSACTION_ACQUIRE_RETRIES).await?;

  let result = retain_in_transaction(
    &txn,
    &bank_id,
    &bank_name,
    &contents,
    &facts,
    &mut processed,
    &chunks,
    document_id,
    is_first_batch,
    deps,
  )
  .await;

  let (result_unit_ids, non_duplicate_facts, entity_links, unit_ids) = match result {
    Ok(outcome) => outcome,
    Err(e) => {
      if let Err(rollback_err) = txn.rollback().await {
        warn!(bank_id = %bank_id, error = %rollback_err, "rollback failed after retain error");
      }
      return Err(e.with_phase(ErrorPhase::Transaction));
    }
  };

  txn.commit().await.map_err(|e| AppError::in_phase(ErrorPhase::Commit, e))?;

  // 18. Post-commit background task fan-out.
  trigger_background_tasks(deps.task_backend, &bank_id, &unit_ids, &non_duplicate_facts, &entity_links).await;

  Ok(result_unit_ids)
}

#[allow(clippy::too_many_arguments)]
async fn retain_in_transaction(
  txn: &DatabaseTransaction,
  bank_id: &str,
  bank_name: &str,
  contents: &[RetainContent],
  facts: &[Fact],
  processed: &mut [ProcessedFact],
  chunks: &[ChunkExtraction],
  document_id: Option<String>,
  is_first_batch: bool,
  deps: &RetainDeps<'_>,
) -> Result<(Vec<Vec<Uuid>>, Vec<ProcessedFact>, Vec<crate::types::EntityLinkCandidate>, Vec<Uuid>), AppError> {
  // 7. Ensure bank exists.
  ensure_bank_exists(bank_id, bank_name, txn)
    .await
    .map_err(|e| e.with_phase(ErrorPhase::FactStorage))?;

  let combined_content = || contents.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join("\n");

  let document_row_id = if let Some(document_id) = document_id.clone() {
    Some(
      handle_document_tracking(bank_id, &document_id, &combined_content(), is_first_batch, txn)
        .await
        .map_err(|e| e.with_phase(ErrorPhase::FactStorage))?,
    )
  } else if !chunks.is_empty() {
    let generated_document_id = Uuid::now_v7().to_string();
    Some(
      handle_document_tracking(bank_id, &generated_document_id, &combined_content(), is_first_batch, txn)
        .await
        .map_err(|e| e.with_phase(ErrorPhase::FactStorage))?,
    )
  } else {
    None
  };

  // 8. Persist chunks, fill in chunk_id on each processed fact.
  if let Some(document_row_id) = document_row_id {
    if !chunks.is_empty() {
      let chunk_ids = store_chunks_batch(bank_id, document_row_id, chunks, txn)
        .await
        .map_err(|e| e.with_phase(ErrorPhase::ChunkStorage))?;

      let fact_chunk_indices: Vec<usize> = facts.iter().map(|f| f.chunk_index).collect();
      let resolved = map_facts_to_chunks(&fact_chunk_indices, &chunk_ids);
      for (p, chunk_id) in processed.iter_mut().zip(resolved) {
        p.chunk_id = chunk_id;
      }
    }
  }

  // 9. Deduplicate.
  let is_duplicate_flags = check_duplicates_batch(deps.duplicate_checker, bank_id, processed, txn).await;
  let non_duplicate_facts: Vec<ProcessedFact> = filter_duplicates(processed.to_vec(), &is_duplicate_flags);

  if non_duplicate_facts.is_empty() {
    return Ok((
      contents.iter().map(|_| Vec::new()).collect(),
      Vec::new(),
      Vec::new(),
      Vec::new(),
    ));
  }

  // 10. Insert facts.
  let unit_ids = insert_facts_batch(bank_id, document_row_id, &non_duplicate_facts, txn)
    .await
    .map_err(|e| e.with_phase(ErrorPhase::FactStorage))?;

  // 12. Entity resolution.
  let fact_texts: Vec<String> = non_duplicate_facts.iter().map(|p| p.fact.fact_text.clone()).collect();
  let entity_names_per_fact: Vec<Vec<String>> = non_duplicate_facts
    .iter()
    .map(|p| p.fact.entities.iter().map(|e| e.text.clone()).collect())
    .collect();
  let entity_links = process_entities_batch(deps.entity_resolver, bank_id, &fact_texts, &entity_names_per_fact, txn).await;

  // 13. Temporal links, then semantic links.
  let mut units: HashMap<Uuid, DateTime<Utc>> = HashMap::with_capacity(unit_ids.len());
  for (id, p) in unit_ids.iter().zip(&non_duplicate_facts) {
    units.insert(*id, p.fact.occurred_start.unwrap_or(p.fact.mentioned_at));
  }

  let (min_bound, max_bound) = compute_temporal_query_bounds(&units, deps.config.time_window_hours);
  let mut all_links = Vec::new();
  if let (Some(min_bound), Some(max_bound)) = (min_bound, max_bound) {
    let candidates = fetch_temporal_candidates(bank_id, min_bound, max_bound, txn)
      .await
      .map_err(|e| e.with_phase(ErrorPhase::LinkCreation))?;
    all_links.extend(compute_temporal_links(&units, &candidates, deps.config.time_window_hours));
  }

  for (id, p) in unit_ids.iter().zip(&non_duplicate_facts) {
    let candidates = fetch_semantic_candidates(bank_id, &p.embedding, deps.config.semantic_link_cap, txn)
      .await
      .map_err(|e| e.with_phase(ErrorPhase::LinkCreation))?;
    all_links.extend(compute_semantic_links(
      *id,
      &candidates,
      deps.config.semantic_link_similarity_floor,
      deps.config.semantic_link_cap,
    ));
  }

  insert_links_batch(bank_id, &all_links, txn)
    .await
    .map_err(|e| e.with_phase(ErrorPhase::LinkCreation))?;

  // 14. Insert entity links.
  if !entity_links.is_empty() {
    insert_entity_links_batch(&entity_links, &unit_ids, txn)
      .await
      .map_err(|e| e.with_phase(ErrorPhase::EntityResolution))?;
  }

  // 15. Causal links: map global (pre-dedup) fact index -> post-dedup unit id.
  let mut fact_index_to_unit_id = HashMap::new();
  let mut unit_cursor = 0;
  for (global_index, &is_duplicate) in is_duplicate_flags.iter().enumerate() {
    if !is_duplicate {
      fact_index_to_unit_id.insert(global_index, unit_ids[unit_cursor]);
      unit_cursor += 1;
    }
  }

  let mut causal_links = Vec::new();
  for (id, p) in unit_ids.iter().zip(&non_duplicate_facts) {
    causal_links.extend(compute_causal_links(*id, &p.fact.causal_relations, &fact_index_to_unit_id));
  }
  insert_links_batch(bank_id, &causal_links, txn)
    .await
    .map_err(|e| e.with_phase(ErrorPhase::LinkCreation))?;

  // 17. Map unit ids back to per-content lists.
  let result_unit_ids = map_results_to_contents(contents, facts, &is_duplicate_flags, &unit_ids);

  Ok((result_unit_ids, non_duplicate_facts, entity_links, unit_ids))
}

/// One fact extraction result (per content item) before cross-content
/// rebasing.
struct MergedExtraction {
  facts: Vec<Fact>,
  chunks: Vec<ChunkExtraction>,
}

/// Merges per-content extraction results into one global fact/chunk list,
/// rebasing each content's locally-global `chunk_index` and
/// `causal_relations` target indices onto the merged batch.
fn merge_extractions(per_content: Vec<(Vec<Fact>, Vec<ChunkExtraction>)>) -> MergedExtraction {
  let mut facts = Vec::new();
  let mut chunks = Vec::new();
  let mut chunk_offset = 0usize;

  for (mut content_facts, content_chunks) in per_content {
    let fact_offset = facts.len();

    for chunk in &content_chunks {
      chunks.push(ChunkExtraction {
        chunk_text: chunk.chunk_text.clone(),
        chunk_index: chunk.chunk_index + chunk_offset,
        fact_count: chunk.fact_count,
      });
    }

    for fact in &mut content_facts {
      fact.chunk_index += chunk_offset;
      for relation in &mut fact.causal_relations {
        relation.target_fact_index += fact_offset;
      }
    }

    facts.extend(content_facts);
    chunk_offset += content_chunks.len();
  }

  MergedExtraction { facts, chunks }
}

/// Invariant 2: drop an `occurred_start..occurred_end` range that doesn't
/// hold together, rather than failing the fact.
fn normalize_occurred_range(fact: &mut Fact) {
  if let (Some(start), Some(end)) = (fact.occurred_start, fact.occurred_end) {
    if start > end {
      warn!(fact_text = %fact.fact_text, "occurred_start > occurred_end, dropping range");
      fact.occurred_start = None;
      fact.occurred_end = None;
    }
  }
}

/// Invariant 3: within one content item, add `i * 10s` to every temporal
/// field in extraction order, so facts that share a `mentioned_at` still
/// sort deterministically.
fn apply_temporal_offsets(facts: &mut [Fact]) {
  let mut counters: HashMap<usize, i64> = HashMap::new();

  for fact in facts.iter_mut() {
    let counter = counters.entry(fact.content_index).or_insert(0);
    let offset = Duration::seconds(*counter * EXTRACTION_ORDER_SPACING_SECS);
    *counter += 1;

    fact.mentioned_at = add_offset(fact.mentioned_at, offset);
    fact.occurred_start = fact.occurred_start.map(|d| add_offset(d, offset));
    fact.occurred_end = fact.occurred_end.map(|d| add_offset(d, offset));
  }
}

fn add_offset(dt: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
  dt.checked_add_signed(offset)
    .unwrap_or_else(|| hindsight_shared::clamp_to_range(None, false))
}

/// Groups created unit ids back by the content item their source fact came
/// from, skipping facts that were dropped as duplicates.
fn map_results_to_contents(
  contents: &[RetainContent],
  facts: &[Fact],
  is_duplicate_flags: &[bool],
  unit_ids: &[Uuid],
) -> Vec<Vec<Uuid>> {
  let mut result = vec![Vec::new(); contents.len()];
  let mut unit_cursor = 0;

  for (fact, &is_duplicate) in facts.iter().zip(is_duplicate_flags) {
    if !is_duplicate {
      if let Some(bucket) = result.get_mut(fact.content_index) {
        bucket.push(unit_ids[unit_cursor]);
      }
      unit_cursor += 1;
    }
  }

  result
}

async fn trigger_background_tasks(
  task_backend: &dyn TaskBackend,
  bank_id: &str,
  unit_ids: &[Uuid],
  facts: &[ProcessedFact],
  entity_links: &[crate::types::EntityLinkCandidate],
) {
  let fact_entities: Vec<Vec<String>> = facts
    .iter()
    .map(|p| p.fact.entities.iter().map(|e| e.text.clone()).collect())
    .collect();

  if fact_entities.iter().any(|names| !names.is_empty()) {
    let task = BackgroundTask::ReinforceOpinion {
      bank_id: bank_id.to_owned(),
      created_unit_ids: unit_ids.to_vec(),
      unit_texts: facts.iter().map(|p| p.fact.fact_text.clone()).collect(),
      unit_entities: fact_entities,
    };
    if let Err(e) = task_backend.submit_task(task).await {
      warn!(bank_id, error = %e, "failed to submit reinforce_opinion task");
    }
  }

  const TOP_N_ENTITIES: usize = 5;
  const MIN_FACTS_THRESHOLD: u32 = 5;

  if !entity_links.is_empty() {
    let mut seen = HashSet::new();
    let entity_ids: Vec<Uuid> = entity_links
      .iter()
      .filter(|link| seen.insert(link.entity_id))
      .map(|link| link.entity_id)
      .take(TOP_N_ENTITIES)
      .collect();

    if !entity_ids.is_empty() {
      let task = BackgroundTask::RegenerateObservations {
        bank_id: bank_id.to_owned(),
        entity_ids,
        min_facts: MIN_FACTS_THRESHOLD,
      };
      if let Err(e) = task_backend.submit_task(task).await {
        warn!(bank_id, error = %e, "failed to submit regenerate_observations task");
      }
    }
  }
}

/// Acquires a transaction with bounded retry on transient failures. This is
/// the one piece of "connection bootstrap" the retain pipeline owns itself
/// (spec §5 "Isolation"), as opposed to pool construction, which callers
/// handle.
async fn begin_with_retry(db: &DatabaseConnection, max_attempts: u32) -> Result<DatabaseTransaction, AppError> {
  let mut last_err = None;

  for attempt in 0..max_attempts {
    match db.begin().await {
      Ok(txn) => return Ok(txn),
      Err(e) => {
        warn!(attempt, error = %e, "transaction acquisition failed, retrying");
        last_err = Some(e);
        tokio::time::sleep(StdDuration::from_millis(50 * u64::from(attempt + 1))).await;
      }
    }
  }

  Err(AppError::in_phase(
    ErrorPhase::ConnectionAcquire,
    last_err.unwrap_or_else(|| sea_orm::DbErr::Custom("no attempts made".to_owned())),
  ))
}

/// Deletes a bank and every row scoped to it (documents, chunks, units,
/// entities, entity links, unit links cascade via foreign key).
pub async fn delete_bank(bank_id: &str, db: &DatabaseConnection) -> Result<(), AppError> {
  bank::Entity::delete_by_id(bank_id.to_owned()).exec(db).await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::RawEntity;
  use chrono::TimeZone;

  fn fact(content_index: usize, text: &str) -> Fact {
    Fact {
      content_index,
      chunk_index: 0,
      fact_text: text.to_owned(),
      fact_type: FactType::World,
      mentioned_at: Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
      occurred_start: None,
      occurred_end: None,
      emotional_significance: None,
      reasoning_motivation: None,
      preferences_opinions: None,
      sensory_details: None,
      observations: None,
      entities: vec![RawEntity { text: "Alice".to_owned() }],
      causal_relations: vec![],
    }
  }

  #[test]
  fn apply_temporal_offsets_spaces_facts_within_one_content() {
    let mut facts = vec![fact(0, "a"), fact(0, "b"), fact(1, "c")];
    apply_temporal_offsets(&mut facts);

    assert_eq!(
      facts[1].mentioned_at - facts[0].mentioned_at,
      Duration::seconds(10)
    );
    // Different content item resets its own counter.
    assert_eq!(facts[2].mentioned_at, facts[0].mentioned_at);
  }

  #[test]
  fn normalize_occurred_range_drops_inverted_range() {
    let mut f = fact(0, "a");
    f.occurred_start = Some(Utc.with_ymd_and_hms(2024, 6, 20, 0, 0, 0).unwrap());
    f.occurred_end = Some(Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
    normalize_occurred_range(&mut f);
    assert!(f.occurred_start.is_none());
    assert!(f.occurred_end.is_none());
  }

  #[test]
  fn map_results_to_contents_accounts_for_duplicates() {
    let contents = vec![
      RetainContent {
        content: String::new(),
        context: String::new(),
        event_date: Utc::now(),
        metadata: serde_json::Value::Null,
      },
      RetainContent {
        content: String::new(),
        context: String::new(),
        event_date: Utc::now(),
        metadata: serde_json::Value::Null,
      },
    ];
    let facts = vec![fact(0, "a"), fact(0, "b"), fact(1, "c")];
    let is_duplicate_flags = vec![false, true, false];
    let unit_ids = vec![Uuid::now_v7(), Uuid::now_v7()];

    let result = map_results_to_contents(&contents, &facts, &is_duplicate_flags, &unit_ids);
    assert_eq!(result[0], vec![unit_ids[0]]);
    assert_eq!(result[1], vec![unit_ids[1]]);
  }
}
