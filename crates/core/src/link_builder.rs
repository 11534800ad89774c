use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use hindsight_entities::unit_link;
use hindsight_shared::{AppError, clamp_to_range};
use sea_orm::{ConnectionTrait, DatabaseTransaction, EntityTrait, Set, Statement};
use uuid::Uuid;

use crate::config::{TEMPORAL_LINK_CAP, TEMPORAL_LINK_MIN_WEIGHT};
use crate::types::{CausalRelationKind, RawCausalRelation};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
  Temporal,
  Semantic,
  Causal,
}

impl LinkKind {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Temporal => "temporal",
      Self::Semantic => "semantic",
      Self::Causal => "causal",
    }
  }
}

/// A fact link row ready for insertion.
#[derive(Clone, Debug)]
pub struct LinkRow {
  pub src_unit_id: Uuid,
  pub dst_unit_id: Uuid,
  pub kind: LinkKind,
  pub weight: f32,
  pub sub_kind: Option<String>,
}

/// A pre-existing unit that may be temporally linked to a newly inserted one.
pub struct TemporalCandidate {
  pub id: Uuid,
  pub event_date: DateTime<Utc>,
}

// ──────────────────────────────────────────────────
// Temporal links
// ──────────────────────────────────────────────────

/// The `[min, max]` window, widened by `time_window_hours` on each side, that
/// a temporal-candidate query should scan. `None` when `units` is empty.
/// Overflow past the representable `DateTime<Utc>` range clamps to its
/// bounds rather than erroring.
#[must_use]
pub fn compute_temporal_query_bounds(
  units: &HashMap<Uuid, DateTime<Utc>>,
  time_window_hours: i64,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
  let (Some(min_event), Some(max_event)) = (
    units.values().min().copied(),
    units.values().max().copied(),
  ) else {
    return (None, None);
  };

  let window = Duration::hours(time_window_hours);
  let min_date = min_event
    .checked_sub_signed(window)
    .unwrap_or_else(|| clamp_to_range(None, true));
  let max_date = max_event
    .checked_add_signed(window)
    .unwrap_or_else(|| clamp_to_range(None, false));

  (Some(min_date), Some(max_date))
}

/// For each unit, links it to every candidate within `time_window_hours`,
/// weighted `max(0.3, 1.0 - |Δhours| / time_window_hours)`, keeping at most
/// [`TEMPORAL_LINK_CAP`] links per unit sorted by weight descending.
#[must_use]
pub fn compute_temporal_links(
  units: &HashMap<Uuid, DateTime<Utc>>,
  candidates: &[TemporalCandidate],
  time_window_hours: i64,
) -> Vec<LinkRow> {
  if units.is_empty() || candidates.is_empty() {
    return Vec::new();
  }

  let window_hours = time_window_hours as f64;
  let mut links = Vec::new();

  for (&unit_id, &unit_date) in units {
    let mut scored: Vec<(Uuid, f32)> = candidates
      .iter()
      .filter(|c| c.id != unit_id)
      .filter_map(|c| {
        let diff_hours = c
          .event_date
          .signed_duration_since(unit_date)
          .num_seconds()
          .abs() as f64
          / 3600.0;

        if diff_hours > window_hours {
          return None;
        }

        let weight = (1.0 - diff_hours / window_hours).max(TEMPORAL_LINK_MIN_WEIGHT as f64) as f32;
        Some((c.id, weight))
      })
      .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(TEMPORAL_LINK_CAP);

    links.extend(scored.into_iter().map(|(dst, weight)| LinkRow {
      src_unit_id: unit_id,
      dst_unit_id: dst,
      kind: LinkKind::Temporal,
      weight,
      sub_kind: None,
    }));
  }

  links
}

/// Fetches existing units in `bank_id` whose best-known event date falls
/// within `[min_date, max_date]`, for use as temporal-link candidates.
pub async fn fetch_temporal_candidates(
  bank_id: &str,
  min_date: DateTime<Utc>,
  max_date: DateTime<Utc>,
  db: &DatabaseTransaction,
) -> Result<Vec<TemporalCandidate>, AppError> {
  let rows = db
    .query_all(Statement::from_sql_and_values(
      sea_orm::DatabaseBackend::Postgres,
      "SELECT id, COALESCE(occurred_start, mentioned_at) AS event_date FROM units \
       WHERE bank_id = $1 AND COALESCE(occurred_start, mentioned_at) BETWEEN $2 AND $3",
      [bank_id.into(), min_date.into(), max_date.into()],
    ))
    .await?;

  rows
    .into_iter()
    .map(|row| {
      Ok(TemporalCandidate {
        id: row.try_get("", "id")?,
        event_date: row.try_get("", "event_date")?,
      })
    })
    .collect::<Result<Vec<_>, sea_orm::DbErr>>()
    .map_err(AppError::from)
}

// ──────────────────────────────────────────────────
// Semantic links
// ──────────────────────────────────────────────────

/// A pre-existing unit's precomputed cosine similarity to a newly inserted
/// unit's embedding.
pub struct SemanticCandidate {
  pub id: Uuid,
  pub similarity: f32,
}

/// Keeps candidates at or above `floor`, sorted by similarity descending,
/// capped at `cap` per unit.
#[must_use]
pub fn compute_semantic_links(
  unit_id: Uuid,
  candidates: &[SemanticCandidate],
  floor: f32,
  cap: usize,
) -> Vec<LinkRow> {
  let mut kept: Vec<&SemanticCandidate> = candidates
    .iter()
    .filter(|c| c.id != unit_id && c.similarity >= floor)
    .collect();

  kept.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
  kept.truncate(cap);

  kept
    .into_iter()
    .map(|c| LinkRow {
      src_unit_id: unit_id,
      dst_unit_id: c.id,
      kind: LinkKind::Semantic,
      weight: c.similarity,
      sub_kind: None,
    })
    .collect()
}

/// Fetches the `cap * 4` nearest existing units by cosine distance, for use
/// as semantic-link candidates (a generous pool; `compute_semantic_links`
/// applies the floor and the final cap).
pub async fn fetch_semantic_candidates(
  bank_id: &str,
  embedding: &sea_orm::prelude::PgVector,
  cap: usize,
  db: &DatabaseTransaction,
) -> Result<Vec<SemanticCandidate>, AppError> {
  let pool_size = (cap * 4).max(cap) as i64;

  let rows = db
    .query_all(Statement::from_sql_and_values(
      sea_orm::DatabaseBackend::Postgres,
      "SELECT id, 1 - (embedding <=> $1) AS similarity FROM units \
       WHERE bank_id = $2 ORDER BY embedding <=> $1 LIMIT $3",
      [
        sea_orm::Value::from(embedding.clone()),
        bank_id.into(),
        pool_size.into(),
      ],
    ))
    .await?;

  rows
    .into_iter()
    .map(|row| {
      Ok(SemanticCandidate {
        id: row.try_get("", "id")?,
        similarity: row.try_get("", "similarity")?,
      })
    })
    .collect::<Result<Vec<_>, sea_orm::DbErr>>()
    .map_err(AppError::from)
}

// ──────────────────────────────────────────────────
// Causal links
// ──────────────────────────────────────────────────

/// Resolves each fact's causal relations (already rebased to global fact
/// indices by the extractor) to post-dedup unit ids, via
/// `fact_index_to_unit_id`. Relations whose target fact was dropped as a
/// duplicate (absent from the map) are skipped.
#[must_use]
pub fn compute_causal_links(
  src_unit_id: Uuid,
  relations: &[RawCausalRelation],
  fact_index_to_unit_id: &HashMap<usize, Uuid>,
) -> Vec<LinkRow> {
  relations
    .iter()
    .filter_map(|relation| {
      let dst_unit_id = *fact_index_to_unit_id.get(&relation.target_fact_index)?;
      if dst_unit_id == src_unit_id {
        return None;
      }

      Some(LinkRow {
        src_unit_id,
        dst_unit_id,
        kind: LinkKind::Causal,
        weight: relation.strength.clamp(0.0, 1.0),
        sub_kind: Some(sub_kind_for(relation.relation_type).to_owned()),
      })
    })
    .collect()
}

fn sub_kind_for(kind: CausalRelationKind) -> &'static str {
  kind.as_str()
}

// ──────────────────────────────────────────────────
// Insertion
// ──────────────────────────────────────────────────

/// Inserts every link row, tagging each with `bank_id`.
pub async fn insert_links_batch(
  bank_id: &str,
  links: &[LinkRow],
  db: &DatabaseTransaction,
) -> Result<(), AppError> {
  if links.is_empty() {
    return Ok(());
  }

  let now = Utc::now();
  let models: Vec<unit_link::ActiveModel> = links
    .iter()
    .map(|link| unit_link::ActiveModel {
      id: Set(Uuid::now_v7()),
      bank_id: Set(bank_id.to_owned()),
      src_unit_id: Set(link.src_unit_id),
      dst_unit_id: Set(link.dst_unit_id),
      kind: Set(link.kind.as_str().to_owned()),
      weight: Set(link.weight),
      sub_kind: Set(link.sub_kind.clone()),
      metadata: Set(None),
      created_at: Set(now.into()),
    })
    .collect();

  unit_link::Entity::insert_many(models).exec(db).await?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn dt(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
  }

  #[test]
  fn empty_units_has_no_bounds() {
    let (min, max) = compute_temporal_query_bounds(&HashMap::new(), 24);
    assert!(min.is_none());
    assert!(max.is_none());
  }

  #[test]
  fn bounds_widen_by_window_on_each_side() {
    let mut units = HashMap::new();
    units.insert(Uuid::now_v7(), dt(2024, 6, 15, 12));
    let (min, max) = compute_temporal_query_bounds(&units, 24);
    assert_eq!(min.unwrap(), dt(2024, 6, 14, 12));
    assert_eq!(max.unwrap(), dt(2024, 6, 16, 12));
  }

  #[test]
  fn candidate_within_window_creates_high_weight_link() {
    let unit_id = Uuid::now_v7();
    let candidate_id = Uuid::now_v7();
    let mut units = HashMap::new();
    units.insert(unit_id, dt(2024, 6, 15, 12));
    let candidates = vec![TemporalCandidate {
      id: candidate_id,
      event_date: dt(2024, 6, 15, 10),
    }];

    let links = compute_temporal_links(&units, &candidates, 24);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].dst_unit_id, candidate_id);
    assert_eq!(links[0].kind, LinkKind::Temporal);
    assert!(links[0].weight > 0.9);
  }

  #[test]
  fn candidate_outside_window_is_excluded() {
    let unit_id = Uuid::now_v7();
    let mut units = HashMap::new();
    units.insert(unit_id, dt(2024, 6, 15, 12));
    let candidates = vec![TemporalCandidate {
      id: Uuid::now_v7(),
      event_date: dt(2024, 6, 10, 12),
    }];

    let links = compute_temporal_links(&units, &candidates, 24);
    assert!(links.is_empty());
  }

  #[test]
  fn weight_floor_is_0_3() {
    let unit_id = Uuid::now_v7();
    let mut units = HashMap::new();
    units.insert(unit_id, dt(2024, 6, 15, 12));
    let candidates = vec![TemporalCandidate {
      id: Uuid::now_v7(),
      event_date: dt(2024, 6, 14, 13),
    }];

    let links = compute_temporal_links(&units, &candidates, 24);
    assert_eq!(links.len(), 1);
    assert!(links[0].weight >= 0.3);
  }

  #[test]
  fn caps_at_ten_links_per_unit() {
    let unit_id = Uuid::now_v7();
    let mut units = HashMap::new();
    units.insert(unit_id, dt(2024, 6, 15, 12));
    let candidates: Vec<_> = (0..15)
      .map(|_| TemporalCandidate {
        id: Uuid::now_v7(),
        event_date: dt(2024, 6, 15, 11),
      })
      .collect();

    let links = compute_temporal_links(&units, &candidates, 24);
    assert_eq!(links.len(), 10);
  }

  #[test]
  fn semantic_links_respect_floor_and_cap() {
    let unit_id = Uuid::now_v7();
    let candidates = vec![
      SemanticCandidate {
        id: Uuid::now_v7(),
        similarity: 0.95,
      },
      SemanticCandidate {
        id: Uuid::now_v7(),
        similarity: 0.5,
      },
    ];

    let links = compute_semantic_links(unit_id, &candidates, 0.75, 5);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].weight, 0.95);
  }

  #[test]
  fn causal_links_skip_dropped_duplicate_targets() {
    let src = Uuid::now_v7();
    let kept_dst = Uuid::now_v7();
    let mut map = HashMap::new();
    map.insert(0usize, kept_dst);

    let relations = vec![
      RawCausalRelation {
        target_fact_index: 0,
        relation_type: CausalRelationKind::Causes,
        strength: 0.8,
      },
      RawCausalRelation {
        target_fact_index: 1,
        relation_type: CausalRelationKind::Enables,
        strength: 0.5,
      },
    ];

    let links = compute_causal_links(src, &relations, &map);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].dst_unit_id, kept_dst);
    assert_eq!(links[0].sub_kind.as_deref(), Some("causes"));
  }

  #[test]
  fn close_and_far_candidates_weigh_and_cutoff_as_expected() {
    let unit_id = Uuid::now_v7();
    let mut units = HashMap::new();
    units.insert(unit_id, dt(2024, 6, 15, 12));

    let close = Uuid::now_v7();
    let mid = Uuid::now_v7();
    let candidates = vec![
      TemporalCandidate { id: close, event_date: dt(2024, 6, 15, 13) },
      TemporalCandidate { id: mid, event_date: dt(2024, 6, 16, 6) },
      TemporalCandidate { id: Uuid::now_v7(), event_date: dt(2024, 6, 16, 13) },
    ];

    let links = compute_temporal_links(&units, &candidates, 24);
    assert_eq!(links.len(), 2);

    let close_weight = links.iter().find(|l| l.dst_unit_id == close).unwrap().weight;
    let mid_weight = links.iter().find(|l| l.dst_unit_id == mid).unwrap().weight;
    assert!(close_weight > mid_weight);
  }
}
