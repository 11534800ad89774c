use hindsight_shared::APP_ENV;

/// Tunables for the retain pipeline's link/dedup thresholds. Defaults come
/// from `APP_ENV`; tests construct this directly to avoid depending on
/// process environment.
#[derive(Debug, Clone, Copy)]
pub struct RetainConfig {
  /// Window either side of a unit's `mentioned_at` to scan for temporal
  /// link candidates.
  pub time_window_hours: i64,
  /// Minimum cosine similarity for a semantic link.
  pub semantic_link_similarity_floor: f32,
  /// Maximum semantic links created per unit.
  pub semantic_link_cap: usize,
  /// Minimum cosine similarity for a fact to be treated as a duplicate.
  pub dedup_similarity_threshold: f32,
}

impl Default for RetainConfig {
  fn default() -> Self {
    Self {
      time_window_hours: APP_ENV.time_window_hours,
      semantic_link_similarity_floor: APP_ENV.semantic_link_similarity_floor,
      semantic_link_cap: APP_ENV.semantic_link_cap,
      dedup_similarity_threshold: APP_ENV.dedup_similarity_threshold,
    }
  }
}

/// Maximum temporal links created per unit, per spec (not configurable: the
/// original caps this independently of the time window).
pub const TEMPORAL_LINK_CAP: usize = 10;

/// Floor below which a temporal link's weight is never allowed to drop.
pub const TEMPORAL_LINK_MIN_WEIGHT: f32 = 0.3;
