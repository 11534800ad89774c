use std::env;
use std::sync::LazyLock;

fn required_env(key: &str) -> String {
  env::var(key).unwrap_or_else(|_| panic!("env {key} must be set"))
}

fn env_or(key: &str, default: &str) -> String {
  env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_f32_or(key: &str, default: f32) -> f32 {
  env::var(key)
    .ok()
    .and_then(|v| v.parse().ok())
    .unwrap_or(default)
}

fn env_u32_or(key: &str, default: u32) -> u32 {
  env::var(key)
    .ok()
    .and_then(|v| v.parse().ok())
    .unwrap_or(default)
}

pub struct AppEnv {
  pub database_url: String,
  pub openai_base_url: String,
  pub openai_api_key: String,
  pub openai_chat_model: String,
  pub openai_embedding_model: String,
  pub db_pool_size: u32,

  /// Half-width, in hours, of the temporal link candidate window (spec §4.8).
  pub time_window_hours: i64,
  /// Minimum cosine similarity for a semantic link to be created.
  pub semantic_link_similarity_floor: f32,
  /// Maximum semantic links created per new unit.
  pub semantic_link_cap: usize,
  /// Cosine-similarity threshold above which the default duplicate checker
  /// considers two facts equivalent (advisory only — spec §4.4).
  pub dedup_similarity_threshold: f32,
}

impl AppEnv {
  fn new() -> Self {
    dotenvy::dotenv().ok();

    Self {
      database_url: required_env("DATABASE_URL"),
      openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
      openai_api_key: required_env("OPENAI_API_KEY"),
      openai_chat_model: env_or("OPENAI_CHAT_MODEL", "gpt-4o-mini"),
      openai_embedding_model: env_or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
      db_pool_size: env_u32_or("DB_POOL_SIZE", 10),
      time_window_hours: i64::from(env_u32_or("RETAIN_TIME_WINDOW_HOURS", 24)),
      semantic_link_similarity_floor: env_f32_or("RETAIN_SEMANTIC_SIMILARITY_FLOOR", 0.75),
      semantic_link_cap: env_u32_or("RETAIN_SEMANTIC_LINK_CAP", 10) as usize,
      dedup_similarity_threshold: env_f32_or("RETAIN_DEDUP_SIMILARITY_THRESHOLD", 0.92),
    }
  }
}

pub static APP_ENV: LazyLock<AppEnv> = LazyLock::new(AppEnv::new);
