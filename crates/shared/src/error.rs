use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::Display;

/// Which retain phase an error surfaced in, so callers get a single error
/// naming the failing phase rather than an opaque stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
  BankProfile,
  Extraction,
  Embedding,
  ConnectionAcquire,
  Transaction,
  ChunkStorage,
  Deduplication,
  FactStorage,
  EntityResolution,
  LinkCreation,
  Commit,
  BackgroundTask,
}

impl Display for ErrorPhase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::BankProfile => "bank_profile",
      Self::Extraction => "extraction",
      Self::Embedding => "embedding",
      Self::ConnectionAcquire => "connection_acquire",
      Self::Transaction => "transaction",
      Self::ChunkStorage => "chunk_storage",
      Self::Deduplication => "deduplication",
      Self::FactStorage => "fact_storage",
      Self::EntityResolution => "entity_resolution",
      Self::LinkCreation => "link_creation",
      Self::Commit => "commit",
      Self::BackgroundTask => "background_task",
    };
    write!(f, "{s}")
  }
}

#[derive(Debug)]
pub struct AppError {
  err: anyhow::Error,
  phase: Option<ErrorPhase>,
}

impl AppError {
  /// Create with no phase attached.
  pub fn new<E: Into<anyhow::Error>>(err: E) -> Self {
    Self {
      err: err.into(),
      phase: None,
    }
  }

  /// Create an error tagged with the retain phase it occurred in.
  pub fn in_phase<E: Into<anyhow::Error>>(phase: ErrorPhase, err: E) -> Self {
    Self {
      err: err.into(),
      phase: Some(phase),
    }
  }

  /// Attach (or overwrite) the phase on an existing error.
  #[must_use]
  pub fn with_phase(mut self, phase: ErrorPhase) -> Self {
    self.phase = Some(phase);
    self
  }

  #[must_use]
  pub const fn phase(&self) -> Option<ErrorPhase> {
    self.phase
  }

  /// Get backtrace from anyhow (requires `RUST_BACKTRACE=1` to capture)
  pub fn backtrace(&self) -> &Backtrace {
    self.err.backtrace()
  }
}

impl Display for AppError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.phase {
      Some(phase) => write!(f, "[{phase}] {}", self.err),
      None => write!(f, "{}", self.err),
    }
  }
}

impl std::error::Error for AppError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    self.err.source()
  }
}

impl<E> From<E> for AppError
where
  E: Into<anyhow::Error>,
{
  fn from(err: E) -> Self {
    Self::new(err)
  }
}
