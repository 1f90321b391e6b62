//! Game session engine for the hangman anatomy trainer.
//!
//! Three layers, view-agnostic all the way down:
//!
//! - [`SessionEngine`] owns every live play-through: deck iteration,
//!   end-of-deck detection, restart, teardown.
//! - [`CardAttempt`] evaluates guesses against a single card.
//! - [`GameClient`] is the view-facing driver: it replays the session id
//!   across calls, enforces the finish-the-card-first policy, and forwards
//!   each terminal outcome to the attempt log exactly once.
//!
//! Card storage and attempt persistence stay behind the [`CardRepository`]
//! and [`AttemptLog`] traits.

mod attempt;
mod client;
mod engine;

pub use attempt::{CardAttempt, Outcome};
pub use client::{ClientError, GameClient, GuessFeedback, NextCard};
pub use engine::{CurrentCard, DeckStep, SessionEngine, SessionStarted};

use anatomy_utils::{Card, Category, Difficulty, Language};

/// Opaque handle for one game session. Generated at creation, never reused.
pub type SessionId = uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no cards available for category {0}")]
    EmptyDeck(Category),
    #[error("unknown or ended game session {0}")]
    UnknownSession(SessionId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Failure inside the card store. The engine only sees the description.
#[derive(Debug, thiserror::Error)]
#[error("card repository failure: {0}")]
pub struct RepositoryError(pub String);

/// The attempt log refused or could not take a write. Non-fatal: the game
/// state transition that produced the record has already committed.
#[derive(Debug, thiserror::Error)]
#[error("attempt log write failed: {0}")]
pub struct LogWriteError(pub String);

/// Supplies decks and single cards for a category.
///
/// The returned order must be stable for the duration of one call (the
/// engine snapshots it for the session), but may differ between calls.
pub trait CardRepository {
    fn fetch_deck(&self, category: Category) -> Result<Vec<Card>, RepositoryError>;

    /// One card drawn at random, for practice outside a session.
    fn random_card(&self, category: Category) -> Result<Option<Card>, RepositoryError>;
}

/// Durable store of per-user card outcomes.
pub trait AttemptLog {
    fn record(&self, attempt: &AttemptRecord) -> Result<(), LogWriteError>;
}

impl<T: AttemptLog + ?Sized> AttemptLog for &T {
    fn record(&self, attempt: &AttemptRecord) -> Result<(), LogWriteError> {
        (**self).record(attempt)
    }
}

/// One finished card, as forwarded to the attempt log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    pub user_id: i64,
    pub card_id: i64,
    pub won: bool,
    pub category: Category,
    pub language: Language,
    pub difficulty: Difficulty,
    pub wrong_count: u32,
    pub max_wrong: u32,
}

/// Per-round settings chosen before the first card.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameSettings {
    pub category: Category,
    pub language: Language,
    pub difficulty: Difficulty,
}

impl GameSettings {
    /// The standard pairing: difficulty picks both the quizzed language and
    /// the mistake budget. Build the struct directly to mix them.
    pub fn for_difficulty(category: Category, difficulty: Difficulty) -> Self {
        Self {
            category,
            language: difficulty.language(),
            difficulty,
        }
    }

    pub fn max_wrong(&self) -> u32 {
        self.difficulty.max_wrong()
    }
}
