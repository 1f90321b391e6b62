use std::collections::HashMap;

use anatomy_utils::{Card, Category};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{CardRepository, EngineError, SessionId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DeckStatus {
    Active,
    /// The cursor sat on the last card when `advance` was called. Cleared
    /// by `restart`.
    FinishedDeck,
}

/// One play-through of a deck. The deck order is fixed at creation; only
/// the cursor and status move.
#[derive(Debug)]
struct GameSession {
    category: Category,
    deck: Vec<Card>,
    /// Index of the current card. Always within `0..deck.len()`; the
    /// status flag, not the cursor, encodes exhaustion.
    cursor: usize,
    status: DeckStatus,
}

/// Result of creating a session: the handle, the deck size, and the first
/// card (cursor 0).
#[derive(Clone, Debug)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub total: usize,
    pub card: Card,
}

/// The card under the cursor plus how many cards follow it.
#[derive(Clone, Debug)]
pub struct CurrentCard {
    pub card: Card,
    pub remaining: usize,
}

/// What `advance` found past the current card.
#[derive(Clone, Debug)]
pub enum DeckStep {
    Card(CurrentCard),
    /// End of deck. The session stays alive so the caller can restart or
    /// end it.
    Finished,
}

/// Registry of live game sessions, keyed by session id.
///
/// Every operation takes the registry lock once and performs its whole
/// read-then-write step under it, so overlapping calls against the same
/// session can never observe a cursor inconsistent with the status.
#[derive(Debug, Default)]
pub struct SessionEngine {
    sessions: Mutex<HashMap<SessionId, GameSession>>,
}

impl SessionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session over a fresh deck for the category.
    ///
    /// The deck snapshot is taken once; its order never changes for the
    /// lifetime of the session. A category with no cards is an error and
    /// registers nothing.
    pub fn create_session(
        &self,
        category: Category,
        repo: &impl CardRepository,
    ) -> Result<SessionStarted, EngineError> {
        let deck = repo.fetch_deck(category)?;
        if deck.is_empty() {
            return Err(EngineError::EmptyDeck(category));
        }

        let session_id = Uuid::new_v4();
        let first = deck[0].clone();
        let total = deck.len();

        self.sessions.lock().insert(
            session_id,
            GameSession {
                category,
                deck,
                cursor: 0,
                status: DeckStatus::Active,
            },
        );

        log::info!("session {session_id} started: {total} {category} cards");

        Ok(SessionStarted {
            session_id,
            total,
            card: first,
        })
    }

    /// Move the cursor to the next card, or report end of deck.
    ///
    /// On the last card the cursor stays put and the session flips to
    /// finished; repeated calls at the end keep answering `Finished`.
    pub fn advance(&self, session_id: SessionId) -> Result<DeckStep, EngineError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&session_id)
            .ok_or(EngineError::UnknownSession(session_id))?;

        debug_assert!(session.cursor < session.deck.len());

        if session.status == DeckStatus::FinishedDeck
            || session.cursor + 1 == session.deck.len()
        {
            session.status = DeckStatus::FinishedDeck;
            return Ok(DeckStep::Finished);
        }

        session.cursor += 1;
        Ok(DeckStep::Card(CurrentCard {
            card: session.deck[session.cursor].clone(),
            remaining: session.deck.len() - session.cursor - 1,
        }))
    }

    /// Restart the same deck from the top, in the same order.
    pub fn restart(&self, session_id: SessionId) -> Result<CurrentCard, EngineError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&session_id)
            .ok_or(EngineError::UnknownSession(session_id))?;

        session.cursor = 0;
        session.status = DeckStatus::Active;

        Ok(CurrentCard {
            card: session.deck[0].clone(),
            remaining: session.deck.len() - 1,
        })
    }

    /// Tear the session down. Ending an unknown or already-ended session
    /// is a no-op.
    pub fn end(&self, session_id: SessionId) {
        if let Some(session) = self.sessions.lock().remove(&session_id) {
            log::info!(
                "session {session_id} ended ({} {} cards)",
                session.deck.len(),
                session.category
            );
        }
    }
}
