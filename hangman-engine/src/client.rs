use anatomy_utils::Card;

use crate::attempt::{CardAttempt, Outcome};
use crate::engine::{DeckStep, SessionEngine};
use crate::{
    AttemptLog, AttemptRecord, CardRepository, EngineError, GameSettings, SessionId,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no game in progress")]
    NoActiveGame,
    #[error("finish this card first")]
    CardStillInPlay,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What a guess did to the board.
#[derive(Clone, Debug)]
pub struct GuessFeedback {
    pub outcome: Outcome,
    pub revealed: String,
    pub mistakes_left: u32,
    /// Set when a terminal outcome could not be forwarded to the attempt
    /// log. The card state above has already committed regardless.
    pub warning: Option<String>,
}

/// What lies past the current card.
#[derive(Clone, Debug)]
pub enum NextCard {
    Card { card: Card, remaining: usize },
    /// Deck exhausted. The session is still alive; the caller decides
    /// between `reset_deck` and `end_game`.
    EndOfDeck { message: String },
}

pub(crate) const END_OF_DECK_MESSAGE: &str =
    "You reached the end. Restart from the beginning?";

/// Client-side state for the active session.
struct Round {
    session_id: SessionId,
    total: usize,
    card: Card,
    attempt: CardAttempt,
    /// The (card, outcome) pair already forwarded to the attempt log.
    /// Cleared whenever a new card becomes current.
    logged: Option<(i64, Outcome)>,
}

/// View-facing driver for one player's game flow.
///
/// Owns the single active session id and the guess state for the card in
/// play. Terminal outcomes are forwarded to the attempt log at most once
/// per card instance, however often the view layer repeats itself.
pub struct GameClient<'a, L> {
    engine: &'a SessionEngine,
    attempt_log: L,
    user_id: i64,
    settings: GameSettings,
    round: Option<Round>,
}

impl<'a, L: AttemptLog> GameClient<'a, L> {
    pub fn new(engine: &'a SessionEngine, attempt_log: L, user_id: i64, settings: GameSettings) -> Self {
        Self {
            engine,
            attempt_log,
            user_id,
            settings,
            round: None,
        }
    }

    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.round.as_ref().map(|round| round.session_id)
    }

    pub fn card(&self) -> Option<&Card> {
        self.round.as_ref().map(|round| &round.card)
    }

    pub fn attempt(&self) -> Option<&CardAttempt> {
        self.round.as_ref().map(|round| &round.attempt)
    }

    /// Deck size of the active session.
    pub fn total(&self) -> Option<usize> {
        self.round.as_ref().map(|round| round.total)
    }

    /// Start a fresh session, tearing down the previous one if any.
    pub fn start_game(&mut self, repo: &impl CardRepository) -> Result<&Card, ClientError> {
        if let Some(round) = self.round.take() {
            self.engine.end(round.session_id);
        }

        let started = self.engine.create_session(self.settings.category, repo)?;
        let attempt = self.fresh_attempt(&started.card);
        let round = self.round.insert(Round {
            session_id: started.session_id,
            total: started.total,
            card: started.card,
            attempt,
            logged: None,
        });

        Ok(&round.card)
    }

    /// Feed one keystroke into the current card.
    ///
    /// On the transition into a terminal outcome the attempt is forwarded
    /// to the log; a log failure comes back as a warning, never an error.
    pub fn guess_letter(&mut self, raw: &str) -> Result<GuessFeedback, ClientError> {
        let round = self.round.as_mut().ok_or(ClientError::NoActiveGame)?;

        round.attempt.submit_letter(raw);
        let outcome = round.attempt.outcome();

        let warning = if outcome.is_terminal() {
            log_once(&self.attempt_log, self.user_id, self.settings, round)
        } else {
            None
        };

        Ok(GuessFeedback {
            outcome,
            revealed: round.attempt.reveal(),
            mistakes_left: round.attempt.mistakes_left(),
            warning,
        })
    }

    /// Move on to the next card.
    ///
    /// Refused while the current card is still in play. On any failure the
    /// local card state is left exactly as it was.
    pub fn next_card(&mut self) -> Result<NextCard, ClientError> {
        let round = self.round.as_mut().ok_or(ClientError::NoActiveGame)?;
        if !round.attempt.outcome().is_terminal() {
            return Err(ClientError::CardStillInPlay);
        }

        match self.engine.advance(round.session_id)? {
            DeckStep::Card(current) => {
                round.attempt = CardAttempt::new(
                    &current.card,
                    self.settings.language,
                    self.settings.max_wrong(),
                );
                round.card = current.card.clone();
                round.logged = None;
                Ok(NextCard::Card {
                    card: current.card,
                    remaining: current.remaining,
                })
            }
            DeckStep::Finished => Ok(NextCard::EndOfDeck {
                message: END_OF_DECK_MESSAGE.to_string(),
            }),
        }
    }

    /// Replay the same deck from the top.
    pub fn reset_deck(&mut self) -> Result<&Card, ClientError> {
        let round = self.round.as_mut().ok_or(ClientError::NoActiveGame)?;

        let current = self.engine.restart(round.session_id)?;
        round.attempt = CardAttempt::new(
            &current.card,
            self.settings.language,
            self.settings.max_wrong(),
        );
        round.card = current.card;
        round.logged = None;

        Ok(&round.card)
    }

    /// Tear down the active session. Calling with no active session is a
    /// no-op.
    pub fn end_game(&mut self) {
        if let Some(round) = self.round.take() {
            self.engine.end(round.session_id);
        }
    }

    fn fresh_attempt(&self, card: &Card) -> CardAttempt {
        CardAttempt::new(card, self.settings.language, self.settings.max_wrong())
    }
}

/// Forward the round's terminal outcome to the log, unless this exact
/// (card, outcome) pair already went out. The marker is set before the
/// write so rapid repeats cannot double-log.
fn log_once<L: AttemptLog>(
    attempt_log: &L,
    user_id: i64,
    settings: GameSettings,
    round: &mut Round,
) -> Option<String> {
    let marker = (round.card.id, round.attempt.outcome());
    if round.logged == Some(marker) {
        return None;
    }
    round.logged = Some(marker);

    let record = AttemptRecord {
        user_id,
        card_id: round.card.id,
        won: round.attempt.outcome() == Outcome::Won,
        category: settings.category,
        language: settings.language,
        difficulty: settings.difficulty,
        wrong_count: round.attempt.wrong_count(),
        max_wrong: round.attempt.max_wrong(),
    };

    match attempt_log.record(&record) {
        Ok(()) => None,
        Err(err) => {
            log::warn!("card {}: {err}", round.card.id);
            Some(err.to_string())
        }
    }
}
