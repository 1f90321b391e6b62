//! SQLite-backed card store and attempt log.

use std::path::Path;

use anatomy_utils::{Card, Category};
use chrono::Utc;
use hangman_engine::{
    AttemptLog, AttemptRecord, CardRepository, LogWriteError, RepositoryError,
};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rusqlite::Connection;
use serde::Deserialize;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cards (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  category TEXT NOT NULL,
  english TEXT NOT NULL,
  latin TEXT NOT NULL,
  image_path TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_cards_category ON cards(category);

CREATE TABLE IF NOT EXISTS card_attempts (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  card_id INTEGER NOT NULL,

  is_won INTEGER NOT NULL CHECK (is_won IN (0, 1)),

  category TEXT,
  language TEXT,
  difficulty TEXT,
  wrong_count INTEGER,
  max_wrong INTEGER,

  played_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_card_attempts_user ON card_attempts(user_id);
CREATE INDEX IF NOT EXISTS idx_card_attempts_user_won ON card_attempts(user_id, is_won);
CREATE INDEX IF NOT EXISTS idx_card_attempts_user_time ON card_attempts(user_id, played_at);
"#;

/// A card row for seeding, without a database id.
#[derive(Debug, Deserialize)]
pub struct SeedCard {
    pub category: Category,
    pub english: String,
    pub latin: String,
    #[serde(default)]
    pub image_path: String,
}

/// Card store and attempt log over one SQLite database.
///
/// rusqlite connections are not `Sync`, so the connection sits behind a
/// mutex and every query is one short critical section.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn card_count(&self) -> Result<usize, rusqlite::Error> {
        self.conn
            .lock()
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get::<_, i64>(0))
            .map(|count| count as usize)
    }

    /// Insert seed cards. Returns the number of rows written.
    pub fn seed_cards(&self, cards: &[SeedCard]) -> Result<usize, rusqlite::Error> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for card in cards {
            tx.execute(
                "INSERT INTO cards (category, english, latin, image_path) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    card.category.to_string(),
                    card.english,
                    card.latin,
                    card.image_path
                ],
            )?;
        }
        tx.commit()?;
        Ok(cards.len())
    }
}

fn row_to_card(row: &rusqlite::Row<'_>) -> rusqlite::Result<Card> {
    let category: String = row.get(1)?;
    let category = category.parse::<Category>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(Card {
        id: row.get(0)?,
        category,
        english: row.get(2)?,
        latin: row.get(3)?,
        image_path: row.get(4)?,
    })
}

fn repo_err(err: rusqlite::Error) -> RepositoryError {
    RepositoryError(err.to_string())
}

impl CardRepository for SqliteStore {
    /// Every fetch shuffles once; the caller snapshots the order for the
    /// whole session.
    fn fetch_deck(&self, category: Category) -> Result<Vec<Card>, RepositoryError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, category, english, latin, image_path FROM cards WHERE category = ?1",
            )
            .map_err(repo_err)?;
        let mut deck = stmt
            .query_map([category.to_string()], row_to_card)
            .map_err(repo_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(repo_err)?;

        deck.shuffle(&mut rand::rng());
        Ok(deck)
    }

    fn random_card(&self, category: Category) -> Result<Option<Card>, RepositoryError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, category, english, latin, image_path FROM cards \
                 WHERE category = ?1 ORDER BY RANDOM() LIMIT 1",
            )
            .map_err(repo_err)?;
        let mut rows = stmt
            .query_map([category.to_string()], row_to_card)
            .map_err(repo_err)?;
        rows.next().transpose().map_err(repo_err)
    }
}

impl AttemptLog for SqliteStore {
    fn record(&self, attempt: &AttemptRecord) -> Result<(), LogWriteError> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO card_attempts \
                 (user_id, card_id, is_won, category, language, difficulty, \
                  wrong_count, max_wrong, played_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    attempt.user_id,
                    attempt.card_id,
                    attempt.won,
                    attempt.category.to_string(),
                    attempt.language.to_string(),
                    attempt.difficulty.to_string(),
                    attempt.wrong_count,
                    attempt.max_wrong,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|err| LogWriteError(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anatomy_utils::{Difficulty, Language};
    use std::collections::BTreeSet;

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .seed_cards(&[
                SeedCard {
                    category: Category::Bones,
                    english: "Skull".to_string(),
                    latin: "Cranium".to_string(),
                    image_path: String::new(),
                },
                SeedCard {
                    category: Category::Bones,
                    english: "Femur".to_string(),
                    latin: "Femur".to_string(),
                    image_path: String::new(),
                },
                SeedCard {
                    category: Category::Organs,
                    english: "Heart".to_string(),
                    latin: "Cor".to_string(),
                    image_path: String::new(),
                },
            ])
            .unwrap();
        store
    }

    #[test]
    fn fetch_deck_filters_by_category() {
        let store = seeded_store();
        let deck = store.fetch_deck(Category::Bones).unwrap();
        assert_eq!(deck.len(), 2);
        assert!(deck.iter().all(|card| card.category == Category::Bones));

        let names: BTreeSet<&str> = deck.iter().map(|card| card.english.as_str()).collect();
        assert_eq!(names, BTreeSet::from(["Femur", "Skull"]));
    }

    #[test]
    fn fetch_deck_on_empty_category_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.fetch_deck(Category::Organs).unwrap().is_empty());
    }

    #[test]
    fn random_card_draws_from_the_category() {
        let store = seeded_store();
        let card = store.random_card(Category::Organs).unwrap().unwrap();
        assert_eq!(card.english, "Heart");

        let empty = SqliteStore::open_in_memory().unwrap();
        assert!(empty.random_card(Category::Organs).unwrap().is_none());
    }

    #[test]
    fn record_writes_one_attempt_row() {
        let store = seeded_store();
        store
            .record(&AttemptRecord {
                user_id: 7,
                card_id: 1,
                won: true,
                category: Category::Bones,
                language: Language::English,
                difficulty: Difficulty::Easy,
                wrong_count: 2,
                max_wrong: 6,
            })
            .unwrap();

        let conn = store.conn.lock();
        let (count, won, language): (i64, bool, String) = conn
            .query_row(
                "SELECT COUNT(*), is_won, language FROM card_attempts WHERE user_id = 7",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert!(won);
        assert_eq!(language, "EN");
    }

    #[test]
    fn full_game_flow_against_the_store() {
        use hangman_engine::{GameClient, GameSettings, NextCard, SessionEngine};

        let store = seeded_store();
        let engine = SessionEngine::new();
        let settings = GameSettings::for_difficulty(Category::Bones, Difficulty::Easy);
        let mut client = GameClient::new(&engine, &store, 42, settings);

        client.start_game(&store).unwrap();

        // Win every card in whatever order the shuffle dealt them.
        loop {
            let word = client.card().unwrap().english.clone();
            for c in word.chars() {
                client.guess_letter(&c.to_string()).unwrap();
            }
            match client.next_card().unwrap() {
                NextCard::Card { .. } => {}
                NextCard::EndOfDeck { .. } => break,
            }
        }
        client.end_game();

        let conn = store.conn.lock();
        let logged: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM card_attempts WHERE user_id = 42 AND is_won = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(logged, 2);
    }

    #[test]
    fn card_count_tracks_seeding() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.card_count().unwrap(), 0);
        store
            .seed_cards(&[SeedCard {
                category: Category::Bones,
                english: "Rib".to_string(),
                latin: "Costa".to_string(),
                image_path: String::new(),
            }])
            .unwrap();
        assert_eq!(store.card_count().unwrap(), 1);
    }
}
