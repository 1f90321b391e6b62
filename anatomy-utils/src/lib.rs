pub mod text;

use serde::{Deserialize, Serialize};

/// Topic a card belongs to. Stored as `"ORGANS"` / `"BONES"` both on the
/// wire and in the database, so the serde names and the `Display`/`FromStr`
/// forms must stay in sync.
#[derive(
    Copy,
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    Hash,
    parse_display::Display,
    parse_display::FromStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[display(style = "UPPERCASE")]
pub enum Category {
    Organs,
    Bones,
}

/// Which side of the card is quizzed.
#[derive(
    Copy,
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    Hash,
    parse_display::Display,
    parse_display::FromStr,
)]
pub enum Language {
    #[serde(rename = "EN")]
    #[display("EN")]
    English,
    #[serde(rename = "LAT")]
    #[display("LAT")]
    Latin,
}

/// Game difficulty. Easy rounds quiz the English term with a generous
/// mistake budget; hard rounds quiz the Latin term with a short one.
#[derive(
    Copy,
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    Hash,
    parse_display::Display,
    parse_display::FromStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[display(style = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Hard,
}

impl Difficulty {
    pub fn max_wrong(self) -> u32 {
        match self {
            Difficulty::Easy => 6,
            Difficulty::Hard => 3,
        }
    }

    pub fn language(self) -> Language {
        match self {
            Difficulty::Easy => Language::English,
            Difficulty::Hard => Language::Latin,
        }
    }
}

/// One flashcard. Immutable once fetched from the repository.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: i64,
    pub category: Category,
    pub english: String,
    pub latin: String,
    /// Opaque reference to the card's illustration. Never interpreted here.
    pub image_path: String,
}

impl Card {
    /// The term the player has to guess in the given language.
    pub fn answer(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english,
            Language::Latin => &self.latin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names_match_display() {
        let json = serde_json::to_string(&Category::Organs).unwrap();
        assert_eq!(json, "\"ORGANS\"");
        assert_eq!(Category::Bones.to_string(), "BONES");
        assert_eq!("ORGANS".parse::<Category>().unwrap(), Category::Organs);
    }

    #[test]
    fn language_wire_names() {
        assert_eq!(
            serde_json::to_string(&Language::Latin).unwrap(),
            "\"LAT\""
        );
        assert_eq!(Language::English.to_string(), "EN");
        assert_eq!("LAT".parse::<Language>().unwrap(), Language::Latin);
    }

    #[test]
    fn unknown_category_is_rejected() {
        // Free-form category strings from the old client must not slip
        // through as an empty deck.
        assert!(serde_json::from_str::<Category>("\"MUSCLES\"").is_err());
        assert!("MUSCLES".parse::<Category>().is_err());
    }

    #[test]
    fn difficulty_budget_and_language() {
        assert_eq!(Difficulty::Easy.max_wrong(), 6);
        assert_eq!(Difficulty::Hard.max_wrong(), 3);
        assert_eq!(Difficulty::Easy.language(), Language::English);
        assert_eq!(Difficulty::Hard.language(), Language::Latin);
    }

    #[test]
    fn card_answer_picks_language_side() {
        let card = Card {
            id: 1,
            category: Category::Bones,
            english: "Skull".to_string(),
            latin: "Cranium".to_string(),
            image_path: String::new(),
        };
        assert_eq!(card.answer(Language::English), "Skull");
        assert_eq!(card.answer(Language::Latin), "Cranium");
    }
}
