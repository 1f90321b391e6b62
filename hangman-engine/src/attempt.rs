use anatomy_utils::text::{is_guessable_letter, normalize};
use anatomy_utils::{Card, Language};
use indexmap::IndexSet;

/// Where one card's attempt stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Guess state for the card currently in play.
///
/// The answer is held in normalized form (lowercase, diacritics stripped),
/// so keystroke matching is a plain `char` comparison. Once the outcome is
/// terminal the attempt is frozen: further input is ignored.
#[derive(Clone, Debug)]
pub struct CardAttempt {
    card_id: i64,
    answer: String,
    guessed: IndexSet<char>,
    wrong_count: u32,
    max_wrong: u32,
    outcome: Outcome,
}

impl CardAttempt {
    pub fn new(card: &Card, language: Language, max_wrong: u32) -> Self {
        let mut attempt = Self {
            card_id: card.id,
            answer: normalize(card.answer(language)),
            guessed: IndexSet::new(),
            wrong_count: 0,
            max_wrong,
            outcome: Outcome::InProgress,
        };
        // An answer with no guessable letters is won on arrival.
        attempt.outcome = attempt.derive_outcome();
        attempt
    }

    pub fn card_id(&self) -> i64 {
        self.card_id
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn max_wrong(&self) -> u32 {
        self.max_wrong
    }

    pub fn mistakes_left(&self) -> u32 {
        self.max_wrong.saturating_sub(self.wrong_count)
    }

    /// The normalized answer, for terminal disclosure.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Letters guessed so far, in the order they were guessed.
    pub fn guessed(&self) -> impl Iterator<Item = char> + '_ {
        self.guessed.iter().copied()
    }

    /// Feed one keystroke into the attempt.
    ///
    /// Input that does not normalize to exactly one unguessed letter is
    /// ignored, as is anything after the outcome turns terminal. A letter
    /// absent from the answer costs one mistake.
    pub fn submit_letter(&mut self, raw: &str) {
        if self.outcome.is_terminal() {
            return;
        }

        let normalized = normalize(raw);
        let trimmed = normalized.trim();
        let mut chars = trimmed.chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            return;
        };
        if !is_guessable_letter(letter) {
            return;
        }
        if !self.guessed.insert(letter) {
            return;
        }

        if !self.answer.contains(letter) {
            self.wrong_count += 1;
        }

        self.outcome = self.derive_outcome();
    }

    /// Reveal state, one character per character of the normalized answer.
    ///
    /// Spaces and punctuation always show through; unguessed letters show
    /// as `_`.
    pub fn reveal(&self) -> String {
        self.answer
            .chars()
            .map(|c| {
                if !is_guessable_letter(c) || self.guessed.contains(&c) {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    fn derive_outcome(&self) -> Outcome {
        let covered = self
            .answer
            .chars()
            .filter(|c| is_guessable_letter(*c))
            .all(|c| self.guessed.contains(&c));
        if covered {
            Outcome::Won
        } else if self.wrong_count >= self.max_wrong {
            Outcome::Lost
        } else {
            Outcome::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anatomy_utils::Category;

    fn femur() -> Card {
        Card {
            id: 1,
            category: Category::Bones,
            english: "Femur".to_string(),
            latin: "Femur".to_string(),
            image_path: String::new(),
        }
    }

    fn attempt(max_wrong: u32) -> CardAttempt {
        CardAttempt::new(&femur(), Language::English, max_wrong)
    }

    #[test]
    fn winning_run_keeps_wrong_count_at_zero() {
        let mut a = attempt(3);
        for letter in ["f", "e", "m", "u", "r"] {
            a.submit_letter(letter);
        }
        assert_eq!(a.outcome(), Outcome::Won);
        assert_eq!(a.wrong_count(), 0);
        assert_eq!(a.reveal(), "femur");
    }

    #[test]
    fn losing_run_discloses_nothing_extra() {
        let mut a = attempt(3);
        for letter in ["x", "y", "z"] {
            a.submit_letter(letter);
        }
        assert_eq!(a.outcome(), Outcome::Lost);
        assert_eq!(a.wrong_count(), 3);
        assert_eq!(a.mistakes_left(), 0);
        // The board keeps its blanks; the answer is disclosed separately.
        assert_eq!(a.reveal(), "_____");
        assert_eq!(a.answer(), "femur");
    }

    #[test]
    fn terminal_attempt_is_frozen() {
        let mut a = attempt(2);
        a.submit_letter("x");
        a.submit_letter("y");
        assert_eq!(a.outcome(), Outcome::Lost);

        a.submit_letter("f");
        assert_eq!(a.outcome(), Outcome::Lost);
        assert_eq!(a.reveal(), "_____");
        assert_eq!(a.guessed().count(), 2);
    }

    #[test]
    fn repeated_letter_is_a_no_op() {
        let mut a = attempt(3);
        a.submit_letter("x");
        a.submit_letter("x");
        assert_eq!(a.wrong_count(), 1);
        a.submit_letter("f");
        a.submit_letter("f");
        assert_eq!(a.wrong_count(), 1);
        assert_eq!(a.guessed().count(), 2);
    }

    #[test]
    fn malformed_input_is_ignored() {
        let mut a = attempt(3);
        for raw in ["", " ", "ab", "1", "-", "ß"] {
            a.submit_letter(raw);
        }
        assert_eq!(a.wrong_count(), 0);
        assert_eq!(a.guessed().count(), 0);
        assert_eq!(a.outcome(), Outcome::InProgress);
    }

    #[test]
    fn accented_keystroke_matches_plain_letter() {
        let mut a = attempt(3);
        a.submit_letter("É");
        assert!(a.guessed().any(|c| c == 'e'));
        assert_eq!(a.reveal(), "_e___");
        assert_eq!(a.wrong_count(), 0);
    }

    #[test]
    fn accented_answer_matches_plain_keystrokes() {
        let card = Card {
            id: 2,
            category: Category::Bones,
            english: "Fémur".to_string(),
            latin: "Fémur".to_string(),
            image_path: String::new(),
        };
        let mut a = CardAttempt::new(&card, Language::Latin, 3);
        a.submit_letter("e");
        assert_eq!(a.reveal(), "_e___");
    }

    #[test]
    fn spaces_and_punctuation_pass_through_unmasked() {
        let card = Card {
            id: 3,
            category: Category::Bones,
            english: "Hip bone".to_string(),
            latin: "Os coxae".to_string(),
            image_path: String::new(),
        };
        let a = CardAttempt::new(&card, Language::Latin, 3);
        assert_eq!(a.reveal(), "__ _____");
        assert_eq!(a.reveal().chars().count(), normalize("Os coxae").chars().count());
    }

    #[test]
    fn coverage_wins_with_mistakes_on_the_board() {
        let mut a = attempt(3);
        a.submit_letter("x");
        a.submit_letter("y");
        for letter in ["f", "e", "m", "u", "r"] {
            a.submit_letter(letter);
        }
        assert_eq!(a.outcome(), Outcome::Won);
        assert_eq!(a.wrong_count(), 2);
        assert_eq!(a.mistakes_left(), 1);
    }

    #[test]
    fn budget_exhaustion_loses_even_with_progress() {
        let mut a = attempt(2);
        a.submit_letter("f");
        a.submit_letter("x");
        a.submit_letter("y");
        assert_eq!(a.outcome(), Outcome::Lost);
        assert_eq!(a.reveal(), "f____");
    }
}
