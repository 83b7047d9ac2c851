//! Prompt composition.
//!
//! Builds the single effective prompt sent to the model from the user's
//! free-text request plus the structured modifiers (length, genre). The
//! composed string is natural language, not a structured payload; no
//! escaping is performed.

use std::fmt;

/// The sentinel genre meaning "don't constrain the genre".
///
/// Selecting it omits the genre clause from the composed prompt entirely
/// rather than inserting the sentinel literally.
pub const NO_GENRE: &str = "(No Genre)";

/// Genres offered by the UI selectors.
pub const GENRES: &[&str] = &[
    NO_GENRE,
    "Fantasy",
    "Science Fiction",
    "Mystery",
    "Horror",
    "Adventure",
    "Comedy",
    "Fairy Tale",
];

/// Canned prompts the pick-example action copies into the pending prompt.
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "A shy dragon who is afraid of fire",
    "A lighthouse keeper who finds a message in a bottle",
    "Two rival robots forced to run a bakery together",
    "A city where it only rains at night",
    "The last librarian on Earth",
];

/// System instruction sent with every generation request.
pub const STORYTELLER_INSTRUCTION: &str = include_str!("prompts/storyteller.txt");

/// Requested story length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl StoryLength {
    /// All lengths in selector order.
    pub fn all() -> [StoryLength; 3] {
        [StoryLength::Short, StoryLength::Medium, StoryLength::Long]
    }

    /// Human-readable label, as it appears in the composed prompt.
    pub fn label(&self) -> &'static str {
        match self {
            StoryLength::Short => "Short",
            StoryLength::Medium => "Medium",
            StoryLength::Long => "Long",
        }
    }

    /// Parse a label (case-insensitive). Used by the headless command parser.
    pub fn parse(s: &str) -> Option<StoryLength> {
        match s.to_lowercase().as_str() {
            "short" => Some(StoryLength::Short),
            "medium" => Some(StoryLength::Medium),
            "long" => Some(StoryLength::Long),
            _ => None,
        }
    }
}

impl fmt::Display for StoryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compose the effective prompt from the user's text and modifiers.
///
/// The caller guarantees `user_text` is non-empty. A `genre` of `None`, the
/// empty string, or [`NO_GENRE`] omits the genre clause. Pure and
/// deterministic; the user's text is always the suffix.
pub fn compose_prompt(user_text: &str, length: StoryLength, genre: Option<&str>) -> String {
    match genre.filter(|g| !g.is_empty() && *g != NO_GENRE) {
        Some(genre) => {
            format!("Tell me a {length}-length story in the {genre} genre about: {user_text}")
        }
        None => format!("Tell me a {length}-length story about: {user_text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_with_genre() {
        let prompt = compose_prompt("A shy dragon", StoryLength::Short, Some("Fantasy"));
        assert_eq!(
            prompt,
            "Tell me a Short-length story in the Fantasy genre about: A shy dragon"
        );
    }

    #[test]
    fn test_compose_without_genre() {
        let prompt = compose_prompt("A shy dragon", StoryLength::Medium, None);
        assert_eq!(prompt, "Tell me a Medium-length story about: A shy dragon");
    }

    #[test]
    fn test_no_genre_sentinel_is_omitted() {
        let prompt = compose_prompt("A quiet town", StoryLength::Long, Some(NO_GENRE));
        assert!(!prompt.contains(NO_GENRE));
        assert_eq!(prompt, "Tell me a Long-length story about: A quiet town");
    }

    #[test]
    fn test_user_text_is_suffix() {
        for genre in [None, Some("Mystery"), Some(NO_GENRE), Some("")] {
            for length in StoryLength::all() {
                let prompt = compose_prompt("a talking cat", length, genre);
                assert!(prompt.ends_with("a talking cat"));
            }
        }
    }

    #[test]
    fn test_default_length_is_medium() {
        assert_eq!(StoryLength::default(), StoryLength::Medium);
    }

    #[test]
    fn test_length_parse() {
        assert_eq!(StoryLength::parse("short"), Some(StoryLength::Short));
        assert_eq!(StoryLength::parse("MEDIUM"), Some(StoryLength::Medium));
        assert_eq!(StoryLength::parse("epic"), None);
    }

    #[test]
    fn test_genre_list_leads_with_sentinel() {
        assert_eq!(GENRES[0], NO_GENRE);
    }
}
