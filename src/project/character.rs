//! Character ids and the per-character reference details.
//!
//! A character id is an opaque string. Standard characters are scoped to one book
//! and spelled `<prefix>-<BOOK>`; everything else is a named character or one of
//! the parser's unresolved markers.

use serde::{Deserialize, Serialize};

/// Marker the quote parser leaves on blocks it could not attribute.
pub const NEEDS_REVIEW: &str = "Needs Review";
/// Marker for blocks that could belong to more than one speaker.
pub const AMBIGUOUS: &str = "Ambiguous";
/// Marker for blocks attributed to a speaker the control data does not expect.
pub const UNKNOWN: &str = "Unknown";

pub const JESUS: &str = "Jesus";
pub const GOD: &str = "God";
pub const HOLY_SPIRIT: &str = "Holy Spirit, the";
/// Collective voice used when scripture is quoted by a speaker.
pub const SCRIPTURE: &str = "scripture";

/// Deity roles in the order they are peeled off into isolated groups.
pub const DEITY_CHARACTERS: [&str; 4] = [JESUS, GOD, HOLY_SPIRIT, SCRIPTURE];

/// Returns true for ids that never take part in casting.
pub fn is_marker(character_id: &str) -> bool {
    matches!(character_id, NEEDS_REVIEW | AMBIGUOUS | UNKNOWN) || character_id.is_empty()
}

pub fn is_deity(character_id: &str) -> bool {
    DEITY_CHARACTERS.contains(&character_id)
}

// =============================================================================
// STANDARD CHARACTERS
// =============================================================================

/// The fixed, non-named roles every book has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardKind {
    Narrator,
    /// Section heads and other extra-biblical material.
    ExtraBiblical,
    /// Book title and chapter announcements.
    BookOrChapter,
    /// Book introduction.
    Intro,
}

impl StandardKind {
    pub const ALL: [StandardKind; 4] = [
        StandardKind::Narrator,
        StandardKind::ExtraBiblical,
        StandardKind::BookOrChapter,
        StandardKind::Intro,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            StandardKind::Narrator => "narrator",
            StandardKind::ExtraBiblical => "extra",
            StandardKind::BookOrChapter => "BC",
            StandardKind::Intro => "intro",
        }
    }
}

/// A parsed standard character id such as `narrator-MRK`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StandardCharacter {
    pub kind: StandardKind,
    pub book_id: String,
}

impl StandardCharacter {
    /// Parses `id` if it names a standard character.
    pub fn parse(id: &str) -> Option<Self> {
        let (prefix, book) = id.split_once('-')?;
        if book.len() != 3 || !book.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return None;
        }
        let kind = StandardKind::ALL.into_iter().find(|k| k.prefix() == prefix)?;
        Some(Self {
            kind,
            book_id: book.to_string(),
        })
    }

    pub fn id(&self) -> String {
        standard_character_id(self.kind, &self.book_id)
    }
}

/// Builds the id of the given standard character for a book.
pub fn standard_character_id(kind: StandardKind, book_id: &str) -> String {
    format!("{}-{}", kind.prefix(), book_id)
}

pub fn narrator_id(book_id: &str) -> String {
    standard_character_id(StandardKind::Narrator, book_id)
}

pub fn is_standard(character_id: &str) -> bool {
    StandardCharacter::parse(character_id).is_some()
}

// =============================================================================
// CHARACTER DETAILS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterGender {
    Male,
    Female,
    PreferMale,
    PreferFemale,
    #[default]
    Either,
    Neuter,
}

impl CharacterGender {
    /// Male or leaning male.
    pub fn is_male(self) -> bool {
        matches!(self, CharacterGender::Male | CharacterGender::PreferMale)
    }

    pub fn is_female(self) -> bool {
        matches!(self, CharacterGender::Female | CharacterGender::PreferFemale)
    }

    /// Male and female roles may not share an actor; everything else mixes.
    pub fn conflicts_with(self, other: CharacterGender) -> bool {
        (self.is_male() && other.is_female()) || (self.is_female() && other.is_male())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterAge {
    #[default]
    Adult,
    Child,
    Elder,
    YoungAdult,
}

impl CharacterAge {
    pub fn is_child(self) -> bool {
        self == CharacterAge::Child
    }
}

/// Reference information about one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDetail {
    pub character_id: String,
    #[serde(default)]
    pub gender: CharacterGender,
    #[serde(default)]
    pub age: CharacterAge,
}

impl CharacterDetail {
    pub fn new(character_id: impl Into<String>, gender: CharacterGender, age: CharacterAge) -> Self {
        Self {
            character_id: character_id.into(),
            gender,
            age,
        }
    }
}
