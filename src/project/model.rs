//! Script-layer data consumed by the grouping engine.
//!
//! The quote parser and project file layer live elsewhere; this module only holds
//! what they hand over: ordered, character-tagged blocks per book, the book
//! inclusion flags, and the user's preferences.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::character::{is_marker, CharacterDetail, CharacterGender, StandardCharacter};
use super::preferences::{
    CharacterGroupGenerationPreferences, DramatizationPreferences,
    ExtraBiblicalMaterialSpeakerOption, GroupingPolicy, NarratorsOption,
};
use super::reference::{sort_books, ReferenceData};

// =============================================================================
// SCRIPT BLOCK
// =============================================================================

/// One character-tagged unit of script, in canonical order within its book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptBlock {
    pub book_id: String,
    pub chapter: u32,
    pub initial_verse: u32,
    /// Last verse of a verse bridge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verse: Option<u32>,
    pub character_id: String,
    #[serde(default)]
    pub keystrokes: u64,
}

impl ScriptBlock {
    pub fn new(
        book_id: impl Into<String>,
        chapter: u32,
        verse: u32,
        character_id: impl Into<String>,
        keystrokes: u64,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            chapter,
            initial_verse: verse,
            last_verse: None,
            character_id: character_id.into(),
            keystrokes,
        }
    }

    /// Builder: make the block span a verse bridge.
    pub fn with_last_verse(mut self, last_verse: u32) -> Self {
        self.last_verse = Some(last_verse);
        self
    }

    /// Display reference, e.g. `MRK 1:16` or `MRK 1:16-17`.
    pub fn reference(&self) -> String {
        match self.last_verse {
            Some(last) if last > self.initial_verse => format!(
                "{} {}:{}-{}",
                self.book_id, self.chapter, self.initial_verse, last
            ),
            _ => format!("{} {}:{}", self.book_id, self.chapter, self.initial_verse),
        }
    }
}

/// The blocks of one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookScript {
    pub book_id: String,
    #[serde(default = "default_included")]
    pub included: bool,
    #[serde(default)]
    pub blocks: Vec<ScriptBlock>,
}

fn default_included() -> bool {
    true
}

impl BookScript {
    pub fn new(book_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            included: true,
            blocks: Vec::new(),
        }
    }

    /// Builder: append a block; the block's book id is forced to this book.
    pub fn with_block(mut self, chapter: u32, verse: u32, character_id: &str, keystrokes: u64) -> Self {
        self.blocks.push(ScriptBlock::new(
            self.book_id.clone(),
            chapter,
            verse,
            character_id,
            keystrokes,
        ));
        self
    }

    pub fn with_included(mut self, included: bool) -> Self {
        self.included = included;
        self
    }
}

// =============================================================================
// PROJECT
// =============================================================================

/// A recording project as seen by the grouping engine.
#[derive(Debug, Clone)]
pub struct Project {
    pub books: Vec<BookScript>,
    pub generation_preferences: CharacterGroupGenerationPreferences,
    pub dramatization_preferences: DramatizationPreferences,
    pub policy: GroupingPolicy,
    reference: Arc<ReferenceData>,
}

impl Project {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self {
            books: Vec::new(),
            generation_preferences: CharacterGroupGenerationPreferences::default(),
            dramatization_preferences: DramatizationPreferences::default(),
            policy: GroupingPolicy::default(),
            reference,
        }
    }

    pub fn with_book(mut self, book: BookScript) -> Self {
        self.books.push(book);
        self
    }

    pub fn with_generation_preferences(mut self, prefs: CharacterGroupGenerationPreferences) -> Self {
        self.generation_preferences = prefs;
        self
    }

    pub fn with_dramatization_preferences(mut self, prefs: DramatizationPreferences) -> Self {
        self.dramatization_preferences = prefs;
        self
    }

    pub fn with_policy(mut self, policy: GroupingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn is_narration_by_author(&self) -> bool {
        self.generation_preferences.narrators_option == NarratorsOption::NarrationByAuthor
    }

    /// Includes or excludes a book. Returns false if the project has no such book.
    pub fn set_book_included(&mut self, book_id: &str, included: bool) -> bool {
        match self.books.iter_mut().find(|b| b.book_id == book_id) {
            Some(book) => {
                book.included = included;
                true
            }
            None => false,
        }
    }

    pub fn included_books(&self) -> impl Iterator<Item = &BookScript> {
        self.books.iter().filter(|b| b.included)
    }

    /// Included book ids in canonical order.
    pub fn included_book_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.included_books().map(|b| b.book_id.clone()).collect();
        sort_books(&mut ids);
        ids.dedup();
        ids
    }

    /// Route of a standard character, `None` for named characters.
    pub fn standard_route(&self, character_id: &str) -> Option<ExtraBiblicalMaterialSpeakerOption> {
        StandardCharacter::parse(character_id).map(|s| self.dramatization_preferences.route(s.kind))
    }

    /// Reference detail of a character, with standard characters taking the
    /// gender of the speaker type they are routed to.
    pub fn effective_detail(&self, character_id: &str) -> CharacterDetail {
        let mut detail = self.reference.detail(character_id);
        if let Some(route) = self.standard_route(character_id) {
            detail.gender = route.as_gender().unwrap_or(CharacterGender::Either);
        }
        detail
    }

    /// Total keystrokes per character id over the included books.
    pub fn keystrokes_by_character(&self) -> HashMap<String, u64> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for block in self.included_books().flat_map(|b| b.blocks.iter()) {
            *totals.entry(block.character_id.clone()).or_default() += block.keystrokes;
        }
        totals
    }

    /// Narration volume per included book: keystrokes of every block read by
    /// the narrator under the current dramatization routing.
    pub fn keystrokes_by_book(&self) -> HashMap<String, u64> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for book in self.included_books() {
            let narrated: u64 = book
                .blocks
                .iter()
                .filter(|b| {
                    self.standard_route(&b.character_id)
                        == Some(ExtraBiblicalMaterialSpeakerOption::Narrator)
                })
                .map(|b| b.keystrokes)
                .sum();
            *totals.entry(book.book_id.clone()).or_default() += narrated;
        }
        totals
    }

    /// Every character id that needs a voice: spoken in an included book, not a
    /// parser marker, and not routed to `Omitted`.
    pub fn in_use_character_ids(&self) -> BTreeSet<String> {
        self.keystrokes_by_character()
            .into_iter()
            .filter(|(id, keystrokes)| {
                *keystrokes > 0
                    && !is_marker(id)
                    && self.standard_route(id) != Some(ExtraBiblicalMaterialSpeakerOption::Omitted)
            })
            .map(|(id, _)| id)
            .collect()
    }
}
