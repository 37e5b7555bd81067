//! Minimum proximity: how close together (in script blocks) the members of a
//! set of characters speak.
//!
//! Casting two characters on one actor is awkward when they speak within a few
//! blocks of each other. Distances are measured per book; related ids (age
//! variants, alternates) count as one speaker and are never measured against
//! each other.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::project::character::StandardCharacter;
use crate::project::model::{Project, ScriptBlock};
use crate::project::preferences::GroupingPolicy;

/// How standard characters of one book are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Standard characters of a book conflict unless routed to the same
    /// speaker type.
    Strict,
    /// Standard characters never conflict with each other, nor (when narrating
    /// by author) with the book's author.
    NonStrict,
}

/// The closest pair found in a set of characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinimumProximity {
    pub number_of_blocks: usize,
    pub first_character_id: String,
    pub second_character_id: String,
    pub first_reference: String,
    pub second_reference: String,
}

impl MinimumProximity {
    /// Sentinel for sets with at most one distinct speaker.
    pub fn maximum() -> Self {
        Self {
            number_of_blocks: usize::MAX,
            first_character_id: String::new(),
            second_character_id: String::new(),
            first_reference: String::new(),
            second_reference: String::new(),
        }
    }

    fn between(distance: usize, first: &ScriptBlock, second: &ScriptBlock) -> Self {
        Self {
            number_of_blocks: distance,
            first_character_id: first.character_id.clone(),
            second_character_id: second.character_id.clone(),
            first_reference: first.reference(),
            second_reference: second.reference(),
        }
    }

    pub fn is_maximum(&self) -> bool {
        self.number_of_blocks == usize::MAX
    }

    pub fn is_acceptable(&self, policy: &GroupingPolicy) -> bool {
        self.is_maximum() || self.number_of_blocks > policy.minimum_acceptable_proximity
    }

    /// Keeps whichever of the two is closer.
    pub fn min(self, other: MinimumProximity) -> MinimumProximity {
        if other.number_of_blocks < self.number_of_blocks {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for MinimumProximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_maximum() {
            return write!(f, "no conflicting speakers");
        }
        write!(
            f,
            "{} blocks between {} ({}) and {} ({})",
            self.number_of_blocks,
            self.first_character_id,
            self.first_reference,
            self.second_character_id,
            self.second_reference
        )
    }
}

// =============================================================================
// CALCULATOR
// =============================================================================

/// Computes minimum proximity over a project's included books.
pub struct ProximityCalculator<'a> {
    project: &'a Project,
}

impl<'a> ProximityCalculator<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// Strict minimum proximity of `ids`.
    pub fn calculate_minimum_proximity<I, S>(&self, ids: I) -> MinimumProximity
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.calculate_minimum_proximity_with(ids, Strictness::Strict)
    }

    pub fn calculate_minimum_proximity_with<I, S>(
        &self,
        ids: I,
        strictness: Strictness,
    ) -> MinimumProximity
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let reference = self.project.reference();
        let units: HashSet<String> = ids
            .into_iter()
            .map(|id| reference.unit_of(id.as_ref()).to_string())
            .collect();
        if units.len() <= 1 {
            return MinimumProximity::maximum();
        }

        let mut best = MinimumProximity::maximum();
        for book in self.project.included_books() {
            let mut last_seen: HashMap<&str, (usize, &ScriptBlock)> = HashMap::new();
            for (i, block) in book.blocks.iter().enumerate() {
                let unit = reference.unit_of(&block.character_id);
                if !units.contains(unit) {
                    continue;
                }
                for (other_unit, (j, other_block)) in &last_seen {
                    if *other_unit == unit
                        || self.is_exempt_pair(
                            &book.book_id,
                            &other_block.character_id,
                            &block.character_id,
                            strictness,
                        )
                    {
                        continue;
                    }
                    let distance = i - j - 1;
                    if distance < best.number_of_blocks {
                        best = MinimumProximity::between(distance, other_block, block);
                    }
                }
                if best.number_of_blocks == 0 {
                    return best;
                }
                last_seen.insert(unit, (i, block));
            }
        }
        best
    }

    /// True when two speakers in `book_id` never count as a conflict.
    pub fn is_exempt_pair(&self, book_id: &str, a: &str, b: &str, strictness: Strictness) -> bool {
        let prefs = &self.project.dramatization_preferences;
        match (StandardCharacter::parse(a), StandardCharacter::parse(b)) {
            (Some(x), Some(y)) => {
                if x.book_id != y.book_id {
                    return true;
                }
                match strictness {
                    Strictness::NonStrict => true,
                    Strictness::Strict => prefs.route(x.kind) == prefs.route(y.kind),
                }
            }
            (Some(standard), None) | (None, Some(standard)) => {
                if strictness == Strictness::Strict
                    || !self.project.is_narration_by_author()
                    || standard.book_id != book_id
                {
                    return false;
                }
                let named = if StandardCharacter::parse(a).is_some() { b } else { a };
                self.project
                    .reference()
                    .author_of(book_id)
                    .and_then(|author| author.speaking_character_id.as_deref())
                    == Some(named)
            }
            (None, None) => false,
        }
    }

    /// Builds a per-unit occurrence index for repeated pairwise queries.
    pub fn index(&self) -> ProximityIndex<'a> {
        let reference = self.project.reference();
        let mut positions: HashMap<String, Vec<Occurrence<'a>>> = HashMap::new();
        for (book_ordinal, book) in self.project.included_books().enumerate() {
            for (index, block) in book.blocks.iter().enumerate() {
                positions
                    .entry(reference.unit_of(&block.character_id).to_string())
                    .or_default()
                    .push(Occurrence {
                        book_ordinal,
                        index,
                        block,
                    });
            }
        }
        ProximityIndex {
            calculator: ProximityCalculator {
                project: self.project,
            },
            positions,
        }
    }
}

// =============================================================================
// PAIRWISE INDEX
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Occurrence<'a> {
    book_ordinal: usize,
    index: usize,
    block: &'a ScriptBlock,
}

/// Occurrence positions of every unit, for fast pairwise proximity.
///
/// The minimum proximity of a set equals the minimum over its pairs, so a
/// group's proximity can be maintained incrementally from pair queries.
pub struct ProximityIndex<'a> {
    calculator: ProximityCalculator<'a>,
    positions: HashMap<String, Vec<Occurrence<'a>>>,
}

impl<'a> ProximityIndex<'a> {
    /// Proximity between two units (representative ids).
    pub fn pair(&self, a: &str, b: &str, strictness: Strictness) -> MinimumProximity {
        if a == b {
            return MinimumProximity::maximum();
        }
        let (Some(pa), Some(pb)) = (self.positions.get(a), self.positions.get(b)) else {
            return MinimumProximity::maximum();
        };

        let mut best = MinimumProximity::maximum();
        let (mut i, mut j) = (0, 0);
        let mut last_a: Option<Occurrence<'a>> = None;
        let mut last_b: Option<Occurrence<'a>> = None;
        let mut book = usize::MAX;
        while i < pa.len() || j < pb.len() {
            let take_a = match (pa.get(i), pb.get(j)) {
                (Some(x), Some(y)) => (x.book_ordinal, x.index) < (y.book_ordinal, y.index),
                (Some(_), None) => true,
                _ => false,
            };
            let current = if take_a { pa[i] } else { pb[j] };
            if take_a {
                i += 1;
            } else {
                j += 1;
            }
            if current.book_ordinal != book {
                book = current.book_ordinal;
                last_a = None;
                last_b = None;
            }
            let previous = if take_a { last_b } else { last_a };
            if let Some(prev) = previous {
                if !self.calculator.is_exempt_pair(
                    &current.block.book_id,
                    &prev.block.character_id,
                    &current.block.character_id,
                    strictness,
                ) {
                    let distance = current.index - prev.index - 1;
                    if distance < best.number_of_blocks {
                        best = MinimumProximity::between(distance, prev.block, current.block);
                        if distance == 0 {
                            return best;
                        }
                    }
                }
            }
            if take_a {
                last_a = Some(current);
            } else {
                last_b = Some(current);
            }
        }
        best
    }
}

// =============================================================================
// TESTS
// =============================================================================
