//! Distribution of books among a fixed number of narrator groups.
//!
//! Slots start as one per author. Small authors are merged until the slot count
//! fits; when more narrators are wanted than authors, the heaviest slots are
//! split along book boundaries.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::authors::AuthorStats;
use super::cancel::CancellationToken;
use crate::project::reference::sort_books;

/// The books one narrator reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarratorSlot {
    pub author_names: Vec<String>,
    /// Canonical order.
    pub book_ids: Vec<String>,
    pub keystrokes: u64,
}

impl NarratorSlot {
    fn from_author(stats: &AuthorStats) -> Self {
        Self {
            author_names: vec![stats.author_name.clone()],
            book_ids: stats.book_ids.clone(),
            keystrokes: stats.keystrokes,
        }
    }

    fn absorb(&mut self, other: NarratorSlot) {
        for name in other.author_names {
            if !self.author_names.contains(&name) {
                self.author_names.push(name);
            }
        }
        self.book_ids.extend(other.book_ids);
        sort_books(&mut self.book_ids);
        self.keystrokes += other.keystrokes;
    }

    fn split_at(&self, at: usize, keystrokes_by_book: &HashMap<String, u64>) -> (Self, Self) {
        let part = |books: &[String]| NarratorSlot {
            author_names: self.author_names.clone(),
            book_ids: books.to_vec(),
            keystrokes: books
                .iter()
                .filter_map(|b| keystrokes_by_book.get(b))
                .sum(),
        };
        (part(&self.book_ids[..at]), part(&self.book_ids[at..]))
    }
}

// =============================================================================
// TRIALS
// =============================================================================

/// One candidate split of the current slots.
#[derive(Debug, Clone)]
pub struct DistributionTrial {
    pub slots: Vec<NarratorSlot>,
    /// Index of the slot that was split, and the book position of the cut.
    pub split: (usize, usize),
    pub largest: u64,
    pub spread: u64,
    /// Pinned book sets that end up spread over several slots.
    pub broken_pins: usize,
}

impl DistributionTrial {
    fn new(slots: Vec<NarratorSlot>, split: (usize, usize), pinned: &[Vec<String>]) -> Self {
        let largest = slots.iter().map(|s| s.keystrokes).max().unwrap_or(0);
        let smallest = slots.iter().map(|s| s.keystrokes).min().unwrap_or(0);
        let broken_pins = pinned
            .iter()
            .filter(|pin| {
                let mut owners = slots
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| pin.iter().any(|b| s.book_ids.contains(b)))
                    .map(|(i, _)| i);
                owners.next().is_some() && owners.next().is_some()
            })
            .count();
        Self {
            slots,
            split,
            largest,
            spread: largest - smallest,
            broken_pins,
        }
    }
}

/// Orders trials best first: smallest heaviest slot, then fewest broken pins,
/// then most even spread, then earliest cut.
pub fn compare_trials(a: &DistributionTrial, b: &DistributionTrial) -> Ordering {
    a.largest
        .cmp(&b.largest)
        .then(a.broken_pins.cmp(&b.broken_pins))
        .then(a.spread.cmp(&b.spread))
        .then(a.split.cmp(&b.split))
}

/// Every single-cut split of `slots`, produced lazily.
fn split_trials<'s>(
    slots: &'s [NarratorSlot],
    pinned: &'s [Vec<String>],
    keystrokes_by_book: &'s HashMap<String, u64>,
) -> impl Iterator<Item = DistributionTrial> + 's {
    slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.book_ids.len() >= 2)
        .flat_map(move |(index, slot)| {
            (1..slot.book_ids.len()).map(move |at| {
                let (left, right) = slot.split_at(at, keystrokes_by_book);
                let mut trial_slots = slots.to_vec();
                trial_slots[index] = left;
                trial_slots.insert(index + 1, right);
                DistributionTrial::new(trial_slots, (index, at), pinned)
            })
        })
}

// =============================================================================
// DISTRIBUTION
// =============================================================================

/// Distributes the authors' books over `narrator_count` slots.
///
/// Every book appears in exactly one slot. The result has
/// `min(narrator_count, number of books)` slots. `pinned` lists book sets
/// (those of cameo narrators) that should stay in one slot when splitting.
/// Returns `None` when cancelled.
pub fn distribute_books_among_narrator_groups(
    author_stats: &[AuthorStats],
    narrator_count: usize,
    pinned: &[Vec<String>],
    cancel: &CancellationToken,
) -> Option<Vec<NarratorSlot>> {
    let mut slots: Vec<NarratorSlot> = author_stats
        .iter()
        .filter(|s| !s.book_ids.is_empty())
        .map(NarratorSlot::from_author)
        .collect();
    let book_count: usize = slots.iter().map(|s| s.book_ids.len()).sum();
    let target = narrator_count.min(book_count);
    if target == 0 {
        return Some(Vec::new());
    }

    while slots.len() > target {
        if cancel.is_cancelled() {
            return None;
        }
        let mut order: Vec<usize> = (0..slots.len()).collect();
        order.sort_by_key(|&i| slots[i].keystrokes);
        let (keep, merge) = (order[0].min(order[1]), order[0].max(order[1]));
        let merged = slots.remove(merge);
        log::trace!(
            "merging narration of {:?} into {:?}",
            merged.author_names,
            slots[keep].author_names
        );
        slots[keep].absorb(merged);
    }

    if slots.len() < target {
        let keystrokes_by_book: HashMap<String, u64> = author_stats
            .iter()
            .flat_map(|s| s.book_ids.iter().cloned().zip(s.book_keystrokes.iter().copied()))
            .collect();
        while slots.len() < target {
            let mut best: Option<DistributionTrial> = None;
            for trial in split_trials(&slots, pinned, &keystrokes_by_book) {
                if cancel.is_cancelled() {
                    return None;
                }
                best = match best {
                    Some(current) if compare_trials(&current, &trial) != Ordering::Greater => {
                        Some(current)
                    }
                    _ => Some(trial),
                };
            }
            match best {
                Some(trial) => {
                    log::trace!("splitting narration at {:?}", trial.split);
                    slots = trial.slots;
                }
                None => break,
            }
        }
    }
    Some(slots)
}

/// Distributes books without regard to authorship: every book starts as its
/// own slot.
pub fn distribute_books(
    narrator_count: usize,
    book_ids: &[String],
    keystrokes_by_book: &HashMap<String, u64>,
    cancel: &CancellationToken,
) -> Option<Vec<NarratorSlot>> {
    let mut books = book_ids.to_vec();
    sort_books(&mut books);
    let stats = AuthorStats::one_per_book(&books, keystrokes_by_book);
    distribute_books_among_narrator_groups(&stats, narrator_count, &[], cancel)
}
