//! The grouping engine: proximity, narrator distribution, generation and
//! adjustment of character groups.

pub mod adjuster;
pub mod authors;
pub mod cancel;
pub mod cast_size;
pub mod generator;
pub mod narrators;
pub mod proximity;

// Re-exports for convenience
pub use adjuster::CharacterGroupsAdjuster;
pub use authors::AuthorStats;
pub use cancel::CancellationToken;
pub use cast_size::CastSizePlan;
pub use generator::{reconcile_actor_assignments, CharacterGroupGenerator};
pub use narrators::{compare_trials, distribute_books, distribute_books_among_narrator_groups, DistributionTrial, NarratorSlot};
pub use proximity::{MinimumProximity, ProximityCalculator, ProximityIndex, Strictness};
