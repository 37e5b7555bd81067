//! Voicecast - casting engine for dramatized multi-book scripture recordings.
//!
//! Every speaking character of the included books is placed in exactly one
//! character group, one group per voice actor:
//!
//! - **Hard constraints**: gender and age compatibility, one narrator line per
//!   book or author, isolation of deity roles once the cast is large enough
//! - **Soft constraint**: characters speaking within a few blocks of each other
//!   should not share an actor (see [`ProximityCalculator`])
//! - **Incremental upkeep**: [`CharacterGroupsAdjuster`] patches hand-edited
//!   groups in place when the project changes
//!
//! Groups and the actor roster persist in an Automerge document managed by
//! [`CastingManager`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use voicecast::{
//!     ActorGender, BookScript, CastingManager, CharacterGroupGenerator, Project,
//!     ReferenceData, VoiceActor,
//! };
//!
//! let project = Project::new(Arc::new(ReferenceData::default())).with_book(
//!     BookScript::new("MRK")
//!         .with_block(1, 16, "narrator-MRK", 200)
//!         .with_block(1, 17, "Jesus", 80)
//!         .with_block(1, 18, "narrator-MRK", 300),
//! );
//!
//! let mut manager = CastingManager::new();
//! manager.add_actor(VoiceActor::new("anna", ActorGender::Female)).unwrap();
//! manager.add_actor(VoiceActor::new("ben", ActorGender::Male)).unwrap();
//!
//! let casting = manager.get_state().unwrap();
//! let mut generator = CharacterGroupGenerator::new(&project, &casting);
//! let groups = generator.generate_character_groups().unwrap();
//! assert_eq!(groups.len(), 2);
//! assert_eq!(groups[0].id, "Narrator1");
//!
//! generator.apply_generated_groups_to_project(&mut manager, false).unwrap();
//! let bytes = manager.save();
//! ```

pub mod error;

pub mod casting;
pub mod grouping;
pub mod project;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-exports for convenience
pub use casting::{ActorAge, ActorGender, CastingManager, CastingRoot, CharacterGroup, GroupLabel, VoiceActor};
pub use error::{CastError, CastResult};
pub use grouping::{
    AuthorStats, CancellationToken, CastSizePlan, CharacterGroupGenerator, CharacterGroupsAdjuster,
    MinimumProximity, ProximityCalculator, Strictness,
};
pub use project::{
    BookScript, CharacterGroupGenerationPreferences, DramatizationPreferences, GroupingPolicy,
    Project, ReferenceData, ScriptBlock,
};
