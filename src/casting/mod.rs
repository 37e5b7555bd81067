//! Casting document module.
//!
//! Provides the CRDT-backed store for the actor roster and character groups.

pub mod model;
pub mod manager;

// Re-exports for convenience
pub use model::{ActorAge, ActorGender, CastingRoot, CharacterGroup, GroupLabel, VoiceActor};
pub use manager::CastingManager;
