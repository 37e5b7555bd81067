//! Project-side input to the casting engine: script blocks, reference data and
//! preferences.

pub mod character;
pub mod model;
pub mod preferences;
pub mod reference;

// Re-exports for convenience
pub use character::{CharacterAge, CharacterDetail, CharacterGender, StandardCharacter, StandardKind};
pub use model::{BookScript, Project, ScriptBlock};
pub use preferences::{
    CastSizeOption, CharacterGroupGenerationPreferences, DramatizationPreferences,
    ExtraBiblicalMaterialSpeakerOption, GroupingPolicy, NarratorsOption,
};
pub use reference::{Author, BiblicalAuthors, ReferenceData, ReferenceTables, RelatedCharacters, RelationshipKind};
