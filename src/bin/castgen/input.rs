//! Input structs for the project JSON handed over by the script layer.
//!
//! Key differences from the library model:
//! - Reference tables are inlined and optional (standard authors apply)
//! - An initial roster may be given for projects without a casting document

use std::sync::Arc;

use serde::Deserialize;

use voicecast::project::{
    BookScript, CharacterGroupGenerationPreferences, DramatizationPreferences, GroupingPolicy,
    Project, ReferenceData, ReferenceTables,
};
use voicecast::VoiceActor;

/// Root of the project JSON file.
#[derive(Debug, Deserialize)]
pub struct InputProject {
    pub books: Vec<BookScript>,
    #[serde(default)]
    pub generation_preferences: CharacterGroupGenerationPreferences,
    #[serde(default)]
    pub dramatization_preferences: DramatizationPreferences,
    #[serde(default)]
    pub reference: ReferenceTables,
    /// Roster used when no casting document exists yet.
    #[serde(default)]
    pub actors: Vec<VoiceActor>,
}

impl InputProject {
    /// Splits the input into the engine's project and the initial roster.
    pub fn into_project(self, policy: GroupingPolicy) -> (Project, Vec<VoiceActor>) {
        let reference = Arc::new(ReferenceData::from_tables(self.reference));
        let project = self
            .books
            .into_iter()
            .fold(Project::new(reference), |project, book| project.with_book(book))
            .with_generation_preferences(self.generation_preferences)
            .with_dramatization_preferences(self.dramatization_preferences)
            .with_policy(policy);
        (project, self.actors)
    }
}
