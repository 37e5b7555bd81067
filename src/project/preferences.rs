//! Generation and dramatization preferences, plus the numeric grouping policy.

use serde::{Deserialize, Serialize};

use super::character::{CharacterGender, StandardKind};

// =============================================================================
// GENERATION PREFERENCES
// =============================================================================

/// How many narrator groups to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NarratorsOption {
    /// Derived from the cast-size plan.
    #[default]
    NotSet,
    SingleNarrator,
    /// One narrator per biblical author of the included books.
    NarrationByAuthor,
    /// Explicit male/female narrator counts.
    Custom,
}

/// Sizing preset used to plan a cast before real actors are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CastSizeOption {
    Small,
    Recommended,
    Large,
    Custom,
    #[default]
    MatchVoiceActorList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterGroupGenerationPreferences {
    pub narrators_option: NarratorsOption,
    pub number_of_male_narrators: u32,
    pub number_of_female_narrators: u32,
    pub cast_size_option: CastSizeOption,
    /// Actor counts used with `CastSizeOption::Custom`.
    pub number_of_male_actors: u32,
    pub number_of_female_actors: u32,
    pub number_of_child_actors: u32,
}

impl Default for CharacterGroupGenerationPreferences {
    fn default() -> Self {
        Self {
            narrators_option: NarratorsOption::NotSet,
            number_of_male_narrators: 0,
            number_of_female_narrators: 0,
            cast_size_option: CastSizeOption::MatchVoiceActorList,
            number_of_male_actors: 0,
            number_of_female_actors: 0,
            number_of_child_actors: 0,
        }
    }
}

impl CharacterGroupGenerationPreferences {
    pub fn with_narrators(mut self, option: NarratorsOption) -> Self {
        self.narrators_option = option;
        self
    }

    pub fn with_custom_narrators(mut self, male: u32, female: u32) -> Self {
        self.narrators_option = NarratorsOption::Custom;
        self.number_of_male_narrators = male;
        self.number_of_female_narrators = female;
        self
    }

    pub fn with_cast_size(mut self, option: CastSizeOption) -> Self {
        self.cast_size_option = option;
        self
    }
}

// =============================================================================
// DRAMATIZATION PREFERENCES
// =============================================================================

/// Who speaks extra-biblical material (titles, section heads, intros).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtraBiblicalMaterialSpeakerOption {
    #[default]
    Narrator,
    ActorOfEitherGender,
    FemaleActor,
    MaleActor,
    /// Not recorded at all.
    Omitted,
}

impl ExtraBiblicalMaterialSpeakerOption {
    /// Gender to cast with when the material is not read by the narrator.
    pub fn as_gender(self) -> Option<CharacterGender> {
        match self {
            Self::ActorOfEitherGender => Some(CharacterGender::Either),
            Self::FemaleActor => Some(CharacterGender::Female),
            Self::MaleActor => Some(CharacterGender::Male),
            Self::Narrator | Self::Omitted => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DramatizationPreferences {
    pub book_title_and_chapter: ExtraBiblicalMaterialSpeakerOption,
    pub section_head: ExtraBiblicalMaterialSpeakerOption,
    pub book_introduction: ExtraBiblicalMaterialSpeakerOption,
}

impl DramatizationPreferences {
    /// Speaker route of a standard character kind. The narrator always
    /// narrates.
    pub fn route(&self, kind: StandardKind) -> ExtraBiblicalMaterialSpeakerOption {
        match kind {
            StandardKind::Narrator => ExtraBiblicalMaterialSpeakerOption::Narrator,
            StandardKind::BookOrChapter => self.book_title_and_chapter,
            StandardKind::ExtraBiblical => self.section_head,
            StandardKind::Intro => self.book_introduction,
        }
    }
}

// =============================================================================
// GROUPING POLICY
// =============================================================================

/// Numeric policy constants of the grouping engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingPolicy {
    /// Two characters in one group must be more than this many blocks apart.
    pub minimum_acceptable_proximity: usize,
    /// Above this many changed characters a full regeneration is recommended.
    pub max_changed_characters_for_minimal_adjustment: usize,
    /// Below this cast size deity roles are packed like any other character.
    pub deity_group_min_cast: usize,
    /// From this cast size Jesus gets a group of his own.
    pub jesus_alone_min_cast: usize,
    /// From this cast size God is separated from the remaining deity roles.
    pub god_alone_min_cast: usize,
    pub keystrokes_per_hour: u64,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self {
            minimum_acceptable_proximity: 30,
            max_changed_characters_for_minimal_adjustment: 5,
            deity_group_min_cast: 4,
            jesus_alone_min_cast: 8,
            god_alone_min_cast: 14,
            keystrokes_per_hour: 6000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes_go_to_narrator() {
        let prefs = DramatizationPreferences::default();
        for kind in StandardKind::ALL {
            assert_eq!(prefs.route(kind), ExtraBiblicalMaterialSpeakerOption::Narrator);
        }
    }

    #[test]
    fn test_narrator_route_cannot_be_overridden() {
        let prefs = DramatizationPreferences {
            book_title_and_chapter: ExtraBiblicalMaterialSpeakerOption::Omitted,
            section_head: ExtraBiblicalMaterialSpeakerOption::MaleActor,
            book_introduction: ExtraBiblicalMaterialSpeakerOption::FemaleActor,
        };
        assert_eq!(
            prefs.route(StandardKind::Narrator),
            ExtraBiblicalMaterialSpeakerOption::Narrator
        );
        assert_eq!(
            prefs.route(StandardKind::ExtraBiblical).as_gender(),
            Some(CharacterGender::Male)
        );
        assert_eq!(prefs.route(StandardKind::BookOrChapter).as_gender(), None);
    }

    #[test]
    fn test_policy_fills_missing_fields_with_defaults() {
        let policy: GroupingPolicy =
            serde_json::from_str(r#"{ "minimum_acceptable_proximity": 12 }"#).unwrap();
        assert_eq!(policy.minimum_acceptable_proximity, 12);
        assert_eq!(policy.max_changed_characters_for_minimal_adjustment, 5);
    }
}
