//! Cast size planning: how many actors of each kind a project needs.
//!
//! The plan is advisory. Generation always packs against the real roster and
//! only takes its narrator count from here.

use std::collections::BTreeMap;

use serde::Serialize;

use super::authors::AuthorStats;
use crate::casting::model::{ActorGender, CastingRoot};
use crate::project::character::{is_deity, is_standard};
use crate::project::model::Project;
use crate::project::preferences::{CastSizeOption, NarratorsOption};

/// Actor counts for a project. Narrators are included in the adult counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CastSizePlan {
    pub male_actors: usize,
    pub female_actors: usize,
    pub child_actors: usize,
    pub male_narrators: usize,
    pub female_narrators: usize,
}

/// Characters in use, collapsed to related units and bucketed by voice type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct UnitCensus {
    male: usize,
    female: usize,
    either: usize,
    child: usize,
    deity: bool,
}

impl UnitCensus {
    fn of(project: &Project) -> Self {
        let reference = project.reference();
        let mut units: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut census = UnitCensus::default();
        for id in project.in_use_character_ids() {
            if is_deity(&id) {
                census.deity = true;
                continue;
            }
            if is_standard(&id) {
                continue;
            }
            units
                .entry(reference.unit_of(&id).to_string())
                .or_default()
                .push(id);
        }
        for members in units.values() {
            let details: Vec<_> = members.iter().map(|id| project.effective_detail(id)).collect();
            if details.iter().all(|d| d.age.is_child()) {
                census.child += 1;
            } else if details.iter().any(|d| d.gender.is_male()) {
                census.male += 1;
            } else if details.iter().any(|d| d.gender.is_female()) {
                census.female += 1;
            } else {
                census.either += 1;
            }
        }
        census
    }
}

/// Characters one actor is expected to cover at each cast size.
fn characters_per_actor(option: CastSizeOption) -> usize {
    match option {
        CastSizeOption::Small => 8,
        CastSizeOption::Large => 2,
        _ => 4,
    }
}

/// Narrator count the chosen cast size calls for.
pub fn narrators_for_cast_size(project: &Project, option: CastSizeOption) -> usize {
    let authors = AuthorStats::for_project(project)
        .into_iter()
        .filter(|a| a.keystrokes > 0)
        .count();
    if authors == 0 {
        return 0;
    }
    let books = project
        .keystrokes_by_book()
        .values()
        .filter(|k| **k > 0)
        .count();
    match option {
        CastSizeOption::Small => 1,
        CastSizeOption::Large => authors,
        _ => books.div_ceil(10).clamp(1, authors),
    }
}

/// Narrator count requested by the project's narrator option.
pub fn requested_narrator_count(project: &Project) -> usize {
    let prefs = &project.generation_preferences;
    match prefs.narrators_option {
        NarratorsOption::SingleNarrator => 1,
        NarratorsOption::NarrationByAuthor => AuthorStats::for_project(project)
            .into_iter()
            .filter(|a| a.keystrokes > 0)
            .count(),
        NarratorsOption::Custom => {
            (prefs.number_of_male_narrators + prefs.number_of_female_narrators) as usize
        }
        NarratorsOption::NotSet => narrators_for_cast_size(project, prefs.cast_size_option),
    }
}

impl CastSizePlan {
    /// Plans the cast for `option`. `MatchVoiceActorList` counts the active
    /// roster of `casting`.
    pub fn for_project(project: &Project, casting: &CastingRoot, option: CastSizeOption) -> Self {
        let prefs = &project.generation_preferences;
        let (male_narrators, female_narrators) = match prefs.narrators_option {
            NarratorsOption::Custom => (
                prefs.number_of_male_narrators as usize,
                prefs.number_of_female_narrators as usize,
            ),
            NarratorsOption::NotSet => (narrators_for_cast_size(project, option), 0),
            _ => (requested_narrator_count(project), 0),
        };

        match option {
            CastSizeOption::MatchVoiceActorList => {
                let mut plan = CastSizePlan {
                    male_narrators,
                    female_narrators,
                    ..Default::default()
                };
                for actor in casting.active_actors() {
                    match (actor.is_child(), actor.gender) {
                        (true, _) => plan.child_actors += 1,
                        (false, ActorGender::Male) => plan.male_actors += 1,
                        (false, ActorGender::Female) => plan.female_actors += 1,
                    }
                }
                plan
            }
            CastSizeOption::Custom => CastSizePlan {
                male_actors: prefs.number_of_male_actors as usize + male_narrators,
                female_actors: prefs.number_of_female_actors as usize + female_narrators,
                child_actors: prefs.number_of_child_actors as usize,
                male_narrators,
                female_narrators,
            },
            _ => {
                let census = UnitCensus::of(project);
                let per_actor = characters_per_actor(option);
                let deity_actors = usize::from(census.deity && option != CastSizeOption::Small);
                CastSizePlan {
                    male_actors: (census.male + census.either.div_ceil(2)).div_ceil(per_actor)
                        + deity_actors
                        + male_narrators,
                    female_actors: (census.female + census.either / 2).div_ceil(per_actor)
                        + female_narrators,
                    child_actors: census.child.div_ceil(per_actor),
                    male_narrators,
                    female_narrators,
                }
            }
        }
    }

    pub fn total_actors(&self) -> usize {
        self.male_actors + self.female_actors + self.child_actors
    }

    pub fn narrator_count(&self) -> usize {
        self.male_narrators + self.female_narrators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casting::model::VoiceActor;
    use crate::fixtures;
    use crate::project::preferences::CharacterGroupGenerationPreferences;

    #[test]
    fn test_larger_cast_sizes_need_more_actors() {
        let project = fixtures::two_gospel_project();
        let roster = CastingRoot::new();
        let small = CastSizePlan::for_project(&project, &roster, CastSizeOption::Small);
        let recommended = CastSizePlan::for_project(&project, &roster, CastSizeOption::Recommended);
        let large = CastSizePlan::for_project(&project, &roster, CastSizeOption::Large);

        assert!(small.total_actors() <= recommended.total_actors());
        assert!(recommended.total_actors() < large.total_actors());
        assert_eq!(small.narrator_count(), 1);
        // Mark and Luke have different authors.
        assert_eq!(large.narrator_count(), 2);
    }

    #[test]
    fn test_census_buckets_units() {
        let census = UnitCensus::of(&fixtures::two_gospel_project());
        // The evil spirit and Legion collapse to one male unit.
        assert_eq!(census.male, 6);
        assert_eq!(census.female, 2);
        assert_eq!(census.child, 0);
        assert!(census.deity);
    }

    #[test]
    fn test_match_counts_active_roster() {
        let project = fixtures::mark_project();
        let mut roster = fixtures::roster(3, 2, 1);
        roster.insert_actor(VoiceActor::new("retired", ActorGender::Male).with_active(false));
        let plan = CastSizePlan::for_project(&project, &roster, CastSizeOption::MatchVoiceActorList);
        assert_eq!(
            (plan.male_actors, plan.female_actors, plan.child_actors),
            (3, 2, 1)
        );
    }

    #[test]
    fn test_custom_plan_adds_narrators() {
        let project = fixtures::mark_project().with_generation_preferences(
            CharacterGroupGenerationPreferences {
                number_of_male_actors: 5,
                number_of_female_actors: 2,
                number_of_child_actors: 1,
                ..Default::default()
            }
            .with_custom_narrators(1, 1),
        );
        let plan = CastSizePlan::for_project(&project, &CastingRoot::new(), CastSizeOption::Custom);
        assert_eq!(plan.male_actors, 6);
        assert_eq!(plan.female_actors, 3);
        assert_eq!(plan.child_actors, 1);
        assert_eq!(plan.total_actors(), 10);
        assert_eq!(plan.narrator_count(), 2);
    }
}
