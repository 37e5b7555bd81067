//! Reconciles existing character groups with the current project inventory.
//!
//! Groups are edited by hand between generation runs, so a change in the
//! project (a book included or excluded, a block re-attributed) is patched in
//! place instead of regenerating everything. Actor assignments are never
//! touched; only character membership is trimmed or extended.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::casting::model::{CastingRoot, CharacterGroup, GroupLabel};
use crate::project::character::{CharacterDetail, StandardCharacter, StandardKind};
use crate::project::model::Project;

/// Difference between a casting document's groups and the project's in-use
/// characters, taken when the adjuster is built.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterGroupsAdjuster {
    characters_not_covered_by_any_group: BTreeSet<String>,
    characters_no_longer_in_use: BTreeSet<String>,
    character_groups_to_remove: Vec<String>,
    new_books_have_been_included: bool,
    books_have_been_excluded: bool,
    full_regenerate_recommended: bool,
    /// Uncovered id -> grouped, still-used character of the same related unit.
    #[serde(skip)]
    related_partners: BTreeMap<String, String>,
    /// Details of the uncovered ids with no grouped relative.
    #[serde(skip)]
    uncovered_details: Vec<CharacterDetail>,
}

impl CharacterGroupsAdjuster {
    pub fn new(project: &Project, casting: &CastingRoot) -> Self {
        let in_use = project.in_use_character_ids();
        let grouped: BTreeSet<String> = casting
            .character_groups
            .iter()
            .flat_map(|g| g.character_ids.iter().cloned())
            .collect();

        let not_covered: BTreeSet<String> = in_use.difference(&grouped).cloned().collect();
        let no_longer_in_use: BTreeSet<String> = grouped.difference(&in_use).cloned().collect();

        let to_remove: Vec<String> = casting
            .character_groups
            .iter()
            .filter(|g| {
                !g.is_empty()
                    && !casting.is_cameo_group(g)
                    && g.character_ids.iter().all(|id| no_longer_in_use.contains(id))
            })
            .map(|g| g.id.clone())
            .collect();

        let books_in_groups = narrated_books(grouped.iter());
        let books_in_use = narrated_books(in_use.iter());
        let new_books = books_in_use.difference(&books_in_groups).next().is_some();
        let excluded_books = books_in_groups.difference(&books_in_use).next().is_some();

        let changed = not_covered.len() + no_longer_in_use.len();
        let full_regenerate = new_books
            || excluded_books
            || changed > project.policy.max_changed_characters_for_minimal_adjustment;

        let reference = project.reference();
        let grouped_units: HashMap<&str, &String> = grouped
            .iter()
            .filter(|id| in_use.contains(*id))
            .map(|id| (reference.unit_of(id), id))
            .collect();
        let related_partners: BTreeMap<String, String> = not_covered
            .iter()
            .filter_map(|id| {
                grouped_units
                    .get(reference.unit_of(id))
                    .map(|partner| (id.clone(), (*partner).clone()))
            })
            .collect();

        Self {
            uncovered_details: not_covered
                .iter()
                .filter(|id| !related_partners.contains_key(*id))
                .map(|id| project.effective_detail(id))
                .collect(),
            related_partners,
            characters_not_covered_by_any_group: not_covered,
            characters_no_longer_in_use: no_longer_in_use,
            character_groups_to_remove: to_remove,
            new_books_have_been_included: new_books,
            books_have_been_excluded: excluded_books,
            full_regenerate_recommended: full_regenerate,
        }
    }

    /// In-use characters that no group holds.
    pub fn characters_not_covered_by_any_group(&self) -> &BTreeSet<String> {
        &self.characters_not_covered_by_any_group
    }

    /// Grouped characters the project no longer uses.
    pub fn characters_no_longer_in_use(&self) -> &BTreeSet<String> {
        &self.characters_no_longer_in_use
    }

    /// Ids of non-cameo groups left empty once obsolete characters go.
    pub fn character_groups_to_remove(&self) -> &[String] {
        &self.character_groups_to_remove
    }

    pub fn new_books_have_been_included(&self) -> bool {
        self.new_books_have_been_included
    }

    pub fn books_have_been_excluded(&self) -> bool {
        self.books_have_been_excluded
    }

    pub fn full_regenerate_recommended(&self) -> bool {
        self.full_regenerate_recommended
    }

    pub fn groups_are_not_in_synch_with_data(&self) -> bool {
        !self.characters_not_covered_by_any_group.is_empty()
            || !self.characters_no_longer_in_use.is_empty()
            || !self.character_groups_to_remove.is_empty()
    }

    /// Patches `casting` in place: drops obsolete characters, deletes groups
    /// emptied by that (cameo groups stay), moves uncovered characters in with
    /// a grouped relative, and puts the rest into one new unassigned group.
    pub fn make_minimal_adjustments(&self, casting: &mut CastingRoot) {
        for group in &mut casting.character_groups {
            for id in &self.characters_no_longer_in_use {
                group.remove(id);
            }
        }

        let removable: Vec<String> = casting
            .character_groups
            .iter()
            .filter(|g| {
                g.is_empty()
                    && !casting.is_cameo_group(g)
                    && self.character_groups_to_remove.contains(&g.id)
            })
            .map(|g| g.id.clone())
            .collect();
        casting
            .character_groups
            .retain(|g| !removable.contains(&g.id));

        let mut unplaced = Vec::new();
        for id in &self.characters_not_covered_by_any_group {
            let related_group = self
                .related_partners
                .get(id)
                .and_then(|partner| casting.character_groups.iter().position(|g| g.contains(partner)));
            match related_group {
                Some(index) => {
                    casting.character_groups[index].insert(id.clone());
                }
                None => unplaced.push(id.clone()),
            }
        }

        if !unplaced.is_empty() {
            let label = GroupLabel::for_members(
                self.uncovered_details
                    .iter()
                    .filter(|d| unplaced.contains(&d.character_id))
                    .cloned(),
            );
            let group = CharacterGroup::new(label, casting.next_group_number(label))
                .with_characters(unplaced.iter().cloned());
            log::info!(
                "adding group {} for {} uncovered characters",
                group.id,
                group.len()
            );
            casting.character_groups.push(group);
        }
        log::debug!(
            "minimal adjustment removed {} obsolete characters and {} groups",
            self.characters_no_longer_in_use.len(),
            removable.len()
        );
    }
}

/// Books whose narrator appears among `ids`.
fn narrated_books<'s>(ids: impl Iterator<Item = &'s String>) -> HashSet<String> {
    ids.filter_map(|id| StandardCharacter::parse(id))
        .filter(|s| s.kind == StandardKind::Narrator)
        .map(|s| s.book_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casting::manager::CastingManager;
    use crate::casting::model::{ActorGender, VoiceActor};
    use crate::fixtures;
    use crate::grouping::generator::CharacterGroupGenerator;

    fn generated(project: &Project, casting: CastingRoot) -> CastingRoot {
        let mut manager = CastingManager::from_state(casting.clone()).unwrap();
        let mut generator = CharacterGroupGenerator::new(project, &casting);
        generator.generate_character_groups().unwrap();
        generator
            .apply_generated_groups_to_project(&mut manager, false)
            .unwrap();
        manager.get_state().unwrap()
    }

    #[test]
    fn test_fresh_generation_is_in_synch() {
        let project = fixtures::two_gospel_project();
        let casting = generated(&project, fixtures::roster(6, 2, 0));
        let adjuster = CharacterGroupsAdjuster::new(&project, &casting);

        assert!(!adjuster.groups_are_not_in_synch_with_data());
        assert!(!adjuster.full_regenerate_recommended());
        assert!(!adjuster.new_books_have_been_included());
        assert!(!adjuster.books_have_been_excluded());
    }

    #[test]
    fn test_new_character_gets_a_new_group() {
        let mut project = fixtures::mark_project();
        let mut casting = generated(&project, fixtures::roster(5, 0, 0));
        let before = casting.character_groups.len();
        project.books[0] = project.books[0].clone().with_block(10, 47, "Bartimaeus", 40);

        let adjuster = CharacterGroupsAdjuster::new(&project, &casting);
        assert!(adjuster.groups_are_not_in_synch_with_data());
        assert!(!adjuster.full_regenerate_recommended());
        assert_eq!(
            adjuster.characters_not_covered_by_any_group().iter().collect::<Vec<_>>(),
            vec!["Bartimaeus"]
        );

        adjuster.make_minimal_adjustments(&mut casting);
        assert_eq!(casting.character_groups.len(), before + 1);
        let group = casting.group("Other 1").unwrap();
        assert_eq!(group.character_ids, vec!["Bartimaeus"]);
        assert!(!group.has_actor());
        assert!(!CharacterGroupsAdjuster::new(&project, &casting).groups_are_not_in_synch_with_data());
    }

    #[test]
    fn test_returning_character_joins_its_related_group() {
        let mut project = fixtures::mark_project();
        project.books[0] = project.books[0].clone().with_block(10, 47, "Bartimaeus", 40);
        let mut casting = fixtures::roster(3, 0, 0)
            .with_group(
                CharacterGroup::new(GroupLabel::Narrator, 1)
                    .with_characters(["BC-MRK", "narrator-MRK"])
                    .with_actor("m1"),
            )
            .with_group(
                CharacterGroup::new(GroupLabel::Male, 1)
                    .with_characters(["God", "Jesus", "scripture"])
                    .with_actor("m2"),
            )
            .with_group(
                CharacterGroup::new(GroupLabel::Male, 2)
                    .with_characters(["John the Baptist", "Peter (Simon)", "disciples", "man with evil spirit"])
                    .with_actor("m3"),
            );

        let adjuster = CharacterGroupsAdjuster::new(&project, &casting);
        assert_eq!(
            adjuster.characters_not_covered_by_any_group().iter().collect::<Vec<_>>(),
            vec!["Bartimaeus", "demons (Legion)"]
        );

        adjuster.make_minimal_adjustments(&mut casting);
        assert_eq!(casting.character_groups.len(), 4);
        let man2 = casting.group("Man 2").unwrap();
        assert!(man2.contains("demons (Legion)"));
        assert!(man2.contains("man with evil spirit"));
        assert_eq!(man2.voice_actor_id.as_deref(), Some("m3"));
        assert_eq!(casting.group("Other 1").unwrap().character_ids, vec!["Bartimaeus"]);
        assert!(!CharacterGroupsAdjuster::new(&project, &casting).groups_are_not_in_synch_with_data());
    }

    #[test]
    fn test_many_changes_recommend_regeneration() {
        let mut project = fixtures::mark_project();
        let casting = generated(&project, fixtures::roster(5, 0, 0));
        let mut book = project.books[0].clone();
        for (i, name) in ["Levi", "Jairus", "Bartimaeus", "Pilate", "centurion", "crowd"]
            .iter()
            .enumerate()
        {
            book = book.with_block(11, i as u32 + 1, name, 25);
        }
        project.books[0] = book;

        let adjuster = CharacterGroupsAdjuster::new(&project, &casting);
        assert_eq!(adjuster.characters_not_covered_by_any_group().len(), 6);
        assert!(adjuster.full_regenerate_recommended());
    }

    #[test]
    fn test_obsolete_characters_are_dropped_but_assignments_stay() {
        let mut project = fixtures::mark_project();
        let mut casting = fixtures::roster(3, 0, 0)
            .with_group(
                CharacterGroup::new(GroupLabel::Narrator, 1)
                    .with_characters(["BC-MRK", "narrator-MRK"])
                    .with_actor("m2"),
            )
            .with_group(
                CharacterGroup::new(GroupLabel::Male, 1)
                    .with_characters(["Jesus", "Peter (Simon)"])
                    .with_actor("m1"),
            )
            .with_group(CharacterGroup::new(GroupLabel::Male, 2).with_characters(["disciples"]));
        // Peter's only block turns out to be the disciples speaking.
        for block in &mut project.books[0].blocks {
            if block.character_id == "Peter (Simon)" {
                block.character_id = "disciples".to_string();
            }
        }

        let adjuster = CharacterGroupsAdjuster::new(&project, &casting);
        assert_eq!(
            adjuster.characters_no_longer_in_use().iter().collect::<Vec<_>>(),
            vec!["Peter (Simon)"]
        );
        assert!(adjuster.character_groups_to_remove().is_empty());

        adjuster.make_minimal_adjustments(&mut casting);
        let jesus = casting.group("Man 1").unwrap();
        assert_eq!(jesus.character_ids, vec!["Jesus"]);
        assert_eq!(jesus.voice_actor_id.as_deref(), Some("m1"));
        assert_eq!(casting.group("Narrator1").unwrap().voice_actor_id.as_deref(), Some("m2"));
        // God, scripture, John and the Legion pair land in one new group.
        assert_eq!(casting.character_groups.len(), 4);
        assert!(casting.group_containing("demons (Legion)").is_some());
    }

    #[test]
    fn test_excluding_a_book_removes_its_groups_but_keeps_cameo() {
        let mut project = fixtures::two_gospel_project();
        let roster = fixtures::roster(20, 5, 0)
            .with_actor(VoiceActor::new("guest", ActorGender::Male).with_cameo(true))
            .with_group(
                CharacterGroup::new(GroupLabel::Male, 1)
                    .with_characters(["Zechariah"])
                    .with_actor("guest"),
            );
        let mut manager = CastingManager::from_state(generated(&project, roster)).unwrap();
        let before = manager.get_state().unwrap().character_groups.len();
        assert_eq!(before, 26);

        project.set_book_included("LUK", false);
        let adjuster = CharacterGroupsAdjuster::new(&project, &manager.get_state().unwrap());
        assert!(adjuster.books_have_been_excluded());
        assert!(adjuster.full_regenerate_recommended());
        let to_remove = adjuster.character_groups_to_remove().len();
        assert!(to_remove > 0);

        manager
            .update_state(|root| adjuster.make_minimal_adjustments(root))
            .unwrap();
        let state = manager.get_state().unwrap();
        assert_eq!(state.character_groups.len(), before - to_remove);
        let cameo = state
            .character_groups
            .iter()
            .find(|g| g.voice_actor_id.as_deref() == Some("guest"))
            .unwrap();
        assert!(cameo.is_empty());
        assert!(!CharacterGroupsAdjuster::new(&project, &state).groups_are_not_in_synch_with_data());
    }
}
