//! Data models for the persisted casting document.
//!
//! These structs use autosurgeon derives for automatic CRDT serialization.

use std::collections::HashMap;

use autosurgeon::{Hydrate, Reconcile};
use serde::{Deserialize, Serialize};

use crate::project::character::{CharacterDetail, StandardCharacter, StandardKind};
use crate::project::preferences::GroupingPolicy;

// =============================================================================
// CASTING ROOT
// =============================================================================

/// Root document: the actor roster and the character group list.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
pub struct CastingRoot {
    /// Roster order (actor ids).
    pub actor_order: Vec<String>,

    /// Map of actor id -> VoiceActor.
    pub actors: HashMap<String, VoiceActor>,

    /// Character groups in display order.
    pub character_groups: Vec<CharacterGroup>,
}

impl CastingRoot {
    /// Creates a new empty casting root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add an actor to the end of the roster.
    pub fn with_actor(mut self, actor: VoiceActor) -> Self {
        self.insert_actor(actor);
        self
    }

    /// Builder: add a character group.
    pub fn with_group(mut self, group: CharacterGroup) -> Self {
        self.character_groups.push(group);
        self
    }

    pub fn insert_actor(&mut self, actor: VoiceActor) {
        if !self.actor_order.contains(&actor.id) {
            self.actor_order.push(actor.id.clone());
        }
        self.actors.insert(actor.id.clone(), actor);
    }

    pub fn actor(&self, id: &str) -> Option<&VoiceActor> {
        self.actors.get(id)
    }

    /// Active actors in roster order.
    pub fn active_actors(&self) -> Vec<&VoiceActor> {
        self.actor_order
            .iter()
            .filter_map(|id| self.actors.get(id))
            .filter(|a| a.is_active)
            .collect()
    }

    pub fn group(&self, id: &str) -> Option<&CharacterGroup> {
        self.character_groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut CharacterGroup> {
        self.character_groups.iter_mut().find(|g| g.id == id)
    }

    pub fn group_containing(&self, character_id: &str) -> Option<&CharacterGroup> {
        self.character_groups.iter().find(|g| g.contains(character_id))
    }

    /// Groups whose assigned actor is a cameo actor.
    pub fn is_cameo_group(&self, group: &CharacterGroup) -> bool {
        group
            .voice_actor_id
            .as_deref()
            .and_then(|id| self.actors.get(id))
            .map(|a| a.is_cameo)
            .unwrap_or(false)
    }

    /// Next unused number for groups with the given label.
    pub fn next_group_number(&self, label: GroupLabel) -> u32 {
        self.character_groups
            .iter()
            .filter(|g| g.label == label)
            .map(|g| g.number)
            .max()
            .unwrap_or(0)
            + 1
    }
}

// =============================================================================
// VOICE ACTOR
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActorGender {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActorAge {
    #[default]
    Adult,
    Child,
    Elder,
    YoungAdult,
}

/// A voice actor on the roster.
#[derive(Debug, Clone, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
pub struct VoiceActor {
    pub id: String,
    pub name: String,
    pub gender: ActorGender,
    #[serde(default)]
    pub age: ActorAge,
    /// Cameo actors keep their hand-made assignment through regeneration.
    #[serde(default)]
    pub is_cameo: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl VoiceActor {
    /// Creates an active adult actor.
    pub fn new(id: impl Into<String>, gender: ActorGender) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            gender,
            age: ActorAge::Adult,
            is_cameo: false,
            is_active: true,
        }
    }

    /// Builder: Set display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: Set age.
    pub fn with_age(mut self, age: ActorAge) -> Self {
        self.age = age;
        self
    }

    /// Builder: Set cameo flag.
    pub fn with_cameo(mut self, is_cameo: bool) -> Self {
        self.is_cameo = is_cameo;
        self
    }

    /// Builder: Set active flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn is_child(&self) -> bool {
        self.age == ActorAge::Child
    }
}

// =============================================================================
// CHARACTER GROUP
// =============================================================================

/// Group label, derived from the group's members.
#[derive(Debug, Clone, Copy, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupLabel {
    Narrator,
    Male,
    Female,
    Child,
    Other,
    /// No members to derive a label from.
    #[default]
    Unlabeled,
}

impl GroupLabel {
    /// Text used in group ids.
    pub fn text(self) -> &'static str {
        match self {
            GroupLabel::Narrator => "Narrator",
            GroupLabel::Male => "Man",
            GroupLabel::Female => "Woman",
            GroupLabel::Child => "Child",
            GroupLabel::Other => "Other",
            GroupLabel::Unlabeled => "Group",
        }
    }

    /// Derives the label from member details (already adjusted for
    /// dramatization routing).
    pub fn for_members<I>(members: I) -> GroupLabel
    where
        I: IntoIterator<Item = CharacterDetail>,
    {
        let mut any = false;
        let mut all_child = true;
        let mut male = false;
        let mut female = false;
        for detail in members {
            any = true;
            if StandardCharacter::parse(&detail.character_id)
                .map(|s| s.kind == StandardKind::Narrator)
                .unwrap_or(false)
            {
                return GroupLabel::Narrator;
            }
            all_child &= detail.age.is_child();
            male |= detail.gender.is_male();
            female |= detail.gender.is_female();
        }
        match (any, all_child, male, female) {
            (false, _, _, _) => GroupLabel::Unlabeled,
            (true, true, _, _) => GroupLabel::Child,
            (true, false, true, false) => GroupLabel::Male,
            (true, false, false, true) => GroupLabel::Female,
            _ => GroupLabel::Other,
        }
    }
}

/// Builds the stable group id: `Narrator1`, `Man 2`, `Woman 1`, ...
pub fn group_id(label: GroupLabel, number: u32) -> String {
    match label {
        GroupLabel::Narrator => format!("{}{}", label.text(), number),
        _ => format!("{} {}", label.text(), number),
    }
}

/// One bin of characters voiced by a single actor.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
pub struct CharacterGroup {
    /// Stable id (label + number).
    pub id: String,
    pub label: GroupLabel,
    pub number: u32,
    /// Member character ids, sorted and unique.
    pub character_ids: Vec<String>,
    /// Assigned actor, if any.
    pub voice_actor_id: Option<String>,
}

impl CharacterGroup {
    /// Creates an empty group with an id derived from label and number.
    pub fn new(label: GroupLabel, number: u32) -> Self {
        Self {
            id: group_id(label, number),
            label,
            number,
            character_ids: Vec::new(),
            voice_actor_id: None,
        }
    }

    /// Builder: add characters.
    pub fn with_characters<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.insert(id);
        }
        self
    }

    /// Builder: assign an actor.
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.voice_actor_id = Some(actor_id.into());
        self
    }

    /// Relabels and renumbers the group, updating its id.
    pub fn set_label(&mut self, label: GroupLabel, number: u32) {
        self.label = label;
        self.number = number;
        self.id = group_id(label, number);
    }

    /// Linear scan: documents written elsewhere may hold unsorted lists.
    pub fn contains(&self, character_id: &str) -> bool {
        self.character_ids.iter().any(|c| c == character_id)
    }

    /// Inserts a character in sorted position. Returns false if present.
    pub fn insert(&mut self, character_id: impl Into<String>) -> bool {
        let id = character_id.into();
        if self.contains(&id) {
            return false;
        }
        let pos = self.character_ids.partition_point(|c| *c < id);
        self.character_ids.insert(pos, id);
        true
    }

    pub fn remove(&mut self, character_id: &str) -> bool {
        match self.character_ids.iter().position(|c| c == character_id) {
            Some(pos) => {
                self.character_ids.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Sorts and dedups the member list.
    pub fn normalize(&mut self) {
        self.character_ids.sort();
        self.character_ids.dedup();
    }

    pub fn is_empty(&self) -> bool {
        self.character_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.character_ids.len()
    }

    pub fn has_actor(&self) -> bool {
        self.voice_actor_id.is_some()
    }

    /// Total keystrokes of the members.
    pub fn keystrokes(&self, keystrokes_by_character: &HashMap<String, u64>) -> u64 {
        self.character_ids
            .iter()
            .filter_map(|id| keystrokes_by_character.get(id))
            .sum()
    }

    /// Estimated recording time in hours.
    pub fn estimated_hours(
        &self,
        keystrokes_by_character: &HashMap<String, u64>,
        policy: &GroupingPolicy,
    ) -> f64 {
        self.keystrokes(keystrokes_by_character) as f64 / policy.keystrokes_per_hour.max(1) as f64
    }

    /// The member with the most keystrokes; ties go to the smaller id.
    pub fn most_prominent_character(
        &self,
        keystrokes_by_character: &HashMap<String, u64>,
    ) -> Option<&str> {
        self.character_ids
            .iter()
            .max_by(|a, b| {
                let ka = keystrokes_by_character.get(*a).copied().unwrap_or(0);
                let kb = keystrokes_by_character.get(*b).copied().unwrap_or(0);
                ka.cmp(&kb).then_with(|| b.cmp(a))
            })
            .map(String::as_str)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::character::{CharacterAge, CharacterGender};

    fn detail(id: &str, gender: CharacterGender, age: CharacterAge) -> CharacterDetail {
        CharacterDetail::new(id, gender, age)
    }

    #[test]
    fn test_membership_does_not_assume_sorted_ids() {
        let mut group = CharacterGroup::new(GroupLabel::Male, 1);
        group.character_ids = vec!["Zechariah".to_string(), "Andrew".to_string()];
        assert!(group.contains("Zechariah"));
        assert!(!group.insert("Andrew"));
        assert!(group.remove("Zechariah"));
        assert_eq!(group.character_ids, vec!["Andrew"]);
    }

    #[test]
    fn test_casting_root_default() {
        let root = CastingRoot::default();
        assert!(root.character_groups.is_empty());
        assert!(root.active_actors().is_empty());
    }

    #[test]
    fn test_group_ids() {
        assert_eq!(group_id(GroupLabel::Narrator, 1), "Narrator1");
        assert_eq!(group_id(GroupLabel::Male, 2), "Man 2");
        assert_eq!(CharacterGroup::new(GroupLabel::Female, 3).id, "Woman 3");
    }

    #[test]
    fn test_group_membership_stays_sorted() {
        let mut group = CharacterGroup::new(GroupLabel::Male, 1).with_characters(["Peter", "Andrew"]);
        assert!(group.insert("James"));
        assert!(!group.insert("Peter"));
        assert_eq!(group.character_ids, vec!["Andrew", "James", "Peter"]);
        assert!(group.contains("James"));
        assert!(group.remove("Andrew"));
        assert!(!group.remove("Andrew"));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_label_from_members() {
        use CharacterAge::*;
        use CharacterGender::*;

        assert_eq!(GroupLabel::for_members(Vec::new()), GroupLabel::Unlabeled);
        assert_eq!(
            GroupLabel::for_members(vec![
                detail("Peter", Male, Adult),
                detail("narrator-MRK", Either, Adult),
            ]),
            GroupLabel::Narrator
        );
        assert_eq!(
            GroupLabel::for_members(vec![detail("Peter", Male, Adult), detail("crowd", Either, Adult)]),
            GroupLabel::Male
        );
        assert_eq!(
            GroupLabel::for_members(vec![detail("Mary", PreferFemale, Adult)]),
            GroupLabel::Female
        );
        assert_eq!(
            GroupLabel::for_members(vec![detail("boy", Male, Child), detail("girl", Female, Child)]),
            GroupLabel::Child
        );
        assert_eq!(
            GroupLabel::for_members(vec![detail("crowd", Either, Adult)]),
            GroupLabel::Other
        );
    }

    #[test]
    fn test_prominence_and_hours() {
        let keystrokes: HashMap<String, u64> = [("Peter", 9000), ("Andrew", 3000)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let group = CharacterGroup::new(GroupLabel::Male, 1).with_characters(["Andrew", "Peter"]);
        assert_eq!(group.most_prominent_character(&keystrokes), Some("Peter"));
        assert_eq!(group.keystrokes(&keystrokes), 12000);
        assert!((group.estimated_hours(&keystrokes, &GroupingPolicy::default()) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cameo_group_detection() {
        let root = CastingRoot::new()
            .with_actor(VoiceActor::new("star", ActorGender::Female).with_cameo(true))
            .with_actor(VoiceActor::new("regular", ActorGender::Male))
            .with_group(CharacterGroup::new(GroupLabel::Female, 1).with_actor("star"))
            .with_group(CharacterGroup::new(GroupLabel::Male, 1).with_actor("regular"));

        assert!(root.is_cameo_group(&root.character_groups[0]));
        assert!(!root.is_cameo_group(&root.character_groups[1]));
        assert_eq!(root.next_group_number(GroupLabel::Male), 2);
        assert_eq!(root.next_group_number(GroupLabel::Child), 1);
    }
}
