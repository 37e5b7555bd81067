//! CastingManager: the persisted roster and character group list.
//!
//! This module provides the `CastingManager` struct that wraps an Automerge
//! document and provides:
//! - High-level operations via autosurgeon (hydrate/reconcile) for bulk updates
//! - Targeted actor flag updates via direct put operations (O(1) instead of O(N))

use automerge::{
    transaction::Transactable, AutoCommit, ChangeHash, ObjId, ReadDoc, ScalarValue, Value, ROOT,
};
use autosurgeon::{hydrate, reconcile};
use log::debug;

use super::model::{CastingRoot, CharacterGroup, VoiceActor};
use crate::error::{CastError, CastResult};

/// The document manager for a project's casting state.
///
/// Uses a hybrid approach:
/// - `update_state()` for bulk struct operations (uses hydrate/reconcile)
/// - `set_actor_*()` for targeted flag updates (direct put, O(1))
///
/// Group generation never writes here directly; generated groups are applied in
/// one explicit `replace_character_groups` call.
pub struct CastingManager {
    doc: AutoCommit,
    /// Cached hydrated state - invalidated after direct document mutations.
    cached_state: Option<CastingRoot>,
    /// Cached ObjId for the "actors" map. Invalidated on from_bytes() and merge().
    cached_actors_obj: Option<ObjId>,
}

impl CastingManager {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Creates a new empty CastingManager with an initialized document schema.
    pub fn new() -> Self {
        let mut doc = AutoCommit::new();
        let root = CastingRoot::default();
        reconcile(&mut doc, &root).expect("Failed to initialize document");
        Self {
            doc,
            cached_state: Some(root),
            cached_actors_obj: None,
        }
    }

    /// Creates a CastingManager holding the given state.
    pub fn from_state(root: CastingRoot) -> CastResult<Self> {
        let mut manager = Self::new();
        manager.update_state(|state| *state = root)?;
        Ok(manager)
    }

    /// Creates a CastingManager from saved binary data.
    pub fn from_bytes(bytes: &[u8]) -> CastResult<Self> {
        let doc = AutoCommit::load(bytes)?;
        Ok(Self {
            doc,
            cached_state: None,
            cached_actors_obj: None,
        })
    }

    /// Saves the document to binary format.
    pub fn save(&mut self) -> Vec<u8> {
        self.doc.save()
    }

    /// Returns the current heads (for sync protocol).
    pub fn get_heads(&mut self) -> Vec<ChangeHash> {
        self.doc.get_heads()
    }

    /// Gets the actor ID of this document instance (the Automerge actor, not a
    /// voice actor).
    pub fn actor_id(&self) -> String {
        self.doc.get_actor().to_hex_string()
    }

    fn invalidate_all_caches(&mut self) {
        self.cached_state = None;
        self.cached_actors_obj = None;
    }

    // =========================================================================
    // HIGH-LEVEL OPERATIONS (via Hydrate/Reconcile)
    // =========================================================================

    /// Hydrates the entire document state to Rust structs.
    pub fn get_state(&mut self) -> CastResult<CastingRoot> {
        if let Some(ref cached) = self.cached_state {
            return Ok(cached.clone());
        }
        let mut state: CastingRoot = hydrate(&self.doc)?;
        for group in &mut state.character_groups {
            group.normalize();
        }
        self.cached_state = Some(state.clone());
        Ok(state)
    }

    /// Applies a function to mutate the state, then reconciles back to the document.
    pub fn update_state<F>(&mut self, f: F) -> CastResult<()>
    where
        F: FnOnce(&mut CastingRoot),
    {
        let mut state = self.get_state()?;
        f(&mut state);
        reconcile(&mut self.doc, &state)?;
        self.cached_state = Some(state);
        Ok(())
    }

    /// Pretty JSON snapshot of the roster and groups, for export and debugging.
    pub fn to_json(&mut self) -> CastResult<String> {
        let state = self.get_state()?;
        Ok(serde_json::to_string_pretty(&state)?)
    }

    // =========================================================================
    // ROSTER
    // =========================================================================

    /// Adds (or replaces) an actor.
    pub fn add_actor(&mut self, actor: VoiceActor) -> CastResult<()> {
        self.update_state(|state| state.insert_actor(actor))
    }

    pub fn get_actor(&mut self, id: &str) -> CastResult<Option<VoiceActor>> {
        let state = self.get_state()?;
        Ok(state.actors.get(id).cloned())
    }

    /// Removes an actor from the roster and from any group it was assigned to.
    pub fn remove_actor(&mut self, id: &str) -> CastResult<()> {
        if self.get_actor(id)?.is_none() {
            return Err(CastError::actor_not_found(id));
        }
        self.update_state(|state| {
            state.actors.remove(id);
            state.actor_order.retain(|a| a != id);
            for group in &mut state.character_groups {
                if group.voice_actor_id.as_deref() == Some(id) {
                    group.voice_actor_id = None;
                }
            }
        })
    }

    // =========================================================================
    // TARGETED ACTOR UPDATES (Direct put, O(1))
    // =========================================================================

    fn set_actor_value(&mut self, actor_id: &str, key: &str, value: ScalarValue) -> CastResult<()> {
        self.cached_state = None;
        let actor_obj = self.get_actor_obj(actor_id)?;
        self.doc.put(&actor_obj, key, value)?;
        Ok(())
    }

    /// Marks an actor active or inactive (O(1)).
    pub fn set_actor_active(&mut self, actor_id: &str, is_active: bool) -> CastResult<()> {
        self.set_actor_value(actor_id, "is_active", ScalarValue::Boolean(is_active))
    }

    /// Marks an actor as a cameo actor (O(1)).
    pub fn set_actor_cameo(&mut self, actor_id: &str, is_cameo: bool) -> CastResult<()> {
        self.set_actor_value(actor_id, "is_cameo", ScalarValue::Boolean(is_cameo))
    }

    // =========================================================================
    // CHARACTER GROUPS
    // =========================================================================

    /// Replaces the whole group list (used when applying generated groups).
    pub fn replace_character_groups(&mut self, groups: Vec<CharacterGroup>) -> CastResult<()> {
        debug!("replacing character groups ({} groups)", groups.len());
        self.update_state(|state| state.character_groups = groups)
    }

    /// Assigns an actor to a group. The actor is taken off any other group first.
    pub fn assign_actor_to_group(&mut self, group_id: &str, actor_id: &str) -> CastResult<()> {
        let state = self.get_state()?;
        if state.group(group_id).is_none() {
            return Err(CastError::group_not_found(group_id));
        }
        if state.actor(actor_id).is_none() {
            return Err(CastError::actor_not_found(actor_id));
        }
        self.update_state(|state| {
            for group in &mut state.character_groups {
                if group.voice_actor_id.as_deref() == Some(actor_id) {
                    group.voice_actor_id = None;
                }
            }
            if let Some(group) = state.group_mut(group_id) {
                group.voice_actor_id = Some(actor_id.to_string());
            }
        })
    }

    /// Clears a group's actor assignment.
    pub fn unassign_actor(&mut self, group_id: &str) -> CastResult<()> {
        if self.get_state()?.group(group_id).is_none() {
            return Err(CastError::group_not_found(group_id));
        }
        self.update_state(|state| {
            if let Some(group) = state.group_mut(group_id) {
                group.voice_actor_id = None;
            }
        })
    }

    /// Moves characters into `dest_group_id`. Source groups left empty are
    /// removed unless they belong to a cameo actor.
    pub fn move_characters_to_group(
        &mut self,
        character_ids: &[&str],
        dest_group_id: &str,
    ) -> CastResult<()> {
        if character_ids.is_empty() {
            return Err(CastError::empty_character_list(dest_group_id));
        }
        let state = self.get_state()?;
        if state.group(dest_group_id).is_none() {
            return Err(CastError::group_not_found(dest_group_id));
        }
        if let Some(missing) = character_ids
            .iter()
            .find(|id| state.group_containing(id).is_none())
        {
            return Err(CastError::character_not_found(*missing));
        }

        self.update_state(|state| {
            let mut emptied = Vec::new();
            for group in &mut state.character_groups {
                if group.id == dest_group_id {
                    continue;
                }
                let mut removed = false;
                for id in character_ids {
                    removed |= group.remove(id);
                }
                if removed && group.is_empty() {
                    emptied.push(group.id.clone());
                }
            }
            if let Some(dest) = state.group_mut(dest_group_id) {
                for id in character_ids {
                    dest.insert(*id);
                }
            }
            let cameo: Vec<String> = emptied
                .iter()
                .filter(|id| state.group(id).map(|g| state.is_cameo_group(g)).unwrap_or(false))
                .cloned()
                .collect();
            state
                .character_groups
                .retain(|g| !emptied.contains(&g.id) || cameo.contains(&g.id));
        })
    }

    // =========================================================================
    // SYNC OPERATIONS
    // =========================================================================

    /// Merges another document into this one.
    pub fn merge(&mut self, other: &mut Self) -> CastResult<()> {
        self.invalidate_all_caches();
        self.doc.merge(&mut other.doc)?;
        Ok(())
    }

    /// Generates sync message for incremental sync.
    /// Returns None if there are no changes since their_heads.
    pub fn generate_sync_message(&mut self, their_heads: &[ChangeHash]) -> Option<Vec<u8>> {
        let changes = self.doc.get_changes(their_heads);
        if changes.is_empty() {
            return None;
        }
        let mut bytes = Vec::new();
        for change in changes {
            bytes.extend_from_slice(change.raw_bytes());
        }
        Some(bytes)
    }

    /// Applies sync message from peer.
    pub fn apply_sync_message(&mut self, msg: &[u8]) -> CastResult<()> {
        self.invalidate_all_caches();
        self.doc.load_incremental(msg)?;
        Ok(())
    }

    // =========================================================================
    // INTERNAL HELPERS - WITH TOPOLOGY CACHING
    // =========================================================================

    fn get_actors_obj(&mut self) -> CastResult<ObjId> {
        if let Some(ref obj) = self.cached_actors_obj {
            return Ok(obj.clone());
        }
        let obj = self.get_obj_at_key(&ROOT, "actors")?;
        self.cached_actors_obj = Some(obj.clone());
        Ok(obj)
    }

    fn get_actor_obj(&mut self, actor_id: &str) -> CastResult<ObjId> {
        let actors_obj = self.get_actors_obj()?;
        match self.doc.get(&actors_obj, actor_id)? {
            Some((Value::Object(_), obj_id)) => Ok(obj_id),
            Some(_) => Err(CastError::schema_violation(format!(
                "actor '{}' is not an object",
                actor_id
            ))),
            None => Err(CastError::actor_not_found(actor_id)),
        }
    }

    /// Gets an object ID at a map key.
    fn get_obj_at_key(&self, parent: &ObjId, key: &str) -> CastResult<ObjId> {
        match self.doc.get(parent, key) {
            Ok(Some((Value::Object(_), obj_id))) => Ok(obj_id),
            Ok(Some(_)) => Err(CastError::schema_violation(format!(
                "'{}' is not an object",
                key
            ))),
            Ok(None) => Err(CastError::schema_violation(format!("missing '{}'", key))),
            Err(e) => Err(CastError::Automerge(e)),
        }
    }
}

impl Default for CastingManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casting::model::{ActorGender, GroupLabel};

    fn manager_with_groups() -> CastingManager {
        let root = CastingRoot::new()
            .with_actor(VoiceActor::new("anna", ActorGender::Female).with_cameo(true))
            .with_actor(VoiceActor::new("bob", ActorGender::Male))
            .with_group(
                CharacterGroup::new(GroupLabel::Male, 1).with_characters(["Peter", "Andrew"]),
            )
            .with_group(CharacterGroup::new(GroupLabel::Male, 2).with_characters(["James"]))
            .with_group(
                CharacterGroup::new(GroupLabel::Female, 1)
                    .with_characters(["Mary"])
                    .with_actor("anna"),
            );
        CastingManager::from_state(root).unwrap()
    }

    #[test]
    fn test_unsorted_member_lists_are_found_after_load() {
        let mut group = CharacterGroup::new(GroupLabel::Male, 1);
        group.character_ids = vec!["Peter".to_string(), "Andrew".to_string(), "James".to_string()];
        let mut writer = CastingManager::new();
        writer
            .update_state(|state| state.character_groups.push(group))
            .unwrap();

        let mut manager = CastingManager::from_bytes(&writer.save()).unwrap();
        let state = manager.get_state().unwrap();
        assert_eq!(state.group("Man 1").unwrap().character_ids, vec!["Andrew", "James", "Peter"]);
        assert!(state.group_containing("Peter").is_some());

        manager
            .update_state(|state| state.character_groups.push(CharacterGroup::new(GroupLabel::Male, 2)))
            .unwrap();
        manager.move_characters_to_group(&["Andrew"], "Man 2").unwrap();
        let state = manager.get_state().unwrap();
        assert_eq!(state.group("Man 1").unwrap().character_ids, vec!["James", "Peter"]);
        assert_eq!(state.group("Man 2").unwrap().character_ids, vec!["Andrew"]);
    }

    #[test]
    fn test_json_snapshot_lists_groups() {
        let mut manager = CastingManager::from_state(
            CastingRoot::new()
                .with_actor(VoiceActor::new("bob", ActorGender::Male))
                .with_group(
                    CharacterGroup::new(GroupLabel::Male, 1)
                        .with_characters(["Peter (Simon)"])
                        .with_actor("bob"),
                ),
        )
        .unwrap();
        let json = manager.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["character_groups"][0]["id"], "Man 1");
        assert_eq!(value["character_groups"][0]["voice_actor_id"], "bob");
    }

    #[test]
    fn test_new_manager() {
        let mut manager = CastingManager::new();
        let state = manager.get_state().unwrap();
        assert!(state.actors.is_empty());
        assert!(state.character_groups.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let mut manager = manager_with_groups();
        let bytes = manager.save();
        let mut loaded = CastingManager::from_bytes(&bytes).unwrap();

        let state = loaded.get_state().unwrap();
        assert_eq!(state.actor_order, vec!["anna", "bob"]);
        assert_eq!(state.character_groups.len(), 3);
        assert_eq!(state.character_groups[2].voice_actor_id.as_deref(), Some("anna"));
        assert_eq!(state.character_groups[0].label, GroupLabel::Male);
    }

    #[test]
    fn test_targeted_actor_flags() {
        let mut manager = manager_with_groups();
        manager.set_actor_active("bob", false).unwrap();
        manager.set_actor_cameo("bob", true).unwrap();

        let bob = manager.get_actor("bob").unwrap().unwrap();
        assert!(!bob.is_active);
        assert!(bob.is_cameo);

        let err = manager.set_actor_active("nobody", true).unwrap_err();
        assert!(matches!(err, CastError::ActorNotFound(_)));
    }

    #[test]
    fn test_assign_actor_moves_assignment() {
        let mut manager = manager_with_groups();
        manager.assign_actor_to_group("Man 1", "bob").unwrap();
        manager.assign_actor_to_group("Man 2", "bob").unwrap();

        let state = manager.get_state().unwrap();
        assert_eq!(state.group("Man 1").unwrap().voice_actor_id, None);
        assert_eq!(state.group("Man 2").unwrap().voice_actor_id.as_deref(), Some("bob"));

        assert!(matches!(
            manager.assign_actor_to_group("Man 9", "bob"),
            Err(CastError::GroupNotFound(_))
        ));
        assert!(matches!(
            manager.assign_actor_to_group("Man 1", "carl"),
            Err(CastError::ActorNotFound(_))
        ));
    }

    #[test]
    fn test_move_characters_removes_emptied_group() {
        let mut manager = manager_with_groups();
        manager.move_characters_to_group(&["James"], "Man 1").unwrap();

        let state = manager.get_state().unwrap();
        assert!(state.group("Man 2").is_none());
        assert_eq!(
            state.group("Man 1").unwrap().character_ids,
            vec!["Andrew", "James", "Peter"]
        );
    }

    #[test]
    fn test_move_characters_keeps_emptied_cameo_group() {
        let mut manager = manager_with_groups();
        manager.move_characters_to_group(&["Mary"], "Man 2").unwrap();

        let state = manager.get_state().unwrap();
        let cameo = state.group("Woman 1").unwrap();
        assert!(cameo.is_empty());
        assert_eq!(cameo.voice_actor_id.as_deref(), Some("anna"));
    }

    #[test]
    fn test_move_characters_contract_errors() {
        let mut manager = manager_with_groups();
        assert!(matches!(
            manager.move_characters_to_group(&[], "Man 1"),
            Err(CastError::EmptyCharacterList(_))
        ));
        assert!(matches!(
            manager.move_characters_to_group(&["Judas"], "Man 1"),
            Err(CastError::CharacterNotFound(_))
        ));
        assert!(matches!(
            manager.move_characters_to_group(&["Peter"], "Woman 7"),
            Err(CastError::GroupNotFound(_))
        ));
    }

    #[test]
    fn test_remove_actor_clears_assignment() {
        let mut manager = manager_with_groups();
        manager.remove_actor("anna").unwrap();
        let state = manager.get_state().unwrap();
        assert!(state.actor("anna").is_none());
        assert_eq!(state.group("Woman 1").unwrap().voice_actor_id, None);
        assert!(matches!(manager.remove_actor("anna"), Err(CastError::ActorNotFound(_))));
    }

    #[test]
    fn test_merge_documents() {
        let mut base = manager_with_groups();
        let bytes = base.save();
        let mut client_a = CastingManager::from_bytes(&bytes).unwrap();
        let mut client_b = CastingManager::from_bytes(&bytes).unwrap();

        client_a
            .add_actor(VoiceActor::new("carl", ActorGender::Male))
            .unwrap();
        client_b.set_actor_active("bob", false).unwrap();

        client_a.merge(&mut client_b).unwrap();
        let state = client_a.get_state().unwrap();
        assert!(state.actor("carl").is_some());
        assert!(!state.actor("bob").unwrap().is_active);
    }

    #[test]
    fn test_sync_message_round_trip() {
        let mut server = manager_with_groups();
        let mut client = CastingManager::from_bytes(&server.save()).unwrap();
        let heads = client.get_heads();

        server.unassign_actor("Woman 1").unwrap();
        let msg = server.generate_sync_message(&heads).unwrap();
        client.apply_sync_message(&msg).unwrap();

        let state = client.get_state().unwrap();
        assert_eq!(state.group("Woman 1").unwrap().voice_actor_id, None);
        let server_heads = server.get_heads();
        assert!(server.generate_sync_message(&server_heads).is_none());
    }
}
