//! Character group generation.
//!
//! Partitions every in-use character into exactly one group per available
//! actor. Cameo assignments are kept, narrators get their books, deity roles
//! are isolated when the cast is large enough, and everything else is packed
//! greedily, heaviest first, against gender, age and proximity constraints.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::authors::AuthorStats;
use super::cancel::CancellationToken;
use super::cast_size::requested_narrator_count;
use super::narrators::distribute_books_among_narrator_groups;
use super::proximity::{MinimumProximity, ProximityCalculator, ProximityIndex, Strictness};
use crate::casting::manager::CastingManager;
use crate::casting::model::{ActorGender, CastingRoot, CharacterGroup, GroupLabel, VoiceActor};
use crate::error::CastResult;
use crate::project::character::{StandardCharacter, GOD, HOLY_SPIRIT, JESUS, SCRIPTURE};
use crate::project::model::Project;
use crate::project::preferences::{ExtraBiblicalMaterialSpeakerOption, NarratorsOption};

// =============================================================================
// WORKING STATE
// =============================================================================

/// Related characters that must share a group, seen as one speaker.
#[derive(Debug, Clone)]
struct Unit {
    id: String,
    members: Vec<String>,
    keystrokes: u64,
    male: bool,
    female: bool,
    /// Every member is a child.
    child: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinKind {
    Cameo,
    Narrator,
    Deity,
    Regular,
}

/// Voice type of the actor a regular group is expected to go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Template {
    Male,
    Female,
    Child,
}

impl Template {
    fn of(actor: &VoiceActor) -> Self {
        match (actor.is_child(), actor.gender) {
            (true, _) => Template::Child,
            (false, ActorGender::Male) => Template::Male,
            (false, ActorGender::Female) => Template::Female,
        }
    }
}

#[derive(Debug, Clone)]
struct Bin {
    kind: BinKind,
    template: Option<Template>,
    actor_id: Option<String>,
    units: Vec<usize>,
    keystrokes: u64,
    /// Closest strict pair distance among the bin's units.
    proximity: usize,
    male: bool,
    female: bool,
    child: bool,
    adult: bool,
}

impl Bin {
    fn new(kind: BinKind) -> Self {
        Self {
            kind,
            template: None,
            actor_id: None,
            units: Vec::new(),
            keystrokes: 0,
            proximity: usize::MAX,
            male: false,
            female: false,
            child: false,
            adult: false,
        }
    }

    fn add(&mut self, index: usize, unit: &Unit) {
        self.units.push(index);
        self.keystrokes += unit.keystrokes;
        self.male |= unit.male;
        self.female |= unit.female;
        self.child |= unit.child;
        self.adult |= !unit.child;
    }
}

/// Lexicographic placement cost; lower is better.
type PlacementScore = (bool, bool, bool, bool, bool, u64, u64, usize);

// =============================================================================
// GENERATOR
// =============================================================================

/// Generates character groups for a project against its actor roster.
pub struct CharacterGroupGenerator<'a> {
    project: &'a Project,
    casting: &'a CastingRoot,
    cancel: CancellationToken,
    generated: Option<Vec<CharacterGroup>>,
    minimum_proximity: MinimumProximity,
}

impl<'a> CharacterGroupGenerator<'a> {
    pub fn new(project: &'a Project, casting: &'a CastingRoot) -> Self {
        Self {
            project,
            casting,
            cancel: CancellationToken::new(),
            generated: None,
            minimum_proximity: MinimumProximity::maximum(),
        }
    }

    /// Builder: use a token shared with the caller.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Groups of the last successful run.
    pub fn generated_groups(&self) -> Option<&[CharacterGroup]> {
        self.generated.as_deref()
    }

    /// Weakest proximity over the non-deity groups of the last run.
    pub fn minimum_proximity(&self) -> &MinimumProximity {
        &self.minimum_proximity
    }

    /// Runs generation. Returns `None` (and keeps no result) when cancelled.
    pub fn generate_character_groups(&mut self) -> Option<Vec<CharacterGroup>> {
        let run = if self.cancel.is_cancelled() {
            None
        } else {
            GenerationRun::new(self.project, self.casting, &self.cancel).run()
        };
        let Some((groups, proximity)) = run else {
            log::info!("character group generation cancelled");
            return None;
        };
        log::info!(
            "generated {} character groups, minimum proximity: {}",
            groups.len(),
            proximity
        );
        self.minimum_proximity = proximity;
        self.generated = Some(groups.clone());
        Some(groups)
    }

    /// Writes the generated groups into the casting document. With
    /// `maintain_assignments`, previous actor assignments follow their most
    /// prominent characters. Does nothing when no groups were generated.
    pub fn apply_generated_groups_to_project(
        &self,
        manager: &mut CastingManager,
        maintain_assignments: bool,
    ) -> CastResult<()> {
        let Some(generated) = self.generated.as_ref() else {
            log::warn!("no generated groups to apply");
            return Ok(());
        };
        let mut groups = generated.clone();
        let previous = manager.get_state()?;
        // Assignments to actors the document does not know are dropped.
        for group in &mut groups {
            if group
                .voice_actor_id
                .as_deref()
                .is_some_and(|id| previous.actor(id).is_none())
            {
                group.voice_actor_id = None;
            }
        }
        if maintain_assignments {
            reconcile_actor_assignments(
                &previous,
                &mut groups,
                &self.project.keystrokes_by_character(),
            );
        }
        manager.replace_character_groups(groups)
    }
}

/// Carries previous actor assignments over to regenerated groups.
///
/// Previous assigned groups are visited by descending keystrokes of their most
/// prominent character. Each takes the first new group, not yet assigned,
/// that holds its most prominent character still present. Inactive or
/// removed actors lose their assignment.
pub fn reconcile_actor_assignments(
    previous: &CastingRoot,
    generated: &mut [CharacterGroup],
    keystrokes_by_character: &HashMap<String, u64>,
) {
    let keystrokes = |id: &str| keystrokes_by_character.get(id).copied().unwrap_or(0);
    let mut used: HashSet<String> = generated
        .iter()
        .filter_map(|g| g.voice_actor_id.clone())
        .collect();

    let mut candidates: Vec<(&CharacterGroup, Vec<&String>)> = previous
        .character_groups
        .iter()
        .filter(|g| {
            g.voice_actor_id
                .as_deref()
                .and_then(|id| previous.actor(id))
                .is_some_and(|a| a.is_active && !used.contains(&a.id))
        })
        .map(|g| {
            let mut ranked: Vec<&String> = g.character_ids.iter().collect();
            ranked.sort_by(|a, b| keystrokes(b).cmp(&keystrokes(a)).then_with(|| a.cmp(b)));
            (g, ranked)
        })
        .collect();
    candidates.sort_by(|(ga, ra), (gb, rb)| {
        let top = |r: &Vec<&String>| r.first().map(|id| keystrokes(id)).unwrap_or(0);
        top(rb).cmp(&top(ra)).then_with(|| ga.id.cmp(&gb.id))
    });

    for (group, ranked) in candidates {
        let Some(actor_id) = group.voice_actor_id.as_ref() else {
            continue;
        };
        if used.contains(actor_id) {
            continue;
        }
        let target = ranked.iter().find_map(|id| {
            generated
                .iter()
                .position(|g| g.contains(id))
                .filter(|&i| generated[i].voice_actor_id.is_none())
        });
        if let Some(index) = target {
            log::debug!("keeping {} on {}", actor_id, generated[index].id);
            generated[index].voice_actor_id = Some(actor_id.clone());
            used.insert(actor_id.clone());
        }
    }
}

// =============================================================================
// GENERATION RUN
// =============================================================================

struct GenerationRun<'a> {
    project: &'a Project,
    casting: &'a CastingRoot,
    cancel: &'a CancellationToken,
    units: Vec<Unit>,
    unit_by_id: HashMap<String, usize>,
    assigned: Vec<bool>,
    bins: Vec<Bin>,
}

impl<'a> GenerationRun<'a> {
    fn new(project: &'a Project, casting: &'a CastingRoot, cancel: &'a CancellationToken) -> Self {
        let reference = project.reference();
        let keystrokes = project.keystrokes_by_character();
        let mut members: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for id in project.in_use_character_ids() {
            members
                .entry(reference.unit_of(&id).to_string())
                .or_default()
                .push(id);
        }
        let units: Vec<Unit> = members
            .into_iter()
            .map(|(id, members)| {
                let details: Vec<_> = members.iter().map(|m| project.effective_detail(m)).collect();
                Unit {
                    keystrokes: members.iter().filter_map(|m| keystrokes.get(m)).sum(),
                    male: details.iter().any(|d| d.gender.is_male()),
                    female: details.iter().any(|d| d.gender.is_female()),
                    child: details.iter().all(|d| d.age.is_child()),
                    id,
                    members,
                }
            })
            .collect();
        let unit_by_id = units
            .iter()
            .enumerate()
            .flat_map(|(i, u)| u.members.iter().map(move |m| (m.clone(), i)))
            .collect();
        Self {
            project,
            casting,
            cancel,
            assigned: vec![false; units.len()],
            units,
            unit_by_id,
            bins: Vec::new(),
        }
    }

    /// Active actors only. Cast-size presets shape the narrator count, never
    /// the number of groups.
    fn roster(&self) -> Vec<VoiceActor> {
        self.casting.active_actors().into_iter().cloned().collect()
    }

    fn unit_index(&self, character_id: &str) -> Option<usize> {
        self.unit_by_id.get(character_id).copied()
    }

    fn take(&mut self, bin: usize, unit: usize) {
        self.assigned[unit] = true;
        self.bins[bin].add(unit, &self.units[unit]);
    }

    fn run(mut self) -> Option<(Vec<CharacterGroup>, MinimumProximity)> {
        let roster = self.roster();
        if roster.is_empty() {
            return Some((Vec::new(), MinimumProximity::maximum()));
        }

        self.place_cameo_groups(&roster);
        let mut free_actors: Vec<&VoiceActor> = roster.iter().filter(|a| !a.is_cameo).collect();
        let available = free_actors.len();

        let narration = self.narration_by_book();
        let narrator_count = self.narrator_count(&narration, available);

        if self.cancel.is_cancelled() {
            return None;
        }
        let deity_partitions = self.deity_partitions(roster.len(), available - narrator_count, narrator_count > 0);
        for partition in &deity_partitions {
            let bin = self.bins.len();
            self.bins.push(Bin::new(BinKind::Deity));
            for &unit in partition {
                self.take(bin, unit);
            }
        }

        if narrator_count > 0 {
            self.place_narrators(&narration, narrator_count)?;
        }

        // Narrators and deity roles take adult actors first, men unless
        // female narrators were asked for.
        let prefs = &self.project.generation_preferences;
        let narrator_bins = self.bins.iter().filter(|b| b.kind == BinKind::Narrator).count();
        let mut female_narrators = match prefs.narrators_option {
            NarratorsOption::Custom => (prefs.number_of_female_narrators as usize).min(narrator_bins),
            _ => 0,
        };
        for slot in 0..narrator_bins + deity_partitions.len() {
            let prefer = if slot < narrator_bins && female_narrators > 0 && slot + female_narrators >= narrator_bins {
                female_narrators -= 1;
                Template::Female
            } else {
                Template::Male
            };
            take_actor(&mut free_actors, prefer);
        }
        for actor in free_actors {
            let mut bin = Bin::new(BinKind::Regular);
            bin.template = Some(Template::of(actor));
            self.bins.push(bin);
        }

        if self.cancel.is_cancelled() {
            return None;
        }
        self.pack_remaining_units();
        if self.cancel.is_cancelled() {
            return None;
        }
        Some(self.finish())
    }

    // -------------------------------------------------------------------------
    // Cameo
    // -------------------------------------------------------------------------

    fn place_cameo_groups(&mut self, roster: &[VoiceActor]) {
        for actor in roster.iter().filter(|a| a.is_cameo) {
            let bin = self.bins.len();
            let mut cameo = Bin::new(BinKind::Cameo);
            cameo.actor_id = Some(actor.id.clone());
            self.bins.push(cameo);

            let Some(existing) = self
                .casting
                .character_groups
                .iter()
                .find(|g| g.voice_actor_id.as_deref() == Some(actor.id.as_str()))
            else {
                continue;
            };
            for id in &existing.character_ids {
                if let Some(unit) = self.unit_index(id) {
                    if !self.assigned[unit] {
                        self.take(bin, unit);
                    }
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Narrators
    // -------------------------------------------------------------------------

    /// Unplaced narrator-read standard characters of each book, canonical order.
    fn narration_by_book(&self) -> Vec<(String, Vec<usize>)> {
        let mut narration = Vec::new();
        for book_id in self.project.included_book_ids() {
            let units: Vec<usize> = self
                .units
                .iter()
                .enumerate()
                .filter(|(i, unit)| {
                    !self.assigned[*i]
                        && unit.members.iter().all(|m| {
                            StandardCharacter::parse(m).is_some_and(|s| s.book_id == book_id)
                                && self.project.standard_route(m)
                                    == Some(ExtraBiblicalMaterialSpeakerOption::Narrator)
                        })
                })
                .map(|(i, _)| i)
                .collect();
            if !units.is_empty() {
                narration.push((book_id, units));
            }
        }
        narration
    }

    fn narrator_count(&self, narration: &[(String, Vec<usize>)], available: usize) -> usize {
        if narration.is_empty() || available == 0 {
            return 0;
        }
        let books: Vec<String> = narration.iter().map(|(b, _)| b.clone()).collect();
        let ceiling = if self.project.is_narration_by_author() {
            AuthorStats::for_books(self.project, &books, &self.project.keystrokes_by_book()).len()
        } else {
            books.len()
        };
        let requested = requested_narrator_count(self.project);
        let mut count = requested.min(ceiling).min(available).max(1);

        let narrated: HashSet<usize> = narration.iter().flat_map(|(_, u)| u.iter().copied()).collect();
        let others_remain = (0..self.units.len()).any(|i| !self.assigned[i] && !narrated.contains(&i));
        if others_remain && count == available && available > 1 {
            count -= 1;
        }
        if count != requested {
            log::debug!("narrator count {} clamped to {}", requested, count);
        }
        count
    }

    fn place_narrators(&mut self, narration: &[(String, Vec<usize>)], count: usize) -> Option<()> {
        let books: Vec<String> = narration.iter().map(|(b, _)| b.clone()).collect();
        let keystrokes_by_book = self.project.keystrokes_by_book();
        let stats = if self.project.is_narration_by_author() {
            AuthorStats::for_books(self.project, &books, &keystrokes_by_book)
        } else {
            AuthorStats::one_per_book(&books, &keystrokes_by_book)
        };
        // Books previously narrated together stay together when a split is a tie.
        let pinned: Vec<Vec<String>> = self
            .casting
            .character_groups
            .iter()
            .filter(|g| g.label == GroupLabel::Narrator)
            .map(|g| {
                g.character_ids
                    .iter()
                    .filter_map(|id| StandardCharacter::parse(id))
                    .map(|s| s.book_id)
                    .collect::<Vec<_>>()
            })
            .filter(|books: &Vec<String>| books.len() > 1)
            .collect();

        let slots = distribute_books_among_narrator_groups(&stats, count, &pinned, self.cancel)?;
        for slot in slots {
            let bin = self.bins.len();
            self.bins.push(Bin::new(BinKind::Narrator));
            for book in &slot.book_ids {
                if let Some((_, units)) = narration.iter().find(|(b, _)| b == book) {
                    for &unit in units {
                        if !self.assigned[unit] {
                            self.take(bin, unit);
                        }
                    }
                }
            }
            if self.project.is_narration_by_author() {
                for name in &slot.author_names {
                    let speaker = stats
                        .iter()
                        .find(|s| &s.author_name == name)
                        .and_then(|s| s.speaking_character_id.as_deref())
                        .and_then(|id| self.unit_index(id));
                    if let Some(unit) = speaker {
                        if !self.assigned[unit] {
                            self.take(bin, unit);
                        }
                    }
                }
            }
        }
        Some(())
    }

    // -------------------------------------------------------------------------
    // Deity roles
    // -------------------------------------------------------------------------

    /// Unit sets to isolate, one group each. The tier follows the cast size
    /// and drops while there are not enough groups left for everyone else.
    fn deity_partitions(&self, cast_size: usize, spare: usize, narrated: bool) -> Vec<Vec<usize>> {
        let policy = &self.project.policy;
        let present = |id: &str| self.unit_index(id).filter(|&u| !self.assigned[u]);
        let (jesus, god, spirit, scripture) =
            (present(JESUS), present(GOD), present(HOLY_SPIRIT), present(SCRIPTURE));
        let deity: HashSet<usize> = [jesus, god, spirit, scripture].into_iter().flatten().collect();
        if deity.is_empty() {
            return Vec::new();
        }
        let others_remain = (0..self.units.len()).any(|i| {
            !self.assigned[i] && !deity.contains(&i) && (!narrated || !self.is_narration_unit(i))
        });

        let mut tier = if cast_size >= policy.god_alone_min_cast {
            3
        } else if cast_size >= policy.jesus_alone_min_cast {
            2
        } else if cast_size >= policy.deity_group_min_cast {
            1
        } else {
            0
        };
        loop {
            let sets: Vec<Vec<Option<usize>>> = match tier {
                0 => Vec::new(),
                1 => vec![vec![jesus, god, spirit, scripture]],
                2 => vec![vec![jesus], vec![god, spirit, scripture]],
                _ => vec![vec![jesus], vec![god], vec![spirit, scripture]],
            };
            let mut partitions: Vec<Vec<usize>> = sets
                .into_iter()
                .map(|set| set.into_iter().flatten().collect::<Vec<usize>>())
                .collect();
            // Related deity ids share a unit; never place one unit twice.
            let mut seen = HashSet::new();
            for units in &mut partitions {
                units.retain(|u| seen.insert(*u));
            }
            partitions.retain(|units| !units.is_empty());

            if tier == 0 || partitions.len() + usize::from(others_remain) <= spare {
                if tier > 0 {
                    log::debug!("isolating deity roles in {} groups", partitions.len());
                }
                return partitions;
            }
            tier -= 1;
        }
    }

    fn is_narration_unit(&self, unit: usize) -> bool {
        self.units[unit].members.iter().all(|m| {
            self.project.standard_route(m) == Some(ExtraBiblicalMaterialSpeakerOption::Narrator)
        })
    }

    // -------------------------------------------------------------------------
    // Packing
    // -------------------------------------------------------------------------

    fn pack_remaining_units(&mut self) {
        let has_child_template = self.bins.iter().any(|b| b.template == Some(Template::Child));
        let mut pending: Vec<usize> = (0..self.units.len()).filter(|&i| !self.assigned[i]).collect();
        pending.sort_by(|&a, &b| {
            let (ua, ub) = (&self.units[a], &self.units[b]);
            (has_child_template && ub.child)
                .cmp(&(has_child_template && ua.child))
                .then(ub.keystrokes.cmp(&ua.keystrokes))
                .then_with(|| ua.id.cmp(&ub.id))
        });

        let candidates: Vec<usize> = {
            let by_kind = |kinds: &[BinKind]| -> Vec<usize> {
                (0..self.bins.len())
                    .filter(|&i| kinds.contains(&self.bins[i].kind))
                    .collect()
            };
            let regular = by_kind(&[BinKind::Regular]);
            if !regular.is_empty() {
                regular
            } else {
                let shared = by_kind(&[BinKind::Narrator, BinKind::Deity]);
                if shared.is_empty() {
                    by_kind(&[BinKind::Cameo])
                } else {
                    shared
                }
            }
        };
        if candidates.is_empty() {
            return;
        }

        let calculator = ProximityCalculator::new(self.project);
        let index = calculator.index();
        let mut pair_cache: HashMap<(usize, usize), usize> = HashMap::new();
        let need = |unit: &Unit| -> Option<Template> {
            if has_child_template && unit.child {
                Some(Template::Child)
            } else if unit.male && !unit.female {
                Some(Template::Male)
            } else if unit.female && !unit.male {
                Some(Template::Female)
            } else {
                None
            }
        };
        let mut needy: HashMap<Template, usize> = HashMap::new();
        for &u in &pending {
            if let Some(t) = need(&self.units[u]) {
                *needy.entry(t).or_default() += 1;
            }
        }

        for &unit in &pending {
            let unit_need = need(&self.units[unit]);
            if let Some(t) = unit_need {
                if let Some(n) = needy.get_mut(&t) {
                    *n = n.saturating_sub(1);
                }
            }
            let mut best: Option<(PlacementScore, usize, usize)> = None;
            for &bin in &candidates {
                let proximity = self.proximity_with(bin, unit, &index, &mut pair_cache);
                let score = self.score(bin, unit, unit_need, proximity, has_child_template, &needy, &candidates);
                if best.as_ref().map_or(true, |(b, _, _)| score < *b) {
                    best = Some((score, bin, proximity));
                }
            }
            let Some((score, bin, proximity)) = best else {
                continue;
            };
            if score.0 || score.3 {
                log::debug!(
                    "no conflict-free group for {}; placing it with {} blocks proximity",
                    self.units[unit].id,
                    proximity
                );
            }
            self.bins[bin].proximity = proximity;
            self.take(bin, unit);
        }
    }

    fn proximity_with(
        &self,
        bin: usize,
        unit: usize,
        index: &ProximityIndex<'_>,
        cache: &mut HashMap<(usize, usize), usize>,
    ) -> usize {
        let mut closest = self.bins[bin].proximity;
        for &member in &self.bins[bin].units {
            let key = (member.min(unit), member.max(unit));
            let distance = *cache.entry(key).or_insert_with(|| {
                index
                    .pair(&self.units[key.0].id, &self.units[key.1].id, Strictness::Strict)
                    .number_of_blocks
            });
            closest = closest.min(distance);
            if closest == 0 {
                break;
            }
        }
        closest
    }

    #[allow(clippy::too_many_arguments)]
    fn score(
        &self,
        bin_index: usize,
        unit_index: usize,
        unit_need: Option<Template>,
        proximity: usize,
        has_child_template: bool,
        needy: &HashMap<Template, usize>,
        candidates: &[usize],
    ) -> PlacementScore {
        let bin = &self.bins[bin_index];
        let unit = &self.units[unit_index];

        let gender_conflict = (unit.female && (bin.male || bin.template == Some(Template::Male)))
            || (unit.male && (bin.female || bin.template == Some(Template::Female)));
        let child_side = bin.child || bin.template == Some(Template::Child);
        let adult_side = bin.adult || matches!(bin.template, Some(Template::Male | Template::Female));
        let age_conflict = has_child_template
            && ((child_side && !unit.child) || (adult_side && unit.child));

        // An empty group reserved for a voice type is left alone while the
        // characters needing that type could still fill every such group.
        let steals_reserved = match bin.template {
            Some(template) if bin.units.is_empty() && unit_need != Some(template) => {
                let empty = candidates
                    .iter()
                    .filter(|&&b| self.bins[b].units.is_empty() && self.bins[b].template == Some(template))
                    .count();
                empty <= needy.get(&template).copied().unwrap_or(0)
            }
            _ => false,
        };

        let acceptable = proximity == usize::MAX
            || proximity > self.project.policy.minimum_acceptable_proximity;
        let closeness = (usize::MAX - proximity) as u64;
        let (first, second) = if acceptable {
            (bin.keystrokes, closeness)
        } else {
            (closeness, bin.keystrokes)
        };
        (
            gender_conflict,
            age_conflict,
            steals_reserved,
            !acceptable,
            !bin.units.is_empty(),
            first,
            second,
            bin_index,
        )
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    fn finish(self) -> (Vec<CharacterGroup>, MinimumProximity) {
        let project = self.project;
        let keystrokes = project.keystrokes_by_character();
        let mut built: Vec<(BinKind, CharacterGroup, u64)> = self
            .bins
            .iter()
            .map(|bin| {
                let members: Vec<String> = bin
                    .units
                    .iter()
                    .flat_map(|&u| self.units[u].members.iter().cloned())
                    .collect();
                let label = if bin.kind == BinKind::Narrator {
                    GroupLabel::Narrator
                } else {
                    GroupLabel::for_members(members.iter().map(|m| project.effective_detail(m)))
                };
                let mut group = CharacterGroup::new(label, 0).with_characters(members);
                group.voice_actor_id = bin.actor_id.clone();
                let total = group.keystrokes(&keystrokes);
                (bin.kind, group, total)
            })
            .collect();

        built.sort_by(|(ka, a, ta), (kb, b, tb)| {
            let narrator_first = (*kb == BinKind::Narrator).cmp(&(*ka == BinKind::Narrator));
            if *ka == BinKind::Narrator && *kb == BinKind::Narrator {
                return std::cmp::Ordering::Equal;
            }
            narrator_first
                .then(a.label.cmp(&b.label))
                .then(tb.cmp(ta))
                .then_with(|| a.character_ids.cmp(&b.character_ids))
        });

        let calculator = ProximityCalculator::new(project);
        let mut weakest = MinimumProximity::maximum();
        let mut numbers: HashMap<GroupLabel, u32> = HashMap::new();
        let mut groups = Vec::with_capacity(built.len());
        for (kind, mut group, _) in built {
            let number = numbers.entry(group.label).or_insert(0);
            *number += 1;
            let label = group.label;
            group.set_label(label, *number);
            if kind != BinKind::Deity {
                let strictness = if kind == BinKind::Narrator {
                    Strictness::NonStrict
                } else {
                    Strictness::Strict
                };
                weakest = weakest.min(
                    calculator.calculate_minimum_proximity_with(&group.character_ids, strictness),
                );
            }
            groups.push(group);
        }
        (groups, weakest)
    }
}

/// Removes and returns the first free actor of the preferred voice type,
/// falling back to any adult, then anyone.
fn take_actor<'r>(free: &mut Vec<&'r VoiceActor>, prefer: Template) -> Option<&'r VoiceActor> {
    let position = free
        .iter()
        .position(|a| Template::of(a) == prefer)
        .or_else(|| free.iter().position(|a| !a.is_child()))
        .or_else(|| (!free.is_empty()).then_some(0))?;
    Some(free.remove(position))
}

// =============================================================================
// TESTS
// =============================================================================
