//! Greedy XP-budget encounter builder.
use smallvec::SmallVec;

use super::tables::{
    PartyThresholds, adjusted_xp, determine_difficulty, encounter_multiplier, party_thresholds,
    xp_for_cr,
};
use super::{
    Creature, CreatureGroups, Difficulty, EncounterConfig, EncounterCreatureGroup, GeneratedEncounter,
};
use crate::hex::mean;
use crate::numbers::round_f64_to_i32;
use crate::rng::RandomSource;
use crate::time::GameTime;

/// Inputs for one encounter generation.
#[derive(Debug, Clone)]
pub struct EncounterRequest<'a> {
    pub pool: &'a [Creature],
    pub party_levels: &'a [u32],
    pub terrain: &'a str,
    pub target_difficulty: Difficulty,
    pub cr_offset_min: i32,
    pub cr_offset_max: i32,
    pub max_creature_count: u32,
    pub id: String,
    pub generated_at: Option<GameTime>,
}

impl<'a> EncounterRequest<'a> {
    /// Request using the difficulty, CR window and group cap from `config`.
    #[must_use]
    pub fn from_config(
        config: &EncounterConfig,
        pool: &'a [Creature],
        party_levels: &'a [u32],
        terrain: &'a str,
        id: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            party_levels,
            terrain,
            target_difficulty: config.target_difficulty,
            cr_offset_min: config.cr_offset_min,
            cr_offset_max: config.cr_offset_max,
            max_creature_count: config.max_creature_count,
            id: id.into(),
            generated_at: None,
        }
    }

    #[must_use]
    pub fn at(mut self, time: Option<GameTime>) -> Self {
        self.generated_at = time;
        self
    }
}

/// One Bernoulli trial; always consumes exactly one draw.
pub fn roll_encounter_check(probability: f64, rng: &mut dyn RandomSource) -> bool {
    let roll = rng.next_unit();
    roll < probability
}

/// Build an encounter for the party, or `None` when nothing fits.
///
/// Candidates are tried from the highest CR down, each added repeatedly
/// until the target tier is reached or adding one more would break the
/// creature cap or the tier ceiling. The weakest candidate tops up a short
/// encounter afterwards. No backtracking.
#[must_use]
pub fn generate_encounter(request: EncounterRequest<'_>) -> Option<GeneratedEncounter> {
    if request.party_levels.is_empty() || request.pool.is_empty() {
        return None;
    }

    let thresholds = party_thresholds(request.party_levels);
    let avg_level = mean(request.party_levels.iter().map(|l| f64::from(*l)))
        .map_or(0, round_f64_to_i32)
        .max(0);
    let cr_min = f64::from(avg_level.saturating_add(request.cr_offset_min).max(0));
    let cr_max = f64::from(avg_level.saturating_add(request.cr_offset_max));

    let mut candidates: Vec<&Creature> = request
        .pool
        .iter()
        .filter(|c| c.cr >= cr_min && c.cr <= cr_max)
        .filter(|c| terrain_matches(c, request.terrain))
        .collect();
    if candidates.is_empty() {
        log::debug!(
            target: "saltmarch::encounter",
            "no creatures in CR {cr_min}..={cr_max} for terrain {}",
            request.terrain
        );
        return None;
    }
    candidates.sort_by(|a, b| a.cr.total_cmp(&b.cr));

    let target = thresholds.get(request.target_difficulty);
    let mut builder = Builder::new(
        request.max_creature_count,
        thresholds.ceiling(request.target_difficulty),
    );

    for creature in candidates.iter().rev() {
        let xp_each = xp_for_cr(creature.cr);
        if xp_each == 0 {
            continue;
        }
        while builder.adjusted() < target && builder.try_add(creature, xp_each) {}
        if builder.adjusted() >= target {
            break;
        }
    }

    if builder.adjusted() < target {
        let weakest = candidates[0];
        let xp_each = xp_for_cr(weakest.cr);
        if xp_each > 0 {
            while builder.adjusted() < target && builder.try_add(weakest, xp_each) {}
        }
    }

    builder.finish(request.id, request.terrain, request.generated_at, &thresholds)
}

fn terrain_matches(creature: &Creature, terrain: &str) -> bool {
    if creature.terrain_preference.is_empty() {
        return true;
    }
    let terrain = terrain.to_lowercase();
    creature.terrain_preference.iter().any(|pref| {
        let pref = pref.to_lowercase();
        pref.contains(&terrain) || terrain.contains(&pref)
    })
}

struct Builder {
    groups: CreatureGroups,
    total_xp: u32,
    count: u32,
    max_count: u32,
    ceiling: u32,
}

impl Builder {
    fn new(max_count: u32, ceiling: u32) -> Self {
        Self {
            groups: SmallVec::new(),
            total_xp: 0,
            count: 0,
            max_count,
            ceiling,
        }
    }

    fn adjusted(&self) -> u32 {
        adjusted_xp(self.total_xp, self.count)
    }

    fn try_add(&mut self, creature: &Creature, xp_each: u32) -> bool {
        let count = self.count + 1;
        let total = self.total_xp.saturating_add(xp_each);
        if count > self.max_count || adjusted_xp(total, count) > self.ceiling {
            return false;
        }
        if let Some(group) = self.groups.iter_mut().find(|g| g.creature_id == creature.id) {
            group.count += 1;
        } else {
            self.groups.push(EncounterCreatureGroup {
                creature_id: creature.id.clone(),
                name: creature.name.clone(),
                cr: creature.cr,
                count: 1,
                xp_each,
            });
        }
        self.count = count;
        self.total_xp = total;
        true
    }

    fn finish(
        self,
        id: String,
        terrain: &str,
        generated_at: Option<GameTime>,
        thresholds: &PartyThresholds,
    ) -> Option<GeneratedEncounter> {
        if self.groups.is_empty() {
            return None;
        }
        let adjusted = self.adjusted();
        Some(GeneratedEncounter {
            id,
            groups: self.groups,
            total_xp: self.total_xp,
            adjusted_xp: adjusted,
            multiplier: encounter_multiplier(self.count),
            difficulty: determine_difficulty(adjusted, thresholds),
            creature_count: self.count,
            terrain: terrain.to_string(),
            generated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRolls;

    fn creature(id: &str, cr: f64, terrain: &[&str]) -> Creature {
        Creature {
            id: id.to_string(),
            name: id.to_uppercase(),
            cr,
            terrain_preference: terrain.iter().map(ToString::to_string).collect(),
        }
    }

    fn forest_pool() -> Vec<Creature> {
        vec![
            creature("goblin", 0.25, &["forest"]),
            creature("wolf", 0.25, &["Forest", "plains"]),
            creature("bugbear", 1.0, &["forest"]),
            creature("ogre", 2.0, &["hills"]),
        ]
    }

    fn request<'a>(pool: &'a [Creature], levels: &'a [u32], difficulty: Difficulty) -> EncounterRequest<'a> {
        let config = EncounterConfig {
            target_difficulty: difficulty,
            ..EncounterConfig::default()
        };
        EncounterRequest::from_config(&config, pool, levels, "forest", "enc-1")
    }

    #[test]
    fn single_strong_creature_meets_medium() {
        let pool = forest_pool();
        let levels = [1, 1, 1, 1];
        let enc = generate_encounter(request(&pool, &levels, Difficulty::Medium)).expect("encounter");
        assert_eq!(enc.groups.len(), 1);
        assert_eq!(enc.groups[0].creature_id, "bugbear");
        assert_eq!(enc.total_xp, 200);
        assert_eq!(enc.adjusted_xp, 200);
        assert_eq!(enc.difficulty, Difficulty::Medium);
        assert_eq!(enc.terrain, "forest");
    }

    #[test]
    fn ceiling_moves_greedy_to_weaker_candidates() {
        let pool = forest_pool();
        let levels = [1, 1, 1, 1];
        let enc = generate_encounter(request(&pool, &levels, Difficulty::Hard)).expect("encounter");
        assert_eq!(enc.creature_count, 2);
        assert_eq!(enc.total_xp, 250);
        assert_eq!(enc.adjusted_xp, 375);
        assert!((enc.multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(enc.difficulty, Difficulty::Hard);
        let ids: Vec<_> = enc.groups.iter().map(|g| g.creature_id.as_str()).collect();
        assert_eq!(ids, ["bugbear", "wolf"]);
    }

    #[test]
    fn creature_cap_is_respected() {
        let pool = vec![creature("rat", 0.125, &[])];
        let levels = [5, 5, 5, 5];
        let enc = generate_encounter(request(&pool, &levels, Difficulty::Medium)).expect("encounter");
        assert_eq!(enc.creature_count, 8);
        assert_eq!(enc.groups[0].count, 8);
        assert_eq!(enc.adjusted_xp, adjusted_xp(enc.total_xp, enc.creature_count));
        assert_eq!(enc.difficulty, Difficulty::Easy);
    }

    #[test]
    fn nothing_to_build_returns_none() {
        let pool = forest_pool();
        assert!(generate_encounter(request(&pool, &[], Difficulty::Medium)).is_none());
        assert!(generate_encounter(request(&[], &[3], Difficulty::Medium)).is_none());

        let hills_only = vec![creature("ogre", 2.0, &["hills"])];
        assert!(generate_encounter(request(&hills_only, &[2, 2], Difficulty::Medium)).is_none());

        let too_strong = vec![creature("dragon", 17.0, &[])];
        assert!(generate_encounter(request(&too_strong, &[1], Difficulty::Easy)).is_none());
    }

    #[test]
    fn terrain_matching_is_case_insensitive_substring() {
        let c = creature("heron", 0.0, &["Swamp"]);
        assert!(terrain_matches(&c, "swampland"));
        assert!(terrain_matches(&c, "SWAMP"));
        assert!(!terrain_matches(&c, "desert"));
        assert!(terrain_matches(&creature("any", 0.0, &[]), "desert"));
    }

    #[test]
    fn encounter_check_compares_roll_to_probability() {
        let mut rolls = ScriptedRolls::new([0.05, 0.5], 0.99);
        assert!(roll_encounter_check(0.125, &mut rolls));
        assert!(!roll_encounter_check(0.125, &mut rolls));
        assert!(!roll_encounter_check(0.0, &mut rolls));
        assert!(roll_encounter_check(1.0, &mut rolls));
    }
}
