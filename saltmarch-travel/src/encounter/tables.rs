//! D&D 5e encounter-building arithmetic.

use serde::{Deserialize, Deserializer};

use super::Difficulty;
use crate::constants::{
    DEADLY_CEILING_FACTOR, ENCOUNTER_MULTIPLIER_HORDE, ENCOUNTER_MULTIPLIERS, FRACTIONAL_CR_XP, MAX_PARTY_LEVEL,
    MIN_PARTY_LEVEL, WHOLE_CR_XP, XP_THRESHOLDS_BY_LEVEL,
};
use crate::numbers::floor_f64_to_u32;

/// Summed party XP thresholds, indexed by [`Difficulty::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartyThresholds([u32; 4]);

impl PartyThresholds {
    #[must_use]
    pub const fn get(&self, difficulty: Difficulty) -> u32 {
        self.0[difficulty.index()]
    }

    /// Highest XP still inside `difficulty`: one below the next tier, or
    /// half again the deadly threshold at the top.
    #[must_use]
    pub fn ceiling(&self, difficulty: Difficulty) -> u32 {
        match difficulty.next() {
            Some(next) => self.get(next).saturating_sub(1),
            None => floor_f64_to_u32(f64::from(self.get(Difficulty::Deadly)) * DEADLY_CEILING_FACTOR),
        }
    }
}

/// Parse a challenge rating such as `"2"`, `"0.5"` or `"1/4"`.
#[must_use]
pub fn parse_cr(text: &str) -> Option<f64> {
    let text = text.trim();
    let value = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => text.parse().ok()?,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// XP for a creature of challenge rating `cr`.
///
/// 1/8, 1/4 and 1/2 are exact; any other value is floored to a whole rating.
/// Ratings outside 0..=30 are worth nothing.
#[must_use]
pub fn xp_for_cr(cr: f64) -> u32 {
    if !cr.is_finite() || cr < 0.0 {
        return 0;
    }
    if let Some((_, xp)) = FRACTIONAL_CR_XP
        .iter()
        .skip(1)
        .find(|(value, _)| (cr - value).abs() < 1e-9)
    {
        return *xp;
    }
    match floor_f64_to_u32(cr) {
        0 => FRACTIONAL_CR_XP[0].1,
        whole => usize::try_from(whole - 1)
            .ok()
            .and_then(|i| WHOLE_CR_XP.get(i))
            .copied()
            .unwrap_or(0),
    }
}

/// Sum of per-character thresholds, levels clamped to 1..=20.
#[must_use]
pub fn party_thresholds(levels: &[u32]) -> PartyThresholds {
    let mut totals = [0u32; 4];
    for level in levels {
        let row = XP_THRESHOLDS_BY_LEVEL[clamped_level_index(*level)];
        for (total, threshold) in totals.iter_mut().zip(row) {
            *total = total.saturating_add(threshold);
        }
    }
    PartyThresholds(totals)
}

fn clamped_level_index(level: u32) -> usize {
    let level = level.clamp(MIN_PARTY_LEVEL, MAX_PARTY_LEVEL);
    usize::try_from(level - 1).unwrap_or(0)
}

/// XP multiplier for a group of `creature_count` creatures.
#[must_use]
pub fn encounter_multiplier(creature_count: u32) -> f64 {
    ENCOUNTER_MULTIPLIERS
        .iter()
        .find(|(max, _)| creature_count <= *max)
        .map_or(ENCOUNTER_MULTIPLIER_HORDE, |(_, m)| *m)
}

/// `floor(total_xp × multiplier(creature_count))`.
#[must_use]
pub fn adjusted_xp(total_xp: u32, creature_count: u32) -> u32 {
    floor_f64_to_u32(f64::from(total_xp) * encounter_multiplier(creature_count))
}

/// Highest tier whose threshold `adjusted` meets; easy when none do.
#[must_use]
pub fn determine_difficulty(adjusted: u32, thresholds: &PartyThresholds) -> Difficulty {
    Difficulty::ALL
        .into_iter()
        .rev()
        .find(|d| adjusted >= thresholds.get(*d))
        .unwrap_or(Difficulty::Easy)
}

/// Whether `adjusted` lands inside `target`'s band (below the next tier).
#[must_use]
pub fn matches_difficulty(adjusted: u32, target: Difficulty, thresholds: &PartyThresholds) -> bool {
    if adjusted < thresholds.get(target) {
        return false;
    }
    target
        .next()
        .is_none_or(|next| adjusted < thresholds.get(next))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CrRepr {
    Number(f64),
    Text(String),
}

pub(super) fn deserialize_cr<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match CrRepr::deserialize(deserializer)? {
        CrRepr::Number(value) if value.is_finite() && value >= 0.0 => Ok(value),
        CrRepr::Number(value) => Err(serde::de::Error::custom(format!("invalid challenge rating {value}"))),
        CrRepr::Text(text) => parse_cr(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid challenge rating {text:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::Creature;

    #[test]
    fn fractional_ratings_parse() {
        assert_eq!(parse_cr("1/8"), Some(0.125));
        assert_eq!(parse_cr(" 1/4 "), Some(0.25));
        assert_eq!(parse_cr("1/2"), Some(0.5));
        assert_eq!(parse_cr("17"), Some(17.0));
        assert_eq!(parse_cr("1/0"), None);
        assert_eq!(parse_cr("-1"), None);
        assert_eq!(parse_cr("goblin"), None);
    }

    #[test]
    fn xp_table_spot_checks() {
        assert_eq!(xp_for_cr(0.0), 10);
        assert_eq!(xp_for_cr(0.125), 25);
        assert_eq!(xp_for_cr(0.25), 50);
        assert_eq!(xp_for_cr(0.5), 100);
        assert_eq!(xp_for_cr(1.0), 200);
        assert_eq!(xp_for_cr(5.0), 1_800);
        assert_eq!(xp_for_cr(30.0), 155_000);
        assert_eq!(xp_for_cr(31.0), 0);
        assert_eq!(xp_for_cr(-1.0), 0);
    }

    #[test]
    fn thresholds_sum_and_clamp_levels() {
        let t = party_thresholds(&[1, 1, 1, 1]);
        assert_eq!(t.get(Difficulty::Easy), 100);
        assert_eq!(t.get(Difficulty::Medium), 200);
        assert_eq!(t.get(Difficulty::Deadly), 400);

        let clamped = party_thresholds(&[0, 25]);
        assert_eq!(clamped.get(Difficulty::Easy), 25 + 2_800);
        assert_eq!(party_thresholds(&[]).get(Difficulty::Hard), 0);
    }

    #[test]
    fn multiplier_tiers() {
        let expected = [
            (1, 1.0),
            (2, 1.5),
            (3, 2.0),
            (6, 2.0),
            (7, 2.5),
            (10, 2.5),
            (11, 3.0),
            (14, 3.0),
            (15, 4.0),
        ];
        for (count, mult) in expected {
            assert!((encounter_multiplier(count) - mult).abs() < f64::EPSILON, "count {count}");
        }
        assert_eq!(adjusted_xp(75, 2), 112);
    }

    #[test]
    fn difficulty_bands() {
        let t = party_thresholds(&[3, 3, 3, 3]);
        // easy 300, medium 600, hard 900, deadly 1600
        assert_eq!(determine_difficulty(0, &t), Difficulty::Easy);
        assert_eq!(determine_difficulty(600, &t), Difficulty::Medium);
        assert_eq!(determine_difficulty(1_599, &t), Difficulty::Hard);
        assert_eq!(determine_difficulty(5_000, &t), Difficulty::Deadly);

        assert!(matches_difficulty(600, Difficulty::Medium, &t));
        assert!(!matches_difficulty(900, Difficulty::Medium, &t));
        assert!(matches_difficulty(9_999, Difficulty::Deadly, &t));
        assert_eq!(t.ceiling(Difficulty::Medium), 899);
        assert_eq!(t.ceiling(Difficulty::Deadly), 2_400);
    }

    #[test]
    fn cr_accepts_number_or_fraction() {
        let c: Creature =
            serde_json::from_str(r#"{"id":"g","name":"Goblin","cr":"1/4"}"#).expect("fraction");
        assert!((c.cr - 0.25).abs() < f64::EPSILON);
        assert!(c.terrain_preference.is_empty());
        let c: Creature =
            serde_json::from_str(r#"{"id":"o","name":"Ogre","cr":2,"terrain_preference":["hills"]}"#)
                .expect("number");
        assert!((c.cr - 2.0).abs() < f64::EPSILON);
        assert!(serde_json::from_str::<Creature>(r#"{"id":"x","name":"X","cr":"?"}"#).is_err());
    }
}
