use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use saltmarch_travel::encounter::{adjusted_xp, party_thresholds, xp_for_cr};
use saltmarch_travel::numbers::round_f64_to_i32;
use saltmarch_travel::{Creature, Difficulty, EncounterConfig, EncounterRequest, generate_encounter};

const CR_LADDER: [f64; 12] = [0.0, 0.125, 0.25, 0.5, 1.0, 2.0, 3.0, 4.0, 5.0, 7.0, 10.0, 13.0];
const TERRAINS: [&str; 4] = ["forest", "hills", "swamp", "plains"];

fn random_pool(rng: &mut ChaCha20Rng) -> Vec<Creature> {
    (0..rng.gen_range(1..12))
        .map(|i| {
            let prefs = if rng.gen_bool(0.3) {
                Vec::new()
            } else {
                vec![TERRAINS[rng.gen_range(0..TERRAINS.len())].to_string()]
            };
            Creature {
                id: format!("c{i}"),
                name: format!("Creature {i}"),
                cr: CR_LADDER[rng.gen_range(0..CR_LADDER.len())],
                terrain_preference: prefs,
            }
        })
        .collect()
}

#[test]
fn generated_encounters_respect_cap_ceiling_window_and_terrain() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xE7C0);
    let mut generated = 0;
    for round in 0..600 {
        let pool = random_pool(&mut rng);
        let levels: Vec<u32> = (0..rng.gen_range(1..6)).map(|_| rng.gen_range(1..=12)).collect();
        let terrain = TERRAINS[rng.gen_range(0..TERRAINS.len())];
        let config = EncounterConfig {
            target_difficulty: Difficulty::ALL[rng.gen_range(0..4)],
            max_creature_count: rng.gen_range(1..=10),
            ..EncounterConfig::default()
        };
        let request = EncounterRequest::from_config(&config, &pool, &levels, terrain, format!("enc-{round}"));
        let Some(encounter) = generate_encounter(request) else {
            continue;
        };
        generated += 1;

        let thresholds = party_thresholds(&levels);
        let mean = levels.iter().map(|l| f64::from(*l)).sum::<f64>() / levels.len() as f64;
        let avg = round_f64_to_i32(mean);
        let cr_min = f64::from((avg + config.cr_offset_min).max(0));
        let cr_max = f64::from(avg + config.cr_offset_max);

        assert!(encounter.creature_count >= 1);
        assert!(encounter.creature_count <= config.max_creature_count);
        assert!(encounter.adjusted_xp <= thresholds.ceiling(config.target_difficulty));
        assert_eq!(
            encounter.creature_count,
            encounter.groups.iter().map(|g| g.count).sum::<u32>()
        );
        assert_eq!(
            encounter.total_xp,
            encounter.groups.iter().map(|g| g.xp_each * g.count).sum::<u32>()
        );
        assert_eq!(
            encounter.adjusted_xp,
            adjusted_xp(encounter.total_xp, encounter.creature_count)
        );
        for group in &encounter.groups {
            assert!(group.cr >= cr_min && group.cr <= cr_max, "round {round}: CR {}", group.cr);
            assert_eq!(group.xp_each, xp_for_cr(group.cr));
            let creature = pool
                .iter()
                .find(|c| c.id == group.creature_id)
                .expect("group drawn from the pool");
            assert!(
                creature.terrain_preference.is_empty()
                    || creature.terrain_preference.iter().any(|t| t == terrain)
            );
        }
    }
    assert!(generated > 50, "only {generated} encounters generated");
}

#[test]
fn generation_is_deterministic() {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    for _ in 0..50 {
        let pool = random_pool(&mut rng);
        let levels = [rng.gen_range(1..=8), rng.gen_range(1..=8)];
        let config = EncounterConfig::default();
        let a = generate_encounter(EncounterRequest::from_config(&config, &pool, &levels, "hills", "e"));
        let b = generate_encounter(EncounterRequest::from_config(&config, &pool, &levels, "hills", "e"));
        assert_eq!(a, b);
    }
}
