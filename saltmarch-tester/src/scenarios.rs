use saltmarch_travel::HexCoordinate;

/// Scripted journey run by the tester.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    pub start: HexCoordinate,
    pub waypoints: Vec<HexCoordinate>,
    /// Game minutes per real second.
    pub speed_multiplier: f64,
    pub check_probability: f64,
    /// Each iteration must generate at least this many encounters.
    pub min_encounters: u32,
    /// Run every seed twice and require identical event streams.
    pub verify_replay: bool,
}

const fn hex(q: i32, r: i32) -> HexCoordinate {
    HexCoordinate::new(q, r)
}

pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            key: "short-hop",
            description: "Single waypoint a few hexes away at double speed",
            start: hex(0, 0),
            waypoints: vec![hex(4, -2)],
            speed_multiplier: 120.0,
            check_probability: 0.125,
            min_encounters: 0,
            verify_replay: false,
        },
        Scenario {
            key: "long-march",
            description: "Four-leg loop over mixed terrain with default encounter odds",
            start: hex(0, 0),
            waypoints: vec![hex(10, 0), hex(10, 10), hex(0, 12), hex(-8, 6)],
            speed_multiplier: 600.0,
            check_probability: 0.125,
            min_encounters: 0,
            verify_replay: false,
        },
        Scenario {
            key: "ambush-heavy",
            description: "Straight run where almost every travel hour rolls an encounter",
            start: hex(-3, 2),
            waypoints: vec![hex(12, -3)],
            speed_multiplier: 600.0,
            check_probability: 0.9,
            min_encounters: 1,
            verify_replay: false,
        },
        Scenario {
            key: "deterministic-replay",
            description: "Same seed twice must publish the same event stream",
            start: hex(2, 2),
            waypoints: vec![hex(8, -1), hex(5, 6)],
            speed_multiplier: 600.0,
            check_probability: 0.5,
            min_encounters: 0,
            verify_replay: true,
        },
    ]
}

pub fn get_scenario(key: &str) -> Option<Scenario> {
    catalog().into_iter().find(|s| s.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog().iter().map(|s| (s.key, s.description)).collect()
}

/// Expand `all` into every catalogued key, keeping other names as given.
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    if requested.iter().any(|s| s == "all") {
        return catalog().iter().map(|s| s.key.to_string()).collect();
    }
    requested.to_vec()
}
