#![allow(dead_code)]

//! Synthetic match documents in the source JSON layout.

use std::collections::BTreeMap;

use serde_json::{json, Value};

pub fn player_id(name: &str) -> String {
    format!("p-{}", name.to_lowercase().replace(' ', "-"))
}

/// One delivery off the bat.
pub fn ball(batter: &str, bowler: &str, non_striker: &str, runs: i64) -> Value {
    json!({
        "batter": batter,
        "bowler": bowler,
        "non_striker": non_striker,
        "runs": { "batter": runs, "extras": 0, "total": runs }
    })
}

pub fn wide(batter: &str, bowler: &str, non_striker: &str) -> Value {
    json!({
        "batter": batter,
        "bowler": bowler,
        "non_striker": non_striker,
        "extras": { "wides": 1 },
        "runs": { "batter": 0, "extras": 1, "total": 1 }
    })
}

/// Adds a wicket to a delivery built with [`ball`].
pub fn out(mut delivery: Value, kind: &str, player_out: &str, fielders: &[&str]) -> Value {
    let fielders: Vec<Value> = fielders.iter().map(|name| json!({ "name": name })).collect();
    let mut wicket = json!({ "player_out": player_out, "kind": kind });
    if !fielders.is_empty() {
        wicket["fielders"] = Value::Array(fielders);
    }
    delivery["wickets"] = json!([wicket]);
    delivery
}

/// Six balls with the given batter runs, no wickets.
pub fn over_of(batter: &str, bowler: &str, non_striker: &str, runs: [i64; 6]) -> Vec<Value> {
    runs.iter().map(|r| ball(batter, bowler, non_striker, *r)).collect()
}

pub struct MatchFixture {
    season: Value,
    date: String,
    teams: [String; 2],
    outcome: Value,
    innings: Vec<Value>,
    people: BTreeMap<String, String>,
    extra_info: Vec<(String, Value)>,
}

impl MatchFixture {
    pub fn new(season: impl Into<Value>, date: &str, team1: &str, team2: &str) -> Self {
        Self {
            season: season.into(),
            date: date.to_string(),
            teams: [team1.to_string(), team2.to_string()],
            outcome: json!({ "result": "no result" }),
            innings: Vec::new(),
            people: BTreeMap::new(),
            extra_info: Vec::new(),
        }
    }

    pub fn won_by_runs(mut self, winner: &str, runs: i64) -> Self {
        self.outcome = json!({ "winner": winner, "by": { "runs": runs } });
        self
    }

    /// An `info` key the importer does not know about.
    pub fn with_info_field(mut self, key: &str, value: Value) -> Self {
        self.extra_info.push((key.to_string(), value));
        self
    }

    fn register(&mut self, name: Option<&str>) {
        if let Some(name) = name {
            self.people.insert(name.to_string(), player_id(name));
        }
    }

    /// Adds an innings; every player named in its deliveries joins the registry.
    pub fn innings(mut self, team: &str, overs: Vec<Vec<Value>>) -> Self {
        let mut names = Vec::new();
        for delivery in overs.iter().flatten() {
            for field in ["batter", "bowler", "non_striker"] {
                names.push(delivery[field].as_str().map(str::to_string));
            }
            if let Some(wickets) = delivery["wickets"].as_array() {
                for wicket in wickets {
                    names.push(wicket["player_out"].as_str().map(str::to_string));
                    if let Some(fielders) = wicket["fielders"].as_array() {
                        names.extend(fielders.iter().map(|f| f["name"].as_str().map(str::to_string)));
                    }
                }
            }
        }
        for name in names {
            self.register(name.as_deref());
        }

        let overs: Vec<Value> = overs
            .into_iter()
            .enumerate()
            .map(|(n, deliveries)| json!({ "over": n, "deliveries": deliveries }))
            .collect();
        self.innings.push(json!({ "team": team, "overs": overs }));
        self
    }

    /// Two innings of two overs each, twelve dot-free balls per side.
    pub fn standard_innings(self) -> Self {
        let [t1, t2] = self.teams.clone();
        let (a1, a2, ab) = (format!("{t1} Opener"), format!("{t1} Second"), format!("{t1} Bowler"));
        let (b1, b2, bb) = (format!("{t2} Opener"), format!("{t2} Second"), format!("{t2} Bowler"));
        self.innings(
            &t1,
            vec![over_of(&a1, &bb, &a2, [1, 2, 1, 4, 1, 1]), over_of(&a2, &bb, &a1, [1, 1, 6, 1, 2, 1])],
        )
        .innings(
            &t2,
            vec![over_of(&b1, &ab, &b2, [1, 1, 1, 1, 1, 1]), over_of(&b2, &ab, &b1, [2, 2, 1, 1, 1, 1])],
        )
    }

    pub fn build(&self) -> Value {
        let mut info = json!({
            "balls_per_over": 6,
            "city": "Mumbai",
            "dates": [self.date],
            "gender": "male",
            "match_type": "T20",
            "outcome": self.outcome,
            "overs": 20,
            "registry": { "people": self.people },
            "season": self.season,
            "team_type": "club",
            "teams": self.teams,
            "toss": { "winner": self.teams[0], "decision": "bat" },
            "venue": "Wankhede Stadium"
        });
        for (key, value) in &self.extra_info {
            info[key.as_str()] = value.clone();
        }
        json!({
            "meta": { "data_version": "1.1.0", "created": "2024-01-01", "revision": 1 },
            "info": info,
            "innings": self.innings
        })
    }
}
