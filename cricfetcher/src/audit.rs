use std::collections::BTreeSet;

use serde_json::Value;

use crate::schema_registry::{InputSchemaRegistry, INPUT_SCHEMA};

/// Walks a raw match document and collects field paths outside the input schema.
///
/// Only the topmost unknown path of a subtree is reported; its children are not
/// visited. Elements of a list are audited under the list's own path.
pub struct FieldAuditor<'a> {
    registry: &'a InputSchemaRegistry,
}

impl Default for FieldAuditor<'static> {
    fn default() -> Self {
        Self {
            registry: &INPUT_SCHEMA,
        }
    }
}

impl<'a> FieldAuditor<'a> {
    pub fn unmapped_paths(&self, document: &Value) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        self.walk(document, "", &mut found);
        found
    }

    fn walk(&self, value: &Value, prefix: &str, found: &mut BTreeSet<String>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    if !self.registry.is_mapped(&path) {
                        found.insert(path);
                        continue;
                    }
                    // Keyed-by-name maps: the key is data, the value is not audited further.
                    if self.registry.accepts_any_child(prefix) {
                        continue;
                    }
                    self.walk(child, &path, found);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, prefix, found);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_topmost_unknown_paths_only() {
        let document = json!({
            "meta": { "data_version": "1.1.0" },
            "info": {
                "venue": "Eden Gardens",
                "registry": { "people": { "SC Ganguly": "abc123" } },
                "players": { "Kolkata Knight Riders": ["SC Ganguly"] },
                "supersub": { "team": "A", "player": "B" }
            },
            "innings": [{
                "team": "A",
                "miscounted_overs": true,
                "overs": [{
                    "over": 0,
                    "deliveries": [
                        { "batter": "X", "extras": { "wides": 1 } },
                        { "batter": "Y", "runs": { "batter": 1, "fancy": 2 } }
                    ]
                }]
            }]
        });

        let unmapped = FieldAuditor::default().unmapped_paths(&document);
        let expected: BTreeSet<String> = [
            "info.supersub",
            "innings.miscounted_overs",
            "innings.overs.deliveries.runs.fancy",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(unmapped, expected);
    }

    #[test]
    fn clean_document_has_nothing_to_report() {
        let document = json!({ "info": { "teams": ["A", "B"], "season": 2008 } });
        assert!(FieldAuditor::default().unmapped_paths(&document).is_empty());
    }
}
