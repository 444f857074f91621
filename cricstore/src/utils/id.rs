use serde_json::{Map, Value};
use uuid::Uuid;

pub fn uuid_v5(ns: Uuid, name: &str) -> Uuid {
    Uuid::new_v5(&ns, name.as_bytes())
}

pub fn stable_node_id(label: &str, key: &str) -> String {
    // name 形如 "Player|key=4ae1755b"
    let name = format!("{}|key={}", label, key);
    uuid_v5(Uuid::NAMESPACE_OID, &name).to_string()
}

/// Edge identity covers the endpoints plus the properties the edge is merged on,
/// so `(d)-[:DISMISSED {kind: "caught"}]->(p)` and `{kind: "bowled"}` are distinct edges.
pub fn stable_edge_id(edge_type: &str, from: &str, to: &str, identity: &Map<String, Value>) -> String {
    let mut name = format!("{}|{}|{}", edge_type, from, to);
    // serde_json::Map iterates in key order, which keeps the id independent of insertion order.
    for (k, v) in identity {
        name.push('|');
        name.push_str(k);
        name.push('=');
        name.push_str(&v.to_string());
    }
    uuid_v5(Uuid::NAMESPACE_OID, &name).to_string()
}
