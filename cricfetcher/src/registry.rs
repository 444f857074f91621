use std::collections::BTreeMap;

/// Read-only display name → player id lookup for one match.
#[derive(Debug, Clone, Copy)]
pub struct PlayerRegistry<'a> {
    people: &'a BTreeMap<String, String>,
}

impl<'a> PlayerRegistry<'a> {
    pub fn new(people: &'a BTreeMap<String, String>) -> Self {
        Self { people }
    }

    /// Player id for a name. Unknown or absent names resolve to `None`; callers
    /// omit the relationship rather than fail.
    pub fn resolve(&self, name: Option<&str>) -> Option<&'a str> {
        let name = name?;
        let id = self.people.get(name).map(String::as_str);
        if id.is_none() {
            log::debug!("No registry id for '{}'", name);
        }
        id
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.people.iter().map(|(name, id)| (name.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}
