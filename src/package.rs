use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BackendError;

/// Lifecycle state for domain objects. Rows are usually soft-deleted by
/// flipping this flag rather than physically removed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Active,
    Deleted,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Active => "active",
            State::Deleted => "deleted",
        }
    }

    /// Parses a `state` column value.
    pub fn parse(value: &str) -> Result<Self, BackendError> {
        match value {
            "active" => Ok(State::Active),
            "deleted" => Ok(State::Deleted),
            other => Err(BackendError::UnrecognizedState(other.to_string())),
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::Active
    }
}

/// A dataset. Only the parts needed to own extras are modelled here; the
/// full entity lives in the wider application.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Package {
    /// The ID of the package.
    id: Uuid,

    /// The name of the package.
    name: String,

    /// The lifecycle state.
    state: State,
}

impl Package {
    pub fn new(id: Uuid, name: String, state: State) -> Self {
        Package { id, name, state }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> State {
        self.state
    }
}

/// One key/value annotation attached to a package.
///
/// Only the (package_id, key) pair is unique, and that is enforced by the
/// application rather than the schema.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PackageExtra {
    /// The ID of the extra.
    id: Uuid,

    /// The ID of the owning package.
    package_id: Uuid,

    /// The annotation key.
    key: String,

    /// The annotation value.
    value: String,

    /// The lifecycle state.
    state: State,
}

impl PackageExtra {
    /// Creates an extra for a package with a freshly generated id and an
    /// active state.
    pub fn new(package_id: Uuid, key: impl Into<String>, value: impl Into<String>) -> Self {
        PackageExtra {
            id: Uuid::new_v4(),
            package_id,
            key: key.into(),
            value: value.into(),
            state: State::Active,
        }
    }

    /// Rebuilds an extra from its stored parts.
    pub fn from_parts(
        id: Uuid,
        package_id: Uuid,
        key: String,
        value: String,
        state: State,
    ) -> Self {
        PackageExtra {
            id,
            package_id,
            key,
            value,
            state,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn package_id(&self) -> &Uuid {
        &self.package_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The packages this extra relates to: always the single owning one.
    /// List-shaped to match how relationships are traversed across entities.
    pub fn related_package_ids(&self) -> Vec<Uuid> {
        vec![self.package_id]
    }
}

/// The derived key→value view of a package's extras.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Extras(BTreeMap<String, String>);

impl Extras {
    /// Builds the view from stored rows. On duplicate keys the later row
    /// wins, mirroring a keyed collection built in retrieval order.
    pub fn from_rows(rows: &[PackageExtra]) -> Self {
        Extras(
            rows.iter()
                .map(|row| (row.key.clone(), row.value.clone()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_extras_default_to_active_with_fresh_ids() {
        let package_id = Uuid::new_v4();

        let first = PackageExtra::new(package_id, "theme", "transport");
        let second = PackageExtra::new(package_id, "region", "north");

        assert_eq!(first.state(), State::Active);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.package_id(), &package_id);
    }

    #[test]
    fn an_extra_relates_to_its_single_owner() {
        let package_id = Uuid::new_v4();
        let extra = PackageExtra::new(package_id, "theme", "transport");

        assert_eq!(extra.related_package_ids(), vec![package_id]);
    }

    #[test]
    fn the_view_maps_keys_to_values() {
        let package_id = Uuid::new_v4();
        let rows = [
            PackageExtra::new(package_id, "theme", "transport"),
            PackageExtra::new(package_id, "region", "north"),
        ];

        let extras = Extras::from_rows(&rows);

        assert_eq!(extras.len(), 2);
        assert_eq!(extras.get("theme"), Some("transport"));
        assert_eq!(extras.get("region"), Some("north"));
        assert_eq!(extras.get("missing"), None);
        assert!(extras.contains_key("theme"));
    }

    #[test]
    fn later_rows_win_on_duplicate_keys() {
        let package_id = Uuid::new_v4();
        let rows = [
            PackageExtra::new(package_id, "theme", "old"),
            PackageExtra::new(package_id, "theme", "new"),
        ];

        let extras = Extras::from_rows(&rows);

        assert_eq!(extras.len(), 1);
        assert_eq!(extras.get("theme"), Some("new"));
    }

    #[test]
    fn states_round_trip_through_their_text_form() {
        for state in &[State::Active, State::Deleted] {
            assert_eq!(State::parse(state.as_str()).unwrap(), *state);
        }

        assert!(matches!(
            State::parse("zombie"),
            Err(BackendError::UnrecognizedState(_))
        ));
    }
}
