use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a world, as handed out by the host environment.
///
/// The registry never interprets the contents. It is only turned into a
/// human-readable name through a [`WorldResolver`](crate::WorldResolver)
/// when an identity string is generated.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldRef(String);

impl WorldRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WorldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorldRef({})", self.0)
    }
}

impl fmt::Display for WorldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for WorldRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Block position in a world.
///
/// Equality includes the world reference, so the same (x, y, z) in two
/// different worlds are different coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Absent only in documents written before worlds were tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<WorldRef>,
}

impl Coordinate {
    /// A coordinate with no world reference.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z, world: None }
    }

    pub fn in_world(x: i32, y: i32, z: i32, world: impl Into<WorldRef>) -> Self {
        Self {
            x,
            y,
            z,
            world: Some(world.into()),
        }
    }

    pub fn has_world(&self) -> bool {
        self.world.is_some()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.world {
            Some(world) => write!(f, "({}, {}, {}) in {}", self.x, self.y, self.z, world),
            None => write!(f, "({}, {}, {})", self.x, self.y, self.z),
        }
    }
}

/// Where a chest sits: one block, or two adjacent blocks for a double chest.
///
/// The JSON field names (`left`, `right`) are kept from the existing data
/// file format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestLocation {
    #[serde(rename = "left")]
    pub primary: Coordinate,
    #[serde(rename = "right", default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Coordinate>,
}

impl ChestLocation {
    pub fn single(primary: Coordinate) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn double(primary: Coordinate, secondary: Coordinate) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// Returns `true` if either half of the chest is at `coordinate`.
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.primary == *coordinate || self.secondary.as_ref() == Some(coordinate)
    }

    /// Assign `world` to a location whose primary coordinate has none.
    ///
    /// The secondary coordinate, if any, takes the same world. Returns
    /// `true` if the location was changed. Locations that already carry a
    /// world are left alone.
    pub fn backfill_world(&mut self, world: &WorldRef) -> bool {
        if self.primary.has_world() {
            return false;
        }
        self.primary.world = Some(world.clone());
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.world = Some(world.clone());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_matches_either_half() {
        let left = Coordinate::in_world(10, 64, 10, "w");
        let right = Coordinate::in_world(11, 64, 10, "w");
        let location = ChestLocation::double(left.clone(), right.clone());

        assert!(location.contains(&left));
        assert!(location.contains(&right));
        assert!(!location.contains(&Coordinate::in_world(12, 64, 10, "w")));
    }

    #[test]
    fn contains_respects_world() {
        let location = ChestLocation::single(Coordinate::in_world(0, 64, 0, "overworld"));
        assert!(!location.contains(&Coordinate::in_world(0, 64, 0, "nether")));
        assert!(!location.contains(&Coordinate::new(0, 64, 0)));
    }

    #[test]
    fn backfill_sets_both_halves() {
        let mut location =
            ChestLocation::double(Coordinate::new(1, 2, 3), Coordinate::new(2, 2, 3));
        let world = WorldRef::new("default");

        assert!(location.backfill_world(&world));
        assert_eq!(location.primary.world.as_ref(), Some(&world));
        assert_eq!(
            location.secondary.as_ref().and_then(|c| c.world.as_ref()),
            Some(&world)
        );
    }

    #[test]
    fn backfill_leaves_existing_world() {
        let mut location = ChestLocation::single(Coordinate::in_world(1, 2, 3, "keep"));
        assert!(!location.backfill_world(&WorldRef::new("other")));
        assert_eq!(location.primary.world, Some(WorldRef::new("keep")));
    }

    #[test]
    fn json_uses_left_right_and_omits_missing() {
        let location = ChestLocation::single(Coordinate::new(5, 6, 7));
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json, serde_json::json!({ "left": { "x": 5, "y": 6, "z": 7 } }));
    }

    #[test]
    fn json_accepts_explicit_nulls() {
        let raw = r#"{ "left": { "x": 1, "y": 2, "z": 3, "world": null }, "right": null }"#;
        let location: ChestLocation = serde_json::from_str(raw).unwrap();
        assert_eq!(location, ChestLocation::single(Coordinate::new(1, 2, 3)));
    }

    #[test]
    fn display_includes_world() {
        assert_eq!(Coordinate::new(1, 2, 3).to_string(), "(1, 2, 3)");
        assert_eq!(
            Coordinate::in_world(1, 2, 3, "w").to_string(),
            "(1, 2, 3) in w"
        );
    }
}
