use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coordinate::{ChestLocation, WorldRef};
use crate::error::IdentityError;

/// Separator between the components of a chest identity string.
const ID_SEPARATOR: char = '~';

/// Host-supplied lookup from a world identifier to its display name.
///
/// Implementations must be deterministic for the lifetime of a world:
/// the resolved name is baked into every [`ChestId`] generated in it.
pub trait WorldResolver: Send + Sync {
    /// Returns `None` if the host does not know the world.
    fn resolve(&self, world: &WorldRef) -> Option<String>;
}

impl<F> WorldResolver for F
where
    F: Fn(&WorldRef) -> Option<String> + Send + Sync,
{
    fn resolve(&self, world: &WorldRef) -> Option<String> {
        self(world)
    }
}

/// A [`WorldResolver`] backed by a fixed table.
///
/// Used by the CLI (populated from the `worlds` config table) and by tests.
#[derive(Clone, Debug, Default)]
pub struct StaticWorldResolver {
    names: HashMap<WorldRef, String>,
}

impl StaticWorldResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of a world.
    pub fn with_world(mut self, world: impl Into<WorldRef>, name: impl Into<String>) -> Self {
        self.insert(world, name);
        self
    }

    pub fn insert(&mut self, world: impl Into<WorldRef>, name: impl Into<String>) {
        self.names.insert(world.into(), name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<W, N> FromIterator<(W, N)> for StaticWorldResolver
where
    W: Into<WorldRef>,
    N: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (W, N)>>(iter: I) -> Self {
        let mut resolver = Self::new();
        for (world, name) in iter {
            resolver.insert(world, name);
        }
        resolver
    }
}

impl WorldResolver for StaticWorldResolver {
    fn resolve(&self, world: &WorldRef) -> Option<String> {
        self.names.get(world).cloned()
    }
}

/// Globally unique, stable identity of a tracked chest.
///
/// A `ChestId` is derived from the primary coordinate of a chest and the
/// resolved name of its world, formatted as `x~y~z~world_name`. The same
/// location always yields the same id, across calls and restarts, as long
/// as the host resolves the world to the same name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChestId(String);

impl ChestId {
    /// Derive the identity of the chest at `location`.
    ///
    /// Fails if the primary coordinate has no world, or if `resolver` does
    /// not know it. There is no placeholder world.
    pub fn generate(
        location: &ChestLocation,
        resolver: &dyn WorldResolver,
    ) -> Result<Self, IdentityError> {
        let primary = &location.primary;
        let world = primary.world.as_ref().ok_or(IdentityError::MissingWorld {
            x: primary.x,
            y: primary.y,
            z: primary.z,
        })?;
        let name = resolver
            .resolve(world)
            .ok_or_else(|| IdentityError::UnresolvedWorld(world.clone()))?;

        Ok(Self(format!(
            "{x}{sep}{y}{sep}{z}{sep}{name}",
            x = primary.x,
            y = primary.y,
            z = primary.z,
            sep = ID_SEPARATOR,
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ChestId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ChestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChestId({})", self.0)
    }
}

impl fmt::Display for ChestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Coordinate;
    use proptest::prelude::*;

    const OVERWORLD: &str = "6f1c2a9e-0000-4000-8000-000000000001";

    fn resolver() -> StaticWorldResolver {
        StaticWorldResolver::new().with_world(OVERWORLD, "world")
    }

    #[test]
    fn generate_formats_coordinates_and_world_name() {
        let location = ChestLocation::single(Coordinate::in_world(-12, 64, 300, OVERWORLD));
        let id = ChestId::generate(&location, &resolver()).unwrap();
        assert_eq!(id.as_str(), "-12~64~300~world");
    }

    #[test]
    fn generate_ignores_secondary_half() {
        let single = ChestLocation::single(Coordinate::in_world(1, 2, 3, OVERWORLD));
        let double = ChestLocation::double(
            Coordinate::in_world(1, 2, 3, OVERWORLD),
            Coordinate::in_world(2, 2, 3, OVERWORLD),
        );
        assert_eq!(
            ChestId::generate(&single, &resolver()).unwrap(),
            ChestId::generate(&double, &resolver()).unwrap()
        );
    }

    #[test]
    fn missing_world_is_an_error() {
        let location = ChestLocation::single(Coordinate::new(1, 2, 3));
        let err = ChestId::generate(&location, &resolver()).unwrap_err();
        assert_eq!(err, IdentityError::MissingWorld { x: 1, y: 2, z: 3 });
    }

    #[test]
    fn unresolved_world_is_an_error() {
        let location = ChestLocation::single(Coordinate::in_world(1, 2, 3, "unknown"));
        let err = ChestId::generate(&location, &resolver()).unwrap_err();
        assert_eq!(err, IdentityError::UnresolvedWorld(WorldRef::new("unknown")));
    }

    #[test]
    fn closure_resolver() {
        let upper = |world: &WorldRef| Some(world.as_str().to_uppercase());
        let location = ChestLocation::single(Coordinate::in_world(0, 0, 0, "nether"));
        let id = ChestId::generate(&location, &upper).unwrap();
        assert_eq!(id.as_str(), "0~0~0~NETHER");
    }

    #[test]
    fn resolver_from_iterator() {
        let resolver: StaticWorldResolver =
            [("a", "alpha"), ("b", "beta")].into_iter().collect();
        assert_eq!(resolver.len(), 2);
        assert_eq!(resolver.resolve(&WorldRef::new("b")).as_deref(), Some("beta"));
    }

    #[test]
    fn json_is_a_plain_string() {
        let id: ChestId = serde_json::from_str(r#""1~2~3~world""#).unwrap();
        assert_eq!(id.as_str(), "1~2~3~world");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""1~2~3~world""#);
    }

    proptest! {
        #[test]
        fn generate_is_deterministic(x in any::<i32>(), y in -64i32..320, z in any::<i32>()) {
            let location = ChestLocation::single(Coordinate::in_world(x, y, z, OVERWORLD));
            let first = ChestId::generate(&location, &resolver()).unwrap();
            let second = ChestId::generate(&location.clone(), &resolver()).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn distinct_positions_get_distinct_ids(a in any::<(i32, i32, i32)>(), b in any::<(i32, i32, i32)>()) {
            prop_assume!(a != b);
            let first = ChestLocation::single(Coordinate::in_world(a.0, a.1, a.2, OVERWORLD));
            let second = ChestLocation::single(Coordinate::in_world(b.0, b.1, b.2, OVERWORLD));
            prop_assert_ne!(
                ChestId::generate(&first, &resolver()).unwrap(),
                ChestId::generate(&second, &resolver()).unwrap()
            );
        }
    }
}
