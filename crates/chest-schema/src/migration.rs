//! Versioned upgrade chain for registry documents.
//!
//! Each [`MigrationStep`] upgrades documents at exactly one source version.
//! The [`Migrator`] applies steps in order until the document reaches
//! [`CURRENT_VERSION`]. Steps run against a working copy, so a failing step
//! leaves the caller's document untouched.
//!
//! A future format change adds a new step for version 2 and bumps
//! [`CURRENT_VERSION`]; existing steps stay as they are.

use serde::Serialize;
use tracing::{debug, warn};

use chest_graph::ItemChest;
use chest_types::{ChestId, WorldRef, WorldResolver};

use crate::document::{RegistryDocument, CURRENT_VERSION, LEGACY_VERSION};
use crate::error::{SchemaError, SchemaResult};

/// Inputs shared by every step.
#[derive(Clone, Copy)]
pub struct MigrationContext<'a> {
    /// World given to coordinates that predate world tracking.
    pub default_world: &'a WorldRef,
    pub resolver: &'a dyn WorldResolver,
}

impl<'a> MigrationContext<'a> {
    pub fn new(default_world: &'a WorldRef, resolver: &'a dyn WorldResolver) -> Self {
        Self {
            default_world,
            resolver,
        }
    }
}

/// A sender/receiver pair that could not be linked during migration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedLink {
    pub sender: ChestId,
    pub receiver: ChestId,
}

/// What a migration run did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Names of the steps applied, in order.
    pub steps: Vec<&'static str>,
    pub chests_created: usize,
    pub locations_backfilled: usize,
    pub failed_links: Vec<FailedLink>,
}

impl MigrationReport {
    /// Returns `true` if the document was already current.
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One transition in the upgrade chain.
pub trait MigrationStep: Send + Sync {
    /// The document version this step upgrades from.
    fn source_version(&self) -> u32;

    fn name(&self) -> &'static str;

    /// Upgrade `document` in place. Must raise `document.version`.
    fn apply(
        &self,
        document: &mut RegistryDocument,
        ctx: &MigrationContext<'_>,
        report: &mut MigrationReport,
    ) -> SchemaResult<()>;
}

/// v1 → v2: flatten nested sender/receiver records into the chest list.
///
/// Legacy records are given the default world before their ids are
/// derived, since an id cannot be generated without a world. Chests that
/// already existed in the list are backfilled afterwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlattenLegacySenders;

impl MigrationStep for FlattenLegacySenders {
    fn source_version(&self) -> u32 {
        LEGACY_VERSION
    }

    fn name(&self) -> &'static str {
        "flatten-legacy-senders"
    }

    fn apply(
        &self,
        document: &mut RegistryDocument,
        ctx: &MigrationContext<'_>,
        report: &mut MigrationReport,
    ) -> SchemaResult<()> {
        let legacy = std::mem::take(&mut document.legacy_senders);

        for mut sender in legacy {
            report.locations_backfilled += sender.backfill_world(ctx.default_world);

            let mut sender_chest =
                ItemChest::new(sender.location, ctx.resolver)?.with_name(sender.name);
            sender_chest.owner = sender.owner;
            let sender_id = sender_chest.id().clone();
            if document.chests.add_chest(sender_chest) {
                report.chests_created += 1;
            }

            for receiver in sender.receivers {
                let mut receiver_chest = ItemChest::new(receiver.location, ctx.resolver)?;
                receiver_chest.owner = receiver.owner;
                let receiver_id = receiver_chest.id().clone();
                if document.chests.add_chest(receiver_chest) {
                    report.chests_created += 1;
                }

                if !document.chests.link(receiver_id.as_str(), sender_id.as_str()) {
                    warn!(
                        sender = %sender_id,
                        receiver = %receiver_id,
                        "unable to link migrated chests"
                    );
                    report.failed_links.push(FailedLink {
                        sender: sender_id.clone(),
                        receiver: receiver_id,
                    });
                }
            }
        }

        report.locations_backfilled += document.chests.backfill_world(ctx.default_world);
        document.version = 2;
        Ok(())
    }
}

/// Ordered chain of [`MigrationStep`]s.
pub struct Migrator {
    steps: Vec<Box<dyn MigrationStep>>,
}

impl Migrator {
    /// A migrator with no steps. Only useful for documents already current.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step. Steps are looked up by source version, so order of
    /// registration does not matter.
    pub fn with_step(mut self, step: impl MigrationStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Upgrade `document` to [`CURRENT_VERSION`].
    ///
    /// A document that is already current is left untouched and the report
    /// is a no-op. On error the document is unchanged.
    pub fn run(
        &self,
        document: &mut RegistryDocument,
        ctx: &MigrationContext<'_>,
    ) -> SchemaResult<MigrationReport> {
        let mut report = MigrationReport {
            from_version: document.version,
            to_version: document.version,
            ..MigrationReport::default()
        };

        if document.version > CURRENT_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                found: document.version,
                supported: CURRENT_VERSION,
            });
        }
        if document.is_current() {
            return Ok(report);
        }

        let mut working = document.clone();
        while working.version < CURRENT_VERSION {
            let version = working.version;
            let step = self
                .steps
                .iter()
                .find(|step| step.source_version() == version)
                .ok_or(SchemaError::MissingStep(version))?;

            step.apply(&mut working, ctx, &mut report)?;
            if working.version <= version {
                return Err(SchemaError::StalledStep {
                    step: step.name(),
                    version,
                });
            }
            debug!(step = step.name(), from = version, to = working.version, "migration step applied");
            report.steps.push(step.name());
        }

        report.to_version = working.version;
        *document = working;
        Ok(report)
    }
}

impl Default for Migrator {
    /// The full chain known to this build.
    fn default() -> Self {
        Self::empty().with_step(FlattenLegacySenders)
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.steps.iter().map(|step| step.name()).collect();
        f.debug_struct("Migrator").field("steps", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chest_types::{ChestLocation, Coordinate, IdentityError, StaticWorldResolver};

    const DEFAULT_WORLD: &str = "world_overworld";

    fn resolver() -> StaticWorldResolver {
        StaticWorldResolver::new()
            .with_world(DEFAULT_WORLD, "world")
            .with_world("nether-id", "world_nether")
    }

    fn migrate(document: &mut RegistryDocument) -> SchemaResult<MigrationReport> {
        let world = WorldRef::new(DEFAULT_WORLD);
        let resolver = resolver();
        Migrator::default().run(document, &MigrationContext::new(&world, &resolver))
    }

    fn legacy_document() -> RegistryDocument {
        RegistryDocument::from_json(
            r#"{
                "sender": [{
                    "sid": "s-1",
                    "name": "Input",
                    "cords": { "left": { "x": 0, "y": 64, "z": 0 } },
                    "receiver": [
                        { "rid": "r-1", "cords": { "left": { "x": 1, "y": 64, "z": 0 } } }
                    ],
                    "playerID": "player-42"
                }],
                "version": 1,
                "chests": []
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn empty_v1_becomes_v2() {
        let mut doc = RegistryDocument::new();
        let report = migrate(&mut doc).unwrap();
        assert_eq!(doc.version, CURRENT_VERSION);
        assert_eq!(report.from_version, 1);
        assert_eq!(report.to_version, 2);
        assert_eq!(report.steps, vec!["flatten-legacy-senders"]);
    }

    #[test]
    fn legacy_sender_and_receiver_are_flattened_and_linked() {
        let mut doc = legacy_document();
        let report = migrate(&mut doc).unwrap();

        assert_eq!(doc.version, 2);
        assert!(doc.legacy_senders.is_empty());
        assert_eq!(doc.chests.len(), 2);
        assert_eq!(report.chests_created, 2);
        assert!(report.failed_links.is_empty());

        let sender = doc.chests.get_by_id("0~64~0~world").expect("sender chest");
        let receiver = doc.chests.get_by_id("1~64~0~world").expect("receiver chest");
        let world = WorldRef::new(DEFAULT_WORLD);
        assert_eq!(sender.location().primary.world.as_ref(), Some(&world));
        assert_eq!(receiver.location().primary.world.as_ref(), Some(&world));
        assert!(sender.receivers().contains("1~64~0~world"));
        assert!(receiver.senders().contains("0~64~0~world"));
        assert_eq!(sender.name(), Some("Input"));
        assert_eq!(sender.owner.as_deref(), Some("player-42"));
        assert!(doc.chests.validate().is_valid());

        let json = doc.to_json_pretty().unwrap();
        assert!(!json.contains("\"sender\""));
    }

    #[test]
    fn receiver_shared_by_two_senders_is_created_once() {
        let mut doc = RegistryDocument::from_json(
            r#"{
                "sender": [
                    { "sid": "a", "name": "", "cords": { "left": { "x": 0, "y": 0, "z": 0 } },
                      "receiver": [ { "rid": "x", "cords": { "left": { "x": 5, "y": 0, "z": 0 } } } ] },
                    { "sid": "b", "name": "", "cords": { "left": { "x": 1, "y": 0, "z": 0 } },
                      "receiver": [ { "rid": "y", "cords": { "left": { "x": 5, "y": 0, "z": 0 } } } ] }
                ],
                "version": 1,
                "chests": []
            }"#,
        )
        .unwrap();
        let report = migrate(&mut doc).unwrap();

        assert_eq!(doc.chests.len(), 3);
        assert_eq!(report.chests_created, 3);
        let receiver = doc.chests.get_by_id("5~0~0~world").unwrap();
        assert_eq!(receiver.senders().len(), 2);
        assert!(doc.chests.validate().is_valid());
    }

    #[test]
    fn existing_chests_without_world_are_backfilled() {
        let mut doc = RegistryDocument::from_json(
            r#"{
                "version": 1,
                "chests": [{
                    "id": "7~64~7~world",
                    "cords": {
                        "left": { "x": 7, "y": 64, "z": 7 },
                        "right": { "x": 8, "y": 64, "z": 7 }
                    }
                }, {
                    "id": "9~64~9~world_nether",
                    "cords": { "left": { "x": 9, "y": 64, "z": 9, "world": "nether-id" } }
                }]
            }"#,
        )
        .unwrap();
        let report = migrate(&mut doc).unwrap();

        assert_eq!(report.locations_backfilled, 1);
        let chest = doc.chests.get_by_id("7~64~7~world").unwrap();
        let world = Some(WorldRef::new(DEFAULT_WORLD));
        assert_eq!(chest.location().primary.world, world);
        assert_eq!(chest.location().secondary.as_ref().unwrap().world, world);

        let nether = doc.chests.get_by_id("9~64~9~world_nether").unwrap();
        assert_eq!(
            nether.location().primary.world,
            Some(WorldRef::new("nether-id"))
        );
    }

    #[test]
    fn second_run_is_a_noop() {
        let mut doc = legacy_document();
        migrate(&mut doc).unwrap();
        let after_first = doc.clone();

        let report = migrate(&mut doc).unwrap();
        assert!(report.is_noop());
        assert_eq!(doc, after_first);
        assert_eq!(doc.version, 2);
    }

    #[test]
    fn unresolvable_world_leaves_document_untouched() {
        let mut doc = legacy_document();
        let before = doc.clone();
        let world = WorldRef::new("unknown-world");
        let resolver = resolver();

        let err = Migrator::default()
            .run(&mut doc, &MigrationContext::new(&world, &resolver))
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::Identity(IdentityError::UnresolvedWorld(_))
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn missing_step_is_reported() {
        let mut doc = RegistryDocument::new();
        let world = WorldRef::new(DEFAULT_WORLD);
        let resolver = resolver();
        let err = Migrator::empty()
            .run(&mut doc, &MigrationContext::new(&world, &resolver))
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingStep(1)));
        assert_eq!(doc.version, 1);
    }

    struct Stuck;

    impl MigrationStep for Stuck {
        fn source_version(&self) -> u32 {
            1
        }

        fn name(&self) -> &'static str {
            "stuck"
        }

        fn apply(
            &self,
            _document: &mut RegistryDocument,
            _ctx: &MigrationContext<'_>,
            _report: &mut MigrationReport,
        ) -> SchemaResult<()> {
            Ok(())
        }
    }

    #[test]
    fn step_that_does_not_advance_is_rejected() {
        let mut doc = RegistryDocument::new();
        let world = WorldRef::new(DEFAULT_WORLD);
        let resolver = resolver();
        let err = Migrator::empty()
            .with_step(Stuck)
            .run(&mut doc, &MigrationContext::new(&world, &resolver))
            .unwrap_err();
        assert!(matches!(err, SchemaError::StalledStep { step: "stuck", version: 1 }));
    }

    #[test]
    fn debug_lists_step_names() {
        let debug = format!("{:?}", Migrator::default());
        assert!(debug.contains("flatten-legacy-senders"));
    }

    #[test]
    fn chest_placed_after_migration_collides_with_migrated_one() {
        let mut doc = legacy_document();
        migrate(&mut doc).unwrap();
        let location = ChestLocation::single(Coordinate::in_world(0, 64, 0, DEFAULT_WORLD));
        let fresh = ItemChest::new(location, &resolver()).unwrap();
        assert!(!doc.chests.add_chest(fresh));
    }
}
