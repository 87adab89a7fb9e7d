use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;

use chest_registry::{
    ChestLocation, ChestRegistry, Coordinate, ItemChest, RegistryConfig, WorldRef, WritePolicy,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let resolver = Arc::new(config.world_resolver());
    // Every mutation is written once, by the shutdown below.
    let sink = Arc::new(|message: &str| eprintln!("{} {}", "note:".cyan(), message));
    let registry = ChestRegistry::open_with_sink(config, resolver, sink)
        .context("failed to open chest registry")?
        .with_write_policy(WritePolicy::Deferred);
    let out = Output(cli.format);

    let result = match cli.command {
        Command::Init => cmd_init(&registry, out),
        Command::Add(args) => cmd_add(&registry, out, args),
        Command::Show(args) => cmd_show(&registry, out, args),
        Command::Locate(args) => cmd_locate(&registry, out, args),
        Command::Senders => cmd_senders(&registry, out),
        Command::Count(args) => cmd_count(&registry, out, args),
        Command::Link(args) => cmd_link(&registry, out, args),
        Command::Unlink(args) => cmd_unlink(&registry, out, args),
        Command::Remove(args) => cmd_remove(&registry, out, args),
        Command::Migrate(args) => cmd_migrate(&registry, out, args),
        Command::Check => cmd_check(&registry, out),
        Command::Flush => cmd_flush(&registry, out),
    };

    registry.shutdown().context("failed to write chest registry")?;
    result
}

fn load_config(cli: &Cli) -> anyhow::Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

#[derive(Clone, Copy)]
struct Output(OutputFormat);

impl Output {
    fn is_json(self) -> bool {
        self.0 == OutputFormat::Json
    }

    fn json(self, value: &impl Serialize) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a one-line outcome, or `{"ok": .., "message": ..}` in JSON mode.
    fn outcome(self, ok: bool, message: &str) -> anyhow::Result<()> {
        if self.is_json() {
            return self.json(&serde_json::json!({ "ok": ok, "message": message }));
        }
        if ok {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("{} {}", "✗".red().bold(), message);
        }
        Ok(())
    }
}

fn world_for(registry: &ChestRegistry, world: Option<String>) -> anyhow::Result<WorldRef> {
    match world {
        Some(world) => Ok(WorldRef::new(world)),
        None => registry
            .config()
            .default_world
            .clone()
            .context("no --world given and no default_world configured"),
    }
}

fn coordinate(registry: &ChestRegistry, position: PositionArgs) -> anyhow::Result<Coordinate> {
    let world = world_for(registry, position.world)?;
    Ok(Coordinate::in_world(position.x, position.y, position.z, world))
}

fn print_chest(chest: &ItemChest) {
    let title = chest.name().map(|name| format!(" ({name})")).unwrap_or_default();
    println!("{}{}", chest.id().as_str().yellow().bold(), title);
    let location = chest.location();
    match &location.secondary {
        Some(secondary) => println!("  Location: {} + {}", location.primary, secondary),
        None => println!("  Location: {}", location.primary),
    }
    if let Some(owner) = &chest.owner {
        println!("  Owner: {}", owner.cyan());
    }
    for receiver in chest.receivers() {
        println!("  {} {}", "sends to".green(), receiver);
    }
    for sender in chest.senders() {
        println!("  {} {}", "receives from".blue(), sender);
    }
}

fn cmd_init(registry: &ChestRegistry, out: Output) -> anyhow::Result<()> {
    let version = registry.version()?;
    let path = registry.config().data_path();
    if out.is_json() {
        return out.json(&serde_json::json!({
            "path": path.display().to_string(),
            "version": version,
        }));
    }
    println!("{} Registry ready at {}", "✓".green().bold(), path.display().to_string().bold());
    println!("  Version: {}", version);
    Ok(())
}

fn cmd_add(registry: &ChestRegistry, out: Output, args: AddArgs) -> anyhow::Result<()> {
    let world = args.position.world.clone();
    let primary = coordinate(registry, args.position)?;
    let location = match args.second {
        Some(second) => match second.as_slice() {
            [x, y, z] => ChestLocation::double(
                primary,
                Coordinate::in_world(*x, *y, *z, world_for(registry, world)?),
            ),
            _ => bail!("--second takes exactly three coordinates"),
        },
        None => ChestLocation::single(primary),
    };

    let mut chest = registry.new_chest(location)?;
    if let Some(name) = args.name {
        chest = chest.with_name(name);
    }
    if let Some(owner) = args.owner {
        chest = chest.with_owner(owner);
    }
    let id = chest.id().clone();

    if registry.add_chest(chest)? {
        out.outcome(true, &format!("Added chest {id}"))
    } else {
        out.outcome(false, &format!("Chest {id} is already tracked"))
    }
}

fn cmd_show(registry: &ChestRegistry, out: Output, args: IdArgs) -> anyhow::Result<()> {
    let chest = registry
        .get_chest_by_id(&args.id)?
        .with_context(|| format!("no chest with id {}", args.id))?;
    if out.is_json() {
        return out.json(&chest);
    }
    print_chest(&chest);
    Ok(())
}

fn cmd_locate(registry: &ChestRegistry, out: Output, args: PositionArgs) -> anyhow::Result<()> {
    let at = coordinate(registry, args)?;
    let chest = registry.get_chest_by_location(&at)?;
    if out.is_json() {
        return out.json(&chest);
    }
    match chest {
        Some(chest) => print_chest(&chest),
        None => println!("No chest at {at}."),
    }
    Ok(())
}

fn cmd_senders(registry: &ChestRegistry, out: Output) -> anyhow::Result<()> {
    let senders = registry.senders()?;
    if out.is_json() {
        return out.json(&senders);
    }
    if senders.is_empty() {
        println!("No senders.");
    }
    for chest in &senders {
        print_chest(chest);
    }
    Ok(())
}

fn cmd_count(registry: &ChestRegistry, out: Output, args: CountArgs) -> anyhow::Result<()> {
    let count = registry.count_by_owner(&args.player)?;
    if out.is_json() {
        return out.json(&serde_json::json!({ "player": args.player, "count": count }));
    }
    println!("{} owns {} chest(s)", args.player.cyan(), count.to_string().bold());
    Ok(())
}

fn cmd_link(registry: &ChestRegistry, out: Output, args: LinkArgs) -> anyhow::Result<()> {
    if registry.link(&args.receiver, &args.sender)? {
        out.outcome(true, &format!("{} now sends to {}", args.sender, args.receiver))
    } else {
        out.outcome(false, "Both chests must be tracked before they can be linked")
    }
}

fn cmd_unlink(registry: &ChestRegistry, out: Output, args: LinkArgs) -> anyhow::Result<()> {
    if registry.unlink(&args.receiver, &args.sender)? {
        out.outcome(true, &format!("{} no longer sends to {}", args.sender, args.receiver))
    } else {
        out.outcome(false, &format!("{} does not send to {}", args.sender, args.receiver))
    }
}

fn cmd_remove(registry: &ChestRegistry, out: Output, args: IdArgs) -> anyhow::Result<()> {
    if registry.remove_chest(&args.id)? {
        out.outcome(true, &format!("Removed chest {}", args.id))
    } else {
        out.outcome(false, &format!("No chest with id {}", args.id))
    }
}

fn cmd_migrate(registry: &ChestRegistry, out: Output, args: MigrateArgs) -> anyhow::Result<()> {
    let world = world_for(registry, args.default_world)?;
    let report = registry.migrate(&world)?;
    if out.is_json() {
        return out.json(&report);
    }
    if report.is_noop() {
        println!("Already at version {}.", report.to_version);
        return Ok(());
    }
    println!(
        "{} Migrated v{} → v{}",
        "✓".green().bold(),
        report.from_version,
        report.to_version
    );
    println!("  Steps: {}", report.steps.join(", "));
    println!("  Chests created: {}", report.chests_created);
    println!("  Locations backfilled: {}", report.locations_backfilled);
    for failed in &report.failed_links {
        println!("  {} {} → {}", "unlinked:".yellow(), failed.sender, failed.receiver);
    }
    Ok(())
}

fn cmd_check(registry: &ChestRegistry, out: Output) -> anyhow::Result<()> {
    let report = registry.validate()?;
    if out.is_json() {
        out.json(&report)?;
    } else if report.is_valid() {
        println!(
            "{} {} chest(s), all links consistent",
            "✓".green().bold(),
            report.chest_count
        );
    } else {
        for violation in &report.violations {
            println!(
                "  {} {:?}: {}",
                violation.chest.as_str().yellow(),
                violation.kind,
                violation.description
            );
        }
    }
    if !report.is_valid() {
        bail!("{} violation(s) found", report.violations.len());
    }
    Ok(())
}

fn cmd_flush(registry: &ChestRegistry, out: Output) -> anyhow::Result<()> {
    let version = registry.version()?;
    registry.flush()?;
    out.outcome(true, &format!("Wrote version {version} document"))
}
