use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chestreg",
    about = "Inspect and edit an item chest registry",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory, overriding the config
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the data directory, marker and data file
    Init,
    /// Track a new chest
    Add(AddArgs),
    /// Show a chest by id
    Show(IdArgs),
    /// Find the chest occupying a block
    Locate(PositionArgs),
    /// List every chest with at least one receiver
    Senders,
    /// Count chests owned by a player
    Count(CountArgs),
    /// Make a chest send items to another
    Link(LinkArgs),
    /// Remove a sender/receiver link
    Unlink(LinkArgs),
    /// Stop tracking a chest
    Remove(IdArgs),
    /// Upgrade the data file to the current version
    Migrate(MigrateArgs),
    /// Check link invariants
    Check,
    /// Load and rewrite the data file
    Flush,
}

#[derive(Args, Clone, Debug)]
pub struct PositionArgs {
    #[arg(allow_negative_numbers = true)]
    pub x: i32,
    #[arg(allow_negative_numbers = true)]
    pub y: i32,
    #[arg(allow_negative_numbers = true)]
    pub z: i32,
    /// World id; defaults to the configured default world
    #[arg(short, long)]
    pub world: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub position: PositionArgs,
    /// Other half of a double chest
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    pub second: Option<Vec<i32>>,
    #[arg(short, long)]
    pub name: Option<String>,
    /// Owning player id
    #[arg(short, long)]
    pub owner: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct CountArgs {
    pub player: String,
}

#[derive(Args)]
pub struct LinkArgs {
    pub receiver: String,
    pub sender: String,
}

#[derive(Args)]
pub struct MigrateArgs {
    /// World assigned to legacy coordinates
    #[arg(long)]
    pub default_world: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_double_chest() {
        let cli = Cli::try_parse_from([
            "chestreg", "add", "-5", "64", "3", "--world", "w1", "--second", "-5", "64", "4",
            "--owner", "p1",
        ])
        .unwrap();
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.position.x, -5);
        assert_eq!(args.position.world.as_deref(), Some("w1"));
        assert_eq!(args.second, Some(vec![-5, 64, 4]));
        assert_eq!(args.owner.as_deref(), Some("p1"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["chestreg", "check", "--format", "json", "-d", "/tmp/r"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/r")));
    }

    #[test]
    fn second_needs_three_values() {
        assert!(Cli::try_parse_from(["chestreg", "add", "1", "2", "3", "--second", "1", "2"]).is_err());
    }
}
