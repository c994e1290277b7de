use crate::board::Board;
use crate::config::{BoardConfig, load_config};
use crate::export::to_flowchart;
use crate::model::{CardId, CardType, Position};
use crate::snapshot::BoardSnapshot;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "stormb", version, about = "Event storming board engine")]
pub struct Args {
    /// Board snapshot (JSON)
    #[arg(short = 'b', long = "board", default_value = "board.json")]
    pub board: PathBuf,

    /// Config JSON file (card metrics, clustering, routing, palette)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty board snapshot
    Init {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },
    /// Add a card
    Add {
        #[arg(long)]
        name: String,
        #[arg(short = 't', long = "type")]
        kind: CardType,
        #[arg(short = 'x', long)]
        x: f32,
        #[arg(short = 'y', long)]
        y: f32,
        #[arg(short = 'd', long)]
        description: Option<String>,
        /// Search nearby free spots when (x, y) is taken
        #[arg(long)]
        near: bool,
    },
    /// Move a card (id or unique name)
    Move { card: String, x: f32, y: f32 },
    /// Rename a card
    Rename { card: String, name: String },
    /// Change a card's type
    Retype { card: String, kind: CardType },
    /// Set or clear a card's description
    Describe { card: String, text: Option<String> },
    /// Remove a card and its connections
    Remove { card: String },
    /// Connect two cards
    Connect { from: String, to: String },
    /// Remove a connection
    Disconnect { from: String, to: String },
    /// Detect aggregates and print them as JSON
    Aggregates,
    /// Check that every command is followed by an event
    Validate {
        /// Exit with an error when the flow is invalid
        #[arg(long)]
        strict: bool,
    },
    /// Route one connection, or every connection when no cards are given
    Route { from: Option<String>, to: Option<String> },
    /// Export the board as Mermaid flowchart text
    Export {
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// Group clustered cards into subgraphs
        #[arg(long)]
        aggregates: bool,
    },
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let _logger = init_logging(args.verbose)?;
    execute(args)
}

fn execute(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let path = args.board.as_path();

    match args.command {
        Command::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force)", path.display());
            }
            write_board(&Board::with_config(config), path)?;
        }
        Command::Add {
            name,
            kind,
            x,
            y,
            description,
            near,
        } => {
            let mut board = read_board(path, config)?;
            let mut position = Position::new(x, y)?;
            if near {
                position = board.find_free_position(&name, position);
            }
            let id = board.create_card(&name, kind, position.x, position.y, description)?;
            write_board(&board, path)?;
            println!("{id}");
        }
        Command::Move { card, x, y } => {
            let mut board = read_board(path, config)?;
            let id = resolve_card(&board, &card)?;
            board.move_card(id, x, y)?;
            write_board(&board, path)?;
        }
        Command::Rename { card, name } => {
            let mut board = read_board(path, config)?;
            let id = resolve_card(&board, &card)?;
            board.rename_card(id, &name)?;
            write_board(&board, path)?;
        }
        Command::Retype { card, kind } => {
            let mut board = read_board(path, config)?;
            let id = resolve_card(&board, &card)?;
            board.retype_card(id, kind)?;
            write_board(&board, path)?;
        }
        Command::Describe { card, text } => {
            let mut board = read_board(path, config)?;
            let id = resolve_card(&board, &card)?;
            board.describe_card(id, text)?;
            write_board(&board, path)?;
        }
        Command::Remove { card } => {
            let mut board = read_board(path, config)?;
            let id = resolve_card(&board, &card)?;
            board.remove_card(id)?;
            write_board(&board, path)?;
        }
        Command::Connect { from, to } => {
            let mut board = read_board(path, config)?;
            let (from, to) = (resolve_card(&board, &from)?, resolve_card(&board, &to)?);
            board.add_connection(from, to)?;
            write_board(&board, path)?;
        }
        Command::Disconnect { from, to } => {
            let mut board = read_board(path, config)?;
            let (from, to) = (resolve_card(&board, &from)?, resolve_card(&board, &to)?);
            board.remove_connection(from, to)?;
            write_board(&board, path)?;
        }
        Command::Aggregates => {
            let mut board = read_board(path, config)?;
            let aggregates = board.detect_aggregates();
            println!("{}", serde_json::to_string_pretty(aggregates)?);
        }
        Command::Validate { strict } => {
            let board = read_board(path, config)?;
            let report = board.validate_flow();
            println!("{}", serde_json::to_string_pretty(&report)?);
            if strict && !report.is_valid {
                anyhow::bail!("flow has {} error(s)", report.errors.len());
            }
        }
        Command::Route { from, to } => {
            let board = read_board(path, config)?;
            match (from, to) {
                (Some(from), Some(to)) => {
                    let (from, to) = (resolve_card(&board, &from)?, resolve_card(&board, &to)?);
                    let points = board.route_connection(from, to)?;
                    println!("{}", serde_json::to_string_pretty(&points)?);
                }
                (None, None) => {
                    let routes = board.route_all()?;
                    println!("{}", serde_json::to_string_pretty(&routes)?);
                }
                _ => anyhow::bail!("route needs both cards or neither"),
            }
        }
        Command::Export { output, aggregates } => {
            let mut board = read_board(path, config)?;
            if aggregates {
                board.detect_aggregates();
            }
            let text = to_flowchart(&board, &board.config().palette);
            match output {
                Some(path) => std::fs::write(&path, text)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{text}"),
            }
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) -> Result<LoggerHandle> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let handle = Logger::try_with_env_or_str(level)?
        .log_to_stderr()
        .start()?;
    Ok(handle)
}

fn read_board(path: &Path, config: BoardConfig) -> Result<Board> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read board {}", path.display()))?;
    let snapshot: BoardSnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a board snapshot", path.display()))?;
    Ok(Board::from_snapshot(snapshot, config)?)
}

fn write_board(board: &Board, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&board.snapshot())?;
    std::fs::write(path, json).with_context(|| format!("failed to write board {}", path.display()))
}

/// Accepts a card id or an exact, unique card name.
fn resolve_card(board: &Board, reference: &str) -> Result<CardId> {
    if let Ok(id) = Uuid::parse_str(reference.trim()) {
        if board.card(id).is_some() {
            return Ok(id);
        }
    }
    board
        .find_by_name(reference)
        .map(|card| card.id())
        .ok_or_else(|| anyhow::anyhow!("no unique card matches `{reference}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_command() {
        let args = Args::try_parse_from([
            "stormb", "-b", "wall.json", "add", "--name", "Order Placed", "-t", "domain-event",
            "-x", "100", "-y", "40", "--near",
        ])
        .unwrap();
        assert_eq!(args.board, PathBuf::from("wall.json"));
        match args.command {
            Command::Add { name, kind, x, near, .. } => {
                assert_eq!(name, "Order Placed");
                assert_eq!(kind, CardType::DomainEvent);
                assert_eq!(x, 100.0);
                assert!(near);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_card_type() {
        assert!(Args::try_parse_from(["stormb", "add", "--name", "A", "-t", "hotspot", "-x", "0", "-y", "0"]).is_err());
    }

    fn scratch_board() -> PathBuf {
        std::env::temp_dir().join(format!("stormb-{}.json", Uuid::new_v4()))
    }

    fn execute_with(board: &Path, rest: &[&str]) -> Result<()> {
        let board = board.to_string_lossy().into_owned();
        let mut argv = vec!["stormb", "-b", board.as_str()];
        argv.extend_from_slice(rest);
        execute(Args::try_parse_from(argv)?)
    }

    #[test]
    fn init_then_add_round_trips_through_the_snapshot_file() {
        let path = scratch_board();
        execute_with(&path, &["init"]).unwrap();
        assert!(execute_with(&path, &["init"]).is_err());
        execute_with(&path, &["init", "--force"]).unwrap();

        execute_with(&path, &["add", "--name", "Place Order", "-t", "command", "-x", "0", "-y", "0"])
            .unwrap();
        execute_with(&path, &["rename", "Place Order", "Submit Order"]).unwrap();

        let board = read_board(&path, BoardConfig::default()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(board.len(), 1);
        assert!(board.find_by_name("Submit Order").is_some());
    }

    #[test]
    fn commands_other_than_init_need_an_existing_board() {
        let path = scratch_board();
        assert!(execute_with(&path, &["validate"]).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn resolves_cards_by_id_or_name() {
        let mut board = Board::new();
        let id = board.create_card("Ship", CardType::Command, 0.0, 0.0, None).unwrap();
        assert_eq!(resolve_card(&board, &id.to_string()).unwrap(), id);
        assert_eq!(resolve_card(&board, "Ship").unwrap(), id);
        assert!(resolve_card(&board, "Missing").is_err());
    }
}
