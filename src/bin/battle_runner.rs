//! Headless Battle Runner
//!
//! Plays one AI vs AI battle with seeded dice and prints the result.

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use titan_battle::battle::{
    archetype, begin_battle, play_battle, BattleEvent, BattlePorts, BattleResult, BattlelandKind,
    ChaChaDice, InMemoryStrategy, LegionSetup, Seats, StrategyKind, UnitSetup,
};
use titan_battle::core::config::{load_config, EngineConfig};
use titan_battle::core::error::{BattleError, Result};
use titan_battle::core::types::PlayerId;

/// Headless Battle Runner - AI vs AI battles
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Play an AI vs AI battle and print the result")]
struct Args {
    /// TOML config with [rules] and [runner] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Battleland to fight on (Plains, Woods, Desert, ...)
    #[arg(long, value_parser = parse_terrain)]
    terrain: Option<BattlelandKind>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    attacker_strategy: Option<StrategyKind>,

    #[arg(long, value_enum)]
    defender_strategy: Option<StrategyKind>,

    /// Attacking creatures, comma separated
    #[arg(long, default_value = "Titan,Angel,Ogre,Ogre,Centaur,Centaur")]
    attacker: String,

    /// Defending creatures, comma separated
    #[arg(long, default_value = "Titan,Troll,Troll,Gargoyle,Lion")]
    defender: String,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Include the full event log
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct Report<'a> {
    terrain: BattlelandKind,
    seed: u64,
    attacker_strategy: StrategyKind,
    defender_strategy: StrategyKind,
    result: &'a BattleResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<&'a [BattleEvent]>,
}

fn parse_terrain(name: &str) -> std::result::Result<BattlelandKind, String> {
    BattlelandKind::from_name(name).ok_or_else(|| format!("unknown battleland '{}'", name))
}

fn parse_legion(player: &str, creatures: &str) -> Result<LegionSetup> {
    creatures
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .try_fold(LegionSetup::new(PlayerId::new(player)), |legion, name| {
            let kind = archetype(name)
                .ok_or_else(|| BattleError::InvalidSetup(format!("unknown creature '{}'", name)))?;
            Ok(legion.with(UnitSetup::new(kind)))
        })
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(terrain) = args.terrain {
        config.runner.terrain = terrain;
    }
    if let Some(kind) = args.attacker_strategy {
        config.runner.attacker_strategy = kind;
    }
    if let Some(kind) = args.defender_strategy {
        config.runner.defender_strategy = kind;
    }
    let seed = args
        .seed
        .or(config.runner.seed)
        .unwrap_or_else(rand::random);
    let runner = &config.runner;

    let attacker = parse_legion("Attacker", &args.attacker)?;
    let defender = parse_legion("Defender", &args.defender)?;

    let ports = BattlePorts::new(
        ChaChaDice::new(seed),
        Seats::new(runner.attacker_strategy, runner.defender_strategy),
        InMemoryStrategy::new(),
    );
    let mut battle = begin_battle(
        config.rules.clone(),
        runner.terrain,
        &attacker,
        &defender,
        runner.attacker_entry_side,
        ports,
    )?;
    let mut seats = Seats::new(runner.attacker_strategy, runner.defender_strategy);
    let result = play_battle(&mut battle, &mut seats)?;

    let report = Report {
        terrain: runner.terrain,
        seed,
        attacker_strategy: runner.attacker_strategy,
        defender_strategy: runner.defender_strategy,
        result: &result,
        events: args.verbose.then(|| battle.events()),
    };

    match args.format.as_str() {
        "text" => print_text(&report),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn print_text(report: &Report) {
    let result = report.result;
    println!("Battle Result");
    println!("=============");
    println!("Battleland: {}", report.terrain.name());
    match result.winner {
        Some(side) => println!("Winner: {:?} ({:?})", side, result.cause),
        None => println!("No winner ({:?})", result.cause),
    }
    println!("Final round: {}", result.final_round);
    println!(
        "Points: attacker {}, defender {}, awarded {}",
        result.attacker_points, result.defender_points, result.points_awarded
    );
    println!("Scoring: {:?}", result.scoring);
    println!();
    println!("Survivors:");
    for survivor in &result.survivors {
        println!(
            "  {:?} {} on {} ({} damage)",
            survivor.side, survivor.creature, survivor.hex, survivor.damage
        );
    }
    if let Some(events) = report.events {
        println!();
        for event in events {
            println!("  [{} {:?}] {}", event.round, event.phase, event.description);
        }
    }
    println!();
    println!(
        "Strategies: {:?} vs {:?}",
        report.attacker_strategy, report.defender_strategy
    );
    println!("Seed: {}", report.seed);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("titan_battle=info".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("battle_runner: {}", e);
        std::process::exit(1);
    }
}
