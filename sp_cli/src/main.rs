//! Command-line front end for Swiss-system pairing.
//!
//! Embeds the `swiss_pairing` core against PostgreSQL: register players,
//! report results, and print standings or the next round's pairings.

use std::sync::Arc;

use anyhow::{Error, anyhow, bail};
use log::{error, info};
use pico_args::Arguments;
use swiss_pairing::{
    MatchHistory, PairingConfig, PairingEngine, PairingError, PairingStrategy, RoundPairings,
    StandingRow, StandingsProvider, TournamentRepository,
    db::{Database, DatabaseConfig},
};

const HELP: &str = "\
Run Swiss-system tournament pairing against a PostgreSQL store

USAGE:
  sp_cli [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
  migrate                  Create the players/matches tables if missing
  register <NAME>          Register a player
  report <WINNER> <LOSER>  Record a match result by player id
  standings                Print current standings
  pairings                 Pair the next round (records a bye if needed)
  matches                  Print the recorded match history
  count                    Print the number of registered players
  reset                    Delete all matches and players

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --strategy   NAME        greedy | matching           [default: env PAIRING_STRATEGY or greedy]

FLAGS:
  --json                   Print JSON instead of text
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  PAIRING_STRATEGY         Pairing strategy
  RUST_LOG                 Log level (e.g. info, debug)
";

struct Args {
    database_url: Option<String>,
    strategy: Option<PairingStrategy>,
    json: bool,
    command: Command,
}

enum Command {
    Migrate,
    Register(String),
    Report(i32, i32),
    Standings,
    Pairings,
    Matches,
    Count,
    Reset,
}

fn parse_args(mut pargs: Arguments) -> Result<Args, Error> {
    let database_url = pargs.opt_value_from_str("--db-url")?;
    let strategy = pargs
        .opt_value_from_fn("--strategy", |s| s.parse::<PairingStrategy>())?;
    let json = pargs.contains("--json");

    let command = match pargs.subcommand()?.as_deref() {
        Some("migrate") => Command::Migrate,
        Some("register") => Command::Register(pargs.free_from_str()?),
        Some("report") => Command::Report(pargs.free_from_str()?, pargs.free_from_str()?),
        Some("standings") => Command::Standings,
        Some("pairings") => Command::Pairings,
        Some("matches") => Command::Matches,
        Some("count") => Command::Count,
        Some("reset") => Command::Reset,
        Some(other) => bail!("unknown command: {other}\n\n{HELP}"),
        None => bail!("missing command\n\n{HELP}"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }

    Ok(Args {
        database_url,
        strategy,
        json,
        command,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    env_logger::builder().format_target(false).init();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = parse_args(pargs)?;

    let mut db_config = DatabaseConfig::from_env();
    if let Some(url) = args.database_url {
        db_config = db_config.with_url(url);
    }
    let mut pairing_config = PairingConfig::from_env();
    if let Some(strategy) = args.strategy {
        pairing_config.strategy = strategy;
    }

    let db = Database::new(&db_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    info!("Database connected successfully");

    let repo: Arc<dyn TournamentRepository> = Arc::new(db.repository());
    let result = run(&db, repo, pairing_config, args.command, args.json).await;

    db.close().await;
    result
}

async fn run(
    db: &Database,
    repo: Arc<dyn TournamentRepository>,
    pairing_config: PairingConfig,
    command: Command,
    json: bool,
) -> Result<(), Error> {
    match command {
        Command::Migrate => {
            db.migrate().await?;
            println!("Schema is up to date");
        }
        Command::Register(name) => {
            let id = repo.register_player(&name).await.map_err(user_facing)?;
            println!("Registered {name} as player {id}");
        }
        Command::Report(winner, loser) => {
            MatchHistory::new(repo)
                .record_match(winner, loser)
                .await
                .map_err(user_facing)?;
            println!("Recorded: {winner} beat {loser}");
        }
        Command::Standings => {
            let standings = StandingsProvider::new(repo)
                .standings()
                .await
                .map_err(user_facing)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&standings)?);
            } else {
                print_standings(&standings);
            }
        }
        Command::Pairings => {
            info!("Pairing next round with {} strategy", pairing_config.strategy);
            let round = PairingEngine::new(repo, pairing_config)
                .next_round_pairings()
                .await
                .map_err(user_facing)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&round)?);
            } else {
                print_round(&round);
            }
        }
        Command::Matches => {
            let matches = MatchHistory::new(repo)
                .matches()
                .await
                .map_err(user_facing)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                for (n, record) in matches.iter().enumerate() {
                    let (winner, loser) = record.to_columns();
                    if record.is_bye() {
                        println!("{:>4}  bye for {winner}", n + 1);
                    } else {
                        println!("{:>4}  {winner} beat {loser}", n + 1);
                    }
                }
            }
        }
        Command::Count => {
            println!("{}", repo.count_players().await.map_err(user_facing)?);
        }
        Command::Reset => {
            repo.delete_players().await.map_err(user_facing)?;
            println!("Deleted all players and matches");
        }
    }

    Ok(())
}

/// Log storage details, show the user only the sanitized message
fn user_facing(err: PairingError) -> Error {
    if err.is_storage() {
        error!("{err}");
    }
    anyhow!(err.client_message())
}

fn print_standings(standings: &[StandingRow]) {
    let width = standings
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    println!("{:>4}  {:<width$}  {:>4}  {:>7}", "ID", "NAME", "WINS", "MATCHES");
    for row in standings {
        println!(
            "{:>4}  {:<width$}  {:>4}  {:>7}",
            row.id, row.name, row.wins, row.matches_played
        );
    }
}

fn print_round(round: &RoundPairings) {
    for (table, p) in round.pairings.iter().enumerate() {
        println!(
            "Table {}: {} ({}) vs {} ({})",
            table + 1,
            p.name1,
            p.id1,
            p.name2,
            p.id2
        );
    }
    if let Some(bye) = &round.bye {
        println!("Bye: {} ({})", bye.name, bye.id);
    }
    for player in &round.unpaired {
        println!(
            "Unpaired: {} ({}) has played every remaining opponent",
            player.name, player.id
        );
    }
}
