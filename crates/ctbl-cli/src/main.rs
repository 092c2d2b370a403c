// CTBL command-line entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout stays clean for tables and JSON)
// 2. Load config (copying defaults/ into config/ on first run)
// 3. Load the stats CSV and compute the metrics batch
// 4. Run the requested query and print it

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use ctbl_core::config::{self, Config};
use ctbl_core::leaderboard::{leaders, team_leaders, LeaderRow};
use ctbl_core::lineup::{build_lineup, Lineup, LineupOutcome, LineupSlot};
use ctbl_core::metrics::{compute_batch, MetricsBatch, Stat};
use ctbl_core::roster::{load_dataset, Dataset};

#[derive(Parser)]
#[command(
    name = "ctbl",
    about = "CTBL stats: team leaderboards and batting-order builder"
)]
struct Cli {
    /// Project directory holding defaults/ and config/. Defaults to the
    /// current directory.
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Stats CSV to read instead of `data_paths.stats` from league.toml.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Top qualified hitters by stat, for one team or the whole league.
    Leaders {
        /// Team name. Omit for league-wide leaders.
        #[arg(long)]
        team: Option<String>,

        /// Stat to rank by (AVG, OBP, SLG, OPS, wOBA, wRAA). Omit to print
        /// every stat for `--team`.
        #[arg(long)]
        stat: Option<Stat>,

        /// Rows per board. Defaults to `leaderboard.top_n`.
        #[arg(long)]
        top: Option<usize>,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Build the batting order for a team.
    Lineup {
        /// Team name. Defaults to `team` from lineup.toml. Another team
        /// gets no handedness data or overrides from lineup.toml.
        #[arg(long)]
        team: Option<String>,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List teams in the dataset.
    Teams,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let base_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    config::ensure_config_files(&base_dir).context("failed to prepare config files")?;
    let config = config::load_config_from(&base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, min PA {}, wOBA scale {}",
        config.league.name, config.stats.min_pa, config.stats.woba_scale
    );

    let data_path = cli
        .data
        .clone()
        .unwrap_or_else(|| base_dir.join(&config.data_paths.stats));
    let dataset = load_dataset(&data_path)
        .with_context(|| format!("failed to load stats from {}", data_path.display()))?;
    info!(
        "Stats generation from {} loaded at {}",
        dataset.source,
        dataset.loaded_at.to_rfc3339()
    );
    let batch = compute_batch(&dataset.records, &config.stats);

    match cli.command {
        Commands::Leaders {
            team,
            stat,
            top,
            json,
        } => {
            let top_n = top.unwrap_or(config.leaderboard.top_n);
            run_leaders(&config, &batch, team.as_deref(), stat, top_n, json)
        }
        Commands::Lineup { team, json } => run_lineup(&config, &batch, team, json),
        Commands::Teams => {
            run_teams(&config, &dataset);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_leaders(
    config: &Config,
    batch: &MetricsBatch,
    team: Option<&str>,
    stat: Option<Stat>,
    top_n: usize,
    json: bool,
) -> anyhow::Result<()> {
    let min_pa = config.stats.min_pa;
    match (team, stat) {
        (_, Some(stat)) => {
            let rows = leaders(batch, team, stat, min_pa, top_n);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No qualified players for {}", team.unwrap_or("the league"));
            } else {
                print_board(stat, &rows);
            }
        }
        (Some(team), None) => {
            let boards = team_leaders(batch, team, min_pa, top_n);
            if json {
                println!("{}", serde_json::to_string_pretty(&boards)?);
            } else if boards.is_empty() {
                println!("No qualified players for {team}");
            } else {
                println!("{team} leaders (min {min_pa} PA)");
                for board in &boards {
                    println!();
                    print_board(board.stat, &board.rows);
                }
            }
        }
        (None, None) => bail!("league-wide leaders need --stat"),
    }
    Ok(())
}

fn run_lineup(
    config: &Config,
    batch: &MetricsBatch,
    team: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let lineup_config = match team.as_deref() {
        Some(team) => config.lineup.retarget(team),
        None => config.lineup.clone(),
    };

    let outcome = build_lineup(batch, &lineup_config, config.stats.min_pa)
        .with_context(|| format!("cannot build lineup for {}", lineup_config.team))?;
    match outcome {
        LineupOutcome::NoQualifiedPlayers => {
            if json {
                println!("null");
            } else {
                println!("No qualified players for {}", lineup_config.team);
            }
        }
        LineupOutcome::Ready(lineup) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&lineup)?);
            } else {
                print_lineup(&lineup);
            }
        }
    }
    Ok(())
}

fn run_teams(config: &Config, dataset: &Dataset) {
    let teams = if config.league.teams.is_empty() {
        dataset.teams()
    } else {
        config.league.teams.clone()
    };
    println!("{}", config.league.name);
    for team in teams {
        println!("  {team}");
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_board(stat: Stat, rows: &[LeaderRow]) {
    println!("{:>3}  {:<24} {:<26} {:>4} {:>8}", "#", "Name", "Team", "PA", stat);
    for (rank, row) in rows.iter().enumerate() {
        println!(
            "{:>3}  {:<24} {:<26} {:>4} {:>8.3}",
            rank + 1,
            row.name,
            row.team,
            row.pa,
            row.value
        );
    }
}

fn print_slot(slot: &LineupSlot) {
    println!(
        "{:>3}  {:<2} {:<24} {:>6.3} {:>6.3} {:>6.3} {:>6.3} {:>6.3} {:>7.3}{}",
        slot.slot,
        slot.handedness,
        slot.name,
        slot.avg,
        slot.obp,
        slot.slg,
        slot.ops,
        slot.woba,
        slot.wraa,
        if slot.fixed { "  *" } else { "" }
    );
}

fn print_lineup(lineup: &Lineup) {
    println!("{} batting order", lineup.team);
    println!(
        "{:>3}  {:<2} {:<24} {:>6} {:>6} {:>6} {:>6} {:>6} {:>7}",
        "#", "B", "Name", "AVG", "OBP", "SLG", "OPS", "wOBA", "wRAA"
    );
    for slot in lineup.active() {
        print_slot(slot);
    }
    if !lineup.bench().is_empty() {
        println!("Bench");
        for slot in lineup.bench() {
            print_slot(slot);
        }
    }
    println!();
    println!(
        "Handedness penalty {} -> {} ({} swaps). * = manager override",
        lineup.initial_penalty,
        lineup.final_penalty,
        lineup.swaps.len()
    );
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ctbl=info,ctbl_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
