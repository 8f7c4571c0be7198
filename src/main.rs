// Blood on the Clocktower Storyteller helper
//
// Every subcommand loads the saved session, applies one action and saves it
// again, so a game can be run one command at a time.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use botc_night::config::Settings;
use botc_night::script::{format_bag, match_role_name, parse_bag};
use botc_night::setup::{analyze_distribution, validate_setup, DistributionAnalysis, SetupReport};
use botc_night::{Phase, SavedPlayerNames, Script, ScriptCatalog, Session, SnapshotStore};

/// BotC Storyteller night helper
#[derive(Parser, Debug)]
#[command(name = "botc-night")]
#[command(about = "Blood on the Clocktower setup validator and night order helper", long_about = None)]
struct Cli {
    /// Session snapshot file (env: BOTC_STATE_PATH)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Remembered player names file (env: BOTC_NAMES_PATH)
    #[arg(long, global = true)]
    names: Option<PathBuf>,

    /// Script catalog override (env: BOTC_SCRIPTS_PATH)
    #[arg(long, global = true)]
    scripts: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available scripts
    Scripts,

    /// Choose the script for this game
    Select {
        /// Script id or name (e.g., "trouble-brewing", "tb")
        script: String,
    },

    /// Manage the seated players
    Players {
        #[command(subcommand)]
        action: PlayersAction,
    },

    /// Deal roles to named players, or seat one player per role
    SkipAssignments {
        #[arg(action = clap::ArgAction::Set)]
        skip: bool,
    },

    /// Manage the role bag
    Bag {
        #[command(subcommand)]
        action: BagAction,
    },

    /// Check the role bag against the expected distribution
    Validate,

    /// Give a player a role (omit the role to clear it)
    Assign { player: u8, role: Option<String> },

    /// Show the session
    Status,

    /// Show the steps the next (or current) night will run
    Plan,

    /// Start the next night
    StartNight,

    /// Move on to the next night step
    Next,

    /// End the night and resolve the kill
    EndNight,

    /// Record tonight's reminders
    Remind {
        #[command(subcommand)]
        action: RemindAction,
    },

    /// Toggle a player status flag
    Flag { player: u8, flag: PlayerFlag },

    /// Throw away the current game
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Validate a role distribution bag
    ValidateRoleDistribution {
        /// Role bag in format: {role1 role2 role3 ...}
        bag: String,

        /// Optional script to check against (e.g., "trouble-brewing", "tb")
        #[arg(short, long)]
        script: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum PlayersAction {
    /// Set the number of players (5 to 15)
    Count { count: i64 },
    /// Add one more seat
    Add,
    /// Rename a seat
    Name { player: u8, name: String },
    /// Seat remembered names in order (all remembered names when none given)
    Seed { names: Vec<String> },
    /// Give every seat its default name
    Defaults,
    /// List remembered names
    Saved,
    /// Forget remembered names
    Forget { names: Vec<String> },
}

#[derive(Subcommand, Debug)]
enum BagAction {
    /// Add or remove one role
    Toggle { role: String },
    /// Replace the bag: {role1 role2 ...}
    Set { bag: String },
    /// Fill the bag with a recommended setup
    Recommend,
    /// Choose the Townsfolk the Drunk thinks they are (omit to clear)
    DrunkExtra { role: Option<String> },
}

#[derive(Subcommand, Debug)]
enum RemindAction {
    /// Player the Demon killed (omit to clear)
    Kill { player: Option<u8> },
    /// Player the Monk protected (omit to clear)
    Protect { player: Option<u8> },
    /// Free-text notes for tonight
    Notes { text: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PlayerFlag {
    Alive,
    Drunk,
    Poisoned,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(cli.state, cli.names, cli.scripts);
    let catalog = ScriptCatalog::load(settings.scripts_path.as_deref());

    let Some(command) = cli.command else {
        println!("=== BotC Night Helper ===\n");
        println!("Run with: botc-night <command>  (see --help)\n");
        println!("Typical game:");
        println!("  select tb, players count 8, bag recommend, validate,");
        println!("  start-night, next ..., remind kill 3, end-night");
        return;
    };

    if let Err(e) = run(command, &settings, &catalog) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command, settings: &Settings, catalog: &ScriptCatalog) -> Result<(), String> {
    let store = SnapshotStore::new(&settings.state_path);

    match command {
        Command::Scripts => {
            for script in catalog.iter() {
                println!("{} ({})", script.title(), script.id());
            }
            return Ok(());
        }
        Command::ValidateRoleDistribution { bag, script } => {
            return validate_role_distribution_cmd(catalog, &bag, script.as_deref());
        }
        Command::Reset { yes } => {
            if !yes {
                println!("Reset the current game? This will clear all saved progress.");
                println!("Run again with --yes to confirm. Nothing was changed.");
                return Ok(());
            }
            let mut session = store.load_or_default(catalog);
            session.reset();
            store.clear().map_err(|e| e.to_string())?;
            println!("Game reset.");
            return Ok(());
        }
        _ => {}
    }

    let mut session = store.load_or_default(catalog);

    match command {
        Command::Select { script } => {
            let script = catalog
                .from_name(&script)
                .ok_or_else(|| format!("Unknown script '{}'", script))?;
            session.select_script(catalog, script.id());
            println!("Using script: {}", script.title());
        }
        Command::Players { action } => players_cmd(&mut session, settings, action)?,
        Command::SkipAssignments { skip } => {
            session.set_skip_assignments(skip);
            if skip && session.phase() != Phase::Idle {
                println!("The roster is kept until the game is reset.");
            }
            session.seat_roles_for_night();
        }
        Command::Bag { action } => {
            let script = require_script(&session, catalog)?;
            bag_cmd(&mut session, catalog, script, action)?;
            print_validation(&session, script);
        }
        Command::Validate => {
            let script = require_script(&session, catalog)?;
            print_validation(&session, script);
        }
        Command::Assign { player, role } => {
            let script = require_script(&session, catalog)?;
            let role = role
                .map(|role| match_role_name(&role, script))
                .transpose()?;
            session.assign_character(player, role.as_deref());
            let assigned = session.player(player).and_then(|p| p.character.as_deref());
            if assigned != role.as_deref() {
                return Err(format!(
                    "Cannot give player {} that role (not in the bag, or already dealt)",
                    player
                ));
            }
        }
        Command::Status => print_status(&session, catalog),
        Command::Plan => {
            let steps = session.planned_steps(catalog);
            println!("{}:", session.night_type().label());
            if steps.is_empty() {
                println!("  (no active roles)");
            }
            for (n, step) in steps.iter().enumerate() {
                println!("  {}. {}", n + 1, step);
            }
        }
        Command::StartNight => {
            require_script(&session, catalog)?;
            if session.phase() == Phase::Running {
                return Err("A night is already running".to_string());
            }
            session.seat_roles_for_night();
            session.start_night(catalog);
            print_night(&session, catalog);
        }
        Command::Next => {
            session.advance_step(catalog);
            print_night(&session, catalog);
        }
        Command::EndNight => {
            if session.end_night().is_none() {
                return Err("No night is running".to_string());
            }
            print_night(&session, catalog);
        }
        Command::Remind { action } => match action {
            RemindAction::Kill { player } => session.set_kill_target(player),
            RemindAction::Protect { player } => session.set_protect_target(player),
            RemindAction::Notes { text } => session.set_notes(&text),
        },
        Command::Flag { player, flag } => match flag {
            PlayerFlag::Alive => session.toggle_alive(player),
            PlayerFlag::Drunk => session.toggle_drunk(player),
            PlayerFlag::Poisoned => session.toggle_poisoned(player),
        },
        Command::Scripts | Command::ValidateRoleDistribution { .. } | Command::Reset { .. } => {
            unreachable!("handled before the session is loaded")
        }
    }

    store.save(&session).map_err(|e| e.to_string())
}

fn require_script<'a>(session: &Session, catalog: &'a ScriptCatalog) -> Result<&'a Script, String> {
    session
        .script(catalog)
        .ok_or_else(|| "No script selected (use `select <script>`)".to_string())
}

fn players_cmd(
    session: &mut Session,
    settings: &Settings,
    action: PlayersAction,
) -> Result<(), String> {
    let mut saved = SavedPlayerNames::load(&settings.names_path);

    match action {
        PlayersAction::Count { count } => session.apply_player_count(count),
        PlayersAction::Add => session.add_player(),
        PlayersAction::Name { player, name } => session.set_player_name(player, &name, &mut saved),
        PlayersAction::Seed { names } => {
            if names.is_empty() {
                session.seed_names(saved.names());
            } else {
                saved.add_many(&names);
                session.seed_names(&names);
            }
        }
        PlayersAction::Defaults => session.fill_with_default_names(),
        PlayersAction::Saved => {
            if saved.names().is_empty() {
                println!("No remembered names");
            }
            for name in saved.names() {
                println!("  {}", name);
            }
        }
        PlayersAction::Forget { names } => saved.remove_many(&names),
    }

    saved.save(&settings.names_path).map_err(|e| e.to_string())?;
    for player in session.players() {
        println!("  {}. {}", player.id, player.name);
    }
    Ok(())
}

fn bag_cmd(
    session: &mut Session,
    catalog: &ScriptCatalog,
    script: &Script,
    action: BagAction,
) -> Result<(), String> {
    match action {
        BagAction::Toggle { role } => {
            let role = match_role_name(&role, script)?;
            session.toggle_role(catalog, &role);
        }
        BagAction::Set { bag } => {
            let roles = parse_bag(&bag, script)?;
            session.set_role_bag(catalog, &roles);
        }
        BagAction::Recommend => session.apply_recommended_fill(catalog),
        BagAction::DrunkExtra { role } => {
            let role = role
                .map(|role| match_role_name(&role, script))
                .transpose()?;
            session.set_drunk_extra_role(catalog, role.as_deref());
            if session.drunk_extra_role() != role.as_deref() {
                return Err("The Drunk can only believe they are a Townsfolk".to_string());
            }
        }
    }
    Ok(())
}

fn print_validation(session: &Session, script: &Script) {
    let report = validate_setup(
        script,
        session.player_count(),
        session.role_bag(),
        session.drunk_extra_role(),
    );
    println!("Bag: {}", format_bag(session.role_bag()));
    match report.expected {
        Some(expected) => println!("  Expected: {}  Selected: {}", expected, report.actual),
        None => println!("  Expected: unknown  Selected: {}", report.actual),
    }
    if report.is_complete {
        println!("✓ Setup complete for {} players", session.player_count());
    } else {
        println!("✗ Setup incomplete");
        for problem in report.problems() {
            println!("    • {}", problem);
        }
    }
}

fn print_status(session: &Session, catalog: &ScriptCatalog) {
    match session.script(catalog) {
        Some(script) => println!("Script: {}", script.title()),
        None => println!("Script: (none)"),
    }
    println!(
        "Phase: {:?}  Nights completed: {}  Next: {}",
        session.phase(),
        session.nights_completed(),
        session.night_type().label()
    );
    println!("Bag: {}", format_bag(session.role_bag()));
    if let Some(extra) = session.drunk_extra_role() {
        println!("Drunk believes they are: {}", extra);
    }
    println!("Players:");
    for player in session.players() {
        let mut flags = Vec::new();
        if !player.is_alive {
            flags.push("dead");
        }
        if player.is_drunk {
            flags.push("drunk");
        }
        if player.is_poisoned {
            flags.push("poisoned");
        }
        println!(
            "  {}. {} - {}{}",
            player.id,
            player.name,
            player.character.as_deref().unwrap_or("Unassigned"),
            if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            }
        );
    }
    if !session.dawn_summary().is_empty() {
        println!("\n{}", session.dawn_summary());
    }
}

fn print_night(session: &Session, catalog: &ScriptCatalog) {
    match session.current_step(catalog) {
        Some(step) => {
            println!("Current Role: {}", step);
            if let Some(prompt) = session.current_prompt(catalog) {
                println!("  {}", prompt);
            }
            for player in session.current_players(catalog) {
                let state = if player.is_alive { "Alive" } else { "Dead" };
                println!("  Wake: {} ({})", player.name, state);
            }
            if session.current_role_is_compromised(catalog) {
                println!("  REMINDER: This player is drunk or poisoned. You may give them false information.");
            }
        }
        None => println!("{}", session.dawn_summary()),
    }
}

fn explain_distribution_error(analysis: &DistributionAnalysis, problems: &[String]) {
    println!("INVALID: This role distribution violates BotC setup rules\n");

    // Show the chain of reasoning
    match analysis.base {
        Some(base) => println!("  Base setup: {}", base),
        None => println!("  Base setup: unknown for this player count"),
    }

    if !analysis.modifiers.is_empty() {
        println!("  Setup modifications:");
        for (role_name, modifier) in &analysis.modifiers {
            println!("    {}", modifier.describe(role_name));
        }
        if let Some(expected) = analysis.expected {
            println!("  Required distribution: {}", expected);
        }
    }

    println!("  Your bag contains: {}", analysis.actual);

    if !problems.is_empty() {
        println!("\n  Problems:");
        for problem in problems {
            println!("    • {}", problem);
        }
    }
}

fn validate_role_distribution_cmd(
    catalog: &ScriptCatalog,
    bag_str: &str,
    script_name: Option<&str>,
) -> Result<(), String> {
    let script = match script_name {
        Some(name) => catalog.from_name(name).ok_or_else(|| {
            let available: Vec<&str> = catalog.iter().map(Script::id).collect();
            format!(
                "Unknown script '{}'\nAvailable scripts: {}",
                name,
                available.join(", ")
            )
        })?,
        None => catalog.iter().next().ok_or("Script catalog is empty")?,
    };
    println!("Using script: {}", script.title());
    println!("Validating role distribution: {}", bag_str);

    let roles = parse_bag(bag_str, script).map_err(|e| format!("Error parsing bag: {}", e))?;
    let player_count = u8::try_from(roles.len()).map_err(|_| "Bag is too large".to_string())?;
    println!("  Player count: {}", player_count);
    println!("  Roles specified:");
    for role in &roles {
        if let Some(team) = script.team_of(role) {
            println!("    - {} ({:?})", role, team);
        }
    }

    // Only the counts matter here; there is no session to pick the Drunk's role in.
    let report = SetupReport {
        missing_drunk_extra: false,
        ..validate_setup(script, player_count, &roles, None)
    };

    println!("\n=== RESULT ===");
    if report.problems().is_empty() && report.expected.is_some() {
        println!("✓ VALID: Legal role distribution for {} players", player_count);
        Ok(())
    } else {
        let analysis = analyze_distribution(script, player_count, &roles);
        explain_distribution_error(&analysis, &report.problems());
        std::process::exit(1);
    }
}
