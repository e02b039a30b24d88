use clap::error::ErrorKind;
use clap::Parser;
use eyre::Result;
use malmo_agent_lib::{
    init_tracing, ActionPolicy, Agent, RecordSpec, RunConfig, SimulatedPlatform, SystemClock,
    DEFAULT_LOG_LEVEL,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "simple_env")]
#[command(version, about = "Walk an agent through the simple flat-world mission")]
struct Cli {
    /// TOML run configuration; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Root directory for per-run image folders
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip writing frames to disk
    #[arg(long)]
    no_save_images: bool,

    /// alternate | simultaneous
    #[arg(long)]
    action_policy: Option<ActionPolicy>,

    /// Velocity sent with move and strafe commands
    #[arg(long, allow_negative_numbers = true)]
    velocity: Option<f64>,

    /// Simulated mission length in ticks
    #[arg(long)]
    mission_ticks: Option<u64>,

    /// Drop the settle delays, for quick runs against the simulation
    #[arg(long)]
    no_settle: bool,

    /// Print the mission XML and exit
    #[arg(long)]
    print_mission: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let _guard = init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    if cli.print_mission {
        println!("{}", config.mission.to_mission_xml());
        return Ok(());
    }

    let platform = SimulatedPlatform::new(config.simulation.clone());
    let mut agent = Agent::new(platform, SystemClock::new(), config.agent.clone());

    info!(
        "Running '{}' with {:?} actions at velocity {}",
        config.mission.summary, config.agent.actions.policy, config.agent.actions.velocity
    );

    let summary = agent.execute(&config.mission, &RecordSpec::none())?;

    info!(
        "Done: {} step(s), {} image(s) written, {} platform error(s)",
        summary.steps, summary.frames_written, summary.platform_errors
    );
    if let Some(pose) = summary.final_pose {
        info!("Final position: {}", pose);
    }
    if let Some(recorder) = agent.recorder() {
        info!("Images saved under {}", recorder.run_dir().display());
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path);
            RunConfig::load_from_file(path)?
        }
        None => RunConfig::default(),
    };

    if let Some(dir) = &cli.output_dir {
        config.agent.images.output_dir = dir.clone();
    }
    if cli.no_save_images {
        config.agent.images.enabled = false;
    }
    if let Some(policy) = cli.action_policy {
        config.agent.actions.policy = policy;
    }
    if let Some(velocity) = cli.velocity {
        config.agent.actions.velocity = velocity;
    }
    if let Some(ticks) = cli.mission_ticks {
        config.simulation.mission_ticks = ticks;
    }
    if cli.no_settle {
        config.agent.sync = config.agent.sync.without_settle();
    }

    config.validate()?;
    Ok(config)
}
