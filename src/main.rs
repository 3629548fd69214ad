use braess_sim::simulation::{
    parse_max_cars, LaunchTiming, ModelState, RoutingMode, SelectionMethod, SimConfig, SimWorld,
    SpeedMode,
};
use clap::Parser;
use log::{info, warn};

/// Ticks allowed for the network to drain after a stop request
const DRAIN_LIMIT: u64 = 100_000;

#[derive(Parser)]
#[command(name = "braess_sim")]
#[command(about = "Headless Braess's paradox traffic simulation")]
struct Cli {
    /// Number of ticks to launch cars for before stopping
    #[arg(long, default_value = "3000")]
    ticks: u64,

    /// Cars launched per speed-limit unit of clock
    #[arg(long, default_value = "0.55")]
    launch_rate: f64,

    /// Congestion coefficient of the narrow links, in [0, 1]
    #[arg(long, default_value = "0.55")]
    congestion: f64,

    /// Open the bridge between the two midpoints
    #[arg(long)]
    bridge_open: bool,

    #[arg(long, value_enum, default_value_t = RoutingMode::Selfish)]
    routing: RoutingMode,

    /// Travel-time estimator used by selfish drivers
    #[arg(long, value_enum, default_value_t = SpeedMode::Theoretical)]
    speed_mode: SpeedMode,

    #[arg(long, value_enum, default_value_t = SelectionMethod::Minimum)]
    selection: SelectionMethod,

    /// Inter-arrival distribution of launches
    #[arg(long, value_enum, default_value_t = LaunchTiming::Poisson)]
    timing: LaunchTiming,

    /// Stop launching after this many departures (0 or blank for no limit)
    #[arg(long, default_value = "")]
    max_cars: String,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Log the dashboard every N ticks (0 disables)
    #[arg(long, default_value = "0")]
    report_every: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = SimConfig {
        launch_rate: cli.launch_rate,
        congestion_coef: cli.congestion,
        timing: cli.timing,
        routing: cli.routing,
        speed_mode: cli.speed_mode,
        selection: cli.selection,
        bridge_open: cli.bridge_open,
        max_cars: parse_max_cars(&cli.max_cars),
        seed: cli.seed,
        ..SimConfig::default()
    };

    let mut world = SimWorld::new(config)?;
    run_headless(&mut world, cli.ticks, cli.report_every);
    world.print_summary();
    Ok(())
}

/// Run the simulation without any renderer attached
fn run_headless(world: &mut SimWorld, ticks: u64, report_every: u64) {
    info!("Running Braess simulation for {ticks} ticks");
    world.start();

    for tick in 1..=ticks {
        if world.step() != ModelState::Running {
            info!("Launch limit reached after {tick} ticks");
            break;
        }
        if report_every > 0 && tick % report_every == 0 {
            info!("--- After tick {tick} ---");
            world.log_report();
        }
    }

    world.request_stop();
    let mut drained = world.state() == ModelState::Stopped;
    for _ in 0..DRAIN_LIMIT {
        if drained {
            break;
        }
        drained = world.step() == ModelState::Stopped;
    }
    if !drained {
        warn!(
            "Network did not drain within {DRAIN_LIMIT} ticks; {} cars still on the road",
            world.vehicles_in_network()
        );
    }

    let dashboard = world.dashboard();
    info!("=== SIMULATION COMPLETE ===");
    info!("Total cars departed: {}", dashboard.departures());
    info!("Total cars completed: {}", dashboard.total_count());
    info!("Cars on the road: {}", world.vehicles_in_network());
}
