//! Inspector Twin CLI - network digital-twin simulation.
//!
//! Commands:
//! - `twin simulate` - Run a scenario against a topology
//! - `twin validate` - Check a topology for structural problems
//! - `twin policy` - Parse, validate and evaluate a firewall policy
//! - `twin blast` - Report the blast radius of a compromised node
//! - `twin init` - Write a sample topology and scenario

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use twin_model::Severity;
use twin_sim::SimConfig;

mod commands;

#[derive(Parser)]
#[command(name = "twin")]
#[command(about = "Network digital-twin simulation and firewall policy evaluation")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a scenario against a topology
    Simulate {
        /// Path to the topology (JSON or YAML)
        #[arg(short, long, env = "TWIN_GRAPH", default_value = "topology.json")]
        graph: String,

        /// Path to the scenario (JSON or YAML)
        #[arg(short, long, env = "TWIN_SCENARIO", default_value = "scenario.json")]
        scenario: String,

        /// Write the run result here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Clock advance per packet event, in milliseconds
        #[arg(long, env = "TWIN_TIME_STEP", default_value_t = 10)]
        time_step: u64,

        /// Attach the blast radius of this node to the result
        #[arg(long)]
        blast_radius: Option<String>,

        /// Exit non-zero if a finding at or above this severity exists
        #[arg(long, env = "TWIN_FAIL_ON")]
        fail_on: Option<Severity>,
    },

    /// Validate the structure of a topology
    Validate {
        /// Path to the topology (JSON or YAML)
        #[arg(short, long, env = "TWIN_GRAPH", default_value = "topology.json")]
        graph: String,
    },

    /// Parse a firewall policy and optionally evaluate one flow
    Policy {
        /// Path to the policy DSL file
        #[arg(short, long)]
        policy: String,

        /// Topology used to validate node and tag references
        #[arg(short, long, env = "TWIN_GRAPH")]
        graph: Option<String>,

        /// Source node id to evaluate
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Destination node id to evaluate
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Protocol of the evaluated flow
        #[arg(long)]
        protocol: Option<String>,

        /// Destination port of the evaluated flow
        #[arg(long)]
        port: Option<u16>,
    },

    /// Report the blast radius of a compromised node
    Blast {
        /// Path to the topology (JSON or YAML)
        #[arg(short, long, env = "TWIN_GRAPH", default_value = "topology.json")]
        graph: String,

        /// Compromised node id
        #[arg(short, long)]
        node: String,
    },

    /// Write a sample topology and scenario
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate {
            graph,
            scenario,
            output,
            time_step,
            blast_radius,
            fail_on,
        } => {
            let mut config = SimConfig::default().with_time_step(time_step);
            if let Some(node) = blast_radius {
                config = config.with_blast_radius(node);
            }
            commands::simulate::run(&graph, &scenario, output.as_deref(), config, fail_on)
        }
        Commands::Validate { graph } => commands::validate::run(&graph),
        Commands::Policy {
            policy,
            graph,
            from,
            to,
            protocol,
            port,
        } => {
            let flow = from.zip(to).map(|(from, to)| commands::policy::FlowQuery {
                from,
                to,
                protocol,
                port,
            });
            commands::policy::run(&policy, graph.as_deref(), flow.as_ref())
        }
        Commands::Blast { graph, node } => commands::blast::run(&graph, &node),
        Commands::Init { path } => commands::init::run(&path),
    }
}
