//! Command line entry point for inspecting action spaces
//!
//! Builds one of the built-in scenarios and lets you:
//! 1. List the flat attacker or defender action space
//! 2. Look up a flat index or decode a parameterised vector
//! 3. Sample random actions the way an untrained policy would
//! 4. Report how much of the parameterised space decodes to real actions

use std::error::Error;
use std::fmt::Display;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use netsim_actions::coverage::action_space_coverage;
use netsim_actions::scenarios;
use netsim_actions::{
    FlatActionSpace, FlatDefenderActionSpace, ParameterisedActionSpace,
    ParameterisedDefenderActionSpace, Scenario,
};

#[derive(Parser, Debug)]
#[command(name = "action-space", about = "Inspect the action spaces of a simulated network scenario")]
struct Cli {
    /// Built-in scenario to load
    #[arg(long, value_enum, default_value_t = ScenarioChoice::Tiny)]
    scenario: ScenarioChoice,

    /// Number of subnets for the uniform scenario
    #[arg(long, default_value_t = 3)]
    subnets: usize,

    /// Hosts per subnet for the uniform scenario
    #[arg(long, default_value_t = 4)]
    hosts: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ScenarioChoice {
    Tiny,
    TinyDefender,
    Uniform,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every action of the flat action space
    List {
        #[arg(long)]
        defender: bool,
    },
    /// Print the action at a flat index
    Lookup {
        #[arg(allow_negative_numbers = true)]
        index: i64,
        #[arg(long)]
        defender: bool,
    },
    /// Decode a parameterised action vector (6 components)
    Decode {
        #[arg(num_args = 6)]
        vector: Vec<usize>,
        #[arg(long)]
        defender: bool,
    },
    /// Sample random actions
    Sample {
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Sample flat indices instead of parameterised vectors
        #[arg(long)]
        flat: bool,
        #[arg(long)]
        defender: bool,
    },
    /// Report how much of the parameterised space decodes to real actions
    Coverage {
        #[arg(long)]
        max_vectors: Option<usize>,
    },
}

fn load_scenario(cli: &Cli) -> Result<Scenario, Box<dyn Error>> {
    let scenario = match cli.scenario {
        ScenarioChoice::Tiny => scenarios::tiny()?,
        ScenarioChoice::TinyDefender => scenarios::tiny_with_defender()?,
        ScenarioChoice::Uniform => scenarios::uniform(cli.subnets, cli.hosts)?,
    };
    Ok(scenario)
}

fn print_listing<A: Display>(actions: &[A]) {
    for (index, action) in actions.iter().enumerate() {
        println!("{:>6}  {}", index, action);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let scenario = load_scenario(&cli)?;
    info!(
        "loaded scenario {} ({} hosts, {} exploits, {} privilege escalations)",
        scenario.name(),
        scenario.address_space().len(),
        scenario.exploits().len(),
        scenario.privescs().len()
    );

    match cli.command {
        Command::List { defender: false } => {
            print_listing(FlatActionSpace::new(&scenario)?.actions());
        }
        Command::List { defender: true } => {
            print_listing(FlatDefenderActionSpace::new(&scenario)?.actions());
        }
        Command::Lookup { index, defender } => {
            if defender {
                println!("{}", FlatDefenderActionSpace::new(&scenario)?.get_action_raw(index)?);
            } else {
                println!("{}", FlatActionSpace::new(&scenario)?.get_action_raw(index)?);
            }
        }
        Command::Decode { vector, defender } => {
            let scenario = Arc::new(scenario);
            if defender {
                println!("{}", ParameterisedDefenderActionSpace::new(scenario).decode(&vector)?);
            } else {
                println!("{}", ParameterisedActionSpace::new(scenario).decode(&vector)?);
            }
        }
        Command::Sample { count, seed, flat, defender } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            sample(scenario, &mut rng, count, flat, defender)?;
        }
        Command::Coverage { max_vectors } => {
            let space = ParameterisedActionSpace::new(Arc::new(scenario));
            action_space_coverage(&space, max_vectors)?.print_summary();
        }
    }

    Ok(())
}

fn sample(
    scenario: Scenario,
    rng: &mut StdRng,
    count: usize,
    flat: bool,
    defender: bool,
) -> Result<(), Box<dyn Error>> {
    match (flat, defender) {
        (true, false) => {
            let space = FlatActionSpace::new(&scenario)?;
            for action in (0..count).filter_map(|_| space.sample(rng)) {
                println!("{}", action);
            }
        }
        (true, true) => {
            let space = FlatDefenderActionSpace::new(&scenario)?;
            for action in (0..count).filter_map(|_| space.sample(rng)) {
                println!("{}", action);
            }
        }
        (false, false) => {
            let space = ParameterisedActionSpace::new(Arc::new(scenario));
            for vector in (0..count).filter_map(|_| space.sample(rng)) {
                println!("{:?} -> {}", vector, space.decode(&vector)?);
            }
        }
        (false, true) => {
            let space = ParameterisedDefenderActionSpace::new(Arc::new(scenario));
            for vector in (0..count).filter_map(|_| space.sample(rng)) {
                println!("{:?} -> {}", vector, space.decode(&vector)?);
            }
        }
    }
    Ok(())
}
