//! Command implementations for RSO CLI.
//!
//! Provides subcommands for simulating reservoir scenarios and for
//! tabulating operating policies and rule curves.

use clap::Subcommand;

pub mod input;
pub mod output;
pub mod policy;
pub mod simulate;

#[derive(Subcommand)]
pub enum Command {
    /// Simulate a scenario CSV through a reservoir and write the trace CSV
    Simulate {
        /// Scenario CSV: date,member,inflow,evaporation,demand,env_requirement
        #[arg(short = 's', long)]
        scenario: String,

        /// Run configuration JSON (reservoir limits and policies)
        #[arg(short = 'c', long)]
        config: String,

        /// Output path for the per-step trace CSV
        #[arg(short = 'o', long)]
        output: String,

        /// Simulate ensemble members in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Tabulate a policy JSON onto the storage-fraction grid
    Policy {
        /// Policy JSON, e.g. {"type": "piecewise_linear", "points": [[0, 2], [1, 10]]}
        #[arg(short = 'c', long)]
        config: String,

        /// Output path for the lookup CSV
        #[arg(short = 'o', long)]
        output: String,
    },

    /// Interpolate rule-curve control points onto every day of the year
    RuleCurve {
        /// JSON with "curves" and "rules" control points
        #[arg(short = 'c', long)]
        config: String,

        /// Output path for the kind,band,day,value CSV
        #[arg(short = 'o', long)]
        output: String,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Simulate {
            scenario,
            config,
            output,
            parallel,
        } => simulate::run_simulate(&scenario, &config, &output, parallel),
        Command::Policy { config, output } => policy::run_policy(&config, &output),
        Command::RuleCurve { config, output } => policy::run_rule_curve(&config, &output),
    }
}
