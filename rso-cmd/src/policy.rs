//! The `policy` and `rule-curve` commands: tabulate policies for inspection.

use crate::input::{read_json, RuleCurveConfig};
use crate::output::{write_lookup, write_rule_curve, write_seasonal_table};
use anyhow::{bail, Context};
use log::info;
use rso_policy::{build_rule_curve, PolicySpec};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Tabulate `spec` into `writer`: a static lookup as `s_frac,value` rows, a
/// seasonal one as a day-of-year table.
pub fn tabulate_policy<W: Write>(spec: &PolicySpec, writer: W) -> anyhow::Result<()> {
    if let Some(lookup) = spec.static_lookup() {
        let lookup = lookup?;
        info!("Tabulated static lookup with {} breakpoints", lookup.grid().len());
        return write_lookup(writer, &lookup);
    }
    if let Some(table) = spec.seasonal_table() {
        let table = table?;
        info!("Tabulated seasonal table with {} breakpoints", table.grid().len());
        return write_seasonal_table(writer, &table);
    }
    bail!("Only lookup and rule curve policies can be tabulated")
}

pub fn run_policy(config_json: &str, output_csv: &str) -> anyhow::Result<()> {
    let spec: PolicySpec = read_json(config_json)?;
    let file = File::create(output_csv)
        .with_context(|| format!("Failed to create {}", output_csv))?;
    tabulate_policy(&spec, BufWriter::new(file))?;
    info!("Policy table written to {}", output_csv);
    Ok(())
}

pub fn run_rule_curve(config_json: &str, output_csv: &str) -> anyhow::Result<()> {
    let config: RuleCurveConfig = read_json(config_json)?;
    let table = build_rule_curve(&config.curves, &config.rules)?;
    let file = File::create(output_csv)
        .with_context(|| format!("Failed to create {}", output_csv))?;
    write_rule_curve(BufWriter::new(file), &table)?;
    info!(
        "Rule curve with {} storage and {} release bands written to {}",
        table.storage_bands.len(),
        table.release_bands.len(),
        output_csv
    );
    Ok(())
}
