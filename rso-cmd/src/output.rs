//! CSV writers for simulation traces and policy tables.

use chrono::NaiveDate;
use rso_engine::SimulationTrace;
use rso_policy::{RuleCurveTable, SeasonalTable, StaticLookup};
use rso_utils::dates::{format_date, DAYS_IN_TABLE};
use rso_utils::series::Ensemble;
use serde::Serialize;
use std::io::Write;

/// One row of a trace CSV. The final storage row of each member leaves the
/// flow columns empty.
#[derive(Debug, Serialize)]
struct TraceRow {
    member: usize,
    step: usize,
    date: String,
    storage: f64,
    inflow: Option<f64>,
    regulated_inflow: Option<f64>,
    regulated_release: Option<f64>,
    env_flow: Option<f64>,
    spill: Option<f64>,
    evaporation: Option<f64>,
}

/// The date after the last step, one step spacing past the last date.
/// Unknown for a single-step scenario.
fn closing_date(dates: &[NaiveDate]) -> Option<NaiveDate> {
    match dates {
        [.., previous, last] => last.checked_add_signed(*last - *previous),
        _ => None,
    }
}

/// Write `trace` member by member, one row per step plus the storage after
/// the last step.
pub fn write_trace<W: Write>(
    writer: W,
    dates: &[NaiveDate],
    inflow: &Ensemble,
    trace: &SimulationTrace,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let steps = trace.steps();
    let closing = closing_date(dates).map(|d| format_date(&d)).unwrap_or_default();
    let date_at = |t: usize| match dates.get(t) {
        Some(date) => format_date(date),
        None => closing.clone(),
    };
    for m in 0..trace.members() {
        for t in 0..steps {
            wtr.serialize(TraceRow {
                member: m,
                step: t,
                date: date_at(t),
                storage: trace.storage.get(t, m),
                inflow: Some(inflow.get(t, m)),
                regulated_inflow: Some(trace.regulated_inflow.get(t, m)),
                regulated_release: Some(trace.regulated_release.get(t, m)),
                env_flow: Some(trace.env_flow.get(t, m)),
                spill: Some(trace.spill.get(t, m)),
                evaporation: Some(trace.evaporation.get(t, m)),
            })?;
        }
        wtr.serialize(TraceRow {
            member: m,
            step: steps,
            date: date_at(steps),
            storage: trace.storage.get(steps, m),
            inflow: None,
            regulated_inflow: None,
            regulated_release: None,
            env_flow: None,
            spill: None,
            evaporation: None,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a static lookup as `s_frac,value` rows.
pub fn write_lookup<W: Write>(writer: W, lookup: &StaticLookup) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["s_frac", "value"])?;
    for (s, v) in lookup.grid().iter().zip(lookup.values()) {
        wtr.write_record([s.to_string(), v.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a seasonal table with one row per storage fraction and one column
/// per day of year (`d1` to `d366`).
pub fn write_seasonal_table<W: Write>(writer: W, table: &SeasonalTable) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["s_frac".to_string()];
    header.extend((1..=DAYS_IN_TABLE).map(|d| format!("d{}", d)));
    wtr.write_record(&header)?;
    for (i, s) in table.grid().iter().enumerate() {
        let mut record = vec![s.to_string()];
        record.extend(table.columns().iter().map(|column| column[i].to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write interpolated rule-curve bands as `kind,band,day,value` rows, where
/// `kind` is `storage_frac` or `release` and `day` is 1-based.
pub fn write_rule_curve<W: Write>(writer: W, table: &RuleCurveTable) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["kind", "band", "day", "value"])?;
    let kinds = [
        ("storage_frac", &table.storage_bands),
        ("release", &table.release_bands),
    ];
    for (kind, bands) in kinds {
        for (band, values) in bands.iter().enumerate() {
            for (day, value) in values.iter().enumerate() {
                wtr.write_record([
                    kind.to_string(),
                    band.to_string(),
                    (day + 1).to_string(),
                    value.to_string(),
                ])?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}
