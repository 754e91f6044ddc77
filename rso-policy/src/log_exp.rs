//! Logarithmic-exponential release curves.
//!
//! Both curves are logarithmic below a reference storage fraction and
//! exponential at or above it, passing through the reference release there.
//!
//! - [`LogExpV1`]: Proussevitch et al. (2013), as used by Oyerinde et al. (2016).
//! - [`LogExpV2`]: Rougé et al. (2021), Hydrol. Earth Syst. Sci., 25, 1365–1388.

use crate::error::{PolicyError, Result};
use crate::lookup::PolicyEvaluator;
use serde::{Deserialize, Serialize};

fn invalid(name: &'static str, reason: impl Into<String>) -> PolicyError {
    PolicyError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, format!("{value} is not finite")))
    }
}

fn check_reference_fraction(s_frac_ref: f64) -> Result<()> {
    if s_frac_ref > 0.0 && s_frac_ref < 1.0 {
        Ok(())
    } else {
        Err(invalid("s_frac_ref", format!("{s_frac_ref} must lie in (0, 1)")))
    }
}

/// Parameters of the Proussevitch curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogExpV1Params {
    /// Release at empty storage, as a fraction of `u_ref`.
    pub u_frac_min: f64,
    /// Storage fraction at which the release equals `u_ref`.
    pub s_frac_ref: f64,
    /// Shape of the logarithmic segment.
    pub alpha: f64,
    /// Shape of the exponential segment.
    pub b: f64,
    /// Reference release, e.g. the target demand.
    pub u_ref: f64,
}

/// Proussevitch log-exponential curve:
///
/// ```text
/// s < s_ref:  u = (u_frac_min + ln(k·s^α + 1)) · u_ref,  k = (e^(1 − u_frac_min) − 1) / s_ref^α
/// s ≥ s_ref:  u = e^(b·(s − s_ref)²) · u_ref
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogExpV1 {
    params: LogExpV1Params,
    k: f64,
}

impl LogExpV1 {
    pub fn params(&self) -> &LogExpV1Params {
        &self.params
    }

    pub fn value(&self, storage_fraction: f64) -> f64 {
        let p = &self.params;
        if storage_fraction < p.s_frac_ref {
            (p.u_frac_min + (self.k * storage_fraction.powf(p.alpha) + 1.0).ln()) * p.u_ref
        } else {
            (p.b * (storage_fraction - p.s_frac_ref).powi(2)).exp() * p.u_ref
        }
    }
}

impl PolicyEvaluator for LogExpV1 {
    fn evaluate(&self, storage_fraction: f64, _day_of_year: Option<u32>) -> f64 {
        self.value(storage_fraction)
    }
}

/// Validate the Proussevitch parameters and derive the log-segment scale `k`.
pub fn build_log_exp_v1(params: LogExpV1Params) -> Result<LogExpV1> {
    check_finite("u_frac_min", params.u_frac_min)?;
    check_finite("alpha", params.alpha)?;
    check_finite("b", params.b)?;
    check_finite("u_ref", params.u_ref)?;
    check_reference_fraction(params.s_frac_ref)?;
    if !(0.0..=1.0).contains(&params.u_frac_min) {
        return Err(invalid(
            "u_frac_min",
            format!("{} must lie in [0, 1]", params.u_frac_min),
        ));
    }
    if params.alpha < 0.0 {
        return Err(invalid("alpha", format!("{} must not be negative", params.alpha)));
    }
    let k = ((1.0 - params.u_frac_min).exp() - 1.0) / params.s_frac_ref.powf(params.alpha);
    Ok(LogExpV1 { params, k })
}

/// Parameters of the Rougé curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogExpV2Params {
    /// Release at empty storage, as a fraction of `u_ref`.
    pub u_frac_min: f64,
    /// Release at full storage, as a fraction of `u_ref`.
    pub u_frac_max: f64,
    /// Storage fraction separating the two segments.
    pub s_frac_ref: f64,
    /// Release at `s_frac_ref`, as a fraction of `u_ref`.
    pub u_frac_ref: f64,
    /// Propensity to release at low storage.
    pub p_rel: f64,
    /// Propensity to store at near-full storage.
    pub p_sto: f64,
    /// Reference release, e.g. the target demand.
    pub u_ref: f64,
    /// Offset smoothing the transition between segments. Supplied by the
    /// caller, never derived.
    pub delta_s: f64,
}

/// Rougé log-exponential curve:
///
/// ```text
/// s < s_ref:  u = (u_min + ln(1 + p_rel·s) / ln(1 + p_rel·s_ref) · (u_ref_frac − u_min)) · u_ref
/// s ≥ s_ref:  u = (u_ref_frac + ((s − s_ref + Δs)^p_sto − Δs^p_sto)
///                 / ((1 − s_ref + Δs)^p_sto − Δs^p_sto) · (u_max − u_ref_frac)) · u_ref
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogExpV2 {
    params: LogExpV2Params,
    log_norm: f64,
    exp_offset: f64,
    exp_norm: f64,
}

impl LogExpV2 {
    pub fn params(&self) -> &LogExpV2Params {
        &self.params
    }

    pub fn value(&self, storage_fraction: f64) -> f64 {
        let p = &self.params;
        if storage_fraction < p.s_frac_ref {
            let shape = (1.0 + p.p_rel * storage_fraction).ln() / self.log_norm;
            (p.u_frac_min + shape * (p.u_frac_ref - p.u_frac_min)) * p.u_ref
        } else {
            let rise =
                (storage_fraction - p.s_frac_ref + p.delta_s).powf(p.p_sto) - self.exp_offset;
            (p.u_frac_ref + rise / self.exp_norm * (p.u_frac_max - p.u_frac_ref)) * p.u_ref
        }
    }
}

impl PolicyEvaluator for LogExpV2 {
    fn evaluate(&self, storage_fraction: f64, _day_of_year: Option<u32>) -> f64 {
        self.value(storage_fraction)
    }
}

/// Validate the Rougé parameters and precompute the segment normalizers.
pub fn build_log_exp_v2(params: LogExpV2Params) -> Result<LogExpV2> {
    check_finite("u_frac_min", params.u_frac_min)?;
    check_finite("u_frac_max", params.u_frac_max)?;
    check_finite("u_frac_ref", params.u_frac_ref)?;
    check_finite("p_rel", params.p_rel)?;
    check_finite("p_sto", params.p_sto)?;
    check_finite("u_ref", params.u_ref)?;
    check_finite("delta_s", params.delta_s)?;
    check_reference_fraction(params.s_frac_ref)?;
    if params.p_rel <= 0.0 {
        return Err(invalid("p_rel", format!("{} must be positive", params.p_rel)));
    }
    if params.p_sto <= 0.0 {
        return Err(invalid("p_sto", format!("{} must be positive", params.p_sto)));
    }
    if params.delta_s < 0.0 {
        return Err(invalid(
            "delta_s",
            format!("{} must not be negative", params.delta_s),
        ));
    }
    let log_norm = (1.0 + params.p_rel * params.s_frac_ref).ln();
    let exp_offset = params.delta_s.powf(params.p_sto);
    let exp_norm = (1.0 - params.s_frac_ref + params.delta_s).powf(params.p_sto) - exp_offset;
    Ok(LogExpV2 {
        params,
        log_norm,
        exp_offset,
        exp_norm,
    })
}
