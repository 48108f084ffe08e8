//! Signal filtering for noisy head pose angles.
//!
//! The pose solver occasionally flips the roll decomposition by a half turn
//! and produces single-frame spikes. The filters here operate on one angle
//! at a time and keep their own state between frames.

/// Exponential filter for responsive smoothing
pub mod exponential;

/// Wrap folding and jump rejection for the roll angle
pub mod roll;

use crate::Result;

/// Trait for all single-angle filters
pub trait AngleFilter: Send + Sync {
    /// Feed one sample and return the filtered value
    fn apply(&mut self, value: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl AngleFilter for NoFilter {
    fn apply(&mut self, value: f64) -> f64 {
        value
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create an angle filter by type name.
///
/// Parameters may follow the name separated by colons, e.g. `exponential:0.5`
/// or `roll:0.3:60`.
///
/// # Errors
///
/// Returns an error for unknown names or unparsable parameters
pub fn create_filter(spec: &str) -> Result<Box<dyn AngleFilter>> {
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let params = parts
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| crate::Error::FilterError(format!("Invalid filter parameter '{p}' in '{spec}'")))
        })
        .collect::<Result<Vec<f64>>>()?;

    let alpha = params.first().copied().unwrap_or(crate::constants::DEFAULT_SMOOTHING_FACTOR);
    if matches!(name.as_str(), "exponential" | "roll") && !(alpha > 0.0 && alpha <= 1.0) {
        return Err(crate::Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
    }

    match name.as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "exponential" => Ok(Box::new(exponential::ExponentialFilter::new(alpha))),
        "roll" => {
            let threshold = params.get(1).copied().unwrap_or(crate::constants::DEFAULT_JUMP_THRESHOLD);
            if threshold <= 0.0 {
                return Err(crate::Error::FilterError(format!(
                    "Jump threshold must be positive, got {threshold}"
                )));
            }
            Ok(Box::new(roll::RollFilter::with_params(alpha, threshold)))
        }
        _ => Err(crate::Error::FilterError(format!("Unknown filter type: {spec}"))),
    }
}
