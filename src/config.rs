use crate::error::{DispatchError, Result};

/// Confidence below which a classification is treated as "no match".
pub const ACCEPTANCE_FLOOR: f32 = 0.5;

/// Maximum gap between the top two matches for them to count as a near-tie.
pub const DISAMBIGUATION_MARGIN: f32 = 0.1;

/// The router never lists more candidates than this.
pub const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterConfig {
    pub acceptance_floor: f32,
    pub disambiguation_margin: f32,
    pub max_candidates: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            acceptance_floor: ACCEPTANCE_FLOOR,
            disambiguation_margin: DISAMBIGUATION_MARGIN,
            max_candidates: MAX_CANDIDATES,
        }
    }
}

impl RouterConfig {
    /// Defaults overridden by environment variables.
    ///
    /// Optional: DISPATCH_ACCEPTANCE_FLOOR (0.0 - 1.0)
    /// Optional: DISPATCH_DISAMBIGUATION_MARGIN (0.0 - 1.0)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(floor) = read_unit_interval("DISPATCH_ACCEPTANCE_FLOOR")? {
            config.acceptance_floor = floor;
        }
        if let Some(margin) = read_unit_interval("DISPATCH_DISAMBIGUATION_MARGIN")? {
            config.disambiguation_margin = margin;
        }
        Ok(config)
    }
}

fn read_unit_interval(key: &str) -> Result<Option<f32>> {
    let raw = match std::env::var(key) {
        Ok(raw) => raw,
        Err(_) => return Ok(None),
    };
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| DispatchError::Config(format!("{} must be a number, got '{}'", key, raw)))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(DispatchError::Config(format!("{} must be within 0.0 - 1.0, got {}", key, value)));
    }
    Ok(Some(value))
}
