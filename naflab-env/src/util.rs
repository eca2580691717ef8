//! Utilities shared by the environments.
use anyhow::Result;
use naflab_core::error::NaflabError;
use ndarray::Array1;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Returns `true` if the elapsed time `t` has reached `terminal_time`.
///
/// Times accumulated from substeps of length `inner_dt` are considered to
/// have reached `terminal_time` within half a substep below it.
pub(crate) fn reached(t: f64, terminal_time: f64, inner_dt: f64) -> bool {
    t >= terminal_time - 0.5 * inner_dt
}

/// Returns the length of a substep, `dt / inner_step_n`.
pub(crate) fn substep(dt: f64, inner_step_n: usize) -> Result<f64, NaflabError> {
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(NaflabError::InvalidConfig(format!("dt must be positive, got {}", dt)));
    }
    if inner_step_n == 0 {
        return Err(NaflabError::InvalidConfig("inner_step_n must be at least 1".to_string()));
    }
    Ok(dt / inner_step_n as f64)
}

pub(crate) fn to_array(v: &[f64]) -> Array1<f64> {
    Array1::from(v.to_vec())
}

pub(crate) fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path)?;
    let rdr = BufReader::new(file);
    let b = serde_yaml::from_reader(rdr)?;
    Ok(b)
}

pub(crate) fn save_yaml<T: Serialize>(config: &T, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_yaml::to_string(config)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reached_tolerates_accumulation() {
        let inner_dt = 0.1;
        let t = (0..50).fold(0.0, |t, _| t + inner_dt);
        assert!(t < 5.0);
        assert!(reached(t, 5.0, inner_dt));
        assert!(!reached(4.9, 5.0, inner_dt));
    }

    #[test]
    fn test_substep() -> Result<()> {
        assert!((substep(0.2, 4)? - 0.05).abs() < 1e-15);
        assert!(matches!(substep(0.2, 0), Err(NaflabError::InvalidConfig(_))));
        assert!(matches!(substep(0.0, 1), Err(NaflabError::InvalidConfig(_))));
        assert!(matches!(substep(-1.0, 1), Err(NaflabError::InvalidConfig(_))));
        Ok(())
    }
}
