//! Fixed-length state and action vectors.
use super::{Act, Obs};
use ndarray::{Array1, Zip};
use std::ops::Index;

/// State of an environment.
///
/// The semantics of each element is environment-specific. For environments
/// with elapsed time in their state, the time is stored at index 0.
#[derive(Clone, Debug, PartialEq)]
pub struct State(Array1<f64>);

impl State {
    /// Constructs a state from a vector.
    pub fn new(v: Array1<f64>) -> Self {
        Self(v)
    }

    /// Returns the underlying array.
    pub fn as_array(&self) -> &Array1<f64> {
        &self.0
    }

    /// Returns the elements as `f32`, the precision used by the agents.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.0.iter().map(|&x| x as f32).collect()
    }
}

impl Obs for State {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<f64>> for State {
    fn from(v: Vec<f64>) -> Self {
        Self(Array1::from(v))
    }
}

impl From<Array1<f64>> for State {
    fn from(v: Array1<f64>) -> Self {
        Self(v)
    }
}

impl Index<usize> for State {
    type Output = f64;

    fn index(&self, ix: usize) -> &f64 {
        &self.0[ix]
    }
}

/// Action applied to an environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Action(Array1<f64>);

impl Action {
    /// Constructs an action from a vector.
    pub fn new(v: Array1<f64>) -> Self {
        Self(v)
    }

    /// Returns the underlying array.
    pub fn as_array(&self) -> &Array1<f64> {
        &self.0
    }

    /// Returns the elements as `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.0.iter().map(|&x| x as f32).collect()
    }

    /// Clips the action element-wise into `[min, max]`.
    ///
    /// Panics if the lengths of `self`, `min` and `max` differ.
    pub fn clip(&self, min: &Array1<f64>, max: &Array1<f64>) -> Self {
        let mut a = self.0.clone();
        Zip::from(&mut a)
            .and(min)
            .and(max)
            .for_each(|x, &lo, &hi| *x = x.max(lo).min(hi));
        Self(a)
    }
}

impl Act for Action {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<f64>> for Action {
    fn from(v: Vec<f64>) -> Self {
        Self(Array1::from(v))
    }
}

impl From<Vec<f32>> for Action {
    fn from(v: Vec<f32>) -> Self {
        Self(v.into_iter().map(|x| x as f64).collect())
    }
}

impl Index<usize> for Action {
    type Output = f64;

    fn index(&self, ix: usize) -> &f64 {
        &self.0[ix]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_clip() {
        let min = arr1(&[-2.0, 0.0]);
        let max = arr1(&[2.0, 1.0]);
        let a = Action::from(vec![5.0, -3.0]).clip(&min, &max);
        assert_eq!(a, Action::from(vec![2.0, 0.0]));

        let a = Action::from(vec![0.5, 0.5]).clip(&min, &max);
        assert_eq!(a, Action::from(vec![0.5, 0.5]));
    }

    #[test]
    #[should_panic]
    fn test_clip_dimension_mismatch() {
        let min = arr1(&[-2.0]);
        let max = arr1(&[2.0]);
        let _ = Action::from(vec![0.0, 0.0]).clip(&min, &max);
    }
}
