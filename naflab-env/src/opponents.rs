//! Fixed policies of the players of [`UnequalGame`](crate::UnequalGame).
//!
//! They serve as opponents of learning agents and as references in
//! evaluation.
use crate::UnequalGameConfig;
use naflab_core::{Action, Policy, State};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Optimal control of U: full control toward the origin.
pub struct OptimalUAgent {
    u_max: f64,
}

impl OptimalUAgent {
    /// Constructs the policy for the given game.
    pub fn new(config: &UnequalGameConfig) -> Self {
        Self {
            u_max: config.u_max,
        }
    }
}

impl Policy<State, Action> for OptimalUAgent {
    fn sample(&mut self, obs: &State) -> Action {
        let x = obs[1];
        let u = if x > 0.0 {
            -self.u_max
        } else if x < 0.0 {
            self.u_max
        } else {
            0.0
        };
        Action::from(vec![u])
    }
}

/// Optimal control of V: full control away from the origin, pushing in the
/// positive direction at the origin.
pub struct OptimalVAgent {
    v_max: f64,
}

impl OptimalVAgent {
    /// Constructs the policy for the given game.
    pub fn new(config: &UnequalGameConfig) -> Self {
        Self {
            v_max: config.v_max,
        }
    }
}

impl Policy<State, Action> for OptimalVAgent {
    fn sample(&mut self, obs: &State) -> Action {
        let v = if obs[1] < 0.0 { -self.v_max } else { self.v_max };
        Action::from(vec![v])
    }
}

/// V applying a constant control.
pub struct DummyVAgent {
    v: f64,
}

impl DummyVAgent {
    /// Constructs the policy always emitting `v`.
    pub fn new(v: f64) -> Self {
        Self { v }
    }
}

impl Policy<State, Action> for DummyVAgent {
    fn sample(&mut self, _obs: &State) -> Action {
        Action::from(vec![self.v])
    }
}

/// U applying a uniformly random control in its bounds.
pub struct DummyUAgent {
    u_max: f64,
    rng: SmallRng,
}

impl DummyUAgent {
    /// Constructs the policy for the given game.
    pub fn new(config: &UnequalGameConfig, seed: u64) -> Self {
        Self {
            u_max: config.u_max,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Policy<State, Action> for DummyUAgent {
    fn sample(&mut self, _obs: &State) -> Action {
        let u = self.rng.gen_range(-self.u_max..=self.u_max);
        Action::from(vec![u])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnequalGame;
    use anyhow::Result;
    use naflab_core::{evaluate_game, Game};

    fn state(x: f64) -> State {
        State::from(vec![0.0, x])
    }

    #[test]
    fn test_optimal_controls() {
        let config = UnequalGameConfig::default();
        let mut u = OptimalUAgent::new(&config);
        let mut v = OptimalVAgent::new(&config);

        assert_eq!(u.sample(&state(0.3))[0], -1.0);
        assert_eq!(u.sample(&state(-0.3))[0], 1.0);
        assert_eq!(u.sample(&state(0.0))[0], 0.0);
        assert_eq!(v.sample(&state(0.3))[0], 0.5);
        assert_eq!(v.sample(&state(-0.3))[0], -0.5);
        assert_eq!(v.sample(&state(0.0))[0], 0.5);
    }

    #[test]
    fn test_dummy_u_is_bounded_and_seeded() {
        let config = UnequalGameConfig::default();
        let mut u1 = DummyUAgent::new(&config, 7);
        let mut u2 = DummyUAgent::new(&config, 7);
        for _ in 0..100 {
            let a1 = u1.sample(&state(1.0))[0];
            assert!((-1.0..=1.0).contains(&a1));
            assert_eq!(a1, u2.sample(&state(1.0))[0]);
        }
    }

    #[test]
    fn test_optimal_u_beats_dummy_v() -> Result<()> {
        let config = UnequalGameConfig::default();
        let mut game = UnequalGame::build(&config, 0)?;
        let mut u = OptimalUAgent::new(&config);
        let mut v = DummyVAgent::new(0.5);
        let returns = evaluate_game(&mut game, &mut u, &mut v, 1, usize::MAX)?;

        // U reaches the origin by t = 2 and chatters around it.
        assert!(returns[0] < 0.05);
        Ok(())
    }
}
