//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{record::Record, Env, Policy};
use anyhow::Result;

/// Runs a fixed number of episodes and returns the average return, recorded
/// as `"episode_return"`.
///
/// # Examples
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::<TerminalPendulum>::new(&config, 42, 10, usize::MAX)?;
/// agent.eval();
/// let record = evaluator.evaluate(&mut agent)?;
/// println!("Average return: {}", record.get_scalar("episode_return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// Episodes are cut after this number of steps.
    max_steps: usize,

    /// The environment instance used for evaluation.
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E::Obs, E::Act>,
    {
        let mut r_total = 0f32;

        for _ in 0..self.n_episodes {
            let mut prev_obs = self.env.reset()?;

            for _ in 0..self.max_steps {
                let act = policy.sample(&prev_obs);
                let step = self.env.step(&act);
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
        }

        Ok(Record::from_scalar(
            "episode_return",
            r_total / self.n_episodes.max(1) as f32,
        ))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize, max_steps: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            max_steps,
            env: E::build(config, seed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::test_utils::{ClockEnv, CountingAgent};

    #[test]
    fn test_mean_return() -> Result<()> {
        let mut evaluator = DefaultEvaluator::<ClockEnv>::new(&4, 0, 2, 3)?;
        let mut policy = CountingAgent::new(0.5);
        let record = evaluator.evaluate(&mut policy)?;
        assert_eq!(record.get_scalar("episode_return")?, 1.5);
        Ok(())
    }
}
