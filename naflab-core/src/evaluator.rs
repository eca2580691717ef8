//! Evaluate policies without training.
use crate::{record::Record, Env, Game, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate a [`Policy`] on an environment.
pub trait Evaluator<E: Env> {
    /// Evaluate a [`Policy`].
    ///
    /// The caller of this method needs to handle the internal state of the
    /// policy, like training/evaluation mode.
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E::Obs, E::Act>;
}

/// Plays `n_episodes` episodes of `game` between `u` and `v` and returns the
/// total reward of each episode.
///
/// Nothing is fitted. Episodes not finished within `max_steps` steps are cut.
pub fn evaluate_game<G, U, V>(
    game: &mut G,
    u: &mut U,
    v: &mut V,
    n_episodes: usize,
    max_steps: usize,
) -> Result<Vec<f32>>
where
    G: Game,
    U: Policy<G::Obs, G::Act>,
    V: Policy<G::Obs, G::Act>,
{
    let mut returns = Vec::with_capacity(n_episodes);

    for _ in 0..n_episodes {
        let mut obs = game.reset()?;
        let mut r_total = 0f32;

        for _ in 0..max_steps {
            let u_act = u.sample(&obs);
            let v_act = v.sample(&obs);
            let step = game.step(&u_act, &v_act);
            r_total += step.reward;
            if step.is_done() {
                break;
            }
            obs = step.obs;
        }
        returns.push(r_total);
    }

    Ok(returns)
}
