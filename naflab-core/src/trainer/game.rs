//! Training loops of two-player games.
use super::{
    fmt_opt, save_agent, EpisodeStats, RewardHistory, Role, TrainerConfig, Turn, TurnScheduler,
};
use crate::{record::Recorder, replay_buffer::Transition, Agent, Game, Policy};
use anyhow::Result;
use log::info;
use std::path::Path;

/// Manages the training loops of agents playing a [`Game`].
///
/// Player U minimizes the reward of the game and is fitted on `-r_t`,
/// player V maximizes it and is fitted on `r_t`. Recorded total rewards are
/// always the raw payoff of the game.
///
/// * [`GameTrainer::train_alternating`] trains two agents against each other.
///   Both act at every step, but only one of them fits; the other only stores
///   its transition. The updating player flips every `block_len` steps and is
///   U at the beginning of each episode (see [`TurnScheduler`]).
/// * [`GameTrainer::train_against`] trains a single agent in a given role
///   against a fixed policy.
pub struct GameTrainer {
    n_episodes: usize,
    max_steps_per_episode: usize,
    mean_window: usize,
    block_len: usize,
    model_dir: Option<String>,
    save_interval: usize,
}

struct GameEpisode {
    u: EpisodeStats,
    v: EpisodeStats,
}

impl GameEpisode {
    fn new() -> Self {
        Self {
            u: EpisodeStats::default(),
            v: EpisodeStats::default(),
        }
    }

    fn add_reward(&mut self, reward: f32) {
        self.u.total_reward += reward;
        self.v.total_reward += reward;
        self.u.n_steps += 1;
        self.v.n_steps += 1;
    }
}

impl GameTrainer {
    /// Constructs a trainer.
    ///
    /// [`TrainerConfig::reward_sign`] is not used; signs follow the roles.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            n_episodes: config.n_episodes,
            max_steps_per_episode: config.max_steps_per_episode,
            mean_window: config.mean_window,
            block_len: config.block_len,
            model_dir: config.model_dir,
            save_interval: config.save_interval,
        }
    }

    fn is_save_episode(&self, episode: usize) -> bool {
        self.save_interval > 0 && (episode + 1) % self.save_interval == 0
    }

    /// Trains two agents with alternating updates.
    pub fn train_alternating<G, U, V, R>(
        &mut self,
        game: &mut G,
        u_agent: &mut U,
        v_agent: &mut V,
        recorder: &mut R,
    ) -> Result<RewardHistory>
    where
        G: Game,
        U: Agent<G::Obs, G::Act>,
        V: Agent<G::Obs, G::Act>,
        R: Recorder + ?Sized,
    {
        let mut history = RewardHistory::new(self.mean_window);
        let mut scheduler = TurnScheduler::new(self.block_len);
        u_agent.train();
        v_agent.train();

        for episode in 0..self.n_episodes {
            let mut ep = GameEpisode::new();
            let mut obs = game.reset()?;
            scheduler.reset();

            loop {
                let u = u_agent.sample(&obs);
                let v = v_agent.sample(&obs);
                let step = game.step(&u, &v);
                ep.add_reward(step.reward);

                let is_done = step.is_done();
                let u_tr = Transition {
                    obs: obs.clone(),
                    act: u,
                    reward: Role::U.reward_sign().apply(step.reward),
                    is_done,
                    next_obs: step.obs.clone(),
                };
                let v_tr = Transition {
                    obs,
                    act: v,
                    reward: Role::V.reward_sign().apply(step.reward),
                    is_done,
                    next_obs: step.obs.clone(),
                };

                match scheduler.turn() {
                    Turn::UpdatingU => {
                        ep.u.observe(u_agent.fit(u_tr)?);
                        v_agent.push(v_tr)?;
                    }
                    Turn::UpdatingV => {
                        ep.v.observe(v_agent.fit(v_tr)?);
                        u_agent.push(u_tr)?;
                    }
                }
                scheduler.tick();

                if is_done || ep.u.n_steps >= self.max_steps_per_episode {
                    break;
                }
                obs = step.obs;
            }

            u_agent.end_episode();
            v_agent.end_episode();
            let total_reward = ep.u.total_reward;
            let mean_reward = history.push(total_reward);
            info!(
                "episode={} total_reward={:.4} mean_reward={:.4} u_loss={} v_loss={} u_memory_len={} v_memory_len={}",
                episode,
                total_reward,
                mean_reward,
                fmt_opt(ep.u.mean_loss()),
                fmt_opt(ep.v.mean_loss()),
                u_agent.memory_len(),
                v_agent.memory_len(),
            );
            let record = ep
                .u
                .into_record(episode, mean_reward, "u_")
                .merge(ep.v.into_record(episode, mean_reward, "v_"));
            recorder.write(record);

            if let Some(model_dir) = &self.model_dir {
                if self.is_save_episode(episode) {
                    let base = Path::new(model_dir).join(format!("{}", episode + 1));
                    save_agent(u_agent, &base.join("u"));
                    save_agent(v_agent, &base.join("v"));
                }
            }
        }

        if let Some(model_dir) = &self.model_dir {
            let base = Path::new(model_dir).join("final");
            save_agent(u_agent, &base.join("u"));
            save_agent(v_agent, &base.join("v"));
        }

        Ok(history)
    }

    /// Trains `learner` playing `role` against a fixed `opponent`.
    pub fn train_against<G, A, P, R>(
        &mut self,
        game: &mut G,
        learner: &mut A,
        role: Role,
        opponent: &mut P,
        recorder: &mut R,
    ) -> Result<RewardHistory>
    where
        G: Game,
        A: Agent<G::Obs, G::Act>,
        P: Policy<G::Obs, G::Act>,
        R: Recorder + ?Sized,
    {
        let mut history = RewardHistory::new(self.mean_window);
        let sign = role.reward_sign();
        learner.train();

        for episode in 0..self.n_episodes {
            let mut stats = EpisodeStats::default();
            let mut obs = game.reset()?;

            loop {
                let (act, step) = match role {
                    Role::U => {
                        let u = learner.sample(&obs);
                        let v = opponent.sample(&obs);
                        let step = game.step(&u, &v);
                        (u, step)
                    }
                    Role::V => {
                        let u = opponent.sample(&obs);
                        let v = learner.sample(&obs);
                        let step = game.step(&u, &v);
                        (v, step)
                    }
                };
                stats.total_reward += step.reward;
                stats.n_steps += 1;

                let is_done = step.is_done();
                let tr = Transition {
                    obs,
                    act,
                    reward: sign.apply(step.reward),
                    is_done,
                    next_obs: step.obs.clone(),
                };
                stats.observe(learner.fit(tr)?);

                if is_done || stats.n_steps >= self.max_steps_per_episode {
                    break;
                }
                obs = step.obs;
            }

            learner.end_episode();
            let mean_reward = history.push(stats.total_reward);
            info!(
                "episode={} role={:?} total_reward={:.4} mean_reward={:.4} loss={} memory_len={}",
                episode,
                role,
                stats.total_reward,
                mean_reward,
                fmt_opt(stats.mean_loss()),
                learner.memory_len(),
            );
            recorder.write(stats.into_record(episode, mean_reward, ""));

            if let Some(model_dir) = &self.model_dir {
                if self.is_save_episode(episode) {
                    let path = Path::new(model_dir).join(format!("{}", episode + 1));
                    save_agent(learner, &path);
                }
            }
        }

        if let Some(model_dir) = &self.model_dir {
            save_agent(learner, &Path::new(model_dir).join("final"));
        }

        Ok(history)
    }
}
