//! Train [`Agent`].
mod config;
mod game;
mod history;
mod scheduler;
use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    replay_buffer::Transition,
    Agent, Env,
};
use anyhow::Result;
pub use config::TrainerConfig;
pub use game::GameTrainer;
pub use history::RewardHistory;
use log::info;
pub use scheduler::{RewardSign, Role, Turn, TurnScheduler};
use std::path::Path;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episodic training loop of a single agent.
///
/// # Training loop
///
/// 0. Given an environment implementing [`Env`], an agent implementing [`Agent`]
///    and a recorder implementing [`Recorder`].
/// 1. For each of `n_episodes` episodes:
///     1. Reset [`Env`] and the total reward of the episode.
///     2. The agent samples an action `a_t` for the observation `o_t`.
///     3. [`Env`] performs a step and emits `(o_t+1, r_t, is_done_t)`.
///     4. `r_t` is added to the total reward, then the transition
///        `(o_t, a_t, sign(r_t), is_done_t, o_t+1)` is handed to [`Agent::fit`].
///     5. Back to step 2 until the episode is done or the step cap
///        `max_steps_per_episode` is reached. A capped episode stores its last
///        transition as not done.
///     6. [`Agent::end_episode`] is called, which typically decays the
///        exploration noise.
///     7. The running mean of the total rewards over the current episode and
///        the `mean_window` episodes before it is computed, a summary line is
///        logged and a record is written to the recorder.
///     8. If `(episode + 1) % save_interval == 0`, the parameters of the agent
///        are saved in `(model_dir)/(episode + 1)`.
/// 2. The parameters of the agent are saved in `(model_dir)/final`.
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|"Step&lt;Env::Obs&gt;"|C[Trainer]
///     C -->|Transition|A
///     C -->|Record|D[Recorder]
/// ```
///
/// `sign` is [`TrainerConfig::reward_sign`]. The recorded total reward is
/// always the raw environment reward.
pub struct Trainer {
    /// The number of training episodes.
    n_episodes: usize,

    /// The maximum number of steps in an episode.
    max_steps_per_episode: usize,

    /// Sign applied to rewards before fitting.
    reward_sign: RewardSign,

    /// Window of the running mean.
    mean_window: usize,

    /// Where to save the trained model.
    model_dir: Option<String>,

    /// Interval of saving the model in episodes.
    save_interval: usize,
}

/// Accumulates the statistics of an episode.
#[derive(Default)]
pub(crate) struct EpisodeStats {
    pub(crate) total_reward: f32,
    pub(crate) n_steps: usize,
    loss_sum: f32,
    n_losses: usize,
    last_agent_record: Record,
}

impl EpisodeStats {
    pub(crate) fn observe(&mut self, record: Record) {
        if let Ok(loss) = record.get_scalar("loss") {
            self.loss_sum += loss;
            self.n_losses += 1;
        }
        self.last_agent_record = record;
    }

    pub(crate) fn mean_loss(&self) -> Option<f32> {
        match self.n_losses {
            0 => None,
            n => Some(self.loss_sum / n as f32),
        }
    }

    /// Builds the summary record of the episode.
    ///
    /// The last record of the agent is merged first, so that `loss` is the
    /// mean over the episode rather than the last value.
    pub(crate) fn into_record(self, episode: usize, mean_reward: f32, prefix: &str) -> Record {
        let mean_loss = self.mean_loss();
        let mut record = Record::empty();
        for (k, v) in self.last_agent_record.into_iter_in_record() {
            record.insert(format!("{}{}", prefix, k), v);
        }
        record.insert("episode", Scalar(episode as f32));
        record.insert("total_reward", Scalar(self.total_reward));
        record.insert("mean_reward", Scalar(mean_reward));
        record.insert("n_steps", Scalar(self.n_steps as f32));
        if let Some(loss) = mean_loss {
            record.insert(format!("{}loss", prefix), Scalar(loss));
        }
        record
    }
}

pub(crate) fn fmt_opt(v: Option<f32>) -> String {
    match v {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

/// Saves the parameters of an agent, logging the outcome.
pub(crate) fn save_agent<O, A, T: Agent<O, A>>(agent: &T, model_dir: &Path) {
    match agent.save_params(model_dir) {
        Ok(()) => info!("Saved the model in {:?}.", model_dir),
        Err(e) => info!("Failed to save model in {:?}: {}", model_dir, e),
    }
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            n_episodes: config.n_episodes,
            max_steps_per_episode: config.max_steps_per_episode,
            reward_sign: config.reward_sign,
            mean_window: config.mean_window,
            model_dir: config.model_dir,
            save_interval: config.save_interval,
        }
    }

    /// Runs an episode, fitting the agent at every step.
    pub(crate) fn run_episode<E, A>(&self, env: &mut E, agent: &mut A) -> Result<EpisodeStats>
    where
        E: Env,
        A: Agent<E::Obs, E::Act>,
    {
        let mut stats = EpisodeStats::default();
        let mut obs = env.reset()?;

        loop {
            let act = agent.sample(&obs);
            let step = env.step(&act);
            stats.total_reward += step.reward;
            stats.n_steps += 1;

            let is_done = step.is_done();
            let tr = Transition {
                obs,
                act,
                reward: self.reward_sign.apply(step.reward),
                is_done,
                next_obs: step.obs.clone(),
            };
            stats.observe(agent.fit(tr)?);

            if is_done || stats.n_steps >= self.max_steps_per_episode {
                break;
            }
            obs = step.obs;
        }

        Ok(stats)
    }

    /// Train the agent.
    ///
    /// Returns the total and running-mean rewards of all episodes.
    pub fn train<E, A, R>(
        &mut self,
        env: &mut E,
        agent: &mut A,
        recorder: &mut R,
    ) -> Result<RewardHistory>
    where
        E: Env,
        A: Agent<E::Obs, E::Act>,
        R: Recorder + ?Sized,
    {
        let mut history = RewardHistory::new(self.mean_window);
        agent.train();

        for episode in 0..self.n_episodes {
            let stats = self.run_episode(env, agent)?;
            agent.end_episode();
            let mean_reward = history.push(stats.total_reward);
            info!(
                "episode={} total_reward={:.4} mean_reward={:.4} loss={} memory_len={}",
                episode,
                stats.total_reward,
                mean_reward,
                fmt_opt(stats.mean_loss()),
                agent.memory_len(),
            );
            recorder.write(stats.into_record(episode, mean_reward, ""));

            if let Some(model_dir) = &self.model_dir {
                if self.save_interval > 0 && (episode + 1) % self.save_interval == 0 {
                    let path = Path::new(model_dir).join(format!("{}", episode + 1));
                    save_agent(agent, &path);
                }
            }
        }

        if let Some(model_dir) = &self.model_dir {
            save_agent(agent, &Path::new(model_dir).join("final"));
        }

        Ok(history)
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    //! A clock environment and a counting agent for testing trainers.
    use crate::{
        record::Record, replay_buffer::Transition, Action, Agent, Env, Game, Policy, State, Step,
    };
    use anyhow::Result;
    use std::path::Path;

    /// State `[t]`; done after `horizon` unit steps; reward is the action.
    pub struct ClockEnv {
        pub horizon: usize,
        pub t: usize,
    }

    impl Env for ClockEnv {
        type Config = usize;
        type Obs = State;
        type Act = Action;

        fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
            Ok(Self {
                horizon: *config,
                t: 0,
            })
        }

        fn step(&mut self, a: &Self::Act) -> Step<Self::Obs> {
            self.t += 1;
            let obs = State::from(vec![self.t as f64]);
            Step::new(obs, a[0] as f32, self.t >= self.horizon)
        }

        fn reset(&mut self) -> Result<Self::Obs> {
            self.t = 0;
            Ok(State::from(vec![0.0]))
        }
    }

    /// Like [`ClockEnv`], with reward `u + v`.
    pub struct ClockGame {
        pub horizon: usize,
        pub t: usize,
    }

    impl Game for ClockGame {
        type Config = usize;
        type Obs = State;
        type Act = Action;

        fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
            Ok(Self {
                horizon: *config,
                t: 0,
            })
        }

        fn step(&mut self, u: &Self::Act, v: &Self::Act) -> Step<Self::Obs> {
            self.t += 1;
            let obs = State::from(vec![self.t as f64]);
            Step::new(obs, (u[0] + v[0]) as f32, self.is_done())
        }

        fn reset(&mut self) -> Result<Self::Obs> {
            self.t = 0;
            Ok(State::from(vec![0.0]))
        }

        fn is_done(&self) -> bool {
            self.t >= self.horizon
        }
    }

    /// Emits a constant action and remembers what it was given.
    pub struct CountingAgent {
        pub act: f64,
        pub fitted: Vec<Transition<State, Action>>,
        pub pushed: Vec<Transition<State, Action>>,
        pub n_end_episode: usize,
        pub is_train: bool,
    }

    impl CountingAgent {
        pub fn new(act: f64) -> Self {
            Self {
                act,
                fitted: vec![],
                pushed: vec![],
                n_end_episode: 0,
                is_train: false,
            }
        }
    }

    impl Policy<State, Action> for CountingAgent {
        fn sample(&mut self, _obs: &State) -> Action {
            Action::from(vec![self.act])
        }
    }

    impl Agent<State, Action> for CountingAgent {
        fn train(&mut self) {
            self.is_train = true;
        }

        fn eval(&mut self) {
            self.is_train = false;
        }

        fn is_train(&self) -> bool {
            self.is_train
        }

        fn push(&mut self, transition: Transition<State, Action>) -> Result<()> {
            self.pushed.push(transition);
            Ok(())
        }

        fn memory_len(&self) -> usize {
            self.pushed.len() + self.fitted.len()
        }

        fn opt_with_record(&mut self) -> Result<Record> {
            Ok(Record::from_scalar("loss", 1.0))
        }

        fn fit(&mut self, transition: Transition<State, Action>) -> Result<Record> {
            self.fitted.push(transition);
            self.opt_with_record()
        }

        fn end_episode(&mut self) {
            self.n_end_episode += 1;
        }

        fn save_params(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{test_utils::*, *};
    use crate::record::BufferedRecorder;

    #[test]
    fn test_train_negates_fitted_reward() -> Result<()> {
        let mut env = ClockEnv::build(&3, 0)?;
        let mut agent = CountingAgent::new(2.0);
        let mut recorder = BufferedRecorder::new();
        let config = TrainerConfig::default()
            .n_episodes(4)
            .reward_sign(RewardSign::Negate);
        let history = Trainer::build(config).train(&mut env, &mut agent, &mut recorder)?;

        assert_eq!(history.rewards, vec![6.0; 4]);
        assert_eq!(agent.fitted.len(), 12);
        assert!(agent.fitted.iter().all(|tr| tr.reward == -2.0));
        assert_eq!(agent.n_end_episode, 4);
        assert!(agent.fitted[2].is_done);
        assert_eq!(recorder.scalars("total_reward"), vec![6.0; 4]);
        assert_eq!(recorder.scalars("loss"), vec![1.0; 4]);
        Ok(())
    }

    #[test]
    fn test_step_cap_truncates_without_done() -> Result<()> {
        let mut env = ClockEnv::build(&usize::MAX, 0)?;
        let mut agent = CountingAgent::new(0.5);
        let config = TrainerConfig::default()
            .n_episodes(2)
            .max_steps_per_episode(5);
        let mut recorder = crate::record::NullRecorder::default();
        let history = Trainer::build(config).train(&mut env, &mut agent, &mut recorder)?;

        assert_eq!(history.rewards, vec![2.5, 2.5]);
        assert_eq!(agent.fitted.len(), 10);
        assert!(agent.fitted.iter().all(|tr| !tr.is_done));
        Ok(())
    }
}
