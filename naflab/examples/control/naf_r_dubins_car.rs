//! NAF-R on the Dubins car with a curriculum of step lengths.
//!
//! The agent is trained on coarse steps first. Each phase of the curriculum
//! restarts the exploration and empties the replay memory, while the
//! parameters carry over.
use anyhow::Result;
use clap::Parser;
use log::info;
use naflab::util::save_history;
use naflab_candle_agent::{
    naf::{AdvantageConfig, Naf, NafConfig, NafModelConfig, NoiseConfig},
    opt::OptimizerConfig,
};
use naflab_core::{
    record::NullRecorder, replay_buffer::ReplayBufferConfig, Agent, Env as _, RewardHistory,
    RewardSign, Trainer, TrainerConfig,
};
use naflab_env::{DubinsCar, DubinsCarConfig};
use std::path::Path;

const DT_CURRICULUM: [f64; 3] = [2.0, 0.5, 0.25];
const INNER_STEP_N: usize = 100;
const R: f64 = 0.1;
const LR: f64 = 1e-3;
const BATCH_SIZE: usize = 256;
const GAMMA: f64 = 1.0;
const N_UPDATES_PER_OPT: usize = 8;
const TAU: f64 = 1e-2;
const UNITS: [usize; 2] = [256, 128];
const REPLAY_BUFFER_CAPACITY: usize = 100_000;
const THRESHOLD: f64 = 1.0;
const THRESHOLD_MIN: f64 = 1e-2;
const MEAN_WINDOW: usize = 25;

fn env_config(dt: f64) -> DubinsCarConfig {
    DubinsCarConfig::symmetric()
        .inner_step_n(INNER_STEP_N)
        .dt(dt)
}

fn create_agent(n_episodes_per_phase: usize, seed: u64) -> Result<Naf> {
    let config = env_config(DT_CURRICULUM[0]);
    let model_config = NafModelConfig::new(
        DubinsCar::STATE_DIM,
        config.action_min.clone(),
        config.action_max.clone(),
        UNITS.to_vec(),
    )
    .advantage(AdvantageConfig::RewardBased {
        r: R,
        dt: config.dt,
    })
    .opt_config(OptimizerConfig::default().learning_rate(LR));
    let naf_config = NafConfig::new(model_config)
        .noise_config(NoiseConfig::geometric_over(
            THRESHOLD,
            THRESHOLD_MIN,
            n_episodes_per_phase,
        ))
        .replay_buffer_config(
            ReplayBufferConfig::default()
                .capacity(REPLAY_BUFFER_CAPACITY)
                .seed(seed),
        )
        .batch_size(BATCH_SIZE)
        .gamma(GAMMA)
        .n_updates_per_opt(N_UPDATES_PER_OPT)
        .tau(TAU);
    Naf::build(naf_config)
}

/// Train NAF-R agents on the Dubins car with decreasing step lengths
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The number of independent runs
    #[arg(long, default_value_t = 5)]
    runs: usize,

    /// The number of episodes in each phase of the curriculum
    #[arg(long, default_value_t = 200)]
    n_episodes: usize,

    /// Directory of the model parameters and the rewards
    #[arg(long, default_value = "./naflab/examples/control/model/naf_r_dubins_car")]
    model_dir: String,
}

/// Trains an agent through the curriculum and returns the rewards of all
/// phases, joined.
fn train_run(n_episodes: usize, seed: u64) -> Result<(Naf, RewardHistory)> {
    let mut agent = create_agent(n_episodes, seed)?;
    let mut history = RewardHistory::new(MEAN_WINDOW);

    for dt in DT_CURRICULUM {
        info!("Phase with dt={}", dt);
        let mut env = DubinsCar::build(&env_config(dt), seed as i64)?;
        agent.set_dt(dt);
        agent.set_noise_threshold(THRESHOLD);
        agent.clear_memory();

        let mut trainer = Trainer::build(
            TrainerConfig::default()
                .n_episodes(n_episodes)
                .reward_sign(RewardSign::Negate)
                .mean_window(MEAN_WINDOW),
        );
        let phase = trainer.train(&mut env, &mut agent, &mut NullRecorder::default())?;
        history.extend(phase);
    }

    Ok((agent, history))
}

fn train(runs: usize, n_episodes: usize, model_dir: &str) -> Result<()> {
    for run in 0..runs {
        info!("Run {}", run);
        let (agent, history) = train_run(n_episodes, run as u64)?;
        let run_dir = Path::new(model_dir).join(format!("run_{}", run));
        agent.save_params(&run_dir)?;
        save_history(&history, &run_dir, "costs")?;
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    train(args.runs, args.n_episodes, &args.model_dir)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_naf_r_dubins_car() -> Result<()> {
        let model_dir = TempDir::new("naf_r_dubins_car")?;
        let model_dir = model_dir.path().to_str().unwrap();
        train(1, 2, model_dir)?;

        let run_dir = Path::new(model_dir).join("run_0");
        let history = RewardHistory::load(run_dir.join("costs.csv"), MEAN_WINDOW)?;
        assert_eq!(history.len(), 2 * DT_CURRICULUM.len());
        assert!(run_dir.join("naf.safetensors").exists());
        Ok(())
    }
}
