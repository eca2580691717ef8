use anyhow::Result;
use clap::Parser;
use naflab::util::{save_history, EvalReport};
use naflab_candle_agent::{
    naf::{Naf, NafConfig, NafModelConfig, NoiseConfig},
    opt::OptimizerConfig,
};
use naflab_core::{
    record::NullRecorder, Agent, DefaultEvaluator, Env as _, Evaluator as _, RewardSign,
    Trainer, TrainerConfig,
};
use naflab_env::{RegulatorProblem, RegulatorProblemConfig};
use std::{fs, path::Path};

const DT: f64 = 0.01;
const MAX_STEPS_PER_EPISODE: usize = 200;
const LR: f64 = 1e-3;
const BATCH_SIZE: usize = 128;
const TAU: f64 = 1e-2;
const UNITS: [usize; 2] = [64, 64];
const THRESHOLD_MIN: f64 = 1e-3;
const MEAN_WINDOW: usize = 25;
const N_EPISODES_PER_EVAL: usize = 1;

fn env_config() -> RegulatorProblemConfig {
    RegulatorProblemConfig::default().dt(DT)
}

fn create_agent(n_episodes: usize) -> Result<Naf> {
    let config = env_config();
    let model_config = NafModelConfig::new(
        RegulatorProblem::STATE_DIM,
        config.action_min.clone(),
        config.action_max.clone(),
        UNITS.to_vec(),
    )
    .opt_config(OptimizerConfig::default().learning_rate(LR));
    let naf_config = NafConfig::new(model_config)
        .noise_config(NoiseConfig::geometric_over(1.0, THRESHOLD_MIN, n_episodes))
        .batch_size(BATCH_SIZE)
        .tau(TAU);
    Naf::build(naf_config)
}

/// Train/eval NAF agent on the linear regulator problem
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train NAF agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate NAF agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// The number of training episodes
    #[arg(long, default_value_t = 300)]
    n_episodes: usize,

    /// Directory of the model parameters and the rewards
    #[arg(long, default_value = "./naflab/examples/control/model/naf_regulator")]
    model_dir: String,
}

fn train(n_episodes: usize, model_dir: &str) -> Result<()> {
    // The reward of the regulator is a cost and the problem has no terminal
    // time, so episodes are cut after a fixed number of steps.
    let config = TrainerConfig::default()
        .n_episodes(n_episodes)
        .max_steps_per_episode(MAX_STEPS_PER_EPISODE)
        .reward_sign(RewardSign::Negate)
        .mean_window(MEAN_WINDOW)
        .model_dir(model_dir);
    fs::create_dir_all(model_dir)?;
    config.save(Path::new(model_dir).join("trainer.yaml"))?;
    let mut trainer = Trainer::build(config);
    let mut env = RegulatorProblem::build(&env_config(), 0)?;
    let mut agent = create_agent(n_episodes)?;
    let mut recorder = NullRecorder::default();

    let history = trainer.train(&mut env, &mut agent, &mut recorder)?;
    save_history(&history, model_dir, "costs")?;

    Ok(())
}

fn eval(n_episodes: usize, model_dir: &str) -> Result<()> {
    let mut agent = {
        let mut agent = create_agent(1)?;
        agent.load_params(&Path::new(model_dir).join("final"))?;
        agent.eval();
        agent
    };
    let mut evaluator = DefaultEvaluator::<RegulatorProblem>::new(
        &env_config(),
        0,
        n_episodes,
        MAX_STEPS_PER_EPISODE,
    )?;
    let record = evaluator.evaluate(&mut agent)?;

    let mut report = EvalReport::new();
    report.add("naf cost", &[record.get_scalar("episode_return")?]);
    report.save(Path::new(model_dir).join("eval.csv"))?;

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.train {
        train(args.n_episodes, &args.model_dir)?;
    } else if args.eval {
        eval(N_EPISODES_PER_EVAL, &args.model_dir)?;
    } else {
        train(args.n_episodes, &args.model_dir)?;
        eval(N_EPISODES_PER_EVAL, &args.model_dir)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use naflab_core::RewardHistory;
    use tempdir::TempDir;

    #[test]
    fn test_naf_regulator() -> Result<()> {
        let model_dir = TempDir::new("naf_regulator")?;
        let model_dir = model_dir.path().to_str().unwrap();
        train(1, model_dir)?;
        eval(1, model_dir)?;

        // Costs are stored with their original, positive sign.
        let history = RewardHistory::load(Path::new(model_dir).join("costs.csv"), MEAN_WINDOW)?;
        assert_eq!(history.len(), 1);
        assert!(history.rewards[0] > 0.0);
        Ok(())
    }
}
