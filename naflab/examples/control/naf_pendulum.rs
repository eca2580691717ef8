use anyhow::Result;
use clap::Parser;
use naflab::util::{save_history, EvalReport};
use naflab_candle_agent::{
    naf::{Naf, NafConfig, NafModelConfig, NoiseConfig},
    opt::OptimizerConfig,
};
use naflab_core::{
    record::NullRecorder, replay_buffer::ReplayBufferConfig, Agent, DefaultEvaluator, Env as _,
    Evaluator as _, Trainer, TrainerConfig,
};
use naflab_env::{TerminalPendulum, TerminalPendulumConfig};
use std::{fs, path::Path};

const LR: f64 = 1e-3;
const BATCH_SIZE: usize = 128;
const GAMMA: f64 = 1.0;
const TAU: f64 = 1e-2;
const UNITS: [usize; 2] = [32, 32];
const REPLAY_BUFFER_CAPACITY: usize = 100_000;
const THRESHOLD_MIN: f64 = 1e-2;
const MEAN_WINDOW: usize = 25;
const N_EPISODES_PER_EVAL: usize = 5;

fn env_config() -> TerminalPendulumConfig {
    TerminalPendulumConfig::default()
}

fn create_agent(n_episodes: usize) -> Result<Naf> {
    let config = env_config();
    let model_config = NafModelConfig::new(
        TerminalPendulum::STATE_DIM,
        config.action_min.clone(),
        config.action_max.clone(),
        UNITS.to_vec(),
    )
    .opt_config(OptimizerConfig::default().learning_rate(LR));
    let naf_config = NafConfig::new(model_config)
        .noise_config(NoiseConfig::geometric_over(1.0, THRESHOLD_MIN, n_episodes))
        .replay_buffer_config(ReplayBufferConfig::default().capacity(REPLAY_BUFFER_CAPACITY))
        .batch_size(BATCH_SIZE)
        .gamma(GAMMA)
        .tau(TAU);
    Naf::build(naf_config)
}

/// Train/eval NAF agent on the pendulum with terminal time
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
    #[arg(long, default_value_t = 200)]
    n_episodes: usize,

    /// Directory of the model parameters and the rewards
    #[arg(long, default_value = "./naflab/examples/control/model/naf_pendulum")]
    model_dir: String,
}

fn train(n_episodes: usize, model_dir: &str) -> Result<()> {
    let config = TrainerConfig::default()
        .n_episodes(n_episodes)
        .mean_window(MEAN_WINDOW)
        .model_dir(model_dir);
    fs::create_dir_all(model_dir)?;
    config.save(Path::new(model_dir).join("trainer.yaml"))?;
    let mut trainer = Trainer::build(config);
    let mut env = TerminalPendulum::build(&env_config(), 0)?;
    let mut agent = create_agent(n_episodes)?;
    let mut recorder = NullRecorder::default();

    let history = trainer.train(&mut env, &mut agent, &mut recorder)?;
    save_history(&history, model_dir, "rewards")?;

    Ok(())
}

fn eval(n_episodes: usize, model_dir: &str) -> Result<()> {
    let mut agent = {
        let mut agent = create_agent(1)?;
        agent.load_params(&Path::new(model_dir).join("final"))?;
        agent.eval();
        agent
    };
    let mut evaluator =
        DefaultEvaluator::<TerminalPendulum>::new(&env_config(), 0, n_episodes, usize::MAX)?;
    let record = evaluator.evaluate(&mut agent)?;

    let mut report = EvalReport::new();
    report.add("naf", &[record.get_scalar("episode_return")?]);
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
