//! Two NAF agents learning the paratrooper game.
//!
//! U and V are first trained together with alternating updates. The trained
//! U is then evaluated against fixed V policies, and a fresh V is trained
//! against the trained U.
use anyhow::Result;
use clap::Parser;
use naflab::util::{save_history, EvalReport};
use naflab_candle_agent::naf::{Naf, NafConfig, NafModelConfig, NoiseConfig};
use naflab_core::{
    evaluate_game, record::NullRecorder, Action, Agent, Game as _, GameTrainer, Policy, Role,
    State, TrainerConfig,
};
use naflab_env::{
    opponents::{DummyUAgent, DummyVAgent, OptimalUAgent, OptimalVAgent},
    UnequalGame, UnequalGameConfig,
};
use std::path::Path;

const BATCH_SIZE: usize = 64;
const UNITS: [usize; 2] = [16, 16];
const BLOCK_LEN: usize = 100;
const MEAN_WINDOW: usize = 50;
const U_THRESHOLD_MIN: f64 = 1e-7;
const V_THRESHOLD_MIN: f64 = 1e-6;

/// Decrement of the noise threshold per step, applied once per episode.
const THRESHOLD_DECREMENT_PER_STEP: f64 = 2e-6;
const N_EPISODES_PER_EVAL: usize = 10;
const DUMMY_U_SEED: u64 = 42;

fn game_config() -> UnequalGameConfig {
    UnequalGameConfig::default()
}

fn steps_per_episode(config: &UnequalGameConfig) -> usize {
    (config.terminal_time / config.dt).round() as usize
}

fn create_agent(action_max: f64, threshold_min: f64) -> Result<Naf> {
    let config = game_config();
    let decrement = THRESHOLD_DECREMENT_PER_STEP * steps_per_episode(&config) as f64;
    let model_config = NafModelConfig::new(
        UnequalGame::STATE_DIM,
        vec![-action_max],
        vec![action_max],
        UNITS.to_vec(),
    );
    let naf_config = NafConfig::new(model_config)
        .noise_config(NoiseConfig::linear(1.0, threshold_min, decrement))
        .batch_size(BATCH_SIZE);
    Naf::build(naf_config)
}

fn create_u_agent() -> Result<Naf> {
    create_agent(game_config().u_max, U_THRESHOLD_MIN)
}

fn create_v_agent() -> Result<Naf> {
    create_agent(game_config().v_max, V_THRESHOLD_MIN)
}

/// Train NAF agents of both players of the paratrooper game
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The number of episodes of alternating training
    #[arg(long, default_value_t = 1000)]
    n_episodes: usize,

    /// Directory of the model parameters, the rewards and the evaluations
    #[arg(long, default_value = "./naflab/examples/game/model/naf_paratrooper")]
    model_dir: String,
}

fn evaluate<U, V>(report: &mut EvalReport, title: &str, u: &mut U, v: &mut V) -> Result<()>
where
    U: Policy<State, Action>,
    V: Policy<State, Action>,
{
    let mut game = UnequalGame::build(&game_config(), 0)?;
    let returns = evaluate_game(&mut game, u, v, N_EPISODES_PER_EVAL, usize::MAX)?;
    report.add(title, &returns);
    Ok(())
}

fn train(n_episodes: usize, model_dir: &str) -> Result<EvalReport> {
    let config = game_config();
    let mut game = UnequalGame::build(&config, 0)?;
    let mut report = EvalReport::new();

    // Alternating updates of U and V
    let mut u_agent = create_u_agent()?;
    let mut v_agent = create_v_agent()?;
    let mut trainer = GameTrainer::build(
        TrainerConfig::default()
            .n_episodes(n_episodes)
            .block_len(BLOCK_LEN)
            .mean_window(MEAN_WINDOW)
            .model_dir(Path::new(model_dir).join("alternating").to_string_lossy()),
    );
    let history = trainer.train_alternating(
        &mut game,
        &mut u_agent,
        &mut v_agent,
        &mut NullRecorder::default(),
    )?;
    save_history(&history, model_dir, "alternating")?;

    // Trained U against fixed V
    u_agent.eval();
    evaluate(&mut report, "u vs optimal v", &mut u_agent, &mut OptimalVAgent::new(&config))?;
    for c in [0.0, 0.5, 1.0] {
        let title = format!("u vs constant {} v", c);
        evaluate(&mut report, &title, &mut u_agent, &mut DummyVAgent::new(c))?;
    }

    // Fresh V against fixed U, before and after training against the trained U
    let mut v_agent = create_v_agent()?;
    v_agent.set_noise_threshold(0.0);
    evaluate(
        &mut report,
        "dummy u vs v before learning",
        &mut DummyUAgent::new(&config, DUMMY_U_SEED),
        &mut v_agent,
    )?;
    evaluate(
        &mut report,
        "optimal u vs v before learning",
        &mut OptimalUAgent::new(&config),
        &mut v_agent,
    )?;

    v_agent.set_noise_threshold(1.0);
    let mut trainer = GameTrainer::build(
        TrainerConfig::default()
            .n_episodes(2 * n_episodes)
            .mean_window(MEAN_WINDOW)
            .model_dir(Path::new(model_dir).join("v_against_u").to_string_lossy()),
    );
    let history = trainer.train_against(
        &mut game,
        &mut v_agent,
        Role::V,
        &mut u_agent,
        &mut NullRecorder::default(),
    )?;
    save_history(&history, model_dir, "v_against_u")?;

    v_agent.set_noise_threshold(0.0);
    evaluate(
        &mut report,
        "dummy u vs v after learning",
        &mut DummyUAgent::new(&config, DUMMY_U_SEED),
        &mut v_agent,
    )?;
    evaluate(
        &mut report,
        "optimal u vs v after learning",
        &mut OptimalUAgent::new(&config),
        &mut v_agent,
    )?;

    report.save(Path::new(model_dir).join("eval.csv"))?;
    Ok(report)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    train(args.n_episodes, &args.model_dir)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_naf_paratrooper() -> Result<()> {
        let model_dir = TempDir::new("naf_paratrooper")?;
        let model_dir = model_dir.path().to_str().unwrap();
        let report = train(1, model_dir)?;

        assert_eq!(report.rows().len(), 8);
        assert!(report.rows().iter().all(|row| row.n_episodes == N_EPISODES_PER_EVAL));
        assert!(Path::new(model_dir).join("alternating.csv").exists());
        assert!(Path::new(model_dir)
            .join("alternating")
            .join("final")
            .join("u")
            .join("naf.safetensors")
            .exists());
        assert!(Path::new(model_dir).join("eval.csv").exists());
        Ok(())
    }
}
