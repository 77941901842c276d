use rl_harness::{
    agent::{Policy, RandomAgent},
    gym::HighCard,
    harness::{EvaluationScheduler, HarnessError},
};

const EVALUATE_NUM: u64 = 10_000;

/// Measures the average payoff of random play at seat 0, the baseline a learner has to beat
fn main() -> Result<(), HarnessError> {
    let mut env = HighCard::default();
    let mut opener = RandomAgent::new();
    let mut responder = RandomAgent::new();

    let evaluation = EvaluationScheduler::new(1, EVALUATE_NUM);
    let mut seats: [&mut dyn Policy<HighCard>; 2] = [&mut opener, &mut responder];
    let reward = evaluation.evaluate(&mut env, &mut seats)?;

    println!("Random play over {EVALUATE_NUM} hands. Average reward is {reward}");
    Ok(())
}
