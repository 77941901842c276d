use rand::{seq::index::sample, thread_rng};
use strum::{EnumIter, FromRepr, VariantArray};
use thiserror::Error;

use crate::{
    agent::Policy,
    env::{Episode, Environment, Mode},
    memory::Exp,
};

const SEATS: usize = 2;

#[derive(EnumIter, VariantArray, FromRepr, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum HCAction {
    Pass = 0,
    Bet = 1,
}

impl From<HCAction> for usize {
    fn from(action: HCAction) -> Self {
        action as usize
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HighCardError {
    #[error("high card seats exactly two players, {0} were given")]
    Seats(usize),
    #[error("seat {0} declined to act")]
    NoAction(usize),
}

/// A two-seat, one-street betting game
///
/// Each seat antes one chip and is dealt a distinct card from a deck of `deck_size` ranks. Seat 0
/// either checks to a showdown (worth the ante) or bets one more chip. Facing a bet, seat 1 folds
/// and forfeits its ante, or calls and the showdown is worth two chips. Higher card wins.
///
/// A seat observes its own card one-hot encoded followed by a flag telling whether a bet is
/// pending, so states have shape `[deck_size + 1]`.
pub struct HighCard {
    deck_size: usize,
    timestep: u64,
}

impl HighCard {
    /// ### Panics
    ///
    /// Panics if `deck_size < 2`
    pub fn new(deck_size: usize) -> Self {
        assert!(deck_size >= SEATS, "deck needs at least one card per seat");
        Self {
            deck_size,
            timestep: 0,
        }
    }

    fn observe(&self, card: usize, facing_bet: bool) -> Vec<f32> {
        let mut state = vec![0.0; self.deck_size + 1];
        state[card] = 1.0;
        state[self.deck_size] = if facing_bet { 1.0 } else { 0.0 };
        state
    }

    fn decide(
        &mut self,
        seat: &mut dyn Policy<Self>,
        index: usize,
        state: &Vec<f32>,
        mode: Mode,
    ) -> Result<HCAction, HighCardError> {
        self.timestep += 1;
        let legal = HCAction::VARIANTS;
        let action = match mode {
            Mode::Training => seat.step(state, legal),
            Mode::Evaluation => seat.eval_step(state, legal),
        };
        action.ok_or(HighCardError::NoAction(index))
    }

    /// Play one hand with `cards[i]` dealt to seat `i`
    fn play(
        &mut self,
        seats: &mut [&mut dyn Policy<Self>],
        mode: Mode,
        cards: [usize; SEATS],
    ) -> Result<Episode<Self>, HighCardError> {
        if seats.len() != SEATS {
            return Err(HighCardError::Seats(seats.len()));
        }

        let showdown = |stake: f32| {
            if cards[0] > cards[1] {
                stake
            } else {
                -stake
            }
        };

        let opening = self.observe(cards[0], false);
        let first = self.decide(&mut *seats[0], 0, &opening, mode)?;

        let (payoff, response) = match first {
            HCAction::Pass => (showdown(1.0), None),
            HCAction::Bet => {
                let facing = self.observe(cards[1], true);
                let second = self.decide(&mut *seats[1], 1, &facing, mode)?;
                let payoff = match second {
                    HCAction::Pass => 1.0,
                    HCAction::Bet => showdown(2.0),
                };
                (payoff, Some((facing, second)))
            }
        };

        let payoffs = vec![payoff, -payoff];
        let trajectories = match mode {
            Mode::Evaluation => Vec::new(),
            Mode::Training => {
                let opener = vec![Exp {
                    state: opening,
                    action: first,
                    next_state: None,
                    reward: payoff,
                }];
                let responder = response
                    .map(|(state, action)| Exp {
                        state,
                        action,
                        next_state: None,
                        reward: -payoff,
                    })
                    .into_iter()
                    .collect();
                vec![opener, responder]
            }
        };

        Ok(Episode {
            trajectories,
            payoffs,
        })
    }
}

impl Default for HighCard {
    fn default() -> Self {
        Self::new(13)
    }
}

impl Environment for HighCard {
    type State = Vec<f32>;
    type Action = HCAction;
    type Error = HighCardError;

    fn num_players(&self) -> usize {
        SEATS
    }

    fn num_actions(&self) -> usize {
        HCAction::VARIANTS.len()
    }

    fn state_shape(&self) -> Vec<usize> {
        vec![self.deck_size + 1]
    }

    fn timestep(&self) -> u64 {
        self.timestep
    }

    fn run(
        &mut self,
        seats: &mut [&mut dyn Policy<Self>],
        mode: Mode,
    ) -> Result<Episode<Self>, Self::Error> {
        let dealt = sample(&mut thread_rng(), self.deck_size, SEATS);
        self.play(seats, mode, [dealt.index(0), dealt.index(1)])
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use crate::agent::RandomAgent;

    use super::*;

    /// Always plays the same action, or refuses to act
    struct Fixed(Option<HCAction>);

    impl Policy<HighCard> for Fixed {
        fn step(&mut self, _state: &Vec<f32>, _legal: &[HCAction]) -> Option<HCAction> {
            self.0
        }

        fn eval_step(&mut self, state: &Vec<f32>, legal: &[HCAction]) -> Option<HCAction> {
            self.step(state, legal)
        }
    }

    fn hand(
        opener: HCAction,
        responder: HCAction,
        cards: [usize; 2],
        mode: Mode,
    ) -> (HighCard, Episode<HighCard>) {
        let mut env = HighCard::new(4);
        let mut a = Fixed(Some(opener));
        let mut b = Fixed(Some(responder));
        let mut seats: [&mut dyn Policy<HighCard>; 2] = [&mut a, &mut b];
        let episode = env.play(&mut seats, mode, cards).unwrap();
        (env, episode)
    }

    #[test]
    fn check_goes_to_showdown_for_the_ante() {
        let (env, episode) = hand(HCAction::Pass, HCAction::Bet, [3, 1], Mode::Training);
        assert_eq!(episode.payoffs, vec![1.0, -1.0]);
        assert_eq!(env.timestep(), 1, "seat 1 never acts");
        assert_eq!(episode.trajectories[0].len(), 1);
        assert!(episode.trajectories[1].is_empty());

        let exp = &episode.trajectories[0][0];
        assert_eq!(exp.state, vec![0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(exp.action, HCAction::Pass);
        assert!(exp.is_terminal());
        assert_eq!(exp.reward, 1.0);
    }

    #[test]
    fn fold_forfeits_the_ante() {
        let (_, episode) = hand(HCAction::Bet, HCAction::Pass, [0, 3], Mode::Training);
        assert_eq!(episode.payoffs, vec![1.0, -1.0]);

        let response = &episode.trajectories[1][0];
        assert_eq!(response.state, vec![0.0, 0.0, 0.0, 1.0, 1.0]);
        assert_eq!(response.reward, -1.0);
    }

    #[test]
    fn call_doubles_the_stake() {
        let (env, episode) = hand(HCAction::Bet, HCAction::Bet, [0, 3], Mode::Training);
        assert_eq!(episode.payoffs, vec![-2.0, 2.0]);
        assert_eq!(env.timestep(), 2);
        assert_eq!(episode.trajectories[0][0].reward, -2.0);
        assert_eq!(episode.trajectories[1][0].reward, 2.0);
    }

    #[test]
    fn evaluation_skips_trajectories() {
        let (_, episode) = hand(HCAction::Bet, HCAction::Bet, [2, 1], Mode::Evaluation);
        assert!(episode.trajectories.is_empty());
        assert_eq!(episode.payoff(0), Some(2.0));
    }

    #[test]
    fn rejects_bad_tables() {
        let mut env = HighCard::new(4);
        let mut a = Fixed(None);
        let mut b = Fixed(Some(HCAction::Bet));

        let mut lonely: [&mut dyn Policy<HighCard>; 1] = [&mut a];
        assert_eq!(
            env.run(&mut lonely, Mode::Training).err(),
            Some(HighCardError::Seats(1))
        );

        let mut seats: [&mut dyn Policy<HighCard>; 2] = [&mut a, &mut b];
        assert_eq!(
            env.run(&mut seats, Mode::Training).err(),
            Some(HighCardError::NoAction(0))
        );
    }

    #[test]
    fn random_play_is_zero_sum() {
        let mut env = HighCard::default();
        let mut a = RandomAgent::new();
        let mut b = RandomAgent::new();
        for _ in 0..200 {
            let mut seats: [&mut dyn Policy<HighCard>; 2] = [&mut a, &mut b];
            let episode = env.run(&mut seats, Mode::Training).unwrap();
            assert_eq!(episode.payoffs.iter().sum::<f32>(), 0.0);
            assert!(episode.payoff(0).unwrap().abs() <= 2.0);
        }
        assert!(env.timestep() >= 200);
        assert_eq!(HCAction::iter().count(), env.num_actions());
        assert_eq!(HCAction::from_repr(1), Some(HCAction::Bet));
    }
}
