use crate::env::Environment;

/// A single interaction (transition) between a seat and the environment
pub struct Exp<E: Environment> {
    /// The state observed before acting
    pub state: E::State,
    /// The action taken in `state`
    pub action: E::Action,
    /// The state observed after acting, or if terminal, `None`
    pub next_state: Option<E::State>,
    /// The reward received for the action
    pub reward: f32,
}

impl<E: Environment> Exp<E> {
    /// Whether this interaction ended the episode
    pub fn is_terminal(&self) -> bool {
        self.next_state.is_none()
    }
}

impl<E: Environment> Clone for Exp<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            action: self.action.clone(),
            next_state: self.next_state.clone(),
            reward: self.reward,
        }
    }
}

/// A zipped batch of [interactions](Exp)
pub struct ExpBatch<E: Environment> {
    pub states: Vec<E::State>,
    pub actions: Vec<E::Action>,
    pub next_states: Vec<Option<E::State>>,
    pub rewards: Vec<f32>,
}

impl<E: Environment> ExpBatch<E> {
    /// Unzip borrowed interactions into a batch of `batch_size` columns
    pub fn from_refs<'a>(iter: impl IntoIterator<Item = &'a Exp<E>>, batch_size: usize) -> Self
    where
        E: 'a,
    {
        let batch = Self {
            states: Vec::with_capacity(batch_size),
            actions: Vec::with_capacity(batch_size),
            next_states: Vec::with_capacity(batch_size),
            rewards: Vec::with_capacity(batch_size),
        };

        iter.into_iter().fold(batch, |mut b, e| {
            b.states.push(e.state.clone());
            b.actions.push(e.action.clone());
            b.next_states.push(e.next_state.clone());
            b.rewards.push(e.reward);
            b
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
