/// Keeps learning switched off until enough interactions have been collected
///
/// The first `prefill_size` interactions fill the agent's replay memory and the following
/// `norm_size` are reserved for state normalization statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupGate {
    prefill_size: u64,
    norm_size: u64,
}

impl WarmupGate {
    pub fn new(prefill_size: u64, norm_size: u64) -> Self {
        Self {
            prefill_size,
            norm_size,
        }
    }

    /// Last interaction count at which the gate is still closed
    pub fn threshold(&self) -> u64 {
        self.prefill_size.saturating_add(self.norm_size)
    }

    /// Whether an optimization step may run once `total_interactions` have been fed to the agent
    pub fn should_train(&self, total_interactions: u64) -> bool {
        total_interactions > self.threshold()
    }
}
