/// Running per-feature mean and standard deviation of observed states (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    count: u64,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

const MIN_STD: f64 = 1e-8;

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states observed so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Fold one state into the statistics
    ///
    /// The first observed state fixes the feature count; states of a different length are ignored.
    pub fn observe(&mut self, state: &[f32]) {
        if self.count == 0 {
            self.mean = vec![0.0; state.len()];
            self.m2 = vec![0.0; state.len()];
        } else if state.len() != self.mean.len() {
            log::warn!(
                "ignoring state of length {} (expected {})",
                state.len(),
                self.mean.len()
            );
            return;
        }

        self.count += 1;
        let n = self.count as f64;
        for ((x, mean), m2) in state.iter().zip(&mut self.mean).zip(&mut self.m2) {
            let x = *x as f64;
            let delta = x - *mean;
            *mean += delta / n;
            *m2 += delta * (x - *mean);
        }
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Population standard deviation of every feature
    pub fn std(&self) -> Vec<f64> {
        let n = self.count.max(1) as f64;
        self.m2.iter().map(|m2| (m2 / n).sqrt()).collect()
    }

    /// Standardize a state with the statistics gathered so far
    ///
    /// Returns the state unchanged until something has been observed. Constant features are only centered.
    pub fn normalize(&self, state: &[f32]) -> Vec<f32> {
        if self.count == 0 || state.len() != self.mean.len() {
            return state.to_vec();
        }

        state
            .iter()
            .zip(&self.mean)
            .zip(self.std())
            .map(|((x, mean), std)| {
                let std = if std < MIN_STD { 1.0 } else { std };
                ((*x as f64 - mean) / std) as f32
            })
            .collect()
    }
}
