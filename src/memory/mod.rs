mod base;
mod exp;
mod normalizer;

pub use base::ReplayMemory;
pub use exp::*;
pub use normalizer::Normalizer;
