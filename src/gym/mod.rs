pub mod high_card;

pub use high_card::{HCAction, HighCard, HighCardError};
