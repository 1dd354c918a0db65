pub mod rewards;
pub mod scorer;
pub mod stake;

pub use rewards::{leaderboard, submissions_from, ParticipantScore, RewardCalculator, Submission};
pub use scorer::{NearestMatch, ParticipantScorer, MAX_DISTANCE};
pub use stake::{staking_modifier, Stake, RAW_UNITS_PER_WHOLE};
