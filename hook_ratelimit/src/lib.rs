pub mod cooldown;
pub mod round;
pub mod sliding_log;

pub use cooldown::Cooldown;
pub use round::round_up;
pub use sliding_log::SlidingLog;
