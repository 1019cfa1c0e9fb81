pub mod data;
pub mod habits;
pub mod repetitions;
