pub mod checkpoints;
pub mod map;
