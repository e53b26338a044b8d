mod checkpoint_dto;

pub use checkpoint_dto::*;
