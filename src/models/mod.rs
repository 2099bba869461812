pub mod api;
pub mod generation;
