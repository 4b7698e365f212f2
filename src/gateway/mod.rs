//! Gateway orchestration

mod builder;
mod handler;

pub use builder::{Recogate, RecogateBuilder};
pub use handler::Gateway;
