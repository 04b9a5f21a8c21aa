pub mod actions;
pub mod auth;
pub mod cli;
pub mod command;
pub mod error;
pub mod forge;
pub mod pipeline;
pub mod result;
pub mod tag;
pub mod workspace;

pub use command::{execute, publish};
pub use error::ActionError;
pub use result::Result;

#[cfg(test)]
mod test_helpers;
