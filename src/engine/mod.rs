mod async_engine;
mod command;

pub use async_engine::AsyncEngine;
pub use command::{Command, CommandRow, CommandType, MissingField};
