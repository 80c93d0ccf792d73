#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod cancel;
pub mod cli;
pub mod cloud;
pub mod control;
pub mod error;
pub mod manifest;
pub mod ops;
pub mod request;
pub mod retry;
pub mod stats;
pub mod storage;

mod file;
mod format;
mod logger;

#[cfg(test)]
mod testing;
