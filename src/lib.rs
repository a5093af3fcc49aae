mod client;
mod config;
mod run;

pub use client::*;
pub use config::*;
pub use run::*;
