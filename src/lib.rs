pub mod api;
pub mod config;
pub mod extract;
pub mod job;
pub mod path;
pub mod pipeline;
pub mod retry;
pub mod runner;
pub mod store;
pub mod sweeper;
pub mod translation;
pub mod workspace;
pub mod wrap;
