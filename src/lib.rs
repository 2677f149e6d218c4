pub mod app;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod maintenance;
pub mod publisher;
pub mod repository;
pub mod scheduler;
