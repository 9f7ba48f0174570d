pub mod anticheat;
pub mod app;
pub mod config;
pub mod engine;
pub mod event;
pub mod generator;
pub mod logging;
pub mod plan;
pub mod service;
pub mod session;
pub mod store;
pub mod text;
pub mod ui;
