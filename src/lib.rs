// Library surface for the binary, headless drivers and integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod games;
pub mod history;
pub mod logging;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod ui;
