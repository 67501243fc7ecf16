pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod ops;
pub mod order;
pub mod output;
pub mod render;
pub mod tree;
pub mod tui;
pub mod ui;
pub mod validate;
pub mod watch;
