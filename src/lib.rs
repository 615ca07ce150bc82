pub mod api;
pub mod board;
pub mod config;
pub mod db;
pub mod models;
pub mod rank;
pub mod repair;
