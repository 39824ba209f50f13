//! tunedl - Download and tag music from a Subsonic library

pub mod cli;
pub mod config;
pub mod download;
pub mod library;
pub mod player;
pub mod service;
pub mod utils;
