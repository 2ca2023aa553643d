#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod assets;
pub mod battery;
pub mod complication;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod mode;
pub mod peer;
pub mod scheduler;
pub mod time_source;
pub mod ui;
