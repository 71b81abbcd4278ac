#![cfg_attr(not(test), no_std)]

pub mod battery;
pub mod bluetooth;
pub mod config;
pub mod connection;
pub mod errors;
pub mod indicator;
pub mod led;
pub mod meeting;
pub mod messages;

#[cfg(feature = "firmware")]
pub mod board;
