//! Bidirectional references for markdown vaults.
//!
//! A reference token names a text range in another document. This crate
//! decodes and encodes tokens, indexes the backlinks they imply, and drives
//! the hover, cursor, and backlink previews a host editor shows for them.

pub mod check;
pub mod codec;
pub mod commands;
pub mod config;
pub mod context;
pub mod controller;
pub mod corpus;
pub mod error;
pub mod events;
pub mod hasher;
pub mod host;
pub mod index;
pub mod locate;
pub mod scanner;
pub mod schedule;
pub mod store;
pub mod types;
pub mod watch;

#[cfg(test)]
mod fake_host;
