// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for capbind CLI

pub mod config;
pub mod strategies;
pub mod synth;

pub use self::config::ConfigCommand;
pub use self::synth::{OutputFormat, SynthArgs};
