// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `capbind strategies` - list the default strategy table

use anyhow::Result;
use colored::Colorize;

use capbind_core::infrastructure::strategies::default_strategy_table;

pub async fn handle_command() -> Result<()> {
    let table = default_strategy_table();

    println!("{}", "Binder strategies (resolution order):".bold());
    for (position, (name, matcher)) in table.listing().into_iter().enumerate() {
        println!("  {:>2}. {:<22} {}", position + 1, name.bold(), matcher);
    }
    println!();
    println!("{} strategies registered", table.len());

    Ok(())
}
