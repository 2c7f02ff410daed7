//! The `flowsim` command line tool.
//!
//! Runs the sampling flow simulation for a population of errors and transactions and prints the
//! result as JSON or as a text summary. Configuration is read from a `config.yml` in the config
//! folder (`.flowsim` by default), and most values can be overridden on the command line:
//!
//! ```text
//! flowsim run --seed 42 --errors 500 --transactions 5000 --summary
//! flowsim rates --pretty
//! flowsim frame --seed 42 --time 2.5
//! flowsim config init
//! ```

mod cli;
mod cliapp;
mod setup;
mod summary;

use std::process;

pub fn main() {
    let exit_code = match cli::execute() {
        Ok(()) => 0,
        Err(err) => {
            flowsim_log::ensure_error(&err);
            1
        }
    };

    process::exit(exit_code);
}
