//! Daemon entrypoint; see [`bridged::run_daemon`].

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match bridged::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            writeln!(stderr, "bridged: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
