//! External nmap invocation and open-port counting.

mod parse;
mod runner;

pub use parse::count_open;
pub use runner::{ScanCommand, ScanOutput, DEFAULT_ARGS, DEFAULT_PROGRAM};
