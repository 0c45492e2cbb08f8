//! Test runner dispatch and common types.

use anyhow::Result;

use crate::build::build_example;
use crate::standard::run_standard;

/// Options for running an example.
pub struct RunOptions {
    /// Print the captured output instead of comparing it (for `qemu` command).
    pub verbose: bool,
    /// Update expected files instead of comparing (for `test --bless`).
    pub bless: bool,
    /// Build in release mode.
    pub release: bool,
}

/// Build and run an example with the given options.
///
/// Returns `Ok(true)` if the test passed, `Ok(false)` if it failed.
pub fn run_example(example: &str, opts: &RunOptions) -> Result<bool> {
    println!("Building '{example}'...");
    let elf_path = build_example(example, opts.release)?;
    run_standard(example, &elf_path, opts)
}
