//! Standard test runner: single run, compare output against expected file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::build::project_root;
use crate::qemu::run_qemu;
use crate::runner::RunOptions;

/// Run a standard test.
///
/// Executes the example once. UART0 carries what the transport put on the wire and the
/// semihosting stream carries the mirror of it; both must match the expected file.
pub fn run_standard(example: &str, elf_path: &Path, opts: &RunOptions) -> Result<bool> {
    println!("Running in QEMU...");
    let output = run_qemu(elf_path)?;
    let semihosting = String::from_utf8_lossy(&output.semihosting).into_owned();
    let uart0 = String::from_utf8_lossy(&output.uart0).into_owned();

    if opts.verbose {
        print!("{uart0}");
        println!("--- QEMU run end ---");

        if semihosting != uart0 {
            println!("ERROR: Semihosting and UART output differs");
            println!("--- semihosting ---");
            print!("{semihosting}");
            return Ok(false);
        }
        println!("PASS: Semihosting and UART output is equal");
        return Ok(true);
    }

    let expected_path = project_root()
        .join("testsuite")
        .join("expected")
        .join(format!("{example}.expected"));

    if opts.bless {
        let status = if expected_path.exists() {
            let existing = fs::read_to_string(&expected_path)?;
            if existing == uart0 {
                "No change"
            } else {
                fs::write(&expected_path, &uart0)?;
                "Updated"
            }
        } else {
            if let Some(dir) = expected_path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&expected_path, &uart0)?;
            "Created"
        };
        println!("  {example}.expected: {status}");
        if semihosting != uart0 {
            println!("  WARNING: semihosting mirror differs from UART output");
        }
        Ok(true)
    } else if expected_path.exists() {
        let expected = fs::read_to_string(&expected_path)
            .with_context(|| format!("Failed to read {}", expected_path.display()))?;
        if uart0 == expected && semihosting == expected {
            println!("  PASS");
            Ok(true)
        } else {
            println!("  FAIL: output differs from expected");
            println!("--- expected ---");
            print!("{expected}");
            println!("--- uart ---");
            print!("{uart0}");
            println!("--- semihosting ---");
            print!("{semihosting}");
            Ok(false)
        }
    } else {
        println!("  No expected output file, run with --bless to create");
        println!("--- output ---");
        print!("{uart0}");
        Ok(false)
    }
}
