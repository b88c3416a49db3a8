//! CP/M harness for running .COM programs such as the ZEXDOC/ZEXALL
//! instruction exercisers.
//!
//! Usage:
//!   cargo run -p specbolt-cpm --release -- path/to/zexdoc.com
//!
//! Console output from the program is printed as it runs. Set `RUST_LOG`
//! to `specbolt=warn` to see unimplemented-opcode reports, or
//! `specbolt::z80=trace` for an instruction trace.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use specbolt_core::FlatBus;
use specbolt_z80::{StopReason, Z80};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// COM files load here.
const TPA_START: u16 = 0x0100;
/// Our BDOS is a single RET; programs read 0x0006 to find the top of
/// usable memory, so it also sits just above the stack.
const BDOS_ENTRY: u16 = 0xFE00;
/// Boot stub: sets up the stack and enters the program.
const BOOT: u16 = 0xFF00;
/// Progress is reported after each slice of this many T-states.
const SLICE: u64 = 500_000_000;

#[derive(Debug, Error)]
enum HarnessError {
    #[error("program is {len} bytes; at most {max} fit below the BDOS")]
    ProgramTooLarge { len: usize, max: usize },
    #[error("CPU halted at {pc:#06X} with no way to wake")]
    Halted { pc: u16 },
}

fn build_machine(program: &[u8]) -> Result<Z80<FlatBus>, HarnessError> {
    let max = usize::from(BDOS_ENTRY - TPA_START);
    if program.len() > max {
        return Err(HarnessError::ProgramTooLarge {
            len: program.len(),
            max,
        });
    }

    let [boot_lo, boot_hi] = BOOT.to_le_bytes();
    let [bdos_lo, bdos_hi] = BDOS_ENTRY.to_le_bytes();
    let [tpa_lo, tpa_hi] = TPA_START.to_le_bytes();

    let mut bus = FlatBus::new();
    // 0x0000: JP BOOT. Reaching it again later is a warm boot.
    bus.load(0x0000, &[0xC3, boot_lo, boot_hi]);
    // 0x0005: JP BDOS.
    bus.load(0x0005, &[0xC3, bdos_lo, bdos_hi]);
    bus.load(BDOS_ENTRY, &[0xC9]);
    bus.load(
        BOOT,
        &[
            0x31, bdos_lo, bdos_hi, // LD SP,BDOS_ENTRY
            0x21, 0x00, 0x00, // LD HL,0x0000
            0xE5, // PUSH HL: RET from the program warm-boots
            0xC3, tpa_lo, tpa_hi, // JP TPA_START
        ],
    );
    bus.load(TPA_START, program);

    let mut cpu = Z80::new(bus);
    cpu.add_breakpoint(0x0000);
    cpu.add_breakpoint(BDOS_ENTRY);
    Ok(cpu)
}

/// Service a BDOS call. Returns true when the program asked to exit.
fn handle_bdos(cpu: &mut Z80<FlatBus>, out: &mut impl Write) -> io::Result<bool> {
    let regs = cpu.snapshot();
    match regs.c {
        0 => return Ok(true),
        2 => out.write_all(&[regs.e])?,
        9 => {
            let mut address = regs.de();
            loop {
                let ch = cpu.read_memory(address);
                if ch == b'$' {
                    break;
                }
                out.write_all(&[ch])?;
                address = address.wrapping_add(1);
            }
        }
        function => tracing::debug!(function, "ignoring BDOS call"),
    }
    out.flush()?;
    Ok(false)
}

fn run(path: &str) -> Result<()> {
    let program = fs::read(path).with_context(|| format!("reading {path}"))?;
    let mut cpu = build_machine(&program)?;
    let mut out = io::stdout().lock();

    tracing::info!(path, bytes = program.len(), "running");
    let start = Instant::now();
    let mut cycles: u64 = 0;
    let mut next_report = SLICE;

    loop {
        let outcome = cpu.run(SLICE);
        cycles += outcome.cycles;
        match outcome.reason {
            StopReason::Breakpoint(BDOS_ENTRY) => {
                if handle_bdos(&mut cpu, &mut out)? {
                    break;
                }
            }
            StopReason::Breakpoint(_) => break,
            StopReason::Halted => {
                return Err(HarnessError::Halted {
                    pc: cpu.snapshot().pc,
                }
                .into());
            }
            StopReason::BudgetExhausted => {}
        }

        if cycles >= next_report {
            tracing::info!(
                seconds = start.elapsed().as_secs_f64(),
                billion_cycles = cycles as f64 / 1e9,
                "progress"
            );
            next_report += SLICE;
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    tracing::info!(
        seconds = elapsed,
        cycles,
        mhz = cycles as f64 / elapsed / 1e6,
        "completed"
    );
    if let Some(fault) = cpu.take_fault() {
        tracing::warn!(%fault, "last fault reported during run");
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("Usage: cpm <program.com>");
        eprintln!("  Runs a CP/M .COM file with BDOS console output (functions 0, 2, 9).");
        return Ok(ExitCode::FAILURE);
    };
    run(&path)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_string_and_exits_through_warm_boot() {
        let program = [
            0x11, 0x09, 0x01, // LD DE,msg
            0x0E, 0x09, // LD C,9
            0xCD, 0x05, 0x00, // CALL 5
            0xC9, // RET
            b'o', b'k', b'$',
        ];
        let mut cpu = build_machine(&program).expect("fits");
        let mut out = Vec::new();

        let first = cpu.run(1_000);
        assert_eq!(first.reason, StopReason::Breakpoint(BDOS_ENTRY));
        assert!(!handle_bdos(&mut cpu, &mut out).expect("write"));
        assert_eq!(out, b"ok");

        let second = cpu.run(1_000);
        assert_eq!(second.reason, StopReason::Breakpoint(0x0000));
    }

    #[test]
    fn rejects_oversized_program() {
        let program = vec![0; 0xFF00];
        assert!(matches!(
            build_machine(&program),
            Err(HarnessError::ProgramTooLarge { .. })
        ));
    }
}
