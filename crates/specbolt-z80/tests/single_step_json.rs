//! Single-instruction tests in the `SingleStepTests` JSON layout: an
//! initial machine state, the state after one instruction, and one entry
//! per T-state in `cycles`.

use serde::Deserialize;
use specbolt_core::FlatBus;
use specbolt_z80::{Registers, Z80};

#[derive(Debug, Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CpuState {
    pc: u16,
    sp: u16,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    i: u8,
    r: u8,
    wz: u16,
    ix: u16,
    iy: u16,
    af_: u16,
    bc_: u16,
    de_: u16,
    hl_: u16,
    im: u8,
    iff1: u8,
    iff2: u8,
    ram: Vec<(u16, u8)>,
}

impl CpuState {
    fn registers(&self) -> Registers {
        let mut regs = Registers::power_on();
        regs.pc = self.pc;
        regs.sp = self.sp;
        regs.a = self.a;
        regs.f = self.f;
        regs.set_bc(u16::from_be_bytes([self.b, self.c]));
        regs.set_de(u16::from_be_bytes([self.d, self.e]));
        regs.set_hl(u16::from_be_bytes([self.h, self.l]));
        regs.i = self.i;
        regs.r = self.r;
        regs.wz = self.wz;
        regs.ix = self.ix;
        regs.iy = self.iy;
        [regs.a_alt, regs.f_alt] = self.af_.to_be_bytes();
        [regs.b_alt, regs.c_alt] = self.bc_.to_be_bytes();
        [regs.d_alt, regs.e_alt] = self.de_.to_be_bytes();
        [regs.h_alt, regs.l_alt] = self.hl_.to_be_bytes();
        regs.im = self.im;
        regs.iff1 = self.iff1 != 0;
        regs.iff2 = self.iff2 != 0;
        regs
    }
}

const CASES: &str = r#"[
  {
    "name": "00 0000",
    "initial": {"pc": 4096, "sp": 32768, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0,
                "i": 0, "r": 127, "wz": 0, "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0, "ram": [[4096, 0]]},
    "final":   {"pc": 4097, "sp": 32768, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0,
                "i": 0, "r": 0, "wz": 0, "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0, "ram": [[4096, 0]]},
    "cycles": [[4096, 0, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"]]
  },
  {
    "name": "80 0000",
    "initial": {"pc": 8192, "sp": 32768, "a": 127, "b": 1, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0,
                "i": 0, "r": 0, "wz": 0, "ix": 0, "iy": 0, "af_": 4660, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 1, "iff1": 1, "iff2": 1, "ram": [[8192, 128]]},
    "final":   {"pc": 8193, "sp": 32768, "a": 128, "b": 1, "c": 0, "d": 0, "e": 0, "f": 148, "h": 0, "l": 0,
                "i": 0, "r": 1, "wz": 0, "ix": 0, "iy": 0, "af_": 4660, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 1, "iff1": 1, "iff2": 1, "ram": [[8192, 128]]},
    "cycles": [[8192, 128, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"]]
  },
  {
    "name": "dd 34 0000",
    "initial": {"pc": 12288, "sp": 32768, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 1, "h": 0, "l": 0,
                "i": 0, "r": 0, "wz": 0, "ix": 8192, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0,
                "ram": [[12288, 221], [12289, 52], [12290, 5], [8197, 127]]},
    "final":   {"pc": 12291, "sp": 32768, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 149, "h": 0, "l": 0,
                "i": 0, "r": 2, "wz": 8197, "ix": 8192, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0,
                "ram": [[12288, 221], [12289, 52], [12290, 5], [8197, 128]]},
    "cycles": [[12288, 221, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [12289, 52, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [12290, 5, "r-m-"], [null, null, "----"], [null, null, "----"],
               [null, null, "----"], [null, null, "----"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [8197, 127, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [8197, 128, "-wm-"], [null, null, "----"], [null, null, "----"]]
  },
  {
    "name": "ed b0 0000",
    "initial": {"pc": 16384, "sp": 32768, "a": 0, "b": 0, "c": 2, "d": 80, "e": 0, "f": 0, "h": 48, "l": 0,
                "i": 0, "r": 0, "wz": 0, "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0,
                "ram": [[16384, 237], [16385, 176], [12288, 18]]},
    "final":   {"pc": 16384, "sp": 32768, "a": 0, "b": 0, "c": 1, "d": 80, "e": 1, "f": 36, "h": 48, "l": 1,
                "i": 0, "r": 2, "wz": 16385, "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0,
                "ram": [[16384, 237], [16385, 176], [12288, 18], [20480, 18]]},
    "cycles": [[16384, 237, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [16385, 176, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [12288, 18, "r-m-"], [null, null, "----"], [null, null, "----"],
               [20480, 18, "-wm-"], [null, null, "----"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [null, null, "----"], [null, null, "----"], [null, null, "----"], [null, null, "----"], [null, null, "----"]]
  },
  {
    "name": "cb 46 0000",
    "initial": {"pc": 24576, "sp": 32768, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 1, "h": 80, "l": 0,
                "i": 0, "r": 0, "wz": 10240, "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0,
                "ram": [[24576, 203], [24577, 70], [20480, 0]]},
    "final":   {"pc": 24578, "sp": 32768, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 125, "h": 80, "l": 0,
                "i": 0, "r": 2, "wz": 10240, "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0,
                "ram": [[24576, 203], [24577, 70], [20480, 0]]},
    "cycles": [[24576, 203, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [24577, 70, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"],
               [20480, 0, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"]]
  },
  {
    "name": "27 0000",
    "initial": {"pc": 0, "sp": 65535, "a": 60, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0,
                "i": 0, "r": 0, "wz": 0, "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0, "ram": [[0, 39]]},
    "final":   {"pc": 1, "sp": 65535, "a": 66, "b": 0, "c": 0, "d": 0, "e": 0, "f": 20, "h": 0, "l": 0,
                "i": 0, "r": 1, "wz": 0, "ix": 0, "iy": 0, "af_": 0, "bc_": 0, "de_": 0, "hl_": 0,
                "im": 0, "iff1": 0, "iff2": 0, "ram": [[0, 39]]},
    "cycles": [[0, 39, "r-m-"], [null, null, "----"], [null, null, "----"], [null, null, "----"]]
  }
]"#;

fn run_case(case: &TestCase) {
    let mut bus = FlatBus::new();
    for &(address, value) in &case.initial.ram {
        bus.load(address, &[value]);
    }
    let mut cpu = Z80::new(bus);
    *cpu.regs_mut() = case.initial.registers();

    let cycles = cpu.step();

    assert_eq!(
        cpu.snapshot(),
        case.final_state.registers(),
        "{}: registers",
        case.name
    );
    assert_eq!(
        cycles as usize,
        case.cycles.len(),
        "{}: T-states",
        case.name
    );
    for &(address, value) in &case.final_state.ram {
        assert_eq!(
            cpu.read_memory(address),
            value,
            "{}: ram[{address:#06X}]",
            case.name
        );
    }
}

#[test]
fn single_step_cases() {
    let cases: Vec<TestCase> = serde_json::from_str(CASES).expect("valid fixture JSON");
    assert!(!cases.is_empty());
    for case in &cases {
        run_case(case);
    }
}
