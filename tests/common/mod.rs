#![allow(dead_code)]

use minibit_core::machine::Machine;
use once_cell::sync::Lazy;

/// Synthetic BIOS: the reset vector points at 0x0100, every other vector
/// table entry encodes its own slot number so dispatch targets are easy to
/// assert on, and the remainder is filled with a recognizable pattern.
static BIOS: Lazy<Vec<u8>> = Lazy::new(|| {
    let mut bios = vec![0u8; 0x1000];
    for slot in 0..0x20u16 {
        let target = 0x0200 + slot;
        bios[2 * slot as usize] = target as u8;
        bios[2 * slot as usize + 1] = (target >> 8) as u8;
    }
    bios[0] = 0x00;
    bios[1] = 0x01;
    for (offset, byte) in bios.iter_mut().enumerate().skip(0x40) {
        *byte = offset as u8 ^ 0xA5;
    }
    bios
});

/// Entry point encoded in the test BIOS for a given vector slot.
pub fn vector_target(slot: u16) -> u16 {
    0x0200 + slot
}

pub fn machine() -> Machine {
    let mut machine = Machine::new();
    machine.load_bios(&BIOS).unwrap();
    machine.reset();
    machine
}

/// Executor standing in for the CPU core: burns one cycle per step and
/// leaves the registers alone.
pub fn idle() -> impl FnMut(&mut Machine) -> i32 {
    |_: &mut Machine| 1
}

/// Enable the cartridge window and the LCD ports through the control
/// register, the way boot code does before touching either.
pub fn enable_cart_and_lcd(machine: &mut Machine) {
    machine.write_byte(0x2000, 0b11);
}
