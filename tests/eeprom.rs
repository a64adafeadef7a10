//! Wire-level EEPROM traffic through the GPIO registers, the way the BIOS
//! bit-bangs the part.

mod common;

use common::machine;
use minibit_core::gpio::{EEPROM_CLOCK_PIN, EEPROM_DATA_PIN};
use minibit_core::machine::Machine;

const BOTH: u8 = EEPROM_CLOCK_PIN | EEPROM_DATA_PIN;

fn wire(machine: &mut Machine, clock_high: bool, data_high: bool) {
    let mut output = 0;
    if clock_high {
        output |= EEPROM_CLOCK_PIN;
    }
    if data_high {
        output |= EEPROM_DATA_PIN;
    }
    machine.write_byte(0x2061, output);
}

fn start(machine: &mut Machine) {
    wire(machine, true, true);
    wire(machine, true, false);
}

fn stop(machine: &mut Machine) {
    wire(machine, false, false);
    wire(machine, true, false);
    wire(machine, true, true);
}

/// Shift one byte out and sample the acknowledge slot.
fn send_byte(machine: &mut Machine, byte: u8) -> bool {
    for bit in (0..8).rev() {
        wire(machine, false, byte & (1 << bit) != 0);
        wire(machine, true, byte & (1 << bit) != 0);
    }
    wire(machine, false, true);
    wire(machine, true, true);
    machine.read_byte(0x2061) & EEPROM_DATA_PIN == 0
}

fn recv_byte(machine: &mut Machine) -> u8 {
    let mut byte = 0;
    for _ in 0..8 {
        wire(machine, false, true);
        wire(machine, true, true);
        byte = byte << 1 | (machine.read_byte(0x2061) & EEPROM_DATA_PIN != 0) as u8;
    }
    byte
}

fn bus_machine() -> Machine {
    let mut machine = machine();
    // Both serial pins as outputs, idle high.
    machine.write_byte(0x2060, BOTH);
    wire(&mut machine, true, true);
    machine
}

#[test]
fn bit_banged_write_and_read_round_trip() {
    let mut machine = bus_machine();

    start(&mut machine);
    assert!(send_byte(&mut machine, 0xA0));
    assert!(send_byte(&mut machine, 0x03));
    assert!(send_byte(&mut machine, 0x21));
    assert!(send_byte(&mut machine, 0xC9));
    stop(&mut machine);

    assert_eq!(machine.gpio.eeprom.contents()[0x0321], 0xC9);

    start(&mut machine);
    assert!(send_byte(&mut machine, 0xA0));
    assert!(send_byte(&mut machine, 0x03));
    assert!(send_byte(&mut machine, 0x21));
    stop(&mut machine);

    start(&mut machine);
    assert!(send_byte(&mut machine, 0xA1));
    assert_eq!(recv_byte(&mut machine), 0xC9);
    stop(&mut machine);
}

#[test]
fn direction_register_reads_back() {
    let mut machine = bus_machine();
    assert_eq!(machine.read_byte(0x2060), BOTH);
}

#[test]
fn serial_pins_read_line_levels_not_the_latch() {
    let mut machine = bus_machine();

    start(&mut machine);
    // The controller holds data low; the line must read low even though
    // nothing else drives it.
    assert_eq!(machine.read_byte(0x2061) & EEPROM_DATA_PIN, 0);
    assert_ne!(machine.read_byte(0x2061) & EEPROM_CLOCK_PIN, 0);
}

#[test]
fn input_pins_release_the_line() {
    let mut machine = bus_machine();

    // Latch both low, then flip the port to inputs: the lines float high.
    wire(&mut machine, false, false);
    machine.write_byte(0x2060, 0);
    assert_ne!(machine.read_byte(0x2061) & EEPROM_DATA_PIN, 0);
    assert_ne!(machine.read_byte(0x2061) & EEPROM_CLOCK_PIN, 0);
}
