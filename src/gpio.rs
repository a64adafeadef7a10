use crate::eeprom::{Eeprom, PinState};

/// GPIO pin wired to the EEPROM data line.
pub const EEPROM_DATA_PIN: u8 = 0b0000_0100;
/// GPIO pin wired to the EEPROM clock line.
pub const EEPROM_CLOCK_PIN: u8 = 0b0000_1000;

/// General-purpose I/O port. Two of its pins carry the two-wire EEPROM
/// bus; both are open drain, so the port only ever pulls a line low.
pub struct Gpio {
    pub output: u8,
    pub direction: u8,
    pub eeprom: Eeprom,
}

impl Gpio {
    pub fn new() -> Self {
        Self {
            output: 0,
            direction: 0,
            eeprom: Eeprom::new(),
        }
    }

    pub fn reset(&mut self) {
        self.output = 0;
        self.direction = 0;
        self.eeprom.reset();
        self.sync_pins();
    }

    /// Controller-side drive of one open-drain pin: pulled low only when
    /// the pin is an output latched low.
    fn drive(&self, pin: u8) -> PinState {
        if self.direction & pin != 0 && self.output & pin == 0 {
            PinState::Reset
        } else {
            PinState::Float
        }
    }

    fn sync_pins(&mut self) {
        let clock = self.drive(EEPROM_CLOCK_PIN);
        let data = self.drive(EEPROM_DATA_PIN);
        self.eeprom.set_clock_pin(clock);
        self.eeprom.set_data_pin(data);
    }

    pub fn read(&self, address: u32) -> u8 {
        match address {
            0x2060 => self.direction,
            0x2061 => {
                // The EEPROM pins read back as line levels, not as the
                // output latch.
                let mut value = self.output & !(EEPROM_DATA_PIN | EEPROM_CLOCK_PIN);
                if self.eeprom.data_line() {
                    value |= EEPROM_DATA_PIN;
                }
                if self.eeprom.clock_line() {
                    value |= EEPROM_CLOCK_PIN;
                }
                value
            }
            0x2062 => 0,
            _ => 0xCD,
        }
    }

    pub fn write(&mut self, address: u32, data: u8) {
        match address {
            0x2060 => self.direction = data,
            0x2061 => self.output = data,
            _ => return,
        }
        self.sync_pins();
    }
}

impl Default for Gpio {
    fn default() -> Self {
        Self::new()
    }
}
