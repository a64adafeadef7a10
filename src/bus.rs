//! Memory bus.
//!
//! All CPU and peripheral traffic moves through one byte-wide bus. The
//! decoder routes 24-bit physical addresses to the BIOS, system RAM, the
//! register file or the cartridge window, and `bus_cap` always holds the
//! last byte the bus carried: unmapped or disabled regions answer with it.

use crate::machine::Machine;
use crate::tracing::TraceKind;

impl Machine {
    /// Raw bus read. Updates `bus_cap` with the byte observed; reads from
    /// nothing-at-all leave it untouched and return it instead.
    pub fn read_byte(&mut self, address: u32) -> u8 {
        let value = if address <= 0x0FFF {
            self.buffers.bios[address as usize]
        } else if address <= 0x1FFF {
            self.ram[(address & 0xFFF) as usize]
        } else if address <= 0x20FF {
            self.read_register(address)
        } else if self.ctrl.cart_enabled() {
            self.read_cartridge(address)
        } else {
            return self.bus_cap;
        };

        self.bus_cap = value;
        value
    }

    /// Raw bus write. The byte lands on the bus (and therefore in
    /// `bus_cap`) even when the target discards it: the BIOS is read-only
    /// and cartridge writes are no-ops.
    pub fn write_byte(&mut self, address: u32, data: u8) {
        self.bus_cap = data;

        if (0x1000..=0x1FFF).contains(&address) {
            self.ram[(address & 0xFFF) as usize] = data;
        } else if (0x2000..=0x20FF).contains(&address) {
            self.write_register(address, data);
        }
    }

    fn read_cartridge(&self, address: u32) -> u8 {
        self.buffers.cartridge[address as usize % self.buffers.cartridge.len()]
    }

    fn read_register(&mut self, address: u32) -> u8 {
        match address {
            0x2000..=0x2002 => self.ctrl.read(address),
            0x2008..=0x200B => self.rtc.read(address),
            0x2020..=0x202A => self.irq.read(address),
            0x2040..=0x2041 => self.tim256.read(address),
            0x2050..=0x2055 => self.input.read(address),
            0x2060..=0x2062 => self.gpio.read(address),
            0x2070..=0x2071 => self.audio.read(address),

            // Battery/status sense, not otherwise modelled.
            0x2010 => 0b01_0000,

            0x20FE..=0x20FF => {
                if self.ctrl.lcd_enabled() {
                    self.lcd.read(address)
                } else {
                    self.bus_cap
                }
            }

            0x2080..=0x208F | 0x20F0..=0x20F8 => self.blitter_read(address),

            0x2018..=0x201D | 0x2030..=0x203F | 0x2048..=0x204F => self.timers.read(address),

            _ => {
                core_debug!(target: "bus", "unhandled register read {address:#07X}");
                self.bus_cap
            }
        }
    }

    fn write_register(&mut self, address: u32, data: u8) {
        match address {
            0x2000..=0x2002 => self.ctrl.write(address, data),
            0x2008..=0x200B => self.rtc.write(address, data),
            0x2020..=0x202A => self.irq.write(address, data),
            0x2040..=0x2041 => self.tim256.write(address, data),
            0x2050..=0x2055 => self.input.write(address, data),
            0x2060..=0x2062 => self.gpio.write(address, data),
            0x2070..=0x2071 => self.audio.write(address, data),

            0x2080..=0x208A => self.blitter_write(address, data),

            0x20FE..=0x20FF => {
                if self.ctrl.lcd_enabled() {
                    self.lcd.write(address, data);
                }
            }

            0x2018..=0x201D | 0x2030..=0x203F | 0x2048..=0x204F => {
                self.timers.write(address, data)
            }

            _ => {
                core_debug!(target: "bus", "unhandled register write {address:#07X}: {data:#04X}");
            }
        }
    }

    // Traced access helpers, used by the instruction executor, interrupt
    // dispatch and the blitter's graphic fetches.

    pub fn read8(&mut self, address: u32, kind: TraceKind) -> u8 {
        let value = self.read_byte(address);
        self.trace_access(address, kind | TraceKind::READ);
        value
    }

    pub fn write8(&mut self, address: u32, data: u8, kind: TraceKind) {
        self.trace_access(address, kind | TraceKind::WRITE);
        self.write_byte(address, data);
    }

    /// 16-bit reads go low byte first; the address wraps within its 64 KiB
    /// bank, the bank byte does not carry.
    pub fn read16(&mut self, address: u32, kind: TraceKind) -> u16 {
        let lo = self.read8(address, kind | TraceKind::WORD_LO) as u16;
        let address = ((address + 1) & 0xFFFF) | (address & 0xFF_0000);
        (self.read8(address, kind | TraceKind::WORD_HI) as u16) << 8 | lo
    }

    pub fn write16(&mut self, address: u32, data: u16, kind: TraceKind) {
        self.write8(address, data as u8, kind | TraceKind::WORD_LO);
        let address = ((address + 1) & 0xFFFF) | (address & 0xFF_0000);
        self.write8(address, (data >> 8) as u8, kind | TraceKind::WORD_HI);
    }

    /// Fetch one immediate byte at the program counter and advance it.
    pub fn imm8(&mut self, kind: TraceKind) -> u8 {
        let address = self.reg.fetch_address();
        self.reg.pc = self.reg.pc.wrapping_add(1);
        self.read8(address, kind | TraceKind::IMMEDIATE)
    }

    pub fn imm16(&mut self, kind: TraceKind) -> u16 {
        let lo = self.imm8(kind | TraceKind::WORD_LO) as u16;
        (self.imm8(kind | TraceKind::WORD_HI) as u16) << 8 | lo
    }

    pub fn push8(&mut self, data: u8, kind: TraceKind) {
        self.reg.sp = self.reg.sp.wrapping_sub(1);
        self.write8(self.reg.sp as u32, data, kind | TraceKind::STACK);
    }

    pub fn pop8(&mut self, kind: TraceKind) -> u8 {
        let value = self.read8(self.reg.sp as u32, kind | TraceKind::STACK);
        self.reg.sp = self.reg.sp.wrapping_add(1);
        value
    }

    pub fn push16(&mut self, data: u16, kind: TraceKind) {
        self.push8((data >> 8) as u8, kind | TraceKind::WORD_HI);
        self.push8(data as u8, kind | TraceKind::WORD_LO);
    }

    pub fn pop16(&mut self, kind: TraceKind) -> u16 {
        let lo = self.pop8(kind | TraceKind::WORD_LO) as u16;
        (self.pop8(kind | TraceKind::WORD_HI) as u16) << 8 | lo
    }
}
