//! Machine facade: the clock tree and everything it drives.
//!
//! The host owns a [`Machine`] value and pushes time into it through
//! [`Machine::advance`], supplying the instruction executor as a
//! collaborator. Each step dispatches pending interrupts, runs one
//! instruction (or burns an idle cycle), and fans the consumed CPU cycles
//! out to the peripherals on their respective oscillators.

use crate::audio::{AUDIO_BUFFER_LENGTH, Audio, AudioSink};
use crate::blitter::Blitter;
use crate::control::Control;
use crate::cpu::Registers;
use crate::gpio::Gpio;
use crate::input::Input;
use crate::irq::{Irq, Vector};
use crate::lcd::{LCD_HEIGHT, LCD_WIDTH, Lcd};
use crate::rtc::Rtc;
use crate::tim256::Tim256;
use crate::timers::Timers;
use crate::tracing::{TraceKind, TraceSink};

/// Low-speed oscillator, in Hz.
pub const OSC1_SPEED: i32 = 32_768;
/// High-speed oscillator, in Hz.
pub const OSC3_SPEED: i32 = 4_000_000;
/// Nominal CPU cycle rate, in cycles per second.
pub const CPU_SPEED: i32 = 1_000_000;

pub const BIOS_SIZE: usize = 0x1000;
pub const RAM_SIZE: usize = 0x1000;
pub const CARTRIDGE_SIZE: usize = 0x20_0000;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("image of {got} bytes does not fit the {max}-byte window")]
    TooLarge { got: usize, max: usize },
}

/// Run state of the machine. Halted and sleeping machines keep clocking
/// peripherals; a crashed machine only drains its cycle budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Normal,
    Halted,
    Sleeping,
    Crashed,
}

/// Host-visible storage: loaded images and the presentation buffers.
pub struct Buffers {
    pub cartridge: Vec<u8>,
    pub bios: Vec<u8>,

    pub audio: [f32; AUDIO_BUFFER_LENGTH],
    pub lcd_shift: [[u8; LCD_WIDTH]; LCD_HEIGHT],
    pub framebuffer: [[u32; LCD_WIDTH]; LCD_HEIGHT],
    pub palette: [u32; 0x100],
    pub weights: [f32; 0x100],
}

impl Buffers {
    fn new() -> Self {
        Self {
            cartridge: vec![0; CARTRIDGE_SIZE],
            bios: vec![0; BIOS_SIZE],
            audio: [0.0; AUDIO_BUFFER_LENGTH],
            lcd_shift: [[0; LCD_WIDTH]; LCD_HEIGHT],
            framebuffer: [[0; LCD_WIDTH]; LCD_HEIGHT],
            palette: [0; 0x100],
            weights: [0.0; 0x100],
        }
    }
}

/// The CPU instruction decoder/executor, supplied by the host. One call
/// executes one instruction against the machine and returns the CPU
/// cycles it consumed.
pub trait Executor {
    fn inst_advance(&mut self, machine: &mut Machine) -> i32;
}

impl<F: FnMut(&mut Machine) -> i32> Executor for F {
    fn inst_advance(&mut self, machine: &mut Machine) -> i32 {
        self(machine)
    }
}

pub struct Machine {
    pub reg: Registers,
    pub irq: Irq,
    pub lcd: Lcd,
    pub rtc: Rtc,
    pub ctrl: Control,
    pub tim256: Tim256,
    pub blitter: Blitter,
    pub timers: Timers,
    pub input: Input,
    pub gpio: Gpio,
    pub audio: Audio,

    /// Last byte carried on the bus; unmapped reads observe it.
    pub bus_cap: u8,
    /// Outstanding cycle budget in high-speed edges; positive means work
    /// is owed.
    pub clocks: i32,
    pub osc1_overflow: i32,
    pub status: Status,

    /// System RAM. The low pages double as the blitter overlay.
    pub ram: [u8; RAM_SIZE],

    pub buffers: Buffers,

    pub(crate) trace: Option<Box<dyn TraceSink>>,
    pub(crate) audio_sink: Option<Box<dyn AudioSink>>,
}

impl Machine {
    pub fn new() -> Self {
        Self {
            reg: Registers::default(),
            irq: Irq::new(),
            lcd: Lcd::new(),
            rtc: Rtc::new(),
            ctrl: Control::new(),
            tim256: Tim256::new(),
            blitter: Blitter::new(),
            timers: Timers::new(),
            input: Input::new(),
            gpio: Gpio::new(),
            audio: Audio::new(),
            bus_cap: 0,
            clocks: 0,
            osc1_overflow: 0,
            status: Status::Normal,
            ram: [0; RAM_SIZE],
            buffers: Buffers::new(),
            trace: None,
            audio_sink: None,
        }
    }

    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.audio_sink = Some(sink);
    }

    pub fn set_sample_rate(&mut self, rate: i32) {
        self.audio.set_sample_rate(rate);
    }

    pub fn load_bios(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.len() > BIOS_SIZE {
            return Err(LoadError::TooLarge {
                got: image.len(),
                max: BIOS_SIZE,
            });
        }
        self.buffers.bios.fill(0);
        self.buffers.bios[..image.len()].copy_from_slice(image);
        Ok(())
    }

    pub fn load_cartridge(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.len() > CARTRIDGE_SIZE {
            return Err(LoadError::TooLarge {
                got: image.len(),
                max: CARTRIDGE_SIZE,
            });
        }
        self.buffers.cartridge.fill(0);
        self.buffers.cartridge[..image.len()].copy_from_slice(image);
        Ok(())
    }

    pub fn load_eeprom(&mut self, image: &[u8]) -> Result<(), LoadError> {
        self.gpio.eeprom.load(image)
    }

    pub(crate) fn trace_access(&mut self, address: u32, kind: TraceKind) {
        if let Some(sink) = self.trace.as_mut() {
            sink.access(address, kind);
        }
    }

    /// Return the machine to its power-on state. Loaded images, the
    /// palette/weight tables and the EEPROM contents survive; everything
    /// else is cleared before the reset vector is fetched.
    pub fn reset(&mut self) {
        self.ctrl.reset();
        self.irq.reset();
        self.lcd.reset();
        self.rtc.reset();
        self.tim256.reset();
        self.blitter.reset();
        self.timers.reset();
        self.input.reset();
        self.gpio.reset();
        self.audio.reset();

        self.ram = [0; RAM_SIZE];
        self.bus_cap = 0;
        self.clocks = 0;
        self.osc1_overflow = 0;

        self.reg = Registers::default();
        self.reg.pc = self.read16(2 * Vector::Reset as u32, TraceKind::VECTOR);
        self.trace_access(self.reg.fetch_address(), TraceKind::BRANCH_TARGET);

        self.reg.set_status_byte(0xC0);
        self.reg.ep = 0xFF;
        self.reg.xp = 0x00;
        self.reg.yp = 0x00;
        self.reg.nb = 0x01;

        self.status = Status::Normal;
    }

    /// Fan the cycles one instruction consumed out to the peripherals.
    /// Everything clocked here runs on the high-speed oscillator; the
    /// low-speed devices advance only when the accumulator carries a full
    /// OSC1 edge.
    fn clock(&mut self, cycles: i32) {
        let osc3 = cycles * OSC3_SPEED / CPU_SPEED;

        self.osc1_overflow += osc3 * OSC1_SPEED;

        if self.status <= Status::Halted {
            self.lcd_clock(osc3);
            {
                let Machine { timers, irq, .. } = self;
                timers.clock(irq, 0, osc3);
            }
            self.audio_clock(osc3);

            if self.osc1_overflow >= OSC3_SPEED {
                let mut osc1 = 0;
                while self.osc1_overflow >= OSC3_SPEED {
                    self.osc1_overflow -= OSC3_SPEED;
                    osc1 += 1;
                }

                let Machine { tim256, rtc, irq, .. } = self;
                tim256.clock(irq, osc1);
                rtc.clock(osc1);
            }
        }

        self.clocks -= osc3;
    }

    /// One machine step: dispatch interrupts, run one instruction (or one
    /// idle cycle when not NORMAL), clock the peripherals.
    pub fn step(&mut self, executor: &mut dyn Executor) {
        self.process_interrupts();

        if self.status == Status::Normal {
            let cycles = executor.inst_advance(self);
            self.clock(cycles);
        } else {
            self.clock(1);
        }
    }

    /// Add `ticks` high-speed edges to the cycle budget and step until the
    /// budget is drained.
    pub fn advance(&mut self, ticks: i32, executor: &mut dyn Executor) {
        self.clocks += ticks;

        while self.clocks > 0 {
            self.step(executor);
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
