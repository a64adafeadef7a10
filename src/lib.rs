//! Cycle-driven emulation core for an S1C88-class handheld.
//!
//! This crate contains the platform-agnostic machine logic: the shared
//! memory bus, the memory-mapped peripheral register file, and the
//! per-peripheral time-advance state machines driven by the two board
//! oscillators. The CPU instruction decoder, video/audio output and input
//! collection are host concerns; they drive the core through the
//! [`machine`] facade.

pub mod diagnostics;

#[allow(unused_macros)]
macro_rules! core_trace {
    (target: $target:expr, $($arg:tt)*) => {{
        if crate::diagnostics::has_log_sink() {
            crate::diagnostics::emit(crate::diagnostics::Level::Trace, $target, format_args!($($arg)*));
        }
    }};
}

#[allow(unused_macros)]
macro_rules! core_debug {
    (target: $target:expr, $($arg:tt)*) => {{
        if crate::diagnostics::has_log_sink() {
            crate::diagnostics::emit(crate::diagnostics::Level::Debug, $target, format_args!($($arg)*));
        }
    }};
}

#[allow(unused_macros)]
macro_rules! core_warn {
    (target: $target:expr, $($arg:tt)*) => {{
        if crate::diagnostics::has_log_sink() {
            crate::diagnostics::emit(crate::diagnostics::Level::Warn, $target, format_args!($($arg)*));
        }
    }};
}

/// PWM-style audio channel fed by timer 2.
pub mod audio;

/// Tile/sprite compositor rendering into the RAM-overlaid framebuffer.
pub mod blitter;

/// Memory bus: address decoding and the traced access helpers.
pub mod bus;

/// Cart-enable / LCD-enable gate bytes.
pub mod control;

/// S1C88 register bank and flag group.
pub mod cpu;

/// Two-wire serial EEPROM pin-level state machine.
pub mod eeprom;

/// GPIO port with the EEPROM wired to two of its pins.
pub mod gpio;

/// Key-matrix input unit with edge-triggered interrupts.
pub mod input;

/// Interrupt prioritization and dispatch.
pub mod irq;

/// LCD controller: GDDRAM, command decoder and the shift-register pipeline.
pub mod lcd;

/// High-level facade that wires the bus, clock tree and peripherals into a
/// single machine.
pub mod machine;

/// Real-time counter on the low-speed oscillator.
pub mod rtc;

/// 256 Hz prescaler chain.
pub mod tim256;

/// The three programmable down-counting timers.
pub mod timers;

/// Memory-access trace plumbing for an external debugger sink.
pub mod tracing;
