use crate::irq::{Irq, Vector};

// Prescale shift per 3-bit ratio, one table per clock source.
const PRESCALE_OSC1: [u32; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
const PRESCALE_OSC3: [u32; 8] = [1, 3, 5, 6, 7, 8, 10, 12];

struct TimerVectors {
    lo_underflow: Option<Vector>,
    hi_underflow: Option<Vector>,
    lo_compare: Option<Vector>,
}

static VECTORS: [TimerVectors; 3] = [
    TimerVectors {
        lo_underflow: Some(Vector::Timer0Lo),
        hi_underflow: Some(Vector::Timer0Hi),
        lo_compare: None,
    },
    TimerVectors {
        lo_underflow: Some(Vector::Timer1Lo),
        hi_underflow: Some(Vector::Timer1Hi),
        lo_compare: None,
    },
    TimerVectors {
        lo_underflow: None,
        hi_underflow: Some(Vector::Timer2Underflow),
        lo_compare: Some(Vector::Timer2Compare),
    },
];

/// One programmable timer: two 8-bit down-counting halves that fuse into a
/// single 16-bit counter when `mode16` is set. The 16-bit `preset`,
/// `compare` and `count` values double as the per-half byte pairs.
#[derive(Default)]
pub struct Timer {
    pub lo_input: bool,
    pub lo_running: bool,
    pub lo_output: bool,
    pub mode16: bool,

    pub hi_input: bool,
    pub hi_running: bool,
    pub hi_output: bool,

    pub preset: u16,
    pub compare: u16,
    pub count: u16,

    pub lo_clock_ratio: u8,
    pub lo_clock_ctrl: bool,
    /// Clock source select: low-speed oscillator when set, high-speed
    /// otherwise.
    pub lo_clock_source: bool,

    pub hi_clock_ratio: u8,
    pub hi_clock_ctrl: bool,
    pub hi_clock_source: bool,
}

impl Timer {
    #[inline]
    pub fn lo_preset(&self) -> u8 {
        self.preset as u8
    }

    #[inline]
    pub fn hi_preset(&self) -> u8 {
        (self.preset >> 8) as u8
    }

    #[inline]
    pub fn lo_compare(&self) -> u8 {
        self.compare as u8
    }

    #[inline]
    pub fn hi_compare(&self) -> u8 {
        (self.compare >> 8) as u8
    }

    #[inline]
    pub fn lo_count(&self) -> u8 {
        self.count as u8
    }

    #[inline]
    pub fn hi_count(&self) -> u8 {
        (self.count >> 8) as u8
    }

    pub fn set_lo_preset(&mut self, data: u8) {
        self.preset = (self.preset & 0xFF00) | data as u16;
    }

    pub fn set_hi_preset(&mut self, data: u8) {
        self.preset = (self.preset & 0x00FF) | (data as u16) << 8;
    }

    pub fn set_lo_compare(&mut self, data: u8) {
        self.compare = (self.compare & 0xFF00) | data as u16;
    }

    pub fn set_hi_compare(&mut self, data: u8) {
        self.compare = (self.compare & 0x00FF) | (data as u16) << 8;
    }

    fn set_lo_count(&mut self, data: u8) {
        self.count = (self.count & 0xFF00) | data as u16;
    }

    fn set_hi_count(&mut self, data: u8) {
        self.count = (self.count & 0x00FF) | (data as u16) << 8;
    }

    fn flags_lo(&self) -> u8 {
        (self.lo_input as u8)
            | (self.lo_running as u8) << 2
            | (self.lo_output as u8) << 3
            | (self.mode16 as u8) << 7
    }

    fn flags_hi(&self) -> u8 {
        (self.hi_input as u8) | (self.hi_running as u8) << 2 | (self.hi_output as u8) << 3
    }

    fn set_flags_lo(&mut self, data: u8) {
        self.lo_input = data & 0b0000_0001 != 0;
        self.lo_running = data & 0b0000_0100 != 0;
        self.lo_output = data & 0b0000_1000 != 0;
        self.mode16 = data & 0b1000_0000 != 0;

        // Preset trigger
        if data & 0b1000_0010 != 0 {
            if self.mode16 {
                self.count = self.preset;
            } else {
                self.set_lo_count(self.lo_preset());
            }
        }
    }

    fn set_flags_hi(&mut self, data: u8) {
        self.hi_input = data & 0b0000_0001 != 0;
        self.hi_running = data & 0b0000_0100 != 0;
        self.hi_output = data & 0b0000_1000 != 0;

        // Preset trigger
        if data & 0b1000_0010 != 0 && !self.mode16 {
            self.set_hi_count(self.hi_preset());
        }
    }

    fn ratio_byte(&self) -> u8 {
        self.lo_clock_ratio
            | (self.lo_clock_ctrl as u8) << 3
            | self.hi_clock_ratio << 4
            | (self.hi_clock_ctrl as u8) << 7
    }

    fn set_ratio_byte(&mut self, data: u8) {
        self.lo_clock_ratio = data & 0b0111;
        self.lo_clock_ctrl = data & 0b1000 != 0;
        self.hi_clock_ratio = (data >> 4) & 0b0111;
        self.hi_clock_ctrl = data & 0b1000_0000 != 0;
    }

    fn source_byte(&self) -> u8 {
        (self.lo_clock_source as u8) | (self.hi_clock_source as u8) << 1
    }

    fn set_source_byte(&mut self, data: u8) {
        self.lo_clock_source = data & 0b01 != 0;
        self.hi_clock_source = data & 0b10 != 0;
    }
}

/// The three timers plus the oscillator gates and the shared prescale
/// accumulators. The accumulators carry sub-divided remainders across clock
/// calls so no oscillator edge is lost to truncation.
#[derive(Default)]
pub struct Timers {
    pub timer: [Timer; 3],

    pub osc1_enable: bool,
    pub osc3_enable: bool,

    pub osc1_prescale: u32,
    pub osc3_prescale: u32,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn ticks(&self, source: bool, ctrl: bool, ratio: u8, osc1: i32, osc3: i32) -> i32 {
        if !ctrl {
            return 0;
        }

        if source {
            let adjust = PRESCALE_OSC1[ratio as usize];
            let mask = (1u32 << adjust) - 1;
            ((self.osc1_prescale & mask) as i32 + osc1) >> adjust
        } else {
            let adjust = PRESCALE_OSC3[ratio as usize];
            let mask = (1u32 << adjust) - 1;
            ((self.osc3_prescale & mask) as i32 + osc3) >> adjust
        }
    }

    fn compare(irq: &mut Irq, vector: Option<Vector>, ticks: i32, compare: i32, preset: i32, count: i32) {
        let Some(vector) = vector else {
            return;
        };
        if compare > preset {
            return;
        }

        let mut distance = count - compare;
        if distance < 0 {
            distance += preset + 1;
        }
        if distance < ticks {
            irq.trigger(vector);
        }
    }

    fn process_timer(&mut self, irq: &mut Irq, index: usize, osc1: i32, osc3: i32) {
        let vectors = &VECTORS[index];

        if self.timer[index].mode16 {
            if !self.timer[index].lo_running {
                return;
            }

            let timer = &self.timer[index];
            let adv = self.ticks(
                timer.lo_clock_source,
                timer.lo_clock_ctrl,
                timer.lo_clock_ratio,
                osc1,
                osc3,
            );

            let mut count = timer.count as i32 - adv;
            if count < 0 {
                if let Some(vector) = vectors.hi_underflow {
                    irq.trigger(vector);
                }
                while count < 0 {
                    count += timer.preset as i32 + 1;
                }
            }

            Self::compare(
                irq,
                vectors.lo_compare,
                adv,
                timer.compare as i32,
                timer.preset as i32,
                timer.count as i32,
            );

            self.timer[index].count = count as u16;
        } else {
            if self.timer[index].lo_running {
                let timer = &self.timer[index];
                let adv = self.ticks(
                    timer.lo_clock_source,
                    timer.lo_clock_ctrl,
                    timer.lo_clock_ratio,
                    osc1,
                    osc3,
                );

                let mut count = timer.lo_count() as i32 - adv;
                if count < 0 {
                    if let Some(vector) = vectors.lo_underflow {
                        irq.trigger(vector);
                    }
                    while count < 0 {
                        count += timer.lo_preset() as i32 + 1;
                    }
                }

                Self::compare(
                    irq,
                    vectors.lo_compare,
                    adv,
                    timer.lo_compare() as i32,
                    timer.lo_preset() as i32,
                    timer.lo_count() as i32,
                );

                self.timer[index].set_lo_count(count as u8);
            }

            if self.timer[index].hi_running {
                let timer = &self.timer[index];
                let adv = self.ticks(
                    timer.hi_clock_source,
                    timer.hi_clock_ctrl,
                    timer.hi_clock_ratio,
                    osc1,
                    osc3,
                );

                let mut count = timer.hi_count() as i32 - adv;
                if count < 0 {
                    if let Some(vector) = vectors.hi_underflow {
                        irq.trigger(vector);
                    }
                    while count < 0 {
                        count += timer.hi_preset() as i32 + 1;
                    }
                }

                self.timer[index].set_hi_count(count as u8);
            }
        }
    }

    /// Advance all three timers by the oscillator edges observed since the
    /// previous call. The prescale accumulators advance after the timers
    /// have been processed.
    pub fn clock(&mut self, irq: &mut Irq, osc1: i32, osc3: i32) {
        let osc1 = if self.osc1_enable { osc1 } else { 0 };
        let osc3 = if self.osc3_enable { osc3 } else { 0 };

        for index in 0..3 {
            self.process_timer(irq, index, osc1, osc3);
        }

        self.osc1_prescale = self.osc1_prescale.wrapping_add(osc1 as u32);
        self.osc3_prescale = self.osc3_prescale.wrapping_add(osc3 as u32);
    }

    pub fn read(&self, address: u32) -> u8 {
        match address {
            0x2018 => self.timer[0].ratio_byte(),
            0x201A => self.timer[1].ratio_byte(),
            0x201C => self.timer[2].ratio_byte(),

            0x2019 => {
                (self.osc3_enable as u8) << 5
                    | (self.osc1_enable as u8) << 4
                    | self.timer[0].source_byte()
            }
            0x201B => self.timer[1].source_byte(),
            0x201D => self.timer[2].source_byte(),

            0x2030 => self.timer[0].flags_lo(),
            0x2031 => self.timer[0].flags_hi(),
            0x2032 => self.timer[0].lo_preset(),
            0x2033 => self.timer[0].hi_preset(),
            0x2034 => self.timer[0].lo_compare(),
            0x2035 => self.timer[0].hi_compare(),
            0x2036 => self.timer[0].lo_count(),
            0x2037 => self.timer[0].hi_count(),

            0x2038 => self.timer[1].flags_lo(),
            0x2039 => self.timer[1].flags_hi(),
            0x203A => self.timer[1].lo_preset(),
            0x203B => self.timer[1].hi_preset(),
            0x203C => self.timer[1].lo_compare(),
            0x203D => self.timer[1].hi_compare(),
            0x203E => self.timer[1].lo_count(),
            0x203F => self.timer[1].hi_count(),

            0x2048 => self.timer[2].flags_lo(),
            0x2049 => self.timer[2].flags_hi(),
            0x204A => self.timer[2].lo_preset(),
            0x204B => self.timer[2].hi_preset(),
            0x204C => self.timer[2].lo_compare(),
            0x204D => self.timer[2].hi_compare(),
            0x204E => self.timer[2].lo_count(),
            0x204F => self.timer[2].hi_count(),

            _ => 0xCD,
        }
    }

    pub fn write(&mut self, address: u32, data: u8) {
        match address {
            0x2018 => self.timer[0].set_ratio_byte(data),
            0x201A => self.timer[1].set_ratio_byte(data),
            0x201C => self.timer[2].set_ratio_byte(data),

            0x2019 => {
                self.osc3_enable = data & 0b0010_0000 != 0;
                self.osc1_enable = data & 0b0001_0000 != 0;
                self.timer[0].set_source_byte(data);
            }
            0x201B => self.timer[1].set_source_byte(data),
            0x201D => self.timer[2].set_source_byte(data),

            0x2030 => self.timer[0].set_flags_lo(data),
            0x2031 => self.timer[0].set_flags_hi(data),
            0x2032 => self.timer[0].set_lo_preset(data),
            0x2033 => self.timer[0].set_hi_preset(data),
            0x2034 => self.timer[0].set_lo_compare(data),
            0x2035 => self.timer[0].set_hi_compare(data),

            0x2038 => self.timer[1].set_flags_lo(data),
            0x2039 => self.timer[1].set_flags_hi(data),
            0x203A => self.timer[1].set_lo_preset(data),
            0x203B => self.timer[1].set_hi_preset(data),
            0x203C => self.timer[1].set_lo_compare(data),
            0x203D => self.timer[1].set_hi_compare(data),

            0x2048 => self.timer[2].set_flags_lo(data),
            0x2049 => self.timer[2].set_flags_hi(data),
            0x204A => self.timer[2].set_lo_preset(data),
            0x204B => self.timer[2].set_hi_preset(data),
            0x204C => self.timer[2].set_lo_compare(data),
            0x204D => self.timer[2].set_hi_compare(data),

            _ => {}
        }
    }
}
