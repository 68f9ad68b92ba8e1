//! Volume Envelope Segment
//!
//! One linear or exponential ramp of the SPU volume envelope. A segment is
//! re-armed with [`VolumeEnvelope::reset`] on every phase change and then
//! advanced one output sample at a time with [`VolumeEnvelope::tick`].

/// Counter bit that fires a level step
const COUNTER_FIRE: i32 = 0x8000;

/// Level above which an exponential rise slows down
const EXP_RISE_KNEE: i16 = 0x6000;

/// Step/counter state of one envelope segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeEnvelope {
    /// 7-bit rate the segment was armed with
    pub rate: u8,
    /// Level moves towards zero
    pub decreasing: bool,
    /// Exponential curve
    pub exponential: bool,
    /// Decreasing segment clamps towards -32768 instead of zero
    pub phase_invert: bool,
    /// Tick accumulator
    pub counter: i32,
    /// Added to the counter every tick; zero means the segment never moves
    pub counter_increment: i32,
    /// Level delta applied each time the counter fires
    pub step: i32,
}

impl VolumeEnvelope {
    /// Create a segment that has not been armed yet
    pub fn new() -> Self {
        VolumeEnvelope {
            rate: 0,
            decreasing: false,
            exponential: false,
            phase_invert: false,
            counter: 0,
            counter_increment: 0,
            step: 0,
        }
    }

    /// Arm the segment for a new rate and direction
    ///
    /// `rate_mask` is the width of the rate field for the phase; a rate with
    /// every masked bit set is allowed to stall with a zero increment.
    pub fn reset(
        &mut self,
        rate: u8,
        rate_mask: u8,
        decreasing: bool,
        exponential: bool,
        phase_invert: bool,
    ) {
        self.rate = rate;
        self.decreasing = decreasing;
        self.exponential = exponential;
        self.phase_invert = phase_invert && !(decreasing && exponential);
        self.counter = 0;
        self.counter_increment = COUNTER_FIRE;

        let base_step = 7 - (rate & 3) as i32;
        self.step = if (decreasing ^ phase_invert) || (decreasing && exponential) {
            !base_step
        } else {
            base_step
        };

        if rate < 44 {
            self.step <<= 11 - (rate >> 2) as i32;
        } else if rate >= 48 {
            self.counter_increment >>= (rate >> 2) as i32 - 11;
            if rate & rate_mask != rate_mask {
                self.counter_increment = self.counter_increment.max(1);
            }
        }
    }

    /// Advance one sample, possibly stepping `level`
    ///
    /// Returns `true` when the level sits at the segment's terminal bound.
    pub fn tick(&mut self, level: &mut i16) -> bool {
        let mut this_increment = self.counter_increment;
        let mut this_step = self.step;

        if self.exponential {
            if self.decreasing {
                this_step = (this_step * *level as i32) >> 15;
            } else if *level >= EXP_RISE_KNEE {
                if self.rate < 40 {
                    this_step >>= 2;
                } else if self.rate >= 44 {
                    this_increment >>= 2;
                } else {
                    this_step >>= 1;
                    this_increment >>= 1;
                }
            }
        }

        self.counter += this_increment;
        if self.counter & COUNTER_FIRE == 0 {
            return false;
        }
        self.counter = 0;

        let new_level = *level as i32 + this_step;
        if !self.decreasing {
            let clamped = new_level.clamp(-32768, 32767);
            *level = clamped as i16;
            clamped == if this_step < 0 { -32768 } else { 32767 }
        } else {
            let clamped = if self.phase_invert {
                new_level.clamp(-32768, 0)
            } else {
                new_level.max(0)
            };
            *level = clamped as i16;
            clamped == 0
        }
    }
}

impl Default for VolumeEnvelope {
    fn default() -> Self {
        Self::new()
    }
}
