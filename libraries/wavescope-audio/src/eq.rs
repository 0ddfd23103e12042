/// Noise-reduction equalizer
///
/// A fixed two-band filter: a low-pass at 1 kHz and a high-pass at 100 Hz,
/// each followed by an attenuation stage derived from the selected
/// reduction level. Uses biquad filters for each band.
use serde::{Deserialize, Serialize};

/// Low-pass band cutoff in Hz
pub const LOW_PASS_CUTOFF_HZ: f32 = 1000.0;

/// High-pass band cutoff in Hz
pub const HIGH_PASS_CUTOFF_HZ: f32 = 100.0;

/// Attenuation applied per reduction step, in dB
pub const ATTENUATION_STEP_DB: f32 = -24.0;

/// Butterworth Q for both bands
const BAND_Q: f32 = 0.707;

/// Noise-reduction strength
///
/// Each step above `Off` attenuates both bands by a further 24 dB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseReductionLevel {
    /// Bypass all filtering
    Off,

    /// -24 dB per band
    Low,

    /// -48 dB per band
    Medium,

    /// -72 dB per band
    High,
}

impl Default for NoiseReductionLevel {
    fn default() -> Self {
        Self::Off
    }
}

impl NoiseReductionLevel {
    /// Number of attenuation steps for this level
    pub fn steps(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Band gain in dB for this level
    pub fn gain_db(self) -> f32 {
        ATTENUATION_STEP_DB * f32::from(self.steps())
    }
}

/// Per-channel biquad filter state
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

/// One EQ band: a biquad filter plus a linear output gain
#[derive(Debug, Clone)]
struct Band {
    // Normalized coefficients (a0 divided out)
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    /// Linear gain applied to the filter output
    gain: f32,

    /// Filter state, one entry per channel
    state: Vec<BiquadState>,
}

impl Band {
    /// RBJ low-pass band
    fn low_pass(cutoff_hz: f32, gain_db: f32, sample_rate: u32, channels: u16) -> Self {
        let (cos_w, alpha) = Self::prewarp(cutoff_hz, sample_rate);
        let b1 = 1.0 - cos_w;
        let b0 = b1 / 2.0;
        Self::normalized(b0, b1, b0, cos_w, alpha, gain_db, channels)
    }

    /// RBJ high-pass band
    fn high_pass(cutoff_hz: f32, gain_db: f32, sample_rate: u32, channels: u16) -> Self {
        let (cos_w, alpha) = Self::prewarp(cutoff_hz, sample_rate);
        let b1 = -(1.0 + cos_w);
        let b0 = (1.0 + cos_w) / 2.0;
        Self::normalized(b0, b1, b0, cos_w, alpha, gain_db, channels)
    }

    fn prewarp(cutoff_hz: f32, sample_rate: u32) -> (f32, f32) {
        let omega = 2.0 * std::f32::consts::PI * cutoff_hz / sample_rate as f32;
        let sin_w = omega.sin();
        let alpha = sin_w / (2.0 * BAND_Q);
        (omega.cos(), alpha)
    }

    fn normalized(
        b0: f32,
        b1: f32,
        b2: f32,
        cos_w: f32,
        alpha: f32,
        gain_db: f32,
        channels: u16,
    ) -> Self {
        let a0 = 1.0 + alpha;
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: (-2.0 * cos_w) / a0,
            a2: (1.0 - alpha) / a0,
            gain: 10.0_f32.powf(gain_db / 20.0),
            state: vec![BiquadState::default(); channels.max(1) as usize],
        }
    }

    /// Filter one sample for one channel, then apply the band gain
    #[inline]
    fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let s = &mut self.state[channel];
        let output = self.b0 * input + self.b1 * s.x1 + self.b2 * s.x2
            - self.a1 * s.y1
            - self.a2 * s.y2;

        s.x2 = s.x1;
        s.x1 = input;
        s.y2 = s.y1;
        s.y1 = output;

        output * self.gain
    }

    fn reset(&mut self) {
        for s in &mut self.state {
            *s = BiquadState::default();
        }
    }
}

/// Two-band noise-reduction EQ node
///
/// Processes interleaved frames in place. `Off` is bit-transparent: the
/// buffer is untouched and no filter state accumulates.
#[derive(Debug, Clone)]
pub struct NoiseReduction {
    level: NoiseReductionLevel,
    sample_rate: u32,
    channels: u16,
    low_pass: Band,
    high_pass: Band,
}

impl NoiseReduction {
    /// Create a bypassed EQ for the given stream parameters
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self::with_level(sample_rate, channels, NoiseReductionLevel::Off)
    }

    /// Create an EQ at a specific reduction level
    pub fn with_level(sample_rate: u32, channels: u16, level: NoiseReductionLevel) -> Self {
        let gain_db = level.gain_db();
        Self {
            level,
            sample_rate,
            channels,
            low_pass: Band::low_pass(LOW_PASS_CUTOFF_HZ, gain_db, sample_rate, channels),
            high_pass: Band::high_pass(HIGH_PASS_CUTOFF_HZ, gain_db, sample_rate, channels),
        }
    }

    /// Current reduction level
    pub fn level(&self) -> NoiseReductionLevel {
        self.level
    }

    /// Reconfigure both bands for a new level
    ///
    /// Filter state is reset so the new response starts clean.
    pub fn set_level(&mut self, level: NoiseReductionLevel) {
        if self.level == level {
            return;
        }
        *self = Self::with_level(self.sample_rate, self.channels, level);
    }

    /// Clear filter state without changing the configuration
    pub fn reset(&mut self) {
        self.low_pass.reset();
        self.high_pass.reset();
    }

    /// Process interleaved samples in place
    ///
    /// Bands run in series: low-pass then high-pass, each with its
    /// attenuation gain. Samples beyond the last whole frame are ignored.
    pub fn process(&mut self, buffer: &mut [f32]) {
        if self.level == NoiseReductionLevel::Off {
            return;
        }

        let channels = self.channels.max(1) as usize;
        let frames = buffer.len() / channels;

        for frame in 0..frames {
            for ch in 0..channels {
                let idx = frame * channels + ch;
                let filtered = self.low_pass.process_sample(ch, buffer[idx]);
                buffer[idx] = self.high_pass.process_sample(ch, filtered);
            }
        }
    }
}
