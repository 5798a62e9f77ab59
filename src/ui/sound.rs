/// Sound engine: procedural effects and tunes via rodio.
///
/// Game data refers to sounds and tunes by index only. Each index maps to
/// a generated waveform: effects are short pitched chirps, tunes are short
/// looping pentatonic phrases. Buffers are built on first use and cached.
///
/// Only one effect plays at a time. A new effect replaces the current one
/// unless the current one has a higher priority and is still playing.
///
/// Compile without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).
use crate::sim::services::Audio;

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::{debug, warn};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        effects: HashMap<usize, Vec<u8>>,
        /// The effect currently playing and its priority.
        current: Option<(Sink, u8)>,
        music: Option<Sink>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(SoundEngine {
                _stream: stream,
                handle,
                effects: HashMap::new(),
                current: None,
                music: None,
            })
        }

        fn decoded(buf: Vec<u8>) -> Option<rodio::Decoder<Cursor<Vec<u8>>>> {
            match rodio::Decoder::new(Cursor::new(buf)) {
                Ok(src) => Some(src),
                Err(e) => {
                    warn!(error = %e, "generated sound failed to decode");
                    None
                }
            }
        }

        pub fn play_sound(&mut self, index: usize, priority: u8) {
            if let Some((sink, playing)) = &self.current {
                if !sink.empty() && *playing > priority {
                    debug!(index, priority, "sound dropped");
                    return;
                }
            }
            let buf = self
                .effects
                .entry(index)
                .or_insert_with(|| make_wav(&gen_effect(index)))
                .clone();
            let Some(src) = Self::decoded(buf) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.append(src);
                if let Some((old, _)) = self.current.replace((sink, priority)) {
                    old.stop();
                }
            }
        }

        pub fn play_music(&mut self, index: usize) {
            let Some(src) = Self::decoded(make_wav(&gen_tune(index))) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.append(src.repeat_infinite());
                if let Some(old) = self.music.replace(sink) {
                    old.stop();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Pentatonic scale, A3 upward.
    const SCALE: [f32; 10] = [220.0, 247.0, 277.0, 330.0, 370.0, 440.0, 494.0, 554.0, 659.0, 740.0];

    /// Square-ish wave (sine + 3rd harmonic) for retro feel.
    fn tone(freq: f32, t: f32) -> f32 {
        (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
            + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
    }

    /// Effect `index`: a chirp whose pitch and sweep direction come from
    /// the index.
    pub(super) fn gen_effect(index: usize) -> Vec<f32> {
        let base = SCALE[index % SCALE.len()] * 2.0;
        let rising = index % 2 == 0;
        let duration = 0.08 + (index % 3) as f32 * 0.04;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let sweep = if rising { 1.0 + p * 0.5 } else { 1.5 - p * 0.5 };
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - p).powf(0.7);
                tone(base * sweep, t) * env * 0.25
            })
            .collect()
    }

    /// Tune `index`: eight notes walked over the scale by a small LCG
    /// seeded with the index.
    pub(super) fn gen_tune(index: usize) -> Vec<f32> {
        let note_dur = 0.18;
        let n = (SAMPLE_RATE as f32 * note_dur) as usize;
        let mut rng: u32 = 12345u32.wrapping_add(index as u32 * 7919);
        let mut step = index % SCALE.len();
        let mut samples = Vec::with_capacity(n * 8);
        for _ in 0..8 {
            rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
            step = (step + (rng >> 16) as usize % 3 + SCALE.len() - 1) % SCALE.len();
            let freq = SCALE[step];
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.6;
                samples.push((t * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.15);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_sound(&mut self, _index: usize, _priority: u8) {}
    pub fn play_music(&mut self, _index: usize) {}
}

impl Audio for SoundEngine {
    fn play_sound(&mut self, index: usize, priority: u8) {
        SoundEngine::play_sound(self, index, priority);
    }

    fn play_music(&mut self, index: usize) {
        SoundEngine::play_music(self, index);
    }
}

/// Used when no output device is available.
pub struct Silent;

impl Audio for Silent {
    fn play_sound(&mut self, _index: usize, _priority: u8) {}
    fn play_music(&mut self, _index: usize) {}
}
