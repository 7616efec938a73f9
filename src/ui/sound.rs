/// Sound engine: procedural chiptune cues via rodio.
///
/// Buffers are synthesised once at init and replayed fire-and-forget.
/// Which cue a `GameEvent` triggers is decided by `sfx_for`, which is
/// available with or without the "sound" feature.
///
/// Without the "sound" feature the stub SoundEngine does nothing.

use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Select,
    Correct,
    Wrong,
    Cleared,
    LowTime,
    TimeUp,
}

/// Cue for an event, if it has one.
pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    match event {
        GameEvent::StarSelected { .. } => Some(Sfx::Select),
        GameEvent::EdgeAccepted { correct: true, .. } => Some(Sfx::Correct),
        GameEvent::EdgeAccepted { correct: false, .. } | GameEvent::EdgeRejected => Some(Sfx::Wrong),
        GameEvent::RoundCleared { .. } => Some(Sfx::Cleared),
        GameEvent::LowTime { .. } => Some(Sfx::LowTime),
        GameEvent::TimeUp { .. } => Some(Sfx::TimeUp),
        _ => None,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        select: Arc<Vec<u8>>,
        correct: Arc<Vec<u8>>,
        wrong: Arc<Vec<u8>>,
        cleared: Arc<Vec<u8>>,
        low_time: Arc<Vec<u8>>,
        time_up: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(SoundEngine {
                _stream: stream,
                handle,
                select: Arc::new(make_wav(&gen_select())),
                correct: Arc::new(make_wav(&gen_correct())),
                wrong: Arc::new(make_wav(&gen_wrong())),
                cleared: Arc::new(make_wav(&gen_cleared())),
                low_time: Arc::new(make_wav(&gen_low_time())),
                time_up: Arc::new(make_wav(&gen_time_up())),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Select => &self.select,
                Sfx::Correct => &self.correct,
                Sfx::Wrong => &self.wrong,
                Sfx::Cleared => &self.cleared,
                Sfx::LowTime => &self.low_time,
                Sfx::TimeUp => &self.time_up,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators (mono f32 samples)
    // ════════════════════════════════════════════════════════════

    /// One note: sine plus `harmonic` share of the octave, with a
    /// fade shaped by `curve` (1.0 = linear).
    fn note(out: &mut Vec<f32>, freq: f32, dur: f32, volume: f32, harmonic: f32, curve: f32) {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(curve);
            let wave = (t * freq * TAU).sin() * (1.0 - harmonic)
                + (t * freq * 2.0 * TAU).sin() * harmonic;
            out.push(wave * env * volume);
        }
    }

    /// Soft high tick.
    fn gen_select() -> Vec<f32> {
        let mut s = Vec::new();
        note(&mut s, 1320.0, 0.04, 0.2, 0.0, 1.0);
        s
    }

    /// Rising fifth: E5 → B5.
    fn gen_correct() -> Vec<f32> {
        let mut s = Vec::new();
        note(&mut s, 659.0, 0.05, 0.25, 0.3, 0.5);
        note(&mut s, 988.0, 0.08, 0.25, 0.3, 0.5);
        s
    }

    /// Low buzz with a downward bend.
    fn gen_wrong() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.14) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 220.0 - p * 80.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                let square = if (t * freq * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                square * (1.0 - p) * 0.15
            })
            .collect()
    }

    /// Arpeggio C5 E5 G5 C6 with a held top note.
    fn gen_cleared() -> Vec<f32> {
        let mut s = Vec::new();
        for freq in [523.0_f32, 659.0, 784.0] {
            note(&mut s, freq, 0.09, 0.3, 0.3, 0.3);
        }
        note(&mut s, 1047.0, 0.3, 0.3, 0.3, 1.0);
        s
    }

    /// Short double beep.
    fn gen_low_time() -> Vec<f32> {
        let mut s = Vec::new();
        note(&mut s, 880.0, 0.05, 0.2, 0.0, 2.0);
        s.extend(std::iter::repeat(0.0).take((SAMPLE_RATE as f32 * 0.04) as usize));
        note(&mut s, 880.0, 0.05, 0.2, 0.0, 2.0);
        s
    }

    /// Falling G4 E4 C4.
    fn gen_time_up() -> Vec<f32> {
        let mut s = Vec::new();
        for freq in [392.0_f32, 330.0] {
            note(&mut s, freq, 0.14, 0.3, 0.1, 3.0);
        }
        note(&mut s, 262.0, 0.35, 0.3, 0.1, 1.0);
        s
    }

    // ════════════════════════════════════════════════════════════
    //  16-bit PCM WAV wrapper
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_size = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes() {
            let wav = make_wav(&gen_select());
            assert_eq!(&wav[0..4], b"RIFF");
            let data = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
            assert_eq!(wav.len(), 44 + data);
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sky::{Edge, StarId};
    use crate::sim::schedule::RoundTicket;

    #[test]
    fn events_map_to_cues() {
        let edge = Edge::new(StarId(0), StarId(1)).unwrap();
        assert_eq!(sfx_for(&GameEvent::EdgeAccepted { edge, correct: true }), Some(Sfx::Correct));
        assert_eq!(sfx_for(&GameEvent::EdgeAccepted { edge, correct: false }), Some(Sfx::Wrong));
        assert_eq!(sfx_for(&GameEvent::EdgeRejected), Some(Sfx::Wrong));
        let ticket = RoundTicket { generation: 1, serial: 1 };
        assert_eq!(sfx_for(&GameEvent::RoundCleared { level: 1, bonus: 0, ticket }), Some(Sfx::Cleared));
        assert_eq!(sfx_for(&GameEvent::GameStarted), None);
        assert_eq!(sfx_for(&GameEvent::StarDeselected { star: StarId(2) }), None);
    }
}
