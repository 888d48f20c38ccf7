//! Minimal RIFF/WAVE reader
//!
//! Accepts exactly one layout: `RIFF` header, `fmt ` chunk, then `data`
//! chunk, PCM with 8 or 16 bits per sample. Anything else is rejected.

use super::AudioClip;
use crate::error::WavError;

const PCM: u16 = 1;

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], WavError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(WavError::ShortRead { field })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn tag(&mut self, expected: &str) -> Result<(), WavError> {
        let found = self.take(4, "chunk tag")?;
        if found != expected.as_bytes() {
            return Err(WavError::TagMismatch {
                expected: expected.to_string(),
                found: String::from_utf8_lossy(found).into_owned(),
            });
        }
        Ok(())
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, WavError> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, WavError> {
        let b = self.take(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Parse a complete WAV file held in memory
pub fn parse(bytes: &[u8]) -> Result<AudioClip, WavError> {
    let mut r = Reader::new(bytes);

    r.tag("RIFF")?;
    let _riff_size = r.u32("riff size")?;
    r.tag("WAVE")?;

    r.tag("fmt ")?;
    let fmt_size = r.u32("fmt size")?;
    let format = r.u16("audio format")?;
    let channels = r.u16("channel count")?;
    let sample_rate = r.u32("sample rate")?;
    let _byte_rate = r.u32("byte rate")?;
    let _block_align = r.u16("block align")?;
    let bits_per_sample = r.u16("bits per sample")?;
    // WAVEFORMATEX appends a cbSize field and extension bytes
    if fmt_size > 16 {
        r.take((fmt_size - 16) as usize, "fmt extension")?;
    }

    if format != PCM {
        return Err(WavError::Unsupported(format!("format tag {format}")));
    }
    if channels == 0 {
        return Err(WavError::Unsupported("zero channels".into()));
    }

    r.tag("data")?;
    let data_size = r.u32("data size")?;
    let data = r.take(data_size as usize, "sample data")?;

    let samples = match bits_per_sample {
        8 => data.iter().map(|&b| (b as i16 - 128) << 8).collect(),
        16 => data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect(),
        other => return Err(WavError::Unsupported(format!("{other} bits per sample"))),
    };

    Ok(AudioClip {
        channels,
        sample_rate,
        samples,
    })
}
