//! Generic multi-format decoding through rodio

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, Source};

use super::AudioClip;
use crate::error::AssetError;

/// Decode any container rodio understands into 16-bit PCM
pub fn decode_file(path: &Path) -> Result<AudioClip, AssetError> {
    let file = File::open(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| AssetError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<i16> = decoder.collect();

    Ok(AudioClip {
        channels,
        sample_rate,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("arcanoid-{}-{name}", std::process::id()))
    }

    fn click_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/audio/click.wav")
    }

    #[test]
    fn test_other_extensions_use_generic_decoder() {
        let bytes = std::fs::read(click_path()).unwrap();
        let expected = wav::parse(&bytes).unwrap();

        let path = temp_path("click.snd");
        std::fs::write(&path, &bytes).unwrap();
        let clip = AudioClip::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(clip.channels, expected.channels);
        assert_eq!(clip.sample_rate, expected.sample_rate);
        assert_eq!(clip.frames(), expected.frames());
    }

    #[test]
    fn test_unrecognized_data_is_a_decode_error() {
        let path = temp_path("garbage.snd");
        std::fs::write(&path, b"definitely not audio, just some bytes").unwrap();
        let result = AudioClip::load(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(AssetError::Decode { .. })));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = decode_file(&temp_path("missing.snd"));
        assert!(matches!(result, Err(AssetError::Io { .. })));
    }
}
