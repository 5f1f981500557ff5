//! Sound-File Reader (spec section 4.2): opens WAV/AIFF/AU files or raw
//! PCM, reads sample data into a [`SampleBuffer`], and normalizes to
//! floating point.
//!
//! Grounded on `original_source/DfxUtil/SoundFile.cpp`'s `getWavInfo`
//! (chunk search for `"fmt "`, format-tag validation, `dataOffset`) and
//! `SampleUtil.h`'s `SampleFormat`/byte-swap helpers, reimplemented with
//! `byteorder` instead of hand-rolled pointer swaps.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};

use crate::error::SoundFileError;

use super::buffer::{Channels, SampleBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Sint16,
    Sint24,
    Sint32,
    Float32,
    Float64,
}

impl SampleFormat {
    fn n_bytes(self) -> usize {
        match self {
            SampleFormat::Sint16 => 2,
            SampleFormat::Sint24 => 3,
            SampleFormat::Sint32 => 4,
            SampleFormat::Float32 => 4,
            SampleFormat::Float64 => 8,
        }
    }

    fn full_scale(self) -> f64 {
        match self {
            SampleFormat::Sint16 => 2f64.powi(15),
            SampleFormat::Sint24 => 2f64.powi(23),
            SampleFormat::Sint32 => 2f64.powi(31),
            SampleFormat::Float32 | SampleFormat::Float64 => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerFormat {
    Wav,
    Aiff,
    Au,
}

/// Output scaling applied while reading (spec section 4.2):
/// `Identity` for diagnostics, `FullScale` to normalize to ±1.0, or
/// `Scaled(s)` to normalize then multiply by `s` (pre-scaling a robin by
/// `1/peak`).
#[derive(Debug, Clone, Copy)]
pub enum ScaleCode {
    Identity,
    FullScale,
    Scaled(f64),
}

impl From<f64> for ScaleCode {
    fn from(code: f64) -> Self {
        if code == 0.0 {
            ScaleCode::Identity
        } else if code == 1.0 {
            ScaleCode::FullScale
        } else {
            ScaleCode::Scaled(code)
        }
    }
}

/// An opened sound file, positioned at its first sample byte.
#[derive(Debug)]
pub struct SoundFile {
    file: File,
    path: PathBuf,
    byte_order_is_big_endian: bool,
    channels: u32,
    format: SampleFormat,
    rate: f64,
    data_offset: u64,
    frame_count: u64,
}

impl SoundFile {
    /// Auto-detect container format from the first 12 bytes and parse
    /// its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SoundFileError> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|_| SoundFileError::NotFound {
            path: path.display().to_string(),
        })?;

        let mut header = [0u8; 12];
        let n = file.read(&mut header).map_err(|_| SoundFileError::SeekFailed {
            path: path.display().to_string(),
        })?;
        if n < 12 {
            return Err(SoundFileError::EmptyFile {
                path: path.display().to_string(),
            });
        }

        let container = if &header[0..4] == b"RIFF" && &header[8..12] == b"WAVE" {
            ContainerFormat::Wav
        } else if &header[0..4] == b"FORM" && (&header[8..12] == b"AIFF" || &header[8..12] == b"AIFC") {
            ContainerFormat::Aiff
        } else if &header[0..4] == b".snd" {
            ContainerFormat::Au
        } else {
            return Err(SoundFileError::UnsupportedFormat {
                path: path.display().to_string(),
                reason: "unrecognized header; expected RIFF/WAVE, FORM/AIFF, or .snd".to_string(),
            });
        };

        file.seek(SeekFrom::Start(0)).map_err(|_| SoundFileError::SeekFailed {
            path: path.display().to_string(),
        })?;

        match container {
            ContainerFormat::Wav => Self::parse_wav(file, path),
            ContainerFormat::Aiff => Self::parse_aiff(file, path),
            ContainerFormat::Au => Self::parse_au(file, path),
        }
    }

    /// Explicit-raw mode (spec section 4.2, supplemented feature): the
    /// caller already knows the layout, matching the original's
    /// `OpenRaw`.
    pub fn open_raw(
        path: impl AsRef<Path>,
        channels: u32,
        format: SampleFormat,
        rate: f64,
    ) -> Result<Self, SoundFileError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|_| SoundFileError::NotFound {
            path: path.display().to_string(),
        })?;
        let file_len = file.metadata().map_err(|_| SoundFileError::SeekFailed {
            path: path.display().to_string(),
        })?.len();
        let frame_size = format.n_bytes() as u64 * channels as u64;
        Ok(SoundFile {
            file,
            path,
            byte_order_is_big_endian: false,
            channels,
            format,
            rate,
            data_offset: 0,
            frame_count: file_len / frame_size.max(1),
        })
    }

    fn parse_wav(mut file: File, path: PathBuf) -> Result<Self, SoundFileError> {
        let seek_err = || SoundFileError::SeekFailed { path: path.display().to_string() };
        let short = |wanted, got| SoundFileError::ReadShort {
            path: path.display().to_string(),
            wanted,
            got,
        };

        file.seek(SeekFrom::Start(12)).map_err(|_| seek_err())?;

        let mut channels = 0u32;
        let mut rate = 0f64;
        let mut bits_per_sample = 0u16;
        let mut format_tag = 0u16;
        let mut data_offset = 0u64;
        let mut data_len = 0u64;
        let mut found_fmt = false;
        let mut found_data = false;

        while !(found_fmt && found_data) {
            let mut chunk_id = [0u8; 4];
            if file.read_exact(&mut chunk_id).is_err() {
                break;
            }
            let chunk_size = file.read_u32::<LittleEndian>().map_err(|_| short(4, 0))?;

            if &chunk_id == b"fmt " {
                format_tag = file.read_u16::<LittleEndian>().map_err(|_| short(2, 0))?;
                channels = file.read_u16::<LittleEndian>().map_err(|_| short(2, 0))? as u32;
                rate = file.read_u32::<LittleEndian>().map_err(|_| short(4, 0))? as f64;
                let _byte_rate = file.read_u32::<LittleEndian>().map_err(|_| short(4, 0))?;
                let _block_align = file.read_u16::<LittleEndian>().map_err(|_| short(2, 0))?;
                bits_per_sample = file.read_u16::<LittleEndian>().map_err(|_| short(2, 0))?;
                let consumed = 16u32;
                if chunk_size > consumed {
                    file.seek(SeekFrom::Current((chunk_size - consumed) as i64)).map_err(|_| seek_err())?;
                }
                found_fmt = true;
            } else if &chunk_id == b"data" {
                data_offset = file.stream_position().map_err(|_| seek_err())?;
                data_len = chunk_size as u64;
                found_data = true;
                break;
            } else {
                let padded = chunk_size + (chunk_size & 1);
                file.seek(SeekFrom::Current(padded as i64)).map_err(|_| seek_err())?;
            }
        }

        if !found_fmt || !found_data {
            return Err(SoundFileError::UnsupportedFormat {
                path: path.display().to_string(),
                reason: "missing 'fmt ' or 'data' chunk".to_string(),
            });
        }

        const WAVE_FORMAT_PCM: u16 = 1;
        const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;

        let format = match (format_tag, bits_per_sample) {
            (WAVE_FORMAT_PCM, 16) => SampleFormat::Sint16,
            (WAVE_FORMAT_PCM, 24) => SampleFormat::Sint24,
            (WAVE_FORMAT_PCM, 32) => SampleFormat::Sint32,
            (WAVE_FORMAT_IEEE_FLOAT, 32) => SampleFormat::Float32,
            (WAVE_FORMAT_IEEE_FLOAT, 64) => SampleFormat::Float64,
            _ => {
                return Err(SoundFileError::UnsupportedFormat {
                    path: path.display().to_string(),
                    reason: format!("format tag {format_tag} with {bits_per_sample} bits per sample"),
                })
            }
        };

        if channels == 0 {
            return Err(SoundFileError::UnsupportedFormat {
                path: path.display().to_string(),
                reason: "zero channels".to_string(),
            });
        }

        let frame_size = format.n_bytes() as u64 * channels as u64;
        let frame_count = data_len / frame_size.max(1);

        file.seek(SeekFrom::Start(data_offset)).map_err(|_| seek_err())?;

        Ok(SoundFile {
            file,
            path,
            byte_order_is_big_endian: false,
            channels,
            format,
            rate,
            data_offset,
            frame_count,
        })
    }

    fn parse_aiff(mut file: File, path: PathBuf) -> Result<Self, SoundFileError> {
        let seek_err = || SoundFileError::SeekFailed { path: path.display().to_string() };

        file.seek(SeekFrom::Start(12)).map_err(|_| seek_err())?;

        let mut channels = 0u32;
        let mut rate = 0f64;
        let mut bits_per_sample = 0u16;
        let mut data_offset = 0u64;
        let mut frame_count = 0u64;
        let mut found_comm = false;
        let mut found_data = false;

        while !(found_comm && found_data) {
            let mut chunk_id = [0u8; 4];
            if file.read_exact(&mut chunk_id).is_err() {
                break;
            }
            let chunk_size = file.read_u32::<BigEndian>().map_err(|_| seek_err())?;

            if &chunk_id == b"COMM" {
                channels = file.read_u16::<BigEndian>().map_err(|_| seek_err())? as u32;
                frame_count = file.read_u32::<BigEndian>().map_err(|_| seek_err())? as u64;
                bits_per_sample = file.read_u16::<BigEndian>().map_err(|_| seek_err())?;
                let mut ext_rate = [0u8; 10];
                file.read_exact(&mut ext_rate).map_err(|_| seek_err())?;
                rate = extended_to_f64(&ext_rate);
                let consumed = 18u32;
                if chunk_size > consumed {
                    file.seek(SeekFrom::Current((chunk_size - consumed) as i64)).map_err(|_| seek_err())?;
                }
                found_comm = true;
            } else if &chunk_id == b"SSND" {
                let offset = file.read_u32::<BigEndian>().map_err(|_| seek_err())?;
                let _block_size = file.read_u32::<BigEndian>().map_err(|_| seek_err())?;
                data_offset = file.stream_position().map_err(|_| seek_err())? + offset as u64;
                found_data = true;
                break;
            } else {
                let padded = chunk_size + (chunk_size & 1);
                file.seek(SeekFrom::Current(padded as i64)).map_err(|_| seek_err())?;
            }
        }

        if !found_comm || !found_data {
            return Err(SoundFileError::UnsupportedFormat {
                path: path.display().to_string(),
                reason: "missing 'COMM' or 'SSND' chunk".to_string(),
            });
        }

        let format = match bits_per_sample {
            16 => SampleFormat::Sint16,
            24 => SampleFormat::Sint24,
            32 => SampleFormat::Sint32,
            _ => {
                return Err(SoundFileError::UnsupportedFormat {
                    path: path.display().to_string(),
                    reason: format!("{bits_per_sample}-bit AIFF samples"),
                })
            }
        };

        file.seek(SeekFrom::Start(data_offset)).map_err(|_| seek_err())?;

        Ok(SoundFile {
            file,
            path,
            byte_order_is_big_endian: true,
            channels,
            format,
            rate,
            data_offset,
            frame_count,
        })
    }

    fn parse_au(mut file: File, path: PathBuf) -> Result<Self, SoundFileError> {
        let seek_err = || SoundFileError::SeekFailed { path: path.display().to_string() };
        file.seek(SeekFrom::Start(4)).map_err(|_| seek_err())?;

        let data_offset = file.read_u32::<BigEndian>().map_err(|_| seek_err())? as u64;
        let data_size = file.read_u32::<BigEndian>().map_err(|_| seek_err())?;
        let encoding = file.read_u32::<BigEndian>().map_err(|_| seek_err())?;
        let rate = file.read_u32::<BigEndian>().map_err(|_| seek_err())? as f64;
        let channels = file.read_u32::<BigEndian>().map_err(|_| seek_err())?;

        const AU_ENC_LINEAR_16: u32 = 3;
        const AU_ENC_LINEAR_24: u32 = 4;
        const AU_ENC_LINEAR_32: u32 = 5;
        const AU_ENC_FLOAT: u32 = 6;
        const AU_ENC_DOUBLE: u32 = 7;

        let format = match encoding {
            AU_ENC_LINEAR_16 => SampleFormat::Sint16,
            AU_ENC_LINEAR_24 => SampleFormat::Sint24,
            AU_ENC_LINEAR_32 => SampleFormat::Sint32,
            AU_ENC_FLOAT => SampleFormat::Float32,
            AU_ENC_DOUBLE => SampleFormat::Float64,
            other => {
                return Err(SoundFileError::UnsupportedFormat {
                    path: path.display().to_string(),
                    reason: format!("unsupported .au encoding {other}"),
                })
            }
        };

        let frame_size = format.n_bytes() as u64 * channels as u64;
        let frame_count = data_size as u64 / frame_size.max(1);

        file.seek(SeekFrom::Start(data_offset)).map_err(|_| seek_err())?;

        Ok(SoundFile {
            file,
            path,
            byte_order_is_big_endian: true,
            channels,
            format,
            rate,
            data_offset,
            frame_count,
        })
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Read `[start_frame, end_frame)` into a [`SampleBuffer`], applying
    /// `scale` (spec section 4.2's `scale_code`). 24-bit samples are
    /// expanded into the high three bytes of a 32-bit integer before
    /// normalization, matching the original's `int24_t::asInt`.
    pub fn read(
        &mut self,
        start_frame: u64,
        end_frame: u64,
        scale: ScaleCode,
    ) -> Result<SampleBuffer, SoundFileError> {
        if end_frame > self.frame_count {
            return Err(SoundFileError::ReadShort {
                path: self.path.display().to_string(),
                wanted: end_frame as usize,
                got: self.frame_count as usize,
            });
        }
        let n_frames = (end_frame - start_frame) as usize;
        let frame_size = self.format.n_bytes() as u64 * self.channels as u64;
        let offset = self.data_offset + start_frame * frame_size;

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|_| SoundFileError::SeekFailed {
                path: self.path.display().to_string(),
            })?;

        let n_samples = n_frames * self.channels as usize;
        let mut raw = vec![0u8; n_samples * self.format.n_bytes()];
        self.file.read_exact(&mut raw).map_err(|_| SoundFileError::ReadShort {
            path: self.path.display().to_string(),
            wanted: raw.len(),
            got: 0,
        })?;

        let full_scale = self.format.full_scale();
        let mut out = Vec::with_capacity(n_samples);

        for chunk in raw.chunks_exact(self.format.n_bytes()) {
            let raw_value: f64 = match self.format {
                SampleFormat::Sint16 => {
                    let v = if self.byte_order_is_big_endian {
                        BigEndian::read_i16(chunk)
                    } else {
                        LittleEndian::read_i16(chunk)
                    };
                    v as f64
                }
                SampleFormat::Sint24 => {
                    let b = if self.byte_order_is_big_endian {
                        [chunk[0], chunk[1], chunk[2]]
                    } else {
                        [chunk[2], chunk[1], chunk[0]]
                    };
                    // expand into the high three bytes of an i32, low byte zeroed
                    let widened = ((b[0] as i32) << 24) | ((b[1] as i32) << 16) | ((b[2] as i32) << 8);
                    (widened >> 8) as f64 * 256.0
                }
                SampleFormat::Sint32 => {
                    let v = if self.byte_order_is_big_endian {
                        BigEndian::read_i32(chunk)
                    } else {
                        LittleEndian::read_i32(chunk)
                    };
                    v as f64
                }
                SampleFormat::Float32 => {
                    let v = if self.byte_order_is_big_endian {
                        BigEndian::read_f32(chunk)
                    } else {
                        LittleEndian::read_f32(chunk)
                    };
                    v as f64
                }
                SampleFormat::Float64 => {
                    if self.byte_order_is_big_endian {
                        BigEndian::read_f64(chunk)
                    } else {
                        LittleEndian::read_f64(chunk)
                    }
                }
            };

            let value = match scale {
                ScaleCode::Identity => raw_value,
                ScaleCode::FullScale => raw_value / full_scale,
                ScaleCode::Scaled(s) => (raw_value / full_scale) * s,
            };
            out.push(value);
        }

        let channels = if self.channels == 1 { Channels::Mono } else { Channels::Stereo };
        Ok(SampleBuffer::from_samples(out, channels, self.rate))
    }
}

/// Decode an 80-bit IEEE extended float (AIFF's sample-rate encoding)
/// into an `f64`. Good enough for any rate a real sound file uses.
fn extended_to_f64(bytes: &[u8; 10]) -> f64 {
    let exponent = (((bytes[0] as u16) << 8) | bytes[1] as u16) & 0x7fff;
    let mantissa = ((bytes[2] as u64) << 56)
        | ((bytes[3] as u64) << 48)
        | ((bytes[4] as u64) << 40)
        | ((bytes[5] as u64) << 32)
        | ((bytes[6] as u64) << 24)
        | ((bytes[7] as u64) << 16)
        | ((bytes[8] as u64) << 8)
        | (bytes[9] as u64);
    if exponent == 0 && mantissa == 0 {
        return 0.0;
    }
    let f = mantissa as f64 * 2f64.powi(exponent as i32 - 16383 - 63);
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_pcm16_wav(path: &Path, rate: u32, channels: u16, samples: &[i16]) {
        let mut f = File::create(path).unwrap();
        let data_bytes = samples.len() * 2;
        let byte_rate = rate * channels as u32 * 2;
        let block_align = channels * 2;

        f.write_all(b"RIFF").unwrap();
        f.write_all(&((36 + data_bytes) as u32).to_le_bytes()).unwrap();
        f.write_all(b"WAVE").unwrap();
        f.write_all(b"fmt ").unwrap();
        f.write_all(&16u32.to_le_bytes()).unwrap();
        f.write_all(&1u16.to_le_bytes()).unwrap(); // PCM
        f.write_all(&channels.to_le_bytes()).unwrap();
        f.write_all(&rate.to_le_bytes()).unwrap();
        f.write_all(&byte_rate.to_le_bytes()).unwrap();
        f.write_all(&block_align.to_le_bytes()).unwrap();
        f.write_all(&16u16.to_le_bytes()).unwrap();
        f.write_all(b"data").unwrap();
        f.write_all(&(data_bytes as u32).to_le_bytes()).unwrap();
        for s in samples {
            f.write_all(&s.to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn reads_mono_pcm16_wav_full_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_pcm16_wav(&path, 44_100, 1, &[0, 16384, -32768, 32767]);

        let mut sf = SoundFile::open(&path).unwrap();
        assert_eq!(sf.channels(), 1);
        assert_eq!(sf.frame_count(), 4);

        let buf = sf.read(0, 4, ScaleCode::FullScale).unwrap();
        assert_eq!(buf.frame_count(), 4);
        assert!((buf.mono_frame(1) - 0.5).abs() < 1e-4);
        assert!((buf.mono_frame(2) - (-1.0)).abs() < 1e-4);
    }

    #[test]
    fn identity_scale_returns_raw_integer_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.wav");
        write_pcm16_wav(&path, 44_100, 1, &[1000]);

        let mut sf = SoundFile::open(&path).unwrap();
        let buf = sf.read(0, 1, ScaleCode::Identity).unwrap();
        assert_eq!(buf.mono_frame(0), 1000.0);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = SoundFile::open("/nonexistent/path/xyz.wav").unwrap_err();
        assert!(matches!(err, SoundFileError::NotFound { .. }));
    }

    #[test]
    fn unrecognized_header_is_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.bin");
        std::fs::write(&path, b"not a real sound file header").unwrap();
        let err = SoundFile::open(&path).unwrap_err();
        assert!(matches!(err, SoundFileError::UnsupportedFormat { .. }));
    }
}
