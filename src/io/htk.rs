//! HTK parameter files.
//!
//! A 12-byte big-endian header (sample count, sample period in 100 ns
//! units, bytes per sample, parameter kind) followed by the samples as
//! big-endian `f32`s. Compressed files store 16-bit integers plus scale
//! tables and are not supported.

use std::io::{self, Read, Write};
use std::path::Path;

use crate::emission::Observation;
use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 12;

/// `_C`: compressed samples.
pub const KIND_COMPRESSED: u16 = 0o2000;
/// `_K`: trailing CRC checksum.
pub const KIND_CHECKSUM: u16 = 0o10000;
/// Base kind `MFCC`.
pub const KIND_MFCC: u16 = 6;
/// Qualifier bits for `_0`, `_D` and `_A`, as in `MFCC_0_D_A`.
pub const QUALIFIERS_0_D_A: u16 = 0o20000 | 0o400 | 0o1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HtkHeader {
    pub samples: u32,
    /// Sample period in 100 ns units.
    pub sample_period: u32,
    /// Bytes per sample.
    pub sample_size: u16,
    pub parm_kind: u16,
}

impl HtkHeader {
    fn decode(bytes: [u8; HEADER_LEN], source_name: &str) -> Result<Self> {
        let samples = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let sample_period = i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let sample_size = i16::from_be_bytes([bytes[8], bytes[9]]);
        let parm_kind = u16::from_be_bytes([bytes[10], bytes[11]]);

        if parm_kind & KIND_COMPRESSED != 0 {
            return Err(Error::UnsupportedFeatureKind {
                source_name: source_name.to_string(),
                kind: parm_kind,
            });
        }
        let (Ok(samples), Ok(sample_period)) = (u32::try_from(samples), u32::try_from(sample_period))
        else {
            return Err(Error::parse(source_name, 0, "negative sample count or period in header"));
        };
        let sample_size = match u16::try_from(sample_size) {
            Ok(s) if s > 0 && s % 4 == 0 => s,
            _ => {
                return Err(Error::parse(
                    source_name,
                    0,
                    format!("sample size {sample_size} is not a positive multiple of 4"),
                ))
            }
        };
        Ok(Self {
            samples,
            sample_period,
            sample_size,
            parm_kind,
        })
    }

    fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.samples.to_be_bytes());
        out[4..8].copy_from_slice(&self.sample_period.to_be_bytes());
        out[8..10].copy_from_slice(&self.sample_size.to_be_bytes());
        out[10..12].copy_from_slice(&self.parm_kind.to_be_bytes());
        out
    }

    /// Values per sample.
    pub fn dimension(&self) -> usize {
        usize::from(self.sample_size) / 4
    }
}

/// Frames reserved up front; longer files grow the buffer as they are read.
const PREALLOCATED_FRAMES: usize = 4096;

fn fill<R: Read>(reader: &mut R, buf: &mut [u8], source_name: &str, what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::parse(source_name, 0, format!("file ends inside {what}"))
        } else {
            Error::Io(e)
        }
    })
}

/// Decode one observation. Bytes after the declared samples (a `_K`
/// checksum, for instance) are left unread.
pub fn parse_features<R: Read>(mut reader: R, source_name: &str) -> Result<(HtkHeader, Observation)> {
    let mut head = [0u8; HEADER_LEN];
    fill(&mut reader, &mut head, source_name, "the header")?;
    let header = HtkHeader::decode(head, source_name)?;

    let dim = header.dimension();
    let mut sample = vec![0u8; usize::from(header.sample_size)];
    let mut frames = Vec::with_capacity((header.samples as usize).min(PREALLOCATED_FRAMES));
    for i in 0..header.samples {
        fill(&mut reader, &mut sample, source_name, &format!("sample {i}"))?;
        frames.push(
            sample
                .chunks_exact(4)
                .map(|b| f64::from(f32::from_be_bytes([b[0], b[1], b[2], b[3]])))
                .collect::<Vec<_>>(),
        );
    }
    debug_assert!(frames.iter().all(|f| f.len() == dim));

    #[cfg(feature = "tracing")]
    tracing::debug!(
        source = source_name,
        samples = header.samples,
        dim,
        kind = header.parm_kind,
        "features read"
    );
    Ok((header, Observation::new(frames)?))
}

pub fn read_features(path: impl AsRef<Path>) -> Result<Observation> {
    let path = path.as_ref();
    let (_, observation) = parse_features(super::open(path)?, &super::source_name(path))?;
    Ok(observation)
}

/// Write `observation` as an uncompressed HTK parameter file.
pub fn write_features<W: Write>(
    mut writer: W,
    observation: &Observation,
    sample_period: u32,
    parm_kind: u16,
) -> Result<()> {
    let dim = observation.dim().unwrap_or(0);
    let too_big = || Error::malformed("observation", "too large for an HTK header");
    let header = HtkHeader {
        samples: u32::try_from(observation.len()).map_err(|_| too_big())?,
        sample_period,
        sample_size: u16::try_from(dim * 4).map_err(|_| too_big())?,
        parm_kind: parm_kind & !KIND_COMPRESSED,
    };
    writer.write_all(&header.encode())?;
    for frame in observation.frames() {
        for &x in frame {
            writer.write_all(&(x as f32).to_be_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}
