//! Binary artifact format for [`RayModelLookup`].
//!
//! Format (all fields little-endian):
//! - Header (40 bytes):
//!   - Magic: "DRAY" (4 bytes)
//!   - Version: u8 (1 byte)
//!   - Reserved: 3 bytes
//!   - Baseline (mm): f32
//!   - Field of view (degrees): f32
//!   - Image width: u32
//!   - Image height: u32
//!   - Column group: u32
//!   - Max disparity: u32
//!   - Range bin (mm): f32
//!   - Entry count: u32
//! - Entries, group major:
//!   - Start bin: u32
//!   - Bin count: u32
//!   - Probabilities: bin count × f32

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::sensor::{RangeDistribution, RayModelLookup, StereoCalibration};

/// Magic bytes for ray model files
const MAGIC: &[u8; 4] = b"DRAY";

/// Current format version
const VERSION: u8 = 1;

/// Header size in bytes
const HEADER_SIZE: usize = 40;

/// Upper bound on bins per entry accepted when reading
const MAX_BINS: u32 = 1 << 20;

/// Error type for artifact I/O
#[derive(Error, Debug)]
pub enum IoError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Version mismatch
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected format version
        expected: u8,
        /// Found format version
        found: u8,
    },
}

/// Save a ray model to a file
pub fn save_ray_model(lookup: &RayModelLookup, path: &Path) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ray_model(lookup, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a ray model to a writer
pub fn write_ray_model<W: Write>(lookup: &RayModelLookup, writer: &mut W) -> Result<(), IoError> {
    let calibration = lookup.calibration();
    let mut header = [0u8; HEADER_SIZE];

    header[0..4].copy_from_slice(MAGIC);
    header[4] = VERSION;
    // 5..8 reserved
    header[8..12].copy_from_slice(&calibration.baseline_mm.to_le_bytes());
    header[12..16].copy_from_slice(&calibration.fov_degrees.to_le_bytes());
    header[16..20].copy_from_slice(&(calibration.image_width as u32).to_le_bytes());
    header[20..24].copy_from_slice(&(calibration.image_height as u32).to_le_bytes());
    header[24..28].copy_from_slice(&lookup.column_group().to_le_bytes());
    header[28..32].copy_from_slice(&lookup.max_disparity().to_le_bytes());
    header[32..36].copy_from_slice(&lookup.bin_mm().to_le_bytes());
    header[36..40].copy_from_slice(&(lookup.entries().len() as u32).to_le_bytes());
    writer.write_all(&header)?;

    for entry in lookup.entries() {
        writer.write_all(&entry.start_bin.to_le_bytes())?;
        writer.write_all(&(entry.probabilities.len() as u32).to_le_bytes())?;
        for p in &entry.probabilities {
            writer.write_all(&p.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Load a ray model from a file
pub fn load_ray_model(path: &Path) -> Result<RayModelLookup, IoError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_ray_model(&mut reader)
}

/// Read a ray model from a reader
pub fn read_ray_model<R: Read>(reader: &mut R) -> Result<RayModelLookup, IoError> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    if &header[0..4] != MAGIC {
        return Err(IoError::InvalidFormat("Invalid magic bytes".to_string()));
    }
    let version = header[4];
    if version != VERSION {
        return Err(IoError::VersionMismatch {
            expected: VERSION,
            found: version,
        });
    }

    let f32_at = |i: usize| f32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);
    let u32_at = |i: usize| u32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);

    let calibration = StereoCalibration {
        baseline_mm: f32_at(8),
        fov_degrees: f32_at(12),
        image_width: u32_at(16) as usize,
        image_height: u32_at(20) as usize,
    };
    if !calibration.is_valid() {
        return Err(IoError::InvalidFormat("Invalid calibration".to_string()));
    }
    let column_group = u32_at(24);
    let max_disparity = u32_at(28);
    let bin_mm = f32_at(32);
    let count = u32_at(36);

    let expected = RayModelLookup::entry_count(calibration.image_width, column_group, max_disparity)
        .ok_or_else(|| IoError::InvalidFormat("Invalid ray model layout".to_string()))?;
    if count as usize != expected {
        return Err(IoError::InvalidFormat(format!(
            "Header declares {} entries, layout needs {}",
            count, expected
        )));
    }

    let mut entries = Vec::with_capacity(expected);
    for _ in 0..count {
        let start_bin = read_u32(reader)?;
        let bins = read_u32(reader)?;
        if bins > MAX_BINS {
            return Err(IoError::InvalidFormat(format!("Entry with {} bins", bins)));
        }
        let mut raw = vec![0u8; bins as usize * 4];
        reader.read_exact(&mut raw)?;
        let probabilities = raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        entries.push(RangeDistribution {
            start_bin,
            probabilities,
        });
    }

    RayModelLookup::from_parts(calibration, column_group, max_disparity, bin_mm, entries)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, IoError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorModelConfig;

    fn lookup() -> RayModelLookup {
        let calibration = StereoCalibration {
            baseline_mm: 80.0,
            fov_degrees: 70.0,
            image_width: 32,
            image_height: 24,
        };
        let config = SensorModelConfig {
            max_disparity: 8,
            column_group: 8,
            ..Default::default()
        };
        RayModelLookup::build(&calibration, &config)
    }

    #[test]
    fn test_roundtrip_in_memory() {
        let original = lookup();
        let mut buf = Vec::new();
        write_ray_model(&original, &mut buf).unwrap();
        assert_eq!(&buf[0..4], b"DRAY");

        let loaded = read_ray_model(&mut buf.as_slice()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = Vec::new();
        write_ray_model(&lookup(), &mut buf).unwrap();
        buf[0] = b'X';
        assert!(matches!(
            read_ray_model(&mut buf.as_slice()),
            Err(IoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let mut buf = Vec::new();
        write_ray_model(&lookup(), &mut buf).unwrap();
        buf[4] = 9;
        assert!(matches!(
            read_ray_model(&mut buf.as_slice()),
            Err(IoError::VersionMismatch {
                expected: 1,
                found: 9
            })
        ));
    }

    #[test]
    fn test_truncated() {
        let mut buf = Vec::new();
        write_ray_model(&lookup(), &mut buf).unwrap();
        buf.truncate(buf.len() - 3);
        assert!(matches!(
            read_ray_model(&mut buf.as_slice()),
            Err(IoError::Io(_))
        ));
    }

    #[test]
    fn test_oversized_layout_rejected() {
        let mut buf = Vec::new();
        write_ray_model(&lookup(), &mut buf).unwrap();
        buf.truncate(HEADER_SIZE);
        buf[16..20].copy_from_slice(&65_536u32.to_le_bytes());
        buf[24..28].copy_from_slice(&1u32.to_le_bytes());
        buf[28..32].copy_from_slice(&65_536u32.to_le_bytes());
        buf[36..40].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            read_ray_model(&mut buf.as_slice()),
            Err(IoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_entry_count_mismatch() {
        let mut buf = Vec::new();
        write_ray_model(&lookup(), &mut buf).unwrap();
        // 4 groups x 8 disparities, header claims one fewer
        buf[36..40].copy_from_slice(&31u32.to_le_bytes());
        assert!(matches!(
            read_ray_model(&mut buf.as_slice()),
            Err(IoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_entry_count_overflow() {
        assert_eq!(RayModelLookup::entry_count(32, 8, 8), Some(32));
        assert_eq!(RayModelLookup::entry_count(32, 0, 8), None);
        assert_eq!(
            RayModelLookup::entry_count(65_536, 1, 65_536),
            usize::try_from(1u64 << 32).ok()
        );
    }
}
