//! Binary PPM (P6) export for diagnostic renderings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::IoError;

/// Write an RGB buffer as a P6 image.
pub fn write_ppm<W: Write>(
    rgb: &[u8],
    width: usize,
    height: usize,
    writer: &mut W,
) -> Result<(), IoError> {
    if rgb.len() != width * height * 3 {
        return Err(IoError::InvalidFormat(format!(
            "RGB buffer of {} bytes does not match {}x{}",
            rgb.len(),
            width,
            height
        )));
    }
    write!(writer, "P6\n{} {}\n255\n", width, height)?;
    writer.write_all(rgb)?;
    Ok(())
}

/// Save an RGB buffer to a `.ppm` file.
pub fn export_ppm(rgb: &[u8], width: usize, height: usize, path: &Path) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ppm(rgb, width, height, &mut writer)?;
    writer.flush()?;
    Ok(())
}
