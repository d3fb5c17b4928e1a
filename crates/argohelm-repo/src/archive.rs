//! Chart archive extraction

use flate2::read::GzDecoder;
use std::path::Path;
use tar::Archive;

use crate::error::Result;

/// Extract a chart archive (tar.gz) into `dest`
///
/// Helm archives hold a single `<chart>/` top-level directory, so the chart
/// lands in `dest/<chart>`.
pub fn extract_chart_archive(data: &[u8], dest: &Path) -> Result<()> {
    let gz = GzDecoder::new(std::io::Cursor::new(data));
    let mut archive = Archive::new(gz);

    std::fs::create_dir_all(dest)?;
    archive.unpack(dest)?;

    Ok(())
}
