//! In-memory gzip-compressed tar archives.

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::convert::Entry;
use crate::error::InterchangeResult;

pub const CONTENT_TYPE: &str = "application/gzip";

/// Builds a tar.gz archive with one member per entry.
///
/// The archive is finished before it is returned; a failure leaves no
/// partially written buffer behind.
pub fn build(
    entries: &[Entry],
    level: Compression,
) -> InterchangeResult<Vec<u8>> {
    let gzip = GzEncoder::new(Vec::new(), level);
    let mut archive = tar::Builder::new(gzip);

    for entry in entries.iter() {
        let mut header = tar::Header::new_gnu();
        header.set_size(entry.content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();

        archive.append_data(&mut header, &entry.name, &entry.content[..])?;
    }

    let buf = archive.into_inner()?.finish()?;
    log::debug!("archived {} entries ({} bytes)", entries.len(), buf.len());
    Ok(buf)
}
