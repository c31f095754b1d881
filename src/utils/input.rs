use crate::error::{DecorateError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Opens a plain or compressed (gz, bz2, xz, zstd) text file for buffered reading.
pub fn open_text_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| DecorateError::io(path, e))?;
    let (reader, _format) =
        niffler::get_reader(Box::new(file)).map_err(|source| DecorateError::Decompress {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Box::new(BufReader::new(reader)))
}
