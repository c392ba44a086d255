//! Reading and writing SSZ files, snappy compressed when the extension is ``.ssz_snappy``.

use std::{fs, path::Path};

use anyhow::Context;
use snap::raw::{Decoder, Encoder};

const SNAPPY_EXTENSION: &str = "ssz_snappy";

fn is_snappy(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == SNAPPY_EXTENSION)
}

pub fn read_ssz_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("Unable to read {}", path.display()))?;
    if !is_snappy(path) {
        return Ok(bytes);
    }
    // Files are unframed, as in the consensus test vectors
    Decoder::new()
        .decompress_vec(&bytes)
        .with_context(|| format!("Error decoding snappy encoding for {}", path.display()))
}

pub fn write_ssz_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let contents = if is_snappy(path) {
        Encoder::new()
            .compress_vec(bytes)
            .with_context(|| format!("Error snappy encoding {}", path.display()))?
    } else {
        bytes.to_vec()
    };
    fs::write(path, contents).with_context(|| format!("Unable to write {}", path.display()))
}
