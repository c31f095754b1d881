use super::canonical::canonical_gid;
use super::lineage::{Lineage, LineageTable};
use crate::error::{DecorateError, Result};
use crate::utils::input::open_text_reader;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

/// Loads a GTDB taxonomy file (`genome<TAB>d__;p__;...;s__`), keeping only
/// genomes in `limit_to`. Keys are canonicalised first when `canonicalize`
/// is set, so `limit_to` must then hold canonical ids too.
pub fn load_taxonomy_file(
    path: &Path,
    limit_to: &HashSet<String>,
    canonicalize: bool,
) -> Result<LineageTable> {
    let reader = open_text_reader(path)?;
    read_taxonomy(reader, limit_to, canonicalize).map_err(|e| match e {
        DecorateError::Io { source, .. } => DecorateError::io(path, source),
        other => other,
    })
}

pub fn read_taxonomy<R: BufRead>(
    reader: R,
    limit_to: &HashSet<String>,
    canonicalize: bool,
) -> Result<LineageTable> {
    let mut out = LineageTable::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| DecorateError::io("<taxonomy>", e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (gid, taxonomy) = line
            .split_once('\t')
            .ok_or_else(|| DecorateError::InvalidTaxonomy {
                line: line_no,
                reason: "expected a tab between genome id and taxonomy".to_string(),
            })?;

        let gid = if canonicalize {
            canonical_gid(gid.trim())
        } else {
            gid.trim().to_string()
        };
        if !limit_to.contains(&gid) {
            continue;
        }
        if out.contains(&gid) {
            return Err(DecorateError::DuplicateGenome { genome: gid });
        }

        let lineage = Lineage::parse(taxonomy).map_err(|reason| DecorateError::InvalidTaxonomy {
            line: line_no,
            reason: format!("{} ({})", reason, gid),
        })?;
        out.insert(gid, lineage);
    }

    Ok(out)
}
