/// Canonical form of an NCBI genome accession.
///
/// `GCF_005435135.1`, `RS_GCF_005435135.1`, `GB_GCA_005435135.1` and
/// `GCF_005435135.1_ASM543513v1_genomic` all become `G005435135`. Ids
/// starting with `U` (user genomes) are returned unchanged.
pub fn canonical_gid(gid: &str) -> String {
    if gid.starts_with('U') {
        return gid.to_string();
    }

    let gid = gid
        .replace("RS_", "")
        .replace("GB_", "")
        .replace("GCA_", "G")
        .replace("GCF_", "G");

    match gid.find('.') {
        Some(dot) => gid[..dot].to_string(),
        None => gid,
    }
}
