use crate::annotate::Decoration;
use crate::error::{DecorateError, Result};
use crate::taxonomy::{LineageTable, TaxonRank};
use crate::tree::{write_newick, LabelStyle, Tree};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const STRIP_FILE: &str = "itol_dataset_strip_phylum.txt";
pub const LABELS_FILE: &str = "itol_labels.txt";
pub const TREE_COLOURS_FILE: &str = "itol_tree_colours.txt";
pub const POPUP_FILE: &str = "itol_popup.txt";

pub fn collapse_file_name(rank: TaxonRank) -> String {
    format!("itol_collapse_{}.txt", rank.name())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItolOptions {
    pub strip_width: u32,
    pub collapse_ranks: Vec<TaxonRank>,
}

impl Default for ItolOptions {
    fn default() -> Self {
        Self {
            strip_width: 100,
            collapse_ranks: vec![
                TaxonRank::Phylum,
                TaxonRank::Class,
                TaxonRank::Order,
                TaxonRank::Family,
                TaxonRank::Genus,
            ],
        }
    }
}

/// Colour strip with one block per phylum LCA, in the phylum's base colour.
pub fn write_color_strip<W: Write>(out: &mut W, decoration: &Decoration, strip_width: u32) -> io::Result<()> {
    writeln!(out, "DATASET_COLORSTRIP")?;
    writeln!(out, "SEPARATOR TAB")?;
    writeln!(out, "DATASET_LABEL\tPhylum Labels")?;
    writeln!(out, "COLOR\t#000000")?;
    writeln!(out, "STRIP_WIDTH\t{}", strip_width)?;
    writeln!(out, "SHOW_INTERNAL\t1")?;
    writeln!(out, "DATA")?;

    let records = &decoration.records;
    for (phylum, references) in &records.phylum_lca {
        let Some(colour) = records.palette.base(phylum) else {
            continue;
        };
        for reference in references {
            writeln!(out, "{}\t{}\t{}", reference, colour, phylum)?;
        }
    }
    Ok(())
}

pub fn write_internal_labels<W: Write>(out: &mut W, decoration: &Decoration) -> io::Result<()> {
    writeln!(out, "LABELS")?;
    writeln!(out, "SEPARATOR TAB")?;
    writeln!(out, "DATA")?;
    for (label, group) in &decoration.records.internal_labels {
        for reference in &group.references {
            writeln!(out, "{}\t{}", reference, label)?;
        }
    }
    Ok(())
}

pub fn write_tree_colours<W: Write>(out: &mut W, decoration: &Decoration) -> io::Result<()> {
    writeln!(out, "TREE_COLORS")?;
    writeln!(out, "SEPARATOR TAB")?;
    writeln!(out, "DATA")?;
    for colour in &decoration.records.node_colours {
        writeln!(out, "{}\trange\t{}\t{}", colour.reference, colour.colour, colour.label)?;
    }
    Ok(())
}

pub fn write_collapse<W: Write>(out: &mut W, decoration: &Decoration, rank: TaxonRank) -> io::Result<()> {
    writeln!(out, "COLLAPSE")?;
    writeln!(out, "DATA")?;
    for reference in decoration.records.collapse_groups(rank) {
        writeln!(out, "{}", reference)?;
    }
    Ok(())
}

/// Popup card per leaf: genome id, branch length and full lineage.
pub fn write_popup<W: Write>(out: &mut W, tree: &Tree, lineages: &LineageTable) -> io::Result<()> {
    writeln!(out, "POPUP_INFO")?;
    writeln!(out, "SEPARATOR TAB")?;
    writeln!(out, "DATA")?;
    for leaf in tree.leaves() {
        let node = tree.node(leaf);
        let Some(gid) = node.genome_id() else {
            continue;
        };
        let Some(lineage) = lineages.get(gid) else {
            continue;
        };
        let branch_length = node
            .edge_length()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "NA".to_string());

        let mut content = format!("<b>Genome ID</b>: {}<br><b>Branch Length</b>: {}", gid, branch_length);
        for (rank, name) in lineage.iter() {
            let rank = rank.name();
            content.push_str(&format!(
                "<br><b>{}{}</b>: {}",
                rank[..1].to_ascii_uppercase(),
                &rank[1..],
                name
            ));
        }
        writeln!(out, "{}\t{}\t{}", gid, lineage.species(), content)?;
    }
    Ok(())
}

fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>) -> Result<()> {
    let file = File::create(path).map_err(|e| DecorateError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| DecorateError::io(path, e))
}

/// Writes every iTOL dataset plus the stripped tree into `out_dir`, returning
/// the paths written.
pub fn write_itol_files(
    out_dir: &Path,
    tree_name: &str,
    tree: &Tree,
    lineages: &LineageTable,
    decoration: &Decoration,
    options: &ItolOptions,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir).map_err(|e| DecorateError::io(out_dir, e))?;
    let mut written = Vec::new();

    let path = out_dir.join(STRIP_FILE);
    write_file(&path, |w| write_color_strip(w, decoration, options.strip_width))?;
    written.push(path);

    let path = out_dir.join(format!("{}_stripped", tree_name));
    write_file(&path, |w| writeln!(w, "{}", write_newick(tree, LabelStyle::SupportOnly)))?;
    written.push(path);

    let path = out_dir.join(LABELS_FILE);
    write_file(&path, |w| write_internal_labels(w, decoration))?;
    written.push(path);

    let path = out_dir.join(TREE_COLOURS_FILE);
    write_file(&path, |w| write_tree_colours(w, decoration))?;
    written.push(path);

    let path = out_dir.join(POPUP_FILE);
    write_file(&path, |w| write_popup(w, tree, lineages))?;
    written.push(path);

    for rank in &options.collapse_ranks {
        let path = out_dir.join(collapse_file_name(*rank));
        write_file(&path, |w| write_collapse(w, decoration, *rank))?;
        written.push(path);
    }

    for path in &written {
        tracing::debug!(path = %path.display(), "wrote iTOL file");
    }
    Ok(written)
}
