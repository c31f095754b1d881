use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write iTOL decoration files for a GTDB tree
    Decorate {
        /// Newick tree whose leaves are genome ids (may be compressed)
        tree: PathBuf,
        /// Taxonomy file: genome id <TAB> d__;p__;c__;o__;f__;g__;s__
        taxonomy: PathBuf,
        /// Directory the iTOL files are written to
        out_dir: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the derived labels, LCAs and palette as JSON
    Summarize {
        /// Newick tree whose leaves are genome ids (may be compressed)
        tree: PathBuf,
        /// Taxonomy file: genome id <TAB> d__;p__;c__;o__;f__;g__;s__
        taxonomy: PathBuf,
        /// Output file for the JSON summary (default: stdout)
        #[arg(short = 'o', long = "output")]
        output_file: Option<PathBuf>,
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file to use instead of the user config
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Match leaves to taxonomy ids verbatim instead of by canonical accession
    #[arg(long)]
    pub raw_ids: bool,
}
