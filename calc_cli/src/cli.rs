//! CLI definition using clap

use std::fmt;
use std::path::PathBuf;

use calc_core::catalog::{FormulaKind, NodePatch, Selection};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Formula kind as typed on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    #[value(name = "length-based", alias = "length")]
    LengthBased,
    #[value(name = "volume-based", alias = "volume")]
    VolumeBased,
}

impl From<KindArg> for FormulaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::LengthBased => FormulaKind::LengthBased,
            KindArg::VolumeBased => FormulaKind::VolumeBased,
        }
    }
}

#[derive(Parser)]
#[command(name = "matcalc")]
#[command(version)]
#[command(about = "Material catalog and weight/cost calculator")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Catalog file, or ":memory:" for a throwaway catalog. Uses config value if not specified.
    #[arg(long, short = 's', global = true)]
    pub store: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Path to a catalog node: material, then optional variant and sub-variant
#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// Material id
    pub material: String,

    /// Variant id
    pub variant: Option<String>,

    /// Sub-variant id
    pub sub_variant: Option<String>,
}

impl NodeArgs {
    pub fn selection(&self) -> Selection {
        let mut selection = Selection::material(&self.material);
        if let Some(variant) = &self.variant {
            selection = selection.variant(variant);
        }
        if let Some(sub_variant) = &self.sub_variant {
            selection = selection.sub_variant(sub_variant);
        }
        selection
    }
}

/// A leaf coefficient given on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct CoefficientArgs {
    /// Weight per meter in kg/m (length-based)
    #[arg(long = "weight-per-meter", value_name = "KG_PER_M")]
    pub weight_per_meter: Option<f64>,

    /// Density in g/cm³ (volume-based)
    #[arg(long, value_name = "G_PER_CM3")]
    pub density: Option<f64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List materials
    List,

    /// Show one material, variant, or sub-variant
    Show {
        #[command(flatten)]
        node: NodeArgs,
    },

    /// Print the whole catalog as a tree
    Tree,

    /// List the variants of a material
    Variants {
        /// Material id
        material: String,
    },

    /// List the sub-variants of a variant
    SubVariants {
        /// Material id
        material: String,

        /// Variant id
        variant: String,
    },

    /// Create a material. Flags create a leaf material; use --from for one with variants.
    Add {
        /// JSON file holding a full material spec (with variants)
        #[arg(long, conflicts_with_all = ["name", "kind", "weight_per_meter", "density"])]
        from: Option<PathBuf>,

        /// Material name
        #[arg(long, required_unless_present = "from")]
        name: Option<String>,

        /// Formula kind
        #[arg(long, value_enum, required_unless_present = "from")]
        kind: Option<KindArg>,

        #[command(flatten)]
        coefficient: CoefficientArgs,
    },

    /// Add a variant to an existing material
    AddVariant {
        /// Material id
        material: String,

        /// Variant name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        coefficient: CoefficientArgs,
    },

    /// Add a sub-variant to an existing variant
    AddSubVariant {
        /// Material id
        material: String,

        /// Variant id
        variant: String,

        /// Sub-variant name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        coefficient: CoefficientArgs,
    },

    /// Rename a node or change its coefficient
    Update {
        #[command(flatten)]
        node: NodeArgs,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        coefficient: CoefficientArgs,
    },

    /// Delete a node and everything under it
    Delete {
        #[command(flatten)]
        node: NodeArgs,

        /// Succeed if the node does not exist
        #[arg(long)]
        ignore_missing: bool,
    },

    /// Calculate weight and cost for a leaf
    Calc {
        #[command(flatten)]
        node: NodeArgs,

        /// Length of one piece in meters
        #[arg(long, short = 'l')]
        length: Option<String>,

        /// Width in millimeters (volume-based)
        #[arg(long, short = 'w')]
        width: Option<String>,

        /// Thickness in millimeters (volume-based)
        #[arg(long, short = 't')]
        thickness: Option<String>,

        /// Number of pieces (default 1)
        #[arg(long, short = 'q')]
        quantity: Option<String>,

        /// Price per kg (default 0)
        #[arg(long, short = 'r')]
        rate: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// store_path, output_format, currency_symbol, or user_id
        key: String,

        /// New value ("" clears optional values)
        value: String,
    },

    /// Print the config file path
    Path,
}

impl Commands {
    /// Whether the command writes to the catalog
    pub fn writes(&self) -> bool {
        matches!(
            self,
            Commands::Add { .. }
                | Commands::AddVariant { .. }
                | Commands::AddSubVariant { .. }
                | Commands::Update { .. }
                | Commands::Delete { .. }
        )
    }
}

/// Build a patch from the update flags
pub fn patch_from(name: Option<String>, coefficient: &CoefficientArgs) -> NodePatch {
    NodePatch {
        name,
        weight_per_unit_length: coefficient.weight_per_meter,
        density: coefficient.density,
    }
}
