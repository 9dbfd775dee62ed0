//! Command handlers

use std::path::Path;

use anyhow::{bail, Context, Result};
use calc_core::calculations::{calculate_raw, RawWeightInput};
use calc_core::catalog::{CatalogRepository, MaterialSpec, SubVariantSpec, VariantSpec};
use calc_core::store::{DocumentStore, JsonFileStore, MemoryStore};
use tracing::{debug, info};

use crate::cli::{patch_from, Cli, CoefficientArgs, Commands, ConfigAction, NodeArgs, OutputFormat};
use crate::config::Config;
use crate::output::{
    output_material, output_materials, output_result, output_sub_variant, output_sub_variants, output_tree,
    output_variant, output_variants, output_written,
};

/// `--store` value selecting a throwaway in-memory catalog
pub const MEMORY_STORE: &str = ":memory:";

type Repository = CatalogRepository<Box<dyn DocumentStore>>;

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    if let Commands::Config { action } = &cli.command {
        return cmd_config(&mut config, action);
    }

    if let Some(ref store) = cli.store {
        config.store_path = Some(store.clone());
    }
    let format = cli.format.unwrap_or(config.output_format);
    let mut repo = open_repository(&config, cli.command.writes())?;

    run(&mut repo, &cli.command, format, &config.currency_symbol)
}

/// Open the configured catalog. Read-only unless the command writes.
fn open_repository(config: &Config, writable: bool) -> Result<Repository> {
    let path = config.store_path()?;
    if path == Path::new(MEMORY_STORE) {
        debug!("using in-memory store");
        return Ok(CatalogRepository::new(Box::new(MemoryStore::new())));
    }
    Ok(CatalogRepository::new(open_file_store(&path, &config.user_id(), writable)?))
}

fn open_file_store(path: &Path, user_id: &str, writable: bool) -> Result<Box<dyn DocumentStore>> {
    let store = if writable {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        JsonFileStore::open(path, user_id)
    } else {
        JsonFileStore::open_read_only(path)
    }
    .with_context(|| format!("Failed to open catalog {}", path.display()))?;

    debug!(path = %path.display(), writable, "opened catalog file");
    Ok(Box::new(store))
}

/// Run a catalog command against an open repository
pub fn run<S: DocumentStore>(
    repo: &mut CatalogRepository<S>,
    command: &Commands,
    format: OutputFormat,
    currency: &str,
) -> Result<()> {
    match command {
        Commands::List => output_materials(format, &repo.list_materials()?),

        Commands::Show { node } => cmd_show(repo, node, format),

        Commands::Tree => output_tree(format, &repo.load_catalog()?),

        Commands::Variants { material } => output_variants(format, &repo.list_variants(material)?),

        Commands::SubVariants { material, variant } => {
            output_sub_variants(format, &repo.list_sub_variants(material, variant)?)
        }

        Commands::Add {
            from,
            name,
            kind,
            coefficient,
        } => {
            let spec = match from {
                Some(path) => read_spec(path)?,
                None => {
                    let name = name.clone().unwrap_or_default();
                    let kind = (*kind).context("--kind is required without --from")?;
                    MaterialSpec {
                        weight_per_unit_length: coefficient.weight_per_meter,
                        density: coefficient.density,
                        ..MaterialSpec::new(name, kind.into())
                    }
                }
            };
            let id = repo.create_material(&spec)?;
            output_written(format, "created material", &id)
        }

        Commands::AddVariant {
            material,
            name,
            coefficient,
        } => {
            let spec = variant_spec(name, coefficient);
            let id = repo.add_variant(material, &spec)?;
            output_written(format, "created variant", &id)
        }

        Commands::AddSubVariant {
            material,
            variant,
            name,
            coefficient,
        } => {
            let spec = sub_variant_spec(name, coefficient);
            let id = repo.add_sub_variant(material, variant, &spec)?;
            output_written(format, "created sub-variant", &id)
        }

        Commands::Update { node, name, coefficient } => {
            let patch = patch_from(name.clone(), coefficient);
            match (&node.variant, &node.sub_variant) {
                (None, None) => output_material(format, &repo.update_material(&node.material, &patch)?),
                (Some(v), None) => output_variant(format, &repo.update_variant(&node.material, v, &patch)?),
                (Some(v), Some(s)) => {
                    output_sub_variant(format, &repo.update_sub_variant(&node.material, v, s, &patch)?)
                }
                (None, Some(_)) => bail!("A sub-variant id needs its variant id"),
            }
        }

        Commands::Delete { node, ignore_missing } => {
            let deleted = match (&node.variant, &node.sub_variant) {
                (None, None) => repo.delete_material(&node.material),
                (Some(v), None) => repo.delete_variant(&node.material, v),
                (Some(v), Some(s)) => repo.delete_sub_variant(&node.material, v, s),
                (None, Some(_)) => bail!("A sub-variant id needs its variant id"),
            };
            match deleted {
                Err(e) if *ignore_missing && e.is_not_found() => {
                    info!(error = %e, "nothing to delete");
                    output_written(format, "already absent", &node_label(node))
                }
                other => {
                    other?;
                    output_written(format, "deleted", &node_label(node))
                }
            }
        }

        Commands::Calc {
            node,
            length,
            width,
            thickness,
            quantity,
            rate,
        } => {
            let leaf = repo.resolve_leaf(&node.selection())?;
            let raw = RawWeightInput {
                length_m: length.clone().unwrap_or_default(),
                width_mm: width.clone().unwrap_or_default(),
                thickness_mm: thickness.clone().unwrap_or_default(),
                quantity: quantity.clone().unwrap_or_default(),
                rate_per_kg: rate.clone().unwrap_or_default(),
            };
            let result = calculate_raw(&leaf, &raw)?;
            output_result(format, &result, currency)
        }

        Commands::Config { .. } => Ok(()),
    }
}

fn cmd_show<S: DocumentStore>(repo: &CatalogRepository<S>, node: &NodeArgs, format: OutputFormat) -> Result<()> {
    match (&node.variant, &node.sub_variant) {
        (None, None) => output_material(format, &repo.get_material(&node.material)?),
        (Some(v), None) => output_variant(format, &repo.get_variant(&node.material, v)?),
        (Some(v), Some(s)) => output_sub_variant(format, &repo.get_sub_variant(&node.material, v, s)?),
        (None, Some(_)) => bail!("A sub-variant id needs its variant id"),
    }
}

fn cmd_config(config: &mut Config, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{config}");
        }
        ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            config.save()?;
            println!("Set {key}.");
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

fn read_spec(path: &Path) -> Result<MaterialSpec> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let spec = serde_json::from_str(&content).with_context(|| format!("Invalid material spec {}", path.display()))?;
    Ok(spec)
}

fn variant_spec(name: &str, coefficient: &CoefficientArgs) -> VariantSpec {
    VariantSpec {
        weight_per_unit_length: coefficient.weight_per_meter,
        density: coefficient.density,
        ..VariantSpec::new(name)
    }
}

fn sub_variant_spec(name: &str, coefficient: &CoefficientArgs) -> SubVariantSpec {
    SubVariantSpec {
        weight_per_unit_length: coefficient.weight_per_meter,
        density: coefficient.density,
        ..SubVariantSpec::new(name)
    }
}

fn node_label(node: &NodeArgs) -> String {
    [Some(&node.material), node.variant.as_ref(), node.sub_variant.as_ref()]
        .into_iter()
        .flatten()
        .cloned()
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_core::catalog::{FormulaKind, Selection};
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Commands {
        let mut full = vec!["matcalc"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap().command
    }

    fn memory_repo() -> CatalogRepository<MemoryStore> {
        CatalogRepository::new(MemoryStore::new())
    }

    #[test]
    fn test_add_then_calc() {
        let mut repo = memory_repo();
        let add = parse(&["add", "--name", "MS Flat", "--kind", "length-based", "--weight-per-meter", "2.5"]);
        run(&mut repo, &add, OutputFormat::Json, "₹").unwrap();

        let id = repo.list_materials().unwrap()[0].id.clone();
        let calc = parse(&["calc", &id, "-l", "4", "-q", "3", "-r", "100"]);
        run(&mut repo, &calc, OutputFormat::Table, "₹").unwrap();

        let bad = parse(&["calc", &id, "-l", "4", "-q", "0"]);
        assert!(run(&mut repo, &bad, OutputFormat::Table, "₹").is_err());
    }

    #[test]
    fn test_add_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipe.json");
        std::fs::write(
            &path,
            r#"{
                "name": "GI Pipe",
                "formula_kind": "length-based",
                "has_variants": true,
                "has_sub_variants": true,
                "variants": [
                    { "name": "25 NB", "sub_variants": [ { "name": "Medium", "weight_per_unit_length": 2.41 } ] }
                ]
            }"#,
        )
        .unwrap();

        let mut repo = memory_repo();
        let add = parse(&["add", "--from", path.to_str().unwrap()]);
        run(&mut repo, &add, OutputFormat::Table, "₹").unwrap();

        let catalog = repo.load_catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].material.formula_kind, FormulaKind::LengthBased);
        assert_eq!(catalog[0].variants[0].sub_variants[0].name, "Medium");
    }

    #[test]
    fn test_variant_commands_and_cascade_delete() {
        let mut repo = memory_repo();
        let id = repo
            .create_material(
                &MaterialSpec::new("Aluminium Plate", FormulaKind::VolumeBased)
                    .with_variant(VariantSpec::new("6061").with_density(2.7)),
            )
            .unwrap();

        let add = parse(&["add-variant", &id, "--name", "5083", "--density", "2.66"]);
        run(&mut repo, &add, OutputFormat::Table, "₹").unwrap();
        assert_eq!(repo.list_variants(&id).unwrap().len(), 2);

        let variant_id = repo.list_variants(&id).unwrap()[1].id.clone();
        let rename = parse(&["update", &id, &variant_id, "--name", "5083-H111"]);
        run(&mut repo, &rename, OutputFormat::Table, "₹").unwrap();
        assert_eq!(repo.get_variant(&id, &variant_id).unwrap().name, "5083-H111");

        let leaf = repo
            .resolve_leaf(&Selection::material(&id).variant(&variant_id))
            .unwrap();
        assert_eq!(leaf.coefficient.value(), 2.66);

        let delete = parse(&["delete", &id]);
        run(&mut repo, &delete, OutputFormat::Table, "₹").unwrap();
        assert_eq!(repo.store().document_count(), 0);
    }

    #[test]
    fn test_delete_ignore_missing() {
        let mut repo = memory_repo();
        assert!(run(&mut repo, &parse(&["delete", "nope"]), OutputFormat::Table, "₹").is_err());
        run(&mut repo, &parse(&["delete", "nope", "--ignore-missing"]), OutputFormat::Table, "₹").unwrap();
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("catalog.json");

        {
            let mut repo = CatalogRepository::new(open_file_store(&path, "tester", true).unwrap());
            let add = parse(&["add", "--name", "Brass Rod", "--kind", "volume", "--density", "8.5"]);
            run(&mut repo, &add, OutputFormat::Json, "₹").unwrap();
        }

        let repo = CatalogRepository::new(open_file_store(&path, "tester", false).unwrap());
        let materials = repo.list_materials().unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].name, "Brass Rod");
    }

    #[test]
    fn test_read_only_store_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let mut repo = CatalogRepository::new(open_file_store(&path, "tester", false).unwrap());
        let add = parse(&["add", "--name", "Copper", "--kind", "volume", "--density", "8.96"]);
        assert!(run(&mut repo, &add, OutputFormat::Table, "₹").is_err());
    }

    #[test]
    fn test_node_label() {
        let node = NodeArgs {
            material: "m".into(),
            variant: Some("v".into()),
            sub_variant: None,
        };
        assert_eq!(node_label(&node), "m/v");
    }
}
