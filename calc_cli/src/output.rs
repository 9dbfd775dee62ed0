//! Output formatting module

use anyhow::Result;
use calc_core::calculations::WeightResult;
use calc_core::catalog::{CatalogEntry, Hierarchy, Material, MaterialSummary, SubVariant, Variant};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Print any value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn tier_label(hierarchy: &Hierarchy) -> &'static str {
    match hierarchy {
        Hierarchy::Leaf { .. } => "leaf",
        Hierarchy::Variants => "variants",
        Hierarchy::SubVariants => "sub-variants",
    }
}

pub fn output_materials(format: OutputFormat, materials: &[MaterialSummary]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(materials);
    }
    if materials.is_empty() {
        println!("No materials.");
        return Ok(());
    }

    println!("{:<34} {:<24} {:<14} {}", "ID", "NAME", "KIND", "TIERS");
    for m in materials {
        let tiers = match (m.has_variants, m.has_sub_variants) {
            (false, _) => "leaf",
            (true, false) => "variants",
            (true, true) => "sub-variants",
        };
        println!("{:<34} {:<24} {:<14} {}", m.id, m.name, m.formula_kind, tiers);
    }
    Ok(())
}

pub fn output_material(format: OutputFormat, material: &Material) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(material);
    }
    println!("\nMaterial");
    println!("========");
    println!("ID:          {}", material.id);
    println!("Name:        {}", material.name);
    println!("Kind:        {}", material.formula_kind);
    println!("Tiers:       {}", tier_label(&material.hierarchy));
    if let Some(coefficient) = material.coefficient() {
        println!("Coefficient: {}", coefficient);
    }
    Ok(())
}

pub fn output_variant(format: OutputFormat, variant: &Variant) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(variant);
    }
    println!("\nVariant");
    println!("=======");
    println!("ID:          {}", variant.id);
    println!("Material:    {}", variant.material_id);
    println!("Name:        {}", variant.name);
    match &variant.coefficient {
        Some(coefficient) => println!("Coefficient: {}", coefficient),
        None => println!("Coefficient: (per sub-variant)"),
    }
    Ok(())
}

pub fn output_sub_variant(format: OutputFormat, sub_variant: &SubVariant) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(sub_variant);
    }
    println!("\nSub-variant");
    println!("===========");
    println!("ID:          {}", sub_variant.id);
    println!("Material:    {}", sub_variant.material_id);
    println!("Variant:     {}", sub_variant.variant_id);
    println!("Name:        {}", sub_variant.name);
    println!("Coefficient: {}", sub_variant.coefficient);
    Ok(())
}

pub fn output_variants(format: OutputFormat, variants: &[Variant]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(variants);
    }
    if variants.is_empty() {
        println!("No variants.");
        return Ok(());
    }
    println!("{:<34} {:<24} {}", "ID", "NAME", "COEFFICIENT");
    for v in variants {
        let coefficient = v
            .coefficient
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        println!("{:<34} {:<24} {}", v.id, v.name, coefficient);
    }
    Ok(())
}

pub fn output_sub_variants(format: OutputFormat, sub_variants: &[SubVariant]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(sub_variants);
    }
    if sub_variants.is_empty() {
        println!("No sub-variants.");
        return Ok(());
    }
    println!("{:<34} {:<24} {}", "ID", "NAME", "COEFFICIENT");
    for s in sub_variants {
        println!("{:<34} {:<24} {}", s.id, s.name, s.coefficient);
    }
    Ok(())
}

pub fn output_tree(format: OutputFormat, catalog: &[CatalogEntry]) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(catalog);
    }
    if catalog.is_empty() {
        println!("No materials.");
        return Ok(());
    }

    for entry in catalog {
        let m = &entry.material;
        match m.coefficient() {
            Some(c) => println!("{} ({}, {}) [{}]", m.name, m.formula_kind, c, m.id),
            None => println!("{} ({}) [{}]", m.name, m.formula_kind, m.id),
        }

        let last_variant = entry.variants.len().saturating_sub(1);
        for (i, v) in entry.variants.iter().enumerate() {
            let (branch, stem) = if i == last_variant { ("└──", "    ") } else { ("├──", "│   ") };
            match &v.variant.coefficient {
                Some(c) => println!("{branch} {} ({}) [{}]", v.variant.name, c, v.variant.id),
                None => println!("{branch} {} [{}]", v.variant.name, v.variant.id),
            }

            let last_sub = v.sub_variants.len().saturating_sub(1);
            for (j, s) in v.sub_variants.iter().enumerate() {
                let twig = if j == last_sub { "└──" } else { "├──" };
                println!("{stem}{twig} {} ({}) [{}]", s.name, s.coefficient, s.id);
            }
        }
    }
    Ok(())
}

pub fn output_result(format: OutputFormat, result: &WeightResult, currency: &str) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(result);
    }
    let shown = result.rounded();
    println!("\nCalculation Result");
    println!("==================");
    println!("Material:        {}", shown.leaf_name);
    println!("Formula:         {}", shown.formula_kind);
    if let Some(volume) = shown.volume_per_unit_cm3 {
        println!("Volume / piece:  {:.2} cm³", volume);
    }
    println!("Weight / piece:  {:.2} kg", shown.weight_per_unit_kg);
    println!("Quantity:        {}", shown.quantity);
    println!("Rate:            {}{:.2} / kg", currency, shown.rate_per_kg);
    println!("------------------");
    println!("{}", result.summary(currency));
    Ok(())
}

/// Confirmation after a write
pub fn output_written(format: OutputFormat, action: &str, id: &str) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({ "action": action, "id": id }));
    }
    println!("{action}: {id}");
    Ok(())
}
