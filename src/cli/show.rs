//! Read-only listing subcommands over the target database.

use super::open_target;
use crate::config::Config;
use crate::db::schema::TargetSchema;
use crate::format::{OutputFormat, format_base_plans_markdown, format_projects_markdown};
use anyhow::{Result, bail};
use clap::Args;

/// Arguments for listings
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Arguments for the baselines subcommand
#[derive(Args, Debug)]
pub struct BaselinesArgs {
    /// Target project id
    pub project_id: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

pub fn run_projects(config: &Config, args: &ListArgs) -> Result<()> {
    let db = open_target(config)?;
    let projects = db.project_overviews()?;
    println!("{}", args.format.render(projects.as_slice(), format_projects_markdown)?);
    Ok(())
}

pub fn run_baselines(config: &Config, args: &BaselinesArgs) -> Result<()> {
    let db = open_target(config)?;
    let Some(plans) = db.base_plan_details(args.project_id)? else {
        bail!("Project not found: {}", args.project_id);
    };
    println!(
        "{}",
        args.format
            .render(plans.as_slice(), |p| format_base_plans_markdown(args.project_id, p))?
    );
    Ok(())
}

fn format_schema_markdown(schema: &TargetSchema) -> String {
    let mut md = String::new();
    for table in &schema.tables {
        md.push_str(&format!("## {}\n", table.name));
        for column in &table.columns {
            let mut flags = Vec::new();
            if column.primary_key {
                flags.push("pk");
            }
            if !column.nullable {
                flags.push("not null");
            }
            md.push_str(&format!("- `{}` {} {}\n", column.name, column.data_type, flags.join(", ")));
        }
        for fk in &table.foreign_keys {
            md.push_str(&format!("- fk `{}` -> {}.{}\n", fk.from_column, fk.to_table, fk.to_column));
        }
        md.push('\n');
    }
    md
}

pub fn run_schema(config: &Config, args: &ListArgs) -> Result<()> {
    let db = open_target(config)?;
    let schema = db.get_schema()?;
    println!("{}", args.format.render(&schema, format_schema_markdown)?);
    Ok(())
}
