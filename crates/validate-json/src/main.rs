use anyhow::{Context, Result};
use clap::Parser;
use jsonsieve_validation::{
    metaschema, Locale, Problem, ProblemRenderer, SchemaReader, Validator,
};
use std::fs;
use std::path::PathBuf;
use std::process;

const EXIT_INVALID: i32 = 1;
const EXIT_ERROR: i32 = 2;

/// Validate JSON documents against a JSON Schema (Draft-07)
#[derive(Parser, Debug)]
#[command(name = "validate-json")]
#[command(version)]
#[command(about = "Validate JSON documents against Draft-07 schemas", long_about = None)]
struct Args {
    /// Path to the schema file; with no instance, the schema itself is
    /// validated against the Draft-07 meta-schema
    schema: PathBuf,

    /// Path to the JSON instance to validate
    instance: Option<PathBuf>,

    /// Treat unknown format attributes as errors
    #[arg(short = 'r', long)]
    strict_format: bool,

    /// Locale for problem messages (default: from the environment)
    #[arg(long, value_name = "TAG")]
    locale: Option<String>,

    /// Output problems as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_INVALID),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

/// Returns `Ok(true)` when every input validated cleanly.
fn run(args: &Args) -> Result<bool> {
    let locale = args
        .locale
        .clone()
        .map(Locale::new)
        .unwrap_or_else(Locale::from_env);
    let renderer = ProblemRenderer::new(locale.clone());

    let schema_content = fs::read_to_string(&args.schema)
        .with_context(|| format!("Failed to read schema file: {}", args.schema.display()))?;

    // The schema document is always checked against the meta-schema; a
    // schema that fails it is reported, not compiled.
    let schema_problems = Validator::new(metaschema::draft07())
        .validate_str(&schema_content)
        .with_context(|| format!("Failed to parse schema file: {}", args.schema.display()))?;
    if !schema_problems.is_empty() {
        report(&schema_problems, &renderer, &locale, args.json);
        return Ok(false);
    }

    let Some(instance_path) = &args.instance else {
        if !args.json {
            println!("✓ Schema is valid");
            println!("  Schema: {}", args.schema.display());
        } else {
            println!(r#"{{"success": true}}"#);
        }
        return Ok(true);
    };

    let schema = SchemaReader::new()
        .with_strict_format(args.strict_format)
        .read_str(&schema_content)
        .with_context(|| format!("Failed to load schema from {}", args.schema.display()))?;

    let instance_content = fs::read_to_string(instance_path)
        .with_context(|| format!("Failed to read input file: {}", instance_path.display()))?;

    let problems = Validator::new(schema)
        .validate_str(&instance_content)
        .with_context(|| format!("Failed to parse input file: {}", instance_path.display()))?;

    if problems.is_empty() {
        if args.json {
            println!(r#"{{"success": true}}"#);
        } else {
            println!("✓ Validation successful");
            println!("  Input: {}", instance_path.display());
            println!("  Schema: {}", args.schema.display());
        }
        return Ok(true);
    }
    report(&problems, &renderer, &locale, args.json);
    Ok(false)
}

fn report(problems: &[Problem], renderer: &ProblemRenderer, locale: &Locale, json: bool) {
    if json {
        let body = serde_json::json!({
            "success": false,
            "problems": problems.iter().map(|p| p.to_serde(locale)).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&body) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{body}"),
        }
    } else {
        eprintln!("{}", renderer.render_all(problems));
    }
}
