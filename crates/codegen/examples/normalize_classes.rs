//! Example: run the pipeline over a JSON dump of parsed classes
//!
//! The input is the JSON array of raw classes an upstream parser produced, the optional second
//! argument a generator configuration.
//!
//! Run with:
//! ```
//! cargo run --example normalize_classes -- classes.json [config.json]
//! ```

use schemagen_codegen::{Class, ClassContainer, GeneratorConfig};
use std::env;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(classes_path) = args.get(1) else {
        println!("Usage: cargo run --example normalize_classes -- <classes.json> [config.json]");
        return Ok(());
    };

    let config = match args.get(2) {
        Some(path) => GeneratorConfig::from_json(&fs::read_to_string(path)?)?,
        None => GeneratorConfig::default(),
    };
    let classes: Vec<Class> = serde_json::from_str(&fs::read_to_string(classes_path)?)?;

    let mut container = ClassContainer::new(config);
    container.extend(classes);
    container.process()?;

    println!("Resolved {} classes\n", container.len());
    for class in container.classes() {
        println!(
            "{}.{}: {}",
            class.package.as_deref().unwrap_or_default(),
            class.module.as_deref().unwrap_or_default(),
            class.qname
        );
        for attr in &class.attrs {
            let types: Vec<&str> = attr.types.iter().map(|tp| tp.qname.as_str()).collect();
            println!("    {} [{}]: {}", attr.field_name(), attr.tag, types.join(" | "));
        }
    }

    Ok(())
}
