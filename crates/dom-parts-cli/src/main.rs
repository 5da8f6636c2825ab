use std::{env, fs, process};

use anyhow::{Context, Result};
use dom_parts_engine::{Document, PartsCache, render, validate_parts_deep};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: dom-parts-cli <file>");
        eprintln!();
        eprintln!("Reads a markup file annotated with part markers");
        eprintln!("(<!--?node-part?-->, <!--?child-node-part?-->, <!--?/child-node-part?-->)");
        eprintln!("and prints its parts tree.");
        process::exit(1);
    }

    if let Err(err) = run(&args[1]) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(path: &str) -> Result<()> {
    let markup =
        fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let doc =
        Document::from_markup(&markup).with_context(|| format!("failed to parse {path}"))?;

    let mut cache = PartsCache::new();
    let parts = cache.get_parts(&doc, doc.root())?;
    validate_parts_deep(&doc, doc.root(), parts)?;

    print!("{}", render(&doc, parts));
    Ok(())
}
