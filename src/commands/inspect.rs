//! `inspect` - show what an xpath matches in a file

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use std::fs;
use xmlkit::fingerprint::fingerprint_children;
use xmlkit::{Document, Element, ElementPath, Selector};

use crate::Context;
use crate::cli::InspectArgs;
use crate::paths;
use crate::ui;

/// What the selector found at one position
#[derive(Debug, PartialEq, Eq)]
pub struct Match {
    pub path: ElementPath,
    /// Opening tag with attributes, e.g. `<add key="mode">`
    pub tag: String,
    /// Trimmed direct text, if any
    pub text: Option<String>,
    /// Digest of the children, as compared by `Replace`
    pub digest: String,
    pub children: usize,
}

fn describe(path: ElementPath, element: &Element) -> Match {
    let attributes: String = element
        .attributes
        .iter()
        .map(|a| format!(" {}=\"{}\"", a.name, a.value))
        .collect();
    let text = element.text();
    let text = text.trim();

    Match {
        path,
        tag: format!("<{}{}>", element.name, attributes),
        text: (!text.is_empty()).then(|| text.to_string()),
        digest: fingerprint_children(element).digest(),
        children: element.elements().count(),
    }
}

/// Evaluate `xpath` against XML bytes
pub fn matches(bytes: &[u8], xpath: &str) -> Result<Vec<Match>> {
    let selector = Selector::parse(xpath)?;
    let document = Document::parse(bytes)?;

    Ok(selector
        .select(&document)
        .into_iter()
        .filter_map(|path| {
            let element = document.element(&path)?;
            Some(describe(path, element))
        })
        .collect())
}

pub fn run(_ctx: &Context, args: InspectArgs) -> Result<()> {
    let file = paths::expand(&args.file.to_string_lossy());
    let bytes = fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let found = matches(&bytes, &args.xpath)
        .with_context(|| format!("Failed to evaluate '{}' against {}", args.xpath, file.display()))?;

    ui::header(&format!("{} in {}", args.xpath, file.display()));
    if found.is_empty() {
        ui::warn("No elements match");
        return Ok(());
    }

    for m in &found {
        println!(
            "  {} {}",
            m.path.to_string().dimmed(),
            m.tag.cyan()
        );
        if let Some(text) = &m.text {
            ui::kv("text", text);
        }
        ui::kv(
            "children",
            &format!("{} element(s), #{}", m.children, m.digest),
        );
    }

    println!();
    ui::info(&format!("{} element(s) match", found.len()));
    Ok(())
}
