//! Command implementations
//!
//! Every command except `inspect` starts from the manifest: it is located,
//! parsed, validated and turned into one resource per transform before any
//! XML file is read.

pub mod apply;
pub mod diff;
pub mod inspect;
pub mod status;
pub mod validate;

use anyhow::{Context as AnyhowContext, Result};
use declarative::ExecutionPlan;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::config::Manifest;
use crate::paths;
use crate::resource::XmlTransform;

/// A validated manifest and the resources it declares
pub struct Loaded {
    pub path: PathBuf,
    pub manifest: Manifest,
    pub resources: Vec<XmlTransform>,
}

/// Locate, parse and validate the manifest
pub fn load(ctx: &Context) -> Result<Loaded> {
    let path = paths::manifest_path(ctx.manifest.as_deref())?;
    log::info!("Loading manifest {}", path.display());

    let manifest = Manifest::load(&path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let specs = manifest
        .validate(base_dir)
        .with_context(|| format!("Invalid manifest {}", path.display()))?;

    let resources = specs
        .iter()
        .map(|spec| {
            XmlTransform::from_spec(spec)
                .with_context(|| format!("Invalid transform '{}' in {}", spec.name, path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    log::debug!("Loaded {} transforms", resources.len());

    Ok(Loaded {
        path,
        manifest,
        resources,
    })
}

/// Group resources by file, keeping only those matching `target`
pub fn build_plan(resources: Vec<XmlTransform>, target: Option<&str>) -> ExecutionPlan {
    let mut plan = ExecutionPlan::new();
    for resource in resources {
        plan.add_resource(Box::new(resource));
    }
    plan.filter_by_target(target)
}
