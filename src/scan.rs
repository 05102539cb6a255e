use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use callgrapher::ir::Class;

/// Class declarations loaded from the input and classpath, in load order.
pub(crate) struct ScanOutput {
    pub(crate) classes: Vec<Class>,
    pub(crate) file_count: usize,
}

/// A program model file holds one class or a list of classes.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProgramFile {
    Many(Vec<Class>),
    One(Box<Class>),
}

pub(crate) fn scan_inputs(input: &Path, classpath: &[PathBuf]) -> Result<ScanOutput> {
    let mut classes = Vec::new();
    let mut file_count = 0;

    scan_path(input, true, &mut classes, &mut file_count)?;

    // Keep deterministic ordering by sorting classpath entries and directory listings.
    let mut classpath_entries = classpath.to_vec();
    classpath_entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for entry in classpath_entries {
        scan_path(&entry, true, &mut classes, &mut file_count)?;
    }

    Ok(ScanOutput {
        classes,
        file_count,
    })
}

fn scan_path(
    path: &Path,
    strict: bool,
    classes: &mut Vec<Class>,
    file_count: &mut usize,
) -> Result<()> {
    if path.is_dir() {
        scan_dir(path, classes, file_count)?;
        return Ok(());
    }

    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match extension {
        "json" => scan_program_file(path, classes, file_count),
        _ => {
            if strict {
                anyhow::bail!("unsupported input file: {}", path.display())
            } else {
                debug!(path = %path.display(), "skipping non-json file");
                Ok(())
            }
        }
    }
}

fn scan_dir(path: &Path, classes: &mut Vec<Class>, file_count: &mut usize) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)
        .with_context(|| format!("failed to read directory {}", path.display()))?
    {
        let entry = entry.with_context(|| format!("failed to read entry under {}", path.display()))?;
        entries.push(entry.path());
    }

    entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for entry in entries {
        if entry.is_dir() {
            scan_dir(&entry, classes, file_count)?;
        } else {
            scan_path(&entry, false, classes, file_count)?;
        }
    }

    Ok(())
}

fn scan_program_file(path: &Path, classes: &mut Vec<Class>, file_count: &mut usize) -> Result<()> {
    let data = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: ProgramFile = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    *file_count += 1;

    let before = classes.len();
    match parsed {
        ProgramFile::Many(many) => classes.extend(many),
        ProgramFile::One(one) => classes.push(*one),
    }
    debug!(
        path = %path.display(),
        classes = classes.len() - before,
        "loaded program model"
    );
    Ok(())
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
