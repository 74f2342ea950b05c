use abx_core::{Condition, StimulusPool, StimulusRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("stimulus root {0} does not exist or is not a directory")]
    MissingRoot(PathBuf),

    #[error("failed to walk stimulus directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Maps a stimulus file name to its condition.
///
/// `*_fp.png` is a visual fingerprint, `*_heat.png` a heatmap and any `.wav`
/// an audio clip. Matching ignores case.
pub fn classify(file_name: &str) -> Option<Condition> {
    let name = file_name.to_ascii_lowercase();
    if name.ends_with("_fp.png") {
        Some(Condition::Viz)
    } else if name.ends_with("_heat.png") {
        Some(Condition::Heat)
    } else if name.ends_with(".wav") {
        Some(Condition::Aud)
    } else {
        None
    }
}

/// Scans `root/<driver>/<file>` into a pool.
///
/// With an empty `drivers` list every visible subdirectory of `root` is a
/// driver. Records come out sorted by driver, then file name. Record paths
/// are relative to `root` and use `/` separators.
pub fn scan_stimuli(root: &Path, drivers: &[String]) -> crate::Result<StimulusPool> {
    if !root.is_dir() {
        return Err(LoadError::MissingRoot(root.to_path_buf()));
    }

    let driver_dirs = if drivers.is_empty() {
        discover_drivers(root)?
    } else {
        let mut names: Vec<&String> = drivers.iter().collect();
        names.sort();
        names.dedup();
        names
            .into_iter()
            .filter_map(|name| {
                let dir = root.join(name);
                if dir.is_dir() {
                    Some((name.clone(), dir))
                } else {
                    warn!("driver directory {} not found, skipping", dir.display());
                    None
                }
            })
            .collect()
    };

    let mut records = Vec::new();
    for (driver, dir) in &driver_dirs {
        let before = records.len();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let Some(condition) = classify(&name) else {
                continue;
            };
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            records.push(StimulusRecord::new(
                condition,
                driver.as_str(),
                rel.to_string_lossy().replace('\\', "/"),
            ));
        }
        debug!("driver {}: {} stimuli", driver, records.len() - before);
    }

    info!(
        "scanned {} stimuli from {} drivers under {}",
        records.len(),
        driver_dirs.len(),
        root.display()
    );
    Ok(StimulusPool::new(records))
}

fn discover_drivers(root: &Path) -> crate::Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_dir() && !name.starts_with('.') {
            dirs.push((name, entry.into_path()));
        }
    }
    Ok(dirs)
}
