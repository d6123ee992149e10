use crate::{
    error::{Error, Result},
    relabel::RelabelReport,
};
use serde::Serialize;
use std::{
    fs,
    io::Write,
    path::Path,
};
use tracing::info;

/// JSON form of a [`RelabelReport`].
#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    codename: &'a str,
    label: &'a str,
    dry_run: bool,
    scanned: usize,
    excluded: usize,
    skipped: usize,
    scan_errors: usize,
    relabeled: Vec<RelabeledEntry>,
    failures: Vec<FailureEntry>,
    duration_secs: f64,
    generated_at: String,
}

#[derive(Debug, Serialize)]
struct RelabeledEntry {
    original: String,
    renamed: String,
    converted: String,
}

#[derive(Debug, Serialize)]
struct FailureEntry {
    path: String,
    error: String,
}

impl<'a> ReportFile<'a> {
    fn new(report: &'a RelabelReport) -> Self {
        Self {
            codename: &report.codename,
            label: &report.label,
            dry_run: report.dry_run,
            scanned: report.scanned,
            excluded: report.excluded,
            skipped: report.skipped,
            scan_errors: report.scan_errors,
            relabeled: report
                .relabeled
                .iter()
                .map(|asset| RelabeledEntry {
                    original: asset.original.display().to_string(),
                    renamed: asset.renamed.display().to_string(),
                    converted: asset.converted.display().to_string(),
                })
                .collect(),
            failures: report
                .failures
                .iter()
                .map(|failure| FailureEntry {
                    path: failure.path.display().to_string(),
                    error: failure.error.to_string(),
                })
                .collect(),
            duration_secs: report.duration.as_secs_f64(),
            generated_at: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        }
    }
}

/// Writes the run report as pretty JSON.
///
/// The file is written to a temporary sibling first and then renamed over
/// the target, so an interrupted write never leaves a truncated report.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the file
/// cannot be written.
pub(crate) fn write_report(path: &Path, report: &RelabelReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let content = serde_json::to_string_pretty(&ReportFile::new(report))?;

    let temp_path = path.with_extension("tmp");
    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    info!("Wrote report to {}", path.display());
    Ok(())
}
