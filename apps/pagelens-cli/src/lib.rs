//! File plumbing for the `pagelens` binary: reading page texts, persisting
//! document indexes and exporting query results.

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use pagelens_core::types::{DocumentIndex, QueryOutcome};

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Page separator emitted by `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

/// Read page texts from `input`.
///
/// A directory contributes one page per `.txt` file in [`natural_cmp`] order
/// of their paths, so `page2.txt` comes before `page10.txt`. A file
/// is split on form feeds; the empty tail after a final form feed is dropped.
pub fn read_pages(input: &Path) -> Result<Vec<String>> {
    if input.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
            .collect();
        files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
        tracing::debug!(dir = %input.display(), files = files.len(), "reading page files");
        files
            .iter()
            .map(|p| fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
            .collect()
    } else {
        let raw = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
        Ok(split_pages(&raw))
    }
}

/// Compare strings with digit runs ordered by numeric value. Runs that are
/// numerically equal (`7` and `007`) fall back to plain string order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut x, mut y) = (a, b);
    loop {
        match (x.chars().next(), y.chars().next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(cx), Some(cy)) if cx.is_ascii_digit() && cy.is_ascii_digit() => {
                let (nx, rx) = split_digits(x);
                let (ny, ry) = split_digits(y);
                let (nx, ny) = (nx.trim_start_matches('0'), ny.trim_start_matches('0'));
                let order = nx.len().cmp(&ny.len()).then_with(|| nx.cmp(ny));
                if order != Ordering::Equal {
                    return order;
                }
                (x, y) = (rx, ry);
            }
            (Some(cx), Some(cy)) => {
                if cx != cy {
                    return cx.cmp(&cy);
                }
                (x, y) = (&x[cx.len_utf8()..], &y[cy.len_utf8()..]);
            }
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

pub fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw.split(PAGE_BREAK).map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Display name for a document read from `input`.
pub fn document_name(input: &Path) -> String {
    input
        .file_stem()
        .map_or_else(|| "document".to_string(), |s| s.to_string_lossy().into_owned())
}

pub fn save_index(index: &DocumentIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, index)?;
    writer.flush()?;
    Ok(())
}

pub fn load_index(path: &Path) -> Result<DocumentIndex> {
    let file = File::open(path).with_context(|| format!("opening index {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing index {}", path.display()))
}

/// `page,score` rows for the ranked pages, scores to six decimals.
pub fn outcome_csv(outcome: &QueryOutcome) -> String {
    let mut csv = String::from("page,score\n");
    for hit in &outcome.top_pages {
        csv.push_str(&format!("{},{:.6}\n", hit.page, hit.score));
    }
    csv
}

/// Write `<base>.json` and `<base>.csv`; returns both paths.
pub fn export_outcome(outcome: &QueryOutcome, base: &Path) -> Result<(PathBuf, PathBuf)> {
    let json_path = base.with_extension("json");
    let csv_path = base.with_extension("csv");
    if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&json_path, serde_json::to_string_pretty(outcome)?)
        .with_context(|| format!("writing {}", json_path.display()))?;
    fs::write(&csv_path, outcome_csv(outcome)).with_context(|| format!("writing {}", csv_path.display()))?;
    Ok((json_path, csv_path))
}
