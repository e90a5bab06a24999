//! Snaps requested column names onto the dataset's actual headers.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{FitError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    Exact,
    /// Equal after trimming and lower-casing.
    Normalized,
    /// Nearest header by edit distance.
    Nearest { tied: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub requested: String,
    pub index: usize,
    pub header: String,
    pub distance: usize,
    pub kind: MatchKind,
}

/// Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        cur[0] = i;
        for j in 1..=b.len() {
            cur[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1]
            } else {
                1 + prev[j].min(cur[j - 1]).min(prev[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Resolves one name: exact match, then case/whitespace-insensitive match,
/// then the first header (in column order) at minimum edit distance.
pub fn resolve_column(requested: &str, headers: &[String]) -> Result<Resolved> {
    if headers.is_empty() {
        return Err(FitError::Schema(format!(
            "cannot resolve column '{requested}': the dataset has no columns"
        )));
    }

    if let Some(index) = headers.iter().position(|h| h == requested) {
        return Ok(Resolved {
            requested: requested.to_string(),
            index,
            header: headers[index].clone(),
            distance: 0,
            kind: MatchKind::Exact,
        });
    }

    let wanted = fold(requested);
    if let Some(index) = headers.iter().position(|h| fold(h) == wanted) {
        return Ok(Resolved {
            requested: requested.to_string(),
            index,
            header: headers[index].clone(),
            distance: 0,
            kind: MatchKind::Normalized,
        });
    }

    let distances: Vec<usize> = headers.iter().map(|h| levenshtein(&fold(h), &wanted)).collect();
    let min = distances.iter().copied().min().unwrap_or(0);
    let index = distances.iter().position(|&d| d == min).unwrap_or(0);
    let tied = distances.iter().filter(|&&d| d == min).count() > 1;

    Ok(Resolved {
        requested: requested.to_string(),
        index,
        header: headers[index].clone(),
        distance: min,
        kind: MatchKind::Nearest { tied },
    })
}

/// Resolves every name, logging each fuzzy snap.
pub fn resolve_columns(requested: &[String], headers: &[String]) -> Result<Vec<Resolved>> {
    requested
        .iter()
        .map(|name| {
            let r = resolve_column(name, headers)?;
            match r.kind {
                MatchKind::Exact => {}
                MatchKind::Normalized => {
                    info!(requested = %r.requested, header = %r.header, "column matched ignoring case");
                }
                MatchKind::Nearest { tied: false } => {
                    warn!(requested = %r.requested, header = %r.header, distance = r.distance,
                        "column not found; using nearest header");
                }
                MatchKind::Nearest { tied: true } => {
                    warn!(requested = %r.requested, header = %r.header, distance = r.distance,
                        "column not found; several headers are equally close, using the first");
                }
            }
            Ok(r)
        })
        .collect()
}
