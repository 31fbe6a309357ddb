use crate::error::{open_artifact, FileCategory, GripError, Result};
use crate::species::TfRecord;
use crate::strand::{Strand, StrandLayout};
use crate::track::PositionTrack;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A known binding site from the target-site list, tagged with its landscape value
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSite {
    /// The TF binding here has a nonzero repression rate
    pub repressor: bool,
    pub name: String,
    /// Landscape column of the site (`name` plus the strand suffix on two strands)
    pub name_strand: String,
    pub position: i64,
    pub size: usize,
    pub strand: Strand,
    pub affinity: f64,
}

/// The fields of one target-site line before any lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSpec {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
}

/// Parses `name:…:start..end:…:strand`; the second field and anything between the
/// range and the last field are ignored
pub fn parse_site_line(line: &str) -> std::result::Result<SiteSpec, String> {
    let fields: Vec<&str> = line.trim().split(':').collect();
    if fields.len() < 4 {
        return Err(format!("expected at least 4 `:`-separated fields, found {}", fields.len()));
    }

    let name = fields[0].trim();
    if name.is_empty() {
        return Err("empty TF name".into());
    }
    let (start, end) = fields[2]
        .split_once("..")
        .ok_or_else(|| format!("invalid range `{}`", fields[2]))?;
    let start: i64 = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start `{}`", start))?;
    let end: i64 = end.trim().parse().map_err(|_| format!("invalid end `{}`", end))?;
    if end < start {
        return Err(format!("range {}..{} ends before it starts", start, end));
    }

    let flag = fields[fields.len() - 1].trim();
    let strand = flag
        .parse::<u8>()
        .ok()
        .and_then(Strand::from_flag)
        .ok_or_else(|| format!("invalid strand flag `{}`", flag))?;

    Ok(SiteSpec {
        name: name.to_string(),
        start,
        end,
        strand,
    })
}

/// Reads the target-site list and tags every site with its landscape value.
///
/// # Arguments
/// * `path` - Target-site description file, one site per line
/// * `landscape` - The affinity landscape as read from disk
/// * `layout` - Strand layout of the landscape; decides the column name of each site
/// * `records` - TF table, used to flag repressor sites
///
/// # Errors
/// * `GripError::FileNotFound` - If the file does not exist
/// * `GripError::MalformedFile` - If a line cannot be parsed
/// * `GripError::Lookup` - If a site names a TF, column or position absent from
///   the TF table or the landscape
pub fn annotate(
    path: impl AsRef<Path>,
    landscape: &PositionTrack,
    layout: StrandLayout,
    records: &[TfRecord],
) -> Result<Vec<TargetSite>> {
    let path = path.as_ref();
    let reader = BufReader::new(open_artifact(path, FileCategory::TargetSites)?);
    let mut sites = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let spec = parse_site_line(&line).map_err(|e| GripError::malformed(path, idx + 1, e))?;
        sites.push(annotate_site(spec, landscape, layout, records)?);
    }

    Ok(sites)
}

/// Looks one parsed site up in the landscape and TF table
pub fn annotate_site(
    spec: SiteSpec,
    landscape: &PositionTrack,
    layout: StrandLayout,
    records: &[TfRecord],
) -> Result<TargetSite> {
    let record = records
        .iter()
        .find(|r| r.name == spec.name)
        .ok_or_else(|| GripError::Lookup(format!("target site TF {} is not in the TF table", spec.name)))?;

    let name_strand = layout.column_name(&spec.name, spec.strand);
    if landscape.series_index(&name_strand).is_none() {
        return Err(GripError::Lookup(format!(
            "no landscape column {} for target site at {}",
            name_strand, spec.start
        )));
    }
    let affinity = landscape.get(&name_strand, spec.start).ok_or_else(|| {
        GripError::Lookup(format!(
            "position {} of target site {} is outside the landscape",
            spec.start, name_strand
        ))
    })?;

    Ok(TargetSite {
        repressor: record.is_repressor(),
        size: (spec.end + 1 - spec.start) as usize,
        position: spec.start,
        strand: spec.strand,
        name: spec.name,
        name_strand,
        affinity,
    })
}
