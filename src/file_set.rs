use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{BDR_EXT, CSV_EXT, IQS_EXT, JSON_REPORT_EXT, RawIdentity};
use crate::error::SnipError;
use crate::metadata::Miscellaneous;

/// The four sibling files of one measurement run plus the metadata to ship
/// with them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataFileSet {
    hostname: String,
    raw_datetime: String,
    iqs: Utf8PathBuf,
    bdr: Utf8PathBuf,
    csv: Utf8PathBuf,
    json_report: Utf8PathBuf,
    metadata: Miscellaneous,
}

impl RawDataFileSet {
    /// Builds the set from any one member's path. Siblings are found by
    /// swapping the extension and must exist as files.
    pub fn from_file(file: &Utf8Path, metadata: Option<Miscellaneous>) -> Result<Self, SnipError> {
        let identity = RawIdentity::from_path(file)?;

        let iqs = existing_sibling(file, IQS_EXT)?;
        let bdr = existing_sibling(file, BDR_EXT)?;
        let csv = existing_sibling(file, CSV_EXT)?;
        let json_report = existing_sibling(file, JSON_REPORT_EXT)?;

        Ok(Self {
            hostname: identity.hostname().to_string(),
            raw_datetime: identity.raw_datetime(),
            iqs,
            bdr,
            csv,
            json_report,
            metadata: metadata.unwrap_or_default(),
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn raw_datetime(&self) -> &str {
        &self.raw_datetime
    }

    pub fn iqs(&self) -> &Utf8Path {
        &self.iqs
    }

    pub fn bdr(&self) -> &Utf8Path {
        &self.bdr
    }

    pub fn csv(&self) -> &Utf8Path {
        &self.csv
    }

    pub fn json_report(&self) -> &Utf8Path {
        &self.json_report
    }

    pub fn metadata(&self) -> &Miscellaneous {
        &self.metadata
    }

    /// `<hostname>-<date>-<time>`
    pub fn snip_name(&self) -> String {
        format!("{}-{}", self.hostname, self.raw_datetime)
    }

    pub fn sources(&self) -> [&Utf8Path; 4] {
        [&self.iqs, &self.bdr, &self.csv, &self.json_report]
    }

    /// Stem shared by all four files, used in diagnostics.
    pub fn stem(&self) -> &str {
        self.iqs.file_stem().unwrap_or(self.iqs.as_str())
    }
}

fn existing_sibling(file: &Utf8Path, extension: &str) -> Result<Utf8PathBuf, SnipError> {
    let sibling = file.with_extension(extension);
    if !sibling.as_std_path().is_file() {
        return Err(SnipError::MissingSibling(sibling));
    }
    Ok(sibling)
}
