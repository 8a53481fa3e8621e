use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use camino::Utf8Path;
use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::SnipError;

/// Extension of the instrument's primary binary artifact.
pub const IQS_EXT: &str = "iqs";
pub const BDR_EXT: &str = "bdr";
pub const CSV_EXT: &str = "csv";
pub const JSON_REPORT_EXT: &str = "json";

/// Secondary fragment files share the primary extension (`*.fragments.iqs`).
pub const FRAGMENTS_EXT: &str = "fragments";

static RAW_DATA_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<prefix>\w*)-(?P<hostname>\w{9})-(?P<date>\d{8})-(?P<time>\d{6})-(?P<mnemonic_id>\w+)",
    )
    .expect("raw data file name pattern is valid")
});

/// Identity of one raw data file, derived from its name.
///
/// The name must match
/// `<prefix>-<hostname:9>-<date:8 digits>-<time:6 digits>-<mnemonic_id>` from
/// the start. Anything after the mnemonic id (usually the extension) is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawIdentity {
    prefix: String,
    hostname: String,
    date: String,
    time: String,
    mnemonic_id: String,
}

impl RawIdentity {
    pub fn from_path(path: &Utf8Path) -> Result<Self, SnipError> {
        let name = path
            .file_name()
            .ok_or_else(|| SnipError::PatternMismatch(path.to_string()))?;
        name.parse()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn mnemonic_id(&self) -> &str {
        &self.mnemonic_id
    }

    /// `DATE-TIME`, as used in snip directory names.
    pub fn raw_datetime(&self) -> String {
        format!("{}-{}", self.date, self.time)
    }

    /// The date and time fields as a timestamp, when they form a real one.
    /// The grammar only asks for digits, so `20241399` still matches.
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.raw_datetime(), "%Y%m%d-%H%M%S").ok()
    }
}

impl fmt::Display for RawIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.prefix, self.hostname, self.date, self.time, self.mnemonic_id
        )
    }
}

impl FromStr for RawIdentity {
    type Err = SnipError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let captures = RAW_DATA_FILE_NAME
            .captures(value)
            .ok_or_else(|| SnipError::PatternMismatch(value.to_string()))?;
        let group = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };
        Ok(Self {
            prefix: group("prefix"),
            hostname: group("hostname"),
            date: group("date"),
            time: group("time"),
            mnemonic_id: group("mnemonic_id"),
        })
    }
}

/// True for `*.iqs` files that are not `*.fragments.iqs`.
pub fn is_primary_artifact(path: &Utf8Path) -> bool {
    if path.extension() != Some(IQS_EXT) {
        return false;
    }
    let inner = path.file_stem().map(Utf8Path::new).and_then(Utf8Path::extension);
    inner != Some(FRAGMENTS_EXT)
}
