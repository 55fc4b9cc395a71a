use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use tracing_error::SpanTrace;

pub const DEFAULT_INPUT: &str = "tracks_features.csv";
pub const DEFAULT_OUTPUT: &str = "cleaned_tracks_features.csv";

pub const DEFAULT_EXCLUDED: [&str; 9] = [
    "album_id",
    "artist_ids",
    "disc_number",
    "explicit",
    "year",
    "id",
    "track_number",
    "disc_number",
    "release_date",
];

/// Set of column names that are removed from a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet(BTreeSet<String>);

impl ColumnSet {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ColumnSet(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join(","))
    }
}

/// What to do when an excluded column is not part of the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingColumnPolicy {
    #[default]
    Strict,
    Ignore,
}

#[derive(Debug, Clone, Setters)]
pub struct FilterConfig {
    #[setters(into)]
    pub input: PathBuf,
    #[setters(into)]
    pub output: PathBuf,
    pub excluded: ColumnSet,
    pub policy: MissingColumnPolicy,
    pub separator: u8,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            excluded: DEFAULT_EXCLUDED.into_iter().collect(),
            policy: MissingColumnPolicy::Strict,
            separator: b',',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Load,
    Project,
    Save,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Load => "load",
            Step::Project => "project",
            Step::Save => "save",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    FileNotFound(PathBuf),
    PermissionDenied(PathBuf),
    NotAFile(PathBuf),
    Read(PathBuf, io::Error),
    MissingHeader(PathBuf),
    DuplicateColumn(PathBuf, String),
    Parse(PathBuf, ParseFailure),
    UnknownColumns(Vec<String>),
    Write(PathBuf, WriteFailure),
}

#[derive(Debug)]
pub enum ParseFailure {
    Csv(csv::Error),
    Polars(PolarsError),
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::Csv(e) => write!(f, "{e}"),
            ParseFailure::Polars(e) => write!(f, "{e}"),
        }
    }
}

impl From<csv::Error> for ParseFailure {
    fn from(err: csv::Error) -> Self {
        ParseFailure::Csv(err)
    }
}

impl From<PolarsError> for ParseFailure {
    fn from(err: PolarsError) -> Self {
        ParseFailure::Polars(err)
    }
}

#[derive(Debug)]
pub enum WriteFailure {
    Io(io::Error),
    Polars(PolarsError),
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteFailure::Io(e) => write!(f, "{e}"),
            WriteFailure::Polars(e) => write!(f, "{e}"),
        }
    }
}

impl From<io::Error> for WriteFailure {
    fn from(err: io::Error) -> Self {
        WriteFailure::Io(err)
    }
}

impl From<PolarsError> for WriteFailure {
    fn from(err: PolarsError) -> Self {
        WriteFailure::Polars(err)
    }
}

impl ErrorKind {
    pub fn step(&self) -> Step {
        match self {
            ErrorKind::FileNotFound(_)
            | ErrorKind::PermissionDenied(_)
            | ErrorKind::NotAFile(_)
            | ErrorKind::Read(..)
            | ErrorKind::MissingHeader(_)
            | ErrorKind::DuplicateColumn(..)
            | ErrorKind::Parse(..) => Step::Load,
            ErrorKind::UnknownColumns(_) => Step::Project,
            ErrorKind::Write(..) => Step::Save,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FileNotFound(p) => write!(f, "file not found: {}", p.display()),
            ErrorKind::PermissionDenied(p) => write!(f, "permission denied: {}", p.display()),
            ErrorKind::NotAFile(p) => write!(f, "not a file: {}", p.display()),
            ErrorKind::Read(p, e) => write!(f, "could not read {}: {e}", p.display()),
            ErrorKind::MissingHeader(p) => write!(f, "no header row in {}", p.display()),
            ErrorKind::DuplicateColumn(p, name) => {
                write!(f, "column {name:?} appears twice in {}", p.display())
            }
            ErrorKind::Parse(p, e) => write!(f, "could not parse {}: {e}", p.display()),
            ErrorKind::UnknownColumns(names) => {
                write!(f, "unknown columns: {}", names.join(", "))
            }
            ErrorKind::Write(p, e) => write!(f, "could not write {}: {e}", p.display()),
        }
    }
}

/// Error returned by every step of the filter, with the span trace at the
/// point it was raised.
#[derive(Debug)]
pub struct FilterError {
    kind: ErrorKind,
    span_trace: SpanTrace,
}

impl FilterError {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn step(&self) -> Step {
        self.kind.step()
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }
}

impl From<ErrorKind> for FilterError {
    fn from(kind: ErrorKind) -> Self {
        FilterError {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step(), self.kind)
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Read(_, e) => Some(e),
            ErrorKind::Parse(_, ParseFailure::Csv(e)) => Some(e),
            ErrorKind::Parse(_, ParseFailure::Polars(e)) => Some(e),
            ErrorKind::Write(_, WriteFailure::Io(e)) => Some(e),
            ErrorKind::Write(_, WriteFailure::Polars(e)) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excluded_collapses_duplicate() {
        let cfg = FilterConfig::default();
        assert_eq!(cfg.excluded.len(), 8);
        assert!(cfg.excluded.contains("disc_number"));
        assert!(!cfg.excluded.contains("name"));
    }

    #[test]
    fn setters_override_defaults() {
        let cfg = FilterConfig::default()
            .input("in.csv")
            .output("out.csv")
            .policy(MissingColumnPolicy::Ignore)
            .separator(b';');
        assert_eq!(cfg.input, PathBuf::from("in.csv"));
        assert_eq!(cfg.output, PathBuf::from("out.csv"));
        assert_eq!(cfg.policy, MissingColumnPolicy::Ignore);
        assert_eq!(cfg.separator, b';');
    }

    #[test]
    fn error_names_failing_step() {
        let err = FilterError::from(ErrorKind::UnknownColumns(vec!["id".into(), "year".into()]));
        assert_eq!(err.step(), Step::Project);
        assert_eq!(err.to_string(), "project failed: unknown columns: id, year");

        let err = FilterError::from(ErrorKind::FileNotFound("x.csv".into()));
        assert_eq!(err.step(), Step::Load);
        assert_eq!(err.to_string(), "load failed: file not found: x.csv");
    }
}
