use ::csv::ReaderBuilder;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

use crate::domain::{
    ColumnSet, ErrorKind, FilterError, MissingColumnPolicy, ParseFailure, WriteFailure,
};

/// A CSV file held completely in memory.
///
/// Every cell is kept as text so values are written back exactly as they were
/// read. Empty fields are null.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    frame: DataFrame,
}

impl Table {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, separator: u8) -> Result<Self, FilterError> {
        Table::check_readable(path)?;
        Table::check_shape(path, separator)?;

        let start_time = Instant::now();
        let frame = LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .with_separator(separator)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| ErrorKind::Parse(path.to_path_buf(), ParseFailure::Polars(e)))?;

        info!(
            "Loaded {} rows x {} columns in {}ms",
            frame.height(),
            frame.width(),
            start_time.elapsed().as_millis()
        );
        debug!("Columns: {:?}", frame.get_column_names());

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        Ok(Table { name, frame })
    }

    /// Returns a copy of the table without the `excluded` columns.
    #[instrument(level = "info", skip_all, fields(table = %self.name, excluded = %excluded))]
    pub fn project(
        &self,
        excluded: &ColumnSet,
        policy: MissingColumnPolicy,
    ) -> Result<Table, FilterError> {
        let columns = self.columns();
        let missing: Vec<String> = excluded
            .iter()
            .filter(|name| !columns.iter().any(|c| c.as_str() == *name))
            .map(String::from)
            .collect();

        if !missing.is_empty() {
            match policy {
                MissingColumnPolicy::Strict => {
                    return Err(ErrorKind::UnknownColumns(missing).into());
                }
                MissingColumnPolicy::Ignore => {
                    warn!("Ignoring unknown columns: {}", missing.join(", "));
                }
            }
        }

        let dropped: Vec<&str> = columns
            .iter()
            .map(String::as_str)
            .filter(|c| excluded.contains(c))
            .collect();
        trace!("Dropping {:?}", dropped);
        let frame = self.frame.drop_many(dropped);
        if frame.width() == 0 {
            warn!("No columns left in {}", self.name);
        }
        debug!("Kept columns: {:?}", frame.get_column_names());

        Ok(Table {
            name: self.name.clone(),
            frame,
        })
    }

    /// Writes the table to `path`, replacing any existing file.
    #[instrument(level = "info", skip_all, fields(table = %self.name, path = %path.display()))]
    pub fn save(&self, path: &Path, separator: u8) -> Result<(), FilterError> {
        let start_time = Instant::now();
        let write = || -> Result<(), WriteFailure> {
            let mut file = File::create(path)?;
            let mut frame = self.frame.clone();
            CsvWriter::new(&mut file)
                .include_header(true)
                .with_separator(separator)
                .finish(&mut frame)?;
            file.flush()?;
            Ok(())
        };
        write().map_err(|e| ErrorKind::Write(path.to_path_buf(), e))?;

        info!(
            "Wrote {} rows to {} in {}ms",
            self.height(),
            path.display(),
            start_time.elapsed().as_millis()
        );
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    fn check_readable(path: &Path) -> Result<(), FilterError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            IoErrorKind::NotFound => ErrorKind::FileNotFound(path.to_path_buf()),
            IoErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Read(path.to_path_buf(), e),
        })?;
        let metadata = file
            .metadata()
            .map_err(|e| ErrorKind::Read(path.to_path_buf(), e))?;
        if !metadata.is_file() {
            return Err(ErrorKind::NotAFile(path.to_path_buf()).into());
        }
        if metadata.len() == 0 {
            return Err(ErrorKind::MissingHeader(path.to_path_buf()).into());
        }
        trace!("{} is {} bytes", path.display(), metadata.len());
        Ok(())
    }

    /// Every record must have as many fields as the header, and header names
    /// must be unique.
    fn check_shape(path: &Path, separator: u8) -> Result<(), FilterError> {
        let parse_err = |e: ::csv::Error| ErrorKind::Parse(path.to_path_buf(), e.into());

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(separator)
            .flexible(false)
            .from_path(path)
            .map_err(parse_err)?;

        let headers = rdr.headers().map_err(parse_err)?.clone();
        let mut seen = HashSet::new();
        for name in headers.iter() {
            if !seen.insert(name) {
                return Err(ErrorKind::DuplicateColumn(path.to_path_buf(), name.to_string()).into());
            }
        }

        let mut records = 0usize;
        for record in rdr.records() {
            record.map_err(parse_err)?;
            records += 1;
        }
        trace!("{} records with {} fields each", records, headers.len());
        Ok(())
    }
}
