use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::domain::{
    ColumnSet, DEFAULT_INPUT, DEFAULT_OUTPUT, FilterConfig, MissingColumnPolicy,
};

/// Drop columns from a CSV file and save the rest to a new file.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// CSV file to read
    #[arg(short, long, default_value = DEFAULT_INPUT, value_parser = parse_path)]
    pub input: PathBuf,

    /// CSV file to write, replaced if it exists
    #[arg(short, long, default_value = DEFAULT_OUTPUT, value_parser = parse_path)]
    pub output: PathBuf,

    /// Comma separated columns to drop instead of the built-in list
    #[arg(short, long, value_delimiter = ',')]
    pub drop: Option<Vec<String>>,

    /// Skip dropped columns that are not in the file instead of failing
    #[arg(long)]
    pub ignore_missing: bool,

    /// Field delimiter of both files
    #[arg(short, long, default_value_t = ',', value_parser = parse_separator)]
    pub separator: char,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn to_config(&self) -> FilterConfig {
        let mut cfg = FilterConfig::default()
            .input(&self.input)
            .output(&self.output)
            // parse_separator only accepts ASCII
            .separator(self.separator as u8);
        if let Some(columns) = &self.drop {
            let excluded: ColumnSet = columns
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect();
            cfg = cfg.excluded(excluded);
        }
        if self.ignore_missing {
            cfg = cfg.policy(MissingColumnPolicy::Ignore);
        }
        cfg
    }
}

fn parse_path(raw: &str) -> Result<PathBuf, String> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| e.to_string())
}

fn parse_separator(raw: &str) -> Result<char, String> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Ok(c),
        _ => Err(format!("separator must be a single ASCII character, got {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("colfilter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_arguments_reproduce_defaults() {
        let cfg = parse(&[]).to_config();
        let default = FilterConfig::default();
        assert_eq!(cfg.input, default.input);
        assert_eq!(cfg.output, default.output);
        assert_eq!(cfg.excluded, default.excluded);
        assert_eq!(cfg.policy, MissingColumnPolicy::Strict);
        assert_eq!(cfg.separator, b',');
    }

    #[test]
    fn drop_list_replaces_defaults() {
        let cfg = parse(&["--drop", "id, year,,id"]).to_config();
        let expected: ColumnSet = ["id", "year"].into_iter().collect();
        assert_eq!(cfg.excluded, expected);
    }

    #[test]
    fn flags_map_to_config() {
        let args = parse(&[
            "-i",
            "in.tsv",
            "-o",
            "out.tsv",
            "--ignore-missing",
            "-s",
            "\t",
            "-vv",
        ]);
        assert_eq!(args.verbose, 2);
        let cfg = args.to_config();
        assert_eq!(cfg.input, PathBuf::from("in.tsv"));
        assert_eq!(cfg.output, PathBuf::from("out.tsv"));
        assert_eq!(cfg.policy, MissingColumnPolicy::Ignore);
        assert_eq!(cfg.separator, b'\t');
    }

    #[test]
    fn rejects_multi_character_separator() {
        let result = Args::try_parse_from(["colfilter", "--separator", ";;"]);
        assert!(result.is_err());
        let result = Args::try_parse_from(["colfilter", "--separator", "\""]);
        assert!(result.is_err());
    }

    #[test]
    fn expands_home_in_paths() {
        let home = shellexpand::tilde("~").into_owned();
        if home == "~" {
            return;
        }
        let args = parse(&["--input", "~/data/tracks_features.csv"]);
        assert_eq!(
            args.input,
            Path::new(&home).join("data/tracks_features.csv")
        );
    }
}
