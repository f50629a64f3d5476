//! File exclusion rules: regex patterns matched against the
//! calling-dir-relative path of each candidate source file.

use regex::Regex;

use crate::error::Result;

#[derive(Debug, Default)]
pub struct Rules {
    patterns: Vec<Regex>,
}

impl Rules {
    pub fn empty() -> Rules {
        Rules::default()
    }

    pub fn new(patterns: &[String]) -> Result<Rules> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Rules { patterns })
    }

    pub fn is_file_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }
}
