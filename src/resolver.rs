use crate::GenerateError;
use datamodel_gen_model::parser::parse_grammar_source;
use datamodel_gen_model::Grammar;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads grammar files relative to a base directory.
pub struct GrammarResolver {
    base_dir: PathBuf,
}

impl GrammarResolver {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    pub fn resolve(&self, filename: &str) -> Result<Grammar, GenerateError> {
        let path = self.path_of(filename);
        let content = fs::read_to_string(&path).map_err(|source| GenerateError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("read {} bytes from '{}'", content.len(), path.display());

        let mut grammar = parse_grammar_source(&content).map_err(|source| GenerateError::Compile {
            path: path.clone(),
            source,
        })?;
        grammar.source_path = Some(path);
        Ok(grammar)
    }
}
