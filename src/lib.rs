//! # datamodel-gen
//!
//! Compiles annotated EBNF grammars into typed object models: one Rust type
//! per grammar production, a discriminant enum, read-only and rewriting
//! visitors, JSON encoding and decoding, and a JSON-Schema of the encoding.
//!
//! Use the [`datamodel!`] macro to generate a model inline, or the
//! [`Generator`] to turn grammar files into formatted source files.

extern crate self as datamodel_gen;

use datamodel_gen_model::{compile_grammar, parser, Renderer, RustRenderer, SchemaRenderer};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use datamodel_gen_macros::datamodel;
pub use datamodel_gen_model::{CompileError, DataModel, Options};

mod resolver;

// Runtime library used by generated code (must be public)
pub mod rt;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("cannot access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    #[error("generated module '{module}' does not parse: {source}")]
    Render {
        module: String,
        #[source]
        source: syn::Error,
    },
}

/// The artifacts of one grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub module_name: String,
    /// Formatted Rust source of the generated module.
    pub rust_source: String,
    /// Pretty-printed JSON-Schema document.
    pub schema: String,
}

impl GeneratedFiles {
    pub fn rust_file_name(&self) -> String {
        format!("{}.rs", self.module_name)
    }

    pub fn schema_file_name(&self) -> String {
        format!("{}.schema.json", self.module_name)
    }

    /// Writes both files into `dir` and returns their paths.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
        let io = |path: &Path| {
            let path = path.to_path_buf();
            move |source| GenerateError::Io { path, source }
        };
        std::fs::create_dir_all(dir).map_err(io(dir))?;
        let files = [
            (dir.join(self.rust_file_name()), &self.rust_source),
            (dir.join(self.schema_file_name()), &self.schema),
        ];
        let mut written = Vec::new();
        for (path, content) in files {
            std::fs::write(&path, content).map_err(io(path.as_path()))?;
            log::info!("wrote '{}'", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

pub struct Generator {
    resolver: resolver::GrammarResolver,
    options: Options,
}

impl Generator {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            resolver: resolver::GrammarResolver::new(base_dir),
            options: Options::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Reads, compiles and renders the grammar file `root_file`.
    pub fn generate(&self, root_file: &str) -> Result<GeneratedFiles, GenerateError> {
        let grammar = self.resolver.resolve(root_file)?;
        let path = self.resolver.path_of(root_file);
        let model = compile_grammar(&grammar, &self.options)
            .map_err(|source| GenerateError::Compile { path: path.clone(), source })?;
        render(&model, &path)
    }

    /// Compiles grammar text that does not live in a file.
    pub fn generate_source(&self, source: &str) -> Result<GeneratedFiles, GenerateError> {
        let path = PathBuf::from("<inline>");
        let model = parser::parse_grammar_source(source)
            .and_then(|grammar| compile_grammar(&grammar, &self.options))
            .map_err(|source| GenerateError::Compile { path: path.clone(), source })?;
        render(&model, &path)
    }
}

fn render(model: &DataModel, path: &Path) -> Result<GeneratedFiles, GenerateError> {
    let compile_error = |source: CompileError| GenerateError::Compile {
        path: path.to_path_buf(),
        source,
    };
    let module_name = model.module_name();
    let tokens = RustRenderer.render(model).map_err(compile_error)?;
    let file: syn::File = syn::parse2(tokens).map_err(|source| GenerateError::Render {
        module: module_name.clone(),
        source,
    })?;
    let schema = SchemaRenderer.render(model).map_err(compile_error)?;
    Ok(GeneratedFiles {
        module_name,
        rust_source: prettyplease::unparse(&file),
        schema,
    })
}

// --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;

    const SHAPES: &str = "grammar Shapes;
        Drawing : 'drawing' Shape* ;
        Shape : Circle | Square ;
        Circle : 'circle' NUMBER ;
        Square : 'square' NUMBER ;";

    #[test]
    fn test_generate_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("shapes.ebnf"), SHAPES).expect("write grammar");

        let files = Generator::new(dir.path())
            .generate("shapes.ebnf")
            .expect("generation failed");
        assert_eq!(files.module_name, "shapes");
        assert!(files.rust_source.contains("pub mod shapes {"));
        assert!(files.rust_source.contains("pub struct Circle {"));
        assert!(files.rust_source.contains("pub enum Shape {"));
        assert!(files.schema.contains("\"$schema\""));
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().expect("temp dir");
        let files = Generator::new(".").generate_source(SHAPES).expect("generation failed");
        let written = files.write_to(&dir.path().join("out")).expect("write failed");
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("out/shapes.rs"));
        assert!(written[1].ends_with("out/shapes.schema.json"));
        let schema = std::fs::read_to_string(&written[1]).expect("read schema");
        assert_eq!(schema, files.schema);
    }

    #[test]
    fn test_locations_option() {
        let files = Generator::new(".")
            .with_options(Options::new().generate_locations(true))
            .generate_source(SHAPES)
            .expect("generation failed");
        assert!(files.rust_source.contains("pub offset: i64"));
    }

    #[test]
    fn test_missing_file() {
        let err = Generator::new("/nonexistent").generate("nope.ebnf").unwrap_err();
        assert!(matches!(err, GenerateError::Io { .. }));
        assert!(err.to_string().contains("nope.ebnf"));
    }

    #[test]
    fn test_compile_error_carries_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("bad.ebnf"), "grammar Bad; A : 'a' | B ; B : 'b' C ;")
            .expect("write grammar");
        let err = Generator::new(dir.path()).generate("bad.ebnf").unwrap_err();
        assert!(matches!(err, GenerateError::Compile { .. }));
        assert!(err.to_string().contains("bad.ebnf"));
    }
}
