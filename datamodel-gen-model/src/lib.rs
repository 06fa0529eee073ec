//! # datamodel-gen-model
//!
//! The compiler behind `datamodel-gen`: it reads an annotated EBNF grammar and
//! produces a [`DataModel`], the complete set of emission plans for a typed
//! object model, its visitors, its JSON encoding and its JSON-Schema.
//!
//! ## Pipeline
//!
//! 1. **[lexer]** and **[parser]**: Grammar text into a [`Grammar`].
//! 2. **[resolver]**: Classify every production by shape and resolve types.
//! 3. **[validator]**: Reject grammars that have no well-formed object model.
//! 4. **[members]**: Synthesize classes, enums, dictionaries and their members.
//! 5. **[visitor]**, **[serializer]**, **[schema]**: Plan the derived artifacts.
//! 6. **[codegen]**: Render the plans as Rust tokens or schema text.

pub mod builtins;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod location;
pub mod members;
pub mod model;
pub mod naming;
pub mod parser;
pub mod plan;
pub mod resolver;
pub mod schema;
pub mod serializer;
pub mod testing;
pub mod validator;
pub mod visitor;

pub use codegen::{generate_rust, Renderer, RustRenderer, SchemaRenderer};
pub use config::Options;
pub use error::{CompileError, CompileResult};
pub use location::SourceLocation;
pub use model::Grammar;
pub use plan::DataModel;

/// Compiles grammar text into a [`DataModel`].
pub fn compile(source: &str, options: &Options) -> CompileResult<DataModel> {
    let grammar = parser::parse_grammar_source(source)?;
    log::log!(
        options.log_level(),
        "parsed grammar '{}' with {} productions",
        grammar.name,
        grammar.productions.len()
    );
    compile_grammar(&grammar, options)
}

/// Runs every stage after parsing. The first error aborts the run.
pub fn compile_grammar(grammar: &Grammar, options: &Options) -> CompileResult<DataModel> {
    let resolved = resolver::resolve(grammar)?;
    validator::validate(&resolved)?;

    let members = members::synthesize(&resolved, options)?;
    let (visitor, rewriting_visitor) = visitor::plan_visitors(&grammar.name, &members);
    let serializer = serializer::plan_serializer(&members);
    let schema = schema::plan_schema(&resolved, &members);

    let members::Members {
        kinds,
        classes,
        enums,
        dictionaries,
        nodes,
    } = members;
    log::log!(
        options.log_level(),
        "planned {} classes, {} enums and {} dictionaries for '{}'",
        classes.len(),
        enums.len(),
        dictionaries.len(),
        grammar.name
    );
    Ok(DataModel {
        grammar_name: grammar.name.clone(),
        namespace: grammar.namespace.clone(),
        options: *options,
        kinds,
        classes,
        enums,
        dictionaries,
        nodes,
        visitor,
        rewriting_visitor,
        serializer,
        schema,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Testable;

    #[test]
    fn test_compile_pipeline() {
        let model = compile(
            "grammar Calc; Expr : Num | Add ; Num : 'n' NUMBER ;
             Add : 'add' /* @name{left} */ Expr /* @name{right} */ Expr ;",
            &Options::default(),
        )
        .test()
        .assert_success();
        assert_eq!(model.grammar_name, "Calc");
        assert_eq!(model.module_name(), "calc");
        assert!(model.class("Expr").map(|c| c.is_abstract).unwrap_or(false));
        assert_eq!(model.visitor.name, "CalcVisitor");
        assert!(model.serializer.object("Add").is_some());
    }

    #[test]
    fn test_first_error_aborts() {
        compile("grammar G; A : B ;", &Options::default())
            .test()
            .assert_semantic_failure();
        compile("grammar G A : 'a' ;", &Options::default())
            .test()
            .assert_failure_contains("syntax error");
    }
}
