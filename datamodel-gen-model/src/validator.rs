use crate::error::{CompileError, CompileResult};
use crate::model::*;
use crate::resolver::{ResolvedGrammar, Shape};

/// Checks that every reference in the resolved grammar lands on something usable.
pub fn validate(resolved: &ResolvedGrammar) -> CompileResult<()> {
    for (subclass, base) in &resolved.superclasses {
        let location = resolved
            .grammar
            .production(base)
            .map(|p| p.location)
            .unwrap_or_default();
        match resolved.shape(subclass) {
            Some(shape) if shape.is_node() => {}
            Some(_) => {
                return Err(CompileError::semantic(
                    location,
                    format!("Alternation member '{}' of '{}' is not a class.", subclass, base),
                ))
            }
            None => {
                return Err(CompileError::semantic(
                    location,
                    format!("Undefined type: '{}'.", subclass),
                ))
            }
        }
    }

    for (production, shape) in resolved.productions_with_shape() {
        match shape {
            Shape::Class {
                is_abstract: false,
                constant_alternative: false,
            } => validate_symbols(&production.rhs, resolved)?,
            Shape::Collection { .. } => {
                if let Some(item) = production.collection_item() {
                    resolved.element_type(item)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_symbols(symbols: &[Symbol], resolved: &ResolvedGrammar) -> CompileResult<()> {
    for symbol in symbols {
        match symbol {
            Symbol::NonTerminal(nt) => {
                resolved.element_type(nt)?;
            }
            Symbol::Terminal(_) => {}
            Symbol::Group(inner) => validate_symbols(inner, resolved)?,
            Symbol::Alternative(groups) => {
                if !is_constant_alternative(groups) {
                    return Err(CompileError::semantic(
                        symbol.location(),
                        "Alternatives inside a sequence may only choose between literals.",
                    ));
                }
            }
            Symbol::Star(inner)
            | Symbol::Plus(inner)
            | Symbol::QuestionMark(inner)
            | Symbol::Structural(inner) => validate_symbols(std::slice::from_ref(&**inner), resolved)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_grammar_source;
    use crate::resolver::resolve;
    use crate::testing::Testable;

    fn check(source: &str) -> CompileResult<()> {
        let grammar = parse_grammar_source(source).test().assert_success();
        resolve(&grammar).and_then(|resolved| validate(&resolved))
    }

    #[test]
    fn test_valid_grammar() {
        check("grammar G; Doc : 'd' Item* ; Item : 'i' /* @name{value} */ STRING ;")
            .test()
            .assert_success();
    }

    #[test]
    fn test_undefined_reference() {
        check("grammar G; Doc : 'd' Missing ;")
            .test()
            .assert_failure_contains("Undefined type: 'Missing'");
        check("grammar G; Doc : 'd' /* @type{Nope} */ DICTIONARY ;")
            .test()
            .assert_failure_contains("Undefined type: 'Nope'");
    }

    #[test]
    fn test_alternation_over_non_class() {
        check("grammar G; Value : Color | Size ; Color : 'red' | 'blue' ; Size : 'big' NUMBER ;")
            .test()
            .assert_failure_contains("is not a class");
        check("grammar G; Value : Circle | Missing ; Circle : 'c' NUMBER ;")
            .test()
            .assert_failure_contains("Undefined type: 'Missing'");
    }

    #[test]
    fn test_nested_alternative_of_references() {
        check("grammar G; Doc : 'd' (A | B) ; A : 'a' NUMBER ; B : 'b' NUMBER ;")
            .test()
            .assert_failure_contains("only choose between literals");
        check("grammar G; Doc : 'd' ('+' | '-') NUMBER ;").test().assert_success();
    }
}
