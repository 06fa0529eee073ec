//! Visitor planning.
//!
//! Both visitor variants share one dispatch table: an arm per discriminant,
//! `None` excluded. Abstract discriminants get an arm too, so the table stays
//! total, but no live node ever carries one.

use crate::members::Members;
use crate::naming;
use crate::plan::*;

/// Name of the typed visit method for a class, e.g. `visit_string_value`.
pub fn visit_method(class: &str) -> String {
    format!("visit_{}", naming::snake(class))
}

/// Plans the read-only and the rewriting visitor.
pub fn plan_visitors(grammar_name: &str, members: &Members) -> (VisitorPlan, VisitorPlan) {
    let arms: Vec<DispatchArm> = members
        .kinds
        .members
        .iter()
        .filter(|kind| kind.as_str() != KindPlan::NONE)
        .map(|kind| DispatchArm {
            kind: kind.clone(),
            class: kind.clone(),
            method: visit_method(kind),
            is_abstract: members
                .classes
                .iter()
                .any(|c| &c.name == kind && c.is_abstract),
        })
        .collect();

    let mut methods: Vec<VisitMethod> = members.classes.iter().map(class_method).collect();
    methods.extend(members.dictionaries.iter().map(dictionary_method));

    let grammar = naming::pascal(grammar_name);
    let read_only = VisitorPlan {
        name: format!("{}Visitor", grammar),
        rewriting: false,
        arms: arms.clone(),
        methods: methods.clone(),
    };
    let rewriting = VisitorPlan {
        name: format!("{}RewritingVisitor", grammar),
        rewriting: true,
        arms,
        methods,
    };
    log::trace!("planned visitors with {} dispatch arms", read_only.arms.len());
    (read_only, rewriting)
}

fn class_method(class: &ClassPlan) -> VisitMethod {
    let body = if class.is_abstract {
        VisitBody::CastThrough {
            subclasses: class
                .subclasses
                .iter()
                .map(|sub| (sub.clone(), visit_method(sub)))
                .collect(),
        }
    } else {
        VisitBody::Properties(
            class
                .properties
                .iter()
                .filter(|p| p.is_visited())
                .map(|p| VisitStep {
                    property: p.name.clone(),
                    element: p.element.clone(),
                    cardinality: p.cardinality,
                })
                .collect(),
        )
    };
    VisitMethod {
        class: class.name.clone(),
        method: visit_method(&class.name),
        body,
    }
}

fn dictionary_method(dictionary: &DictionaryPlan) -> VisitMethod {
    let value = dictionary.value_type();
    let body = if value.is_node() {
        VisitBody::DictionaryValues {
            element: value.clone(),
        }
    } else {
        VisitBody::Properties(Vec::new())
    };
    VisitMethod {
        class: dictionary.name.clone(),
        method: visit_method(&dictionary.name),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::members::synthesize;
    use crate::parser::parse_grammar_source;
    use crate::resolver::resolve;
    use crate::testing::Testable;

    fn visitors(source: &str) -> (VisitorPlan, VisitorPlan) {
        let grammar = parse_grammar_source(source).test().assert_success();
        let resolved = resolve(&grammar).test().assert_success();
        let members = synthesize(&resolved, &Options::default()).test().assert_success();
        plan_visitors(&grammar.name, &members)
    }

    #[test]
    fn test_dispatch_table_covers_every_kind() {
        let (visitor, rewriting) = visitors(
            "grammar Drawing; Doc : 'd' Shape* Props ; Shape : Circle | Square ;
             Circle : 'c' NUMBER ; Square : 's' NUMBER ; Props : /* @type{Circle} */ DICTIONARY ;",
        );
        assert_eq!(visitor.name, "DrawingVisitor");
        assert_eq!(rewriting.name, "DrawingRewritingVisitor");
        assert!(rewriting.rewriting);
        assert_eq!(visitor.arms, rewriting.arms);
        let kinds: Vec<&str> = visitor.arms.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["Circle", "DictionaryStringCircle", "Doc", "Identifier", "Shape", "Square"]
        );
        assert!(visitor.arm("Shape").map(|a| a.is_abstract).unwrap_or(false));
        assert_eq!(visitor.arm("Identifier").map(|a| a.method.as_str()), Some("visit_identifier"));
    }

    #[test]
    fn test_visit_steps() {
        let (visitor, _) = visitors(
            "grammar G; Doc : 'd' Shape* Props /* @name{title} */ STRING ; Shape : Circle | Square ;
             Circle : 'c' NUMBER ; Square : 's' NUMBER ; Props : /* @type{Circle} */ DICTIONARY ;",
        );
        let doc = visitor.methods.iter().find(|m| m.class == "Doc").expect("Doc method");
        match &doc.body {
            VisitBody::Properties(steps) => {
                let names: Vec<&str> = steps.iter().map(|s| s.property.as_str()).collect();
                assert_eq!(names, vec!["Shape", "Props"]);
                assert_eq!(steps[0].cardinality, Cardinality::List);
                assert_eq!(steps[0].element, ElementType::Base("Shape".into()));
                assert_eq!(steps[1].element, ElementType::Dictionary("DictionaryStringCircle".into()));
            }
            other => panic!("Expected property steps, got {:?}", other),
        }

        let shape = visitor.methods.iter().find(|m| m.class == "Shape").expect("Shape method");
        assert!(matches!(&shape.body, VisitBody::CastThrough { subclasses } if subclasses.len() == 2));

        let props = visitor
            .methods
            .iter()
            .find(|m| m.class == "DictionaryStringCircle")
            .expect("dictionary method");
        assert!(matches!(&props.body, VisitBody::DictionaryValues { element } if *element == ElementType::Class("Circle".into())));
    }
}
