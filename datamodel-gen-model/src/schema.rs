//! JSON-Schema (draft-04) generation.
//!
//! The root production is inlined at the top of the document; every other
//! class, collection and abstract base lives under `definitions`. References
//! to the root point at the document itself (`#`). Value enums and
//! dictionaries are inlined where they are used.

use crate::members::Members;
use crate::naming;
use crate::plan::*;
use crate::resolver::ResolvedGrammar;
use serde_json::{json, Map, Value};

pub const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";
pub const TYPE_KEY: &str = "__type";

pub fn plan_schema(resolved: &ResolvedGrammar, members: &Members) -> SchemaPlan {
    let root_class = resolved
        .root
        .as_deref()
        .map(|production| resolved.class_name(production));
    let builder = SchemaBuilder {
        members,
        root: root_class.as_deref(),
    };

    let mut document = Map::new();
    document.insert("$schema".into(), json!(DRAFT_04));
    document.insert("title".into(), json!(resolved.grammar.name));
    if let Some(summary) = resolved.grammar.annotations.value("summary") {
        document.insert("description".into(), json!(naming::collapse_whitespace(summary)));
    }

    let mut definitions = Map::new();
    for class in &members.classes {
        let definition = builder.class(class);
        if Some(&class.name) == root_class.as_ref() {
            if let Value::Object(fields) = definition {
                for (key, value) in fields {
                    document.entry(key).or_insert(value);
                }
            }
        } else {
            definitions.insert(class.name.clone(), definition);
        }
    }
    if !definitions.is_empty() {
        document.insert("definitions".into(), Value::Object(definitions));
    }

    log::trace!("schema root: {:?}", root_class);
    SchemaPlan {
        document: Value::Object(document),
    }
}

struct SchemaBuilder<'m> {
    members: &'m Members,
    root: Option<&'m str>,
}

impl SchemaBuilder<'_> {
    fn class(&self, class: &ClassPlan) -> Value {
        let mut definition = Map::new();
        if let Some(summary) = &class.summary {
            definition.insert("description".into(), json!(naming::collapse_whitespace(summary)));
        }
        if class.is_abstract {
            let choices: Vec<Value> = class.subclasses.iter().map(|sub| self.reference(sub)).collect();
            definition.insert("oneOf".into(), Value::Array(choices));
            return Value::Object(definition);
        }

        let mut properties = Map::new();
        properties.insert(TYPE_KEY.into(), json!({ "enum": [class.name] }));
        let mut required = vec![json!(TYPE_KEY)];
        for property in &class.properties {
            properties.insert(property.serialized_name.clone(), self.property(property));
            if property.required {
                required.push(json!(property.serialized_name));
            }
        }
        definition.insert("type".into(), json!("object"));
        definition.insert("properties".into(), Value::Object(properties));
        definition.insert("required".into(), Value::Array(required));
        definition.insert("additionalProperties".into(), json!(false));
        Value::Object(definition)
    }

    fn property(&self, property: &PropertyPlan) -> Value {
        let element = self.element(&property.element);
        let mut schema = if property.is_list() {
            let mut array = Map::new();
            array.insert("type".into(), json!("array"));
            array.insert("items".into(), element);
            if let Some(min_items) = property.facets.min_items {
                array.insert("minItems".into(), json!(min_items));
            }
            array
        } else if !property.required {
            nullable(element)
        } else {
            match element {
                Value::Object(map) => map,
                other => Map::from_iter([("allOf".to_string(), Value::Array(vec![other]))]),
            }
        };

        if let Some(summary) = &property.summary {
            schema.insert("description".into(), json!(naming::collapse_whitespace(summary)));
        }
        if let Some(pattern) = &property.facets.pattern {
            schema.insert("pattern".into(), json!(pattern));
        }
        if let Some(minimum) = &property.facets.minimum {
            schema.insert("minimum".into(), literal(minimum));
        }
        if let Some(default) = &property.facets.default {
            schema.insert("default".into(), literal(default));
        }
        Value::Object(schema)
    }

    fn element(&self, element: &ElementType) -> Value {
        match element {
            ElementType::String => json!({ "type": "string" }),
            // Identifiers are encoded as objects carrying their text and location.
            ElementType::Identifier => self.reference(&element.label()),
            ElementType::Uri => json!({ "type": "string", "format": "uri" }),
            ElementType::Number => json!({ "type": "number" }),
            ElementType::Integer => json!({ "type": "integer" }),
            ElementType::Boolean => json!({ "type": "boolean" }),
            ElementType::Enum(name) => {
                let literals: Vec<&str> = self
                    .members
                    .enums
                    .iter()
                    .find(|e| &e.name == name)
                    .map(|e| e.members.iter().map(|m| m.literal.as_str()).collect())
                    .unwrap_or_default();
                json!({ "type": "string", "enum": literals })
            }
            ElementType::Class(name) | ElementType::Base(name) => self.reference(name),
            ElementType::Dictionary(name) => {
                let value = self
                    .members
                    .dictionaries
                    .iter()
                    .find(|d| &d.name == name)
                    .map(|d| self.element(d.value_type()))
                    .unwrap_or_else(|| json!({ "type": "string" }));
                json!({
                    "type": "object",
                    "properties": { TYPE_KEY: { "enum": [name] } },
                    "additionalProperties": value,
                })
            }
        }
    }

    fn reference(&self, class: &str) -> Value {
        if self.root == Some(class) {
            json!({ "$ref": "#" })
        } else {
            json!({ "$ref": format!("#/definitions/{}", class) })
        }
    }
}

/// Optional members are written as `null` when absent.
fn nullable(element: Value) -> Map<String, Value> {
    match element {
        Value::Object(mut map) => match map.get("type").cloned() {
            Some(Value::String(ty)) if !map.contains_key("enum") => {
                map.insert("type".into(), json!([ty, "null"]));
                map
            }
            _ => Map::from_iter([(
                "oneOf".to_string(),
                json!([Value::Object(map), { "type": "null" }]),
            )]),
        },
        other => Map::from_iter([("oneOf".to_string(), json!([other, { "type": "null" }]))]),
    }
}

/// Annotation values are JSON when they parse as JSON, strings otherwise.
fn literal(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::members::synthesize;
    use crate::parser::parse_grammar_source;
    use crate::resolver::resolve;
    use crate::testing::Testable;

    fn schema(source: &str) -> Value {
        let grammar = parse_grammar_source(source).test().assert_success();
        let resolved = resolve(&grammar).test().assert_success();
        let members = synthesize(&resolved, &Options::default()).test().assert_success();
        plan_schema(&resolved, &members).document
    }

    #[test]
    fn test_root_is_inlined() {
        let doc = schema(
            "/* @summary{Shapes   and more} */ grammar Drawing;
             Doc : 'doc' /* @name{title} @summary{The title.} */ STRING Shape* ;
             Shape : Circle | Square ;
             Circle : 'c' /* @name{radius} @minimum{0} */ NUMBER ;
             Square : 's' /* @name{side} */ INTEGER ;",
        );
        assert_eq!(doc["$schema"], DRAFT_04);
        assert_eq!(doc["title"], "Drawing");
        assert_eq!(doc["description"], "Shapes and more");
        assert_eq!(doc["type"], "object");
        assert_eq!(doc["additionalProperties"], false);
        assert_eq!(doc["properties"]["title"]["type"], "string");
        assert_eq!(doc["properties"]["title"]["description"], "The title.");
        assert_eq!(doc["properties"]["shape"]["type"], "array");
        assert_eq!(doc["properties"]["shape"]["items"]["$ref"], "#/definitions/Shape");
        assert_eq!(doc["required"], json!(["__type", "title"]));
        assert!(doc["definitions"].get("Doc").is_none());

        let definitions = &doc["definitions"];
        assert_eq!(
            definitions["Shape"]["oneOf"],
            json!([{ "$ref": "#/definitions/Circle" }, { "$ref": "#/definitions/Square" }])
        );
        assert_eq!(definitions["Circle"]["properties"]["radius"]["type"], "number");
        assert_eq!(definitions["Circle"]["properties"]["radius"]["minimum"], 0);
        assert_eq!(definitions["Square"]["properties"]["side"]["type"], "integer");
    }

    #[test]
    fn test_canonical_types() {
        let doc = schema(
            "grammar G; Doc : 'd' /* @name{home} */ URI /* @name{id} */ ID /* @name{flag} */ BOOLEAN
             Color? Props /* @name{tags} @minItems{2} */ STRING+ ;
             Color : 'red' | 'blue' ; Props : /* @type{NUMBER} */ DICTIONARY ;",
        );
        let properties = &doc["properties"];
        assert_eq!(properties["home"], json!({ "type": "string", "format": "uri" }));
        assert_eq!(properties["id"]["$ref"], "#/definitions/Identifier");
        assert_eq!(doc["definitions"]["Identifier"]["properties"]["value"]["type"], "string");
        assert_eq!(properties["flag"]["type"], "boolean");
        assert_eq!(
            properties["color"],
            json!({ "oneOf": [{ "type": "string", "enum": ["red", "blue"] }, { "type": "null" }] })
        );
        assert_eq!(properties["props"]["type"], "object");
        assert_eq!(properties["props"]["additionalProperties"]["type"], "number");
        assert_eq!(properties["tags"]["minItems"], 2);
    }

    #[test]
    fn test_root_annotation_selects_inlined_type() {
        let doc = schema("grammar G; Item : 'i' NUMBER ; /* @root */ Doc : 'd' Item* ;");
        assert_eq!(doc["properties"]["__type"]["enum"], json!(["Doc"]));
        assert!(doc["definitions"].get("Item").is_some());
    }

    /// Collects every `$ref` target in the document.
    fn references(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(target)) = map.get("$ref") {
                    out.push(target.clone());
                }
                map.values().for_each(|v| references(v, out));
            }
            Value::Array(items) => items.iter().for_each(|v| references(v, out)),
            _ => {}
        }
    }

    #[test]
    fn test_recursive_root_references_document() {
        let doc = schema(
            "grammar Calc; Expr : Num | Add ; Num : 'n' NUMBER ;
             Add : 'add' /* @name{left} */ Expr /* @name{right} */ Expr ;",
        );
        assert!(doc["definitions"].get("Expr").is_none());
        assert_eq!(doc["definitions"]["Add"]["properties"]["left"]["$ref"], "#");

        let mut targets = Vec::new();
        references(&doc, &mut targets);
        assert!(!targets.is_empty());
        for target in targets {
            let resolved = match target.strip_prefix("#/definitions/") {
                Some(name) => doc["definitions"].get(name).is_some(),
                None => target == "#",
            };
            assert!(resolved, "dangling reference {}", target);
        }
    }
}
