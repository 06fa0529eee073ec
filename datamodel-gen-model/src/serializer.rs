//! JSON encoding plan.
//!
//! Every concrete type writes `{"__type":"<Class>", ...}`. Location members
//! follow the type tag when the class generated them; all other members follow
//! in declaration order. Defaults are never omitted.

use crate::members::Members;
use crate::plan::*;

pub fn plan_serializer(members: &Members) -> SerializerPlan {
    let classes = members
        .classes
        .iter()
        .filter(|c| !c.is_abstract)
        .map(|class| JsonObjectPlan {
            class: class.name.clone(),
            type_name: class.name.clone(),
            write_locations: class.tracks_locations(),
            body: JsonBody::Entries(
                class
                    .properties
                    .iter()
                    .filter(|p| !p.is_location)
                    .map(|p| JsonEntry {
                        key: p.serialized_name.clone(),
                        property: p.name.clone(),
                    })
                    .collect(),
            ),
        });
    let dictionaries = members.dictionaries.iter().map(|dictionary| JsonObjectPlan {
        class: dictionary.name.clone(),
        type_name: dictionary.name.clone(),
        write_locations: false,
        body: JsonBody::DictionaryEntries,
    });
    SerializerPlan {
        objects: classes.chain(dictionaries).collect(),
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

    fn serializer(source: &str, options: Options) -> SerializerPlan {
        let grammar = parse_grammar_source(source).test().assert_success();
        let resolved = resolve(&grammar).test().assert_success();
        let members = synthesize(&resolved, &options).test().assert_success();
        plan_serializer(&members)
    }

    #[test]
    fn test_entries_in_declaration_order() {
        let plan = serializer(
            "grammar G; Doc : 'd' /* @name{title} */ STRING Color? Item* /* @name{count} */ INTEGER ;
             Color : 'red' | 'blue' ; Item : 'i' NUMBER ;",
            Options::default(),
        );
        let doc = plan.object("Doc").expect("Doc object");
        assert!(!doc.write_locations);
        match &doc.body {
            JsonBody::Entries(entries) => {
                let keys: Vec<(&str, &str)> = entries
                    .iter()
                    .map(|e| (e.key.as_str(), e.property.as_str()))
                    .collect();
                assert_eq!(
                    keys,
                    vec![
                        ("title", "Title"),
                        ("color", "Color"),
                        ("item", "Item"),
                        ("count", "Count"),
                    ]
                );
            }
            other => panic!("Expected entries, got {:?}", other),
        }
    }

    #[test]
    fn test_location_entries_are_not_members() {
        let plan = serializer("grammar G; Doc : 'd' STRING ;", Options::new().generate_locations(true));
        let doc = plan.object("Doc").expect("Doc object");
        assert!(doc.write_locations);
        assert!(matches!(&doc.body, JsonBody::Entries(entries) if entries.len() == 1));

        let plan = serializer(
            "grammar G; Doc : 'd' /* @name{offset} */ INTEGER ;",
            Options::new().generate_locations(true),
        );
        let doc = plan.object("Doc").expect("Doc object");
        assert!(!doc.write_locations);
        assert!(matches!(&doc.body, JsonBody::Entries(entries) if entries[0].key == "offset"));
    }

    #[test]
    fn test_dictionary_objects() {
        let plan = serializer(
            "grammar G; Doc : 'd' Props ; Props : /* @type{NUMBER} */ DICTIONARY ;",
            Options::default(),
        );
        let props = plan.object("DictionaryStringNumber").expect("dictionary object");
        assert_eq!(props.body, JsonBody::DictionaryEntries);
        assert!(plan.object("Identifier").is_some());
    }
}
