use datamodel_gen::datamodel;
use datamodel_gen_model::plan::{ClassForm, ElementType};
use datamodel_gen_model::testing::Testable;
use datamodel_gen_model::{compile, Options};

#[test]
fn test_optional_enum_member() {
    datamodel! { "grammar Optional; Foo : 'a' Bar? ; Bar : 'b' ;" }

    let mut foo = optional::Foo::new();
    assert_eq!(foo.bar, None);
    foo.bar = Some(optional::Bar::B);
    assert_eq!(foo.to_string(), "a b");
    assert_eq!(foo.to_json(), r#"{"__type":"Foo","bar":"b"}"#);

    let model = compile("grammar Optional; Foo : 'a' Bar? ; Bar : 'b' ;", &Options::default())
        .test()
        .assert_success();
    let foo = model.class("Foo").expect("Foo is planned");
    assert_eq!(foo.properties.len(), 1);
    assert_eq!(foo.properties[0].element, ElementType::Enum("Bar".into()));
    assert!(!foo.properties[0].required);
    assert!(model.enumeration("Bar").is_some());
}

#[test]
fn test_alternative_of_classes() {
    datamodel! { "grammar Geometry; Shape : Circle | Square ; Circle : 'c' NUMBER ; Square : 's' NUMBER ;" }

    let shapes = [
        geometry::Shape::from(geometry::Circle::new()),
        geometry::Shape::from(geometry::Square::new()),
    ];
    let kinds: Vec<geometry::GeometryKind> = shapes.iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, vec![geometry::GeometryKind::Circle, geometry::GeometryKind::Square]);

    let model = compile(
        "grammar Geometry; Shape : Circle | Square ; Circle : 'c' NUMBER ; Square : 's' NUMBER ;",
        &Options::default(),
    )
    .test()
    .assert_success();
    let shape = model.class("Shape").expect("Shape is planned");
    assert!(shape.is_abstract);
    assert_eq!(shape.form, ClassForm::Abstract);
    for sub in ["Circle", "Square"] {
        let class = model.class(sub).expect("subclass is planned");
        assert!(!class.is_abstract);
        assert_eq!(class.super_class.as_deref(), Some("Shape"));
    }
}

#[test]
fn test_collection_display() {
    datamodel! { "grammar Labels; Tags : Tag* ; Tag : /* @name{text} */ ID ;" }

    let mut tags = labels::Tags::new();
    for text in ["tag1", "tag2"] {
        let mut id = labels::Identifier::new();
        id.value = text.to_string();
        let mut tag = labels::Tag::new();
        tag.text = Some(Box::new(id));
        tags.items.push(tag);
    }
    assert_eq!(tags.to_string(), "[tag1, tag2]");
    assert_eq!(labels::Tags::new().to_string(), "[]");
}

#[test]
fn test_dictionary_wrapper() {
    datamodel! { "grammar Settings; Doc : 'd' Props ; Props : /* @type{NUMBER} */ PROP_DICT ;" }

    let mut props = settings::Props::new();
    props.entries.insert("a", 1.0);
    props.entries.insert("b", 2.0);
    assert_eq!(props.to_json(), r#"{"__type":"DictionaryStringNumber","a":1,"b":2}"#);

    let decoded = settings::Props::from_json(&props.to_json()).expect("decoding failed");
    assert_eq!(decoded, props);
}

#[test]
fn test_mixed_alternative_is_rejected() {
    let err = compile(
        "grammar Mixed; Foo : 'a' | Bar ; Bar : 'b' NUMBER ;",
        &Options::default(),
    )
    .test()
    .assert_semantic_failure();
    assert_eq!(err.location().line, 1);
    assert!(err.to_string().contains("Foo"));
}
