//! Renderers turning a [`DataModel`] into output text or tokens.

mod class;
mod json;
mod node;
mod visitor;

use crate::error::{CompileError, CompileResult};
use crate::location::SourceLocation;
use crate::naming;
use crate::plan::*;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

/// Turns emission plans into one output artifact.
pub trait Renderer {
    type Output;

    fn render(&self, model: &DataModel) -> CompileResult<Self::Output>;
}

/// Renders the object model as one Rust module.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustRenderer;

impl Renderer for RustRenderer {
    type Output = TokenStream;

    fn render(&self, model: &DataModel) -> CompileResult<TokenStream> {
        generate_rust(model)
    }
}

/// Renders the JSON-Schema document as pretty-printed text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaRenderer;

impl Renderer for SchemaRenderer {
    type Output = String;

    fn render(&self, model: &DataModel) -> CompileResult<String> {
        Ok(model.schema.to_pretty_string())
    }
}

/// Identifiers shared by every generated item.
pub(crate) struct Names {
    pub kind: Ident,
    pub node: Ident,
    pub node_ref: Ident,
}

impl Names {
    fn new(model: &DataModel) -> CompileResult<Self> {
        Ok(Self {
            kind: ident(&model.kinds.name)?,
            node: ident(&model.nodes.name)?,
            node_ref: ident(&model.nodes.ref_name)?,
        })
    }
}

pub fn generate_rust(model: &DataModel) -> CompileResult<TokenStream> {
    let module = ident(&model.module_name())?;
    let names = Names::new(model)?;
    let grammar_name = &model.grammar_name;
    let schema = model.schema.to_pretty_string();
    let namespace_doc = model
        .namespace
        .as_ref()
        .map(|ns| format!(" Namespace `{}`.", ns))
        .unwrap_or_default();
    let module_doc = format!(" Object model for the `{}` grammar.{}", grammar_name, namespace_doc);

    let kinds = node::generate_kinds(&model.kinds)?;
    let classes = model
        .classes
        .iter()
        .map(|c| class::generate_class(c, &names))
        .collect::<CompileResult<Vec<_>>>()?;
    let enums = model
        .enums
        .iter()
        .map(|e| class::generate_enum(e, &names))
        .collect::<CompileResult<Vec<_>>>()?;
    let dictionaries = model
        .dictionaries
        .iter()
        .map(|d| class::generate_dictionary(d, &names))
        .collect::<CompileResult<Vec<_>>>()?;
    let nodes = node::generate_nodes(model, &names)?;
    let visitor = visitor::generate_visitor(&model.visitor, &names)?;
    let rewriting_visitor = visitor::generate_rewriting_visitor(&model.rewriting_visitor, &names)?;
    let serializer = json::generate_serializer(&model.serializer, model)?;

    log::debug!(
        "rendered module '{}' from {} plans",
        model.module_name(),
        model.plans().len()
    );
    Ok(quote! {
        #[doc = #module_doc]
        pub mod #module {
            #![allow(dead_code, unused_imports, unused_variables, unused_mut, clippy::all)]

            use ::datamodel_gen::rt;

            pub const GRAMMAR_NAME: &str = #grammar_name;

            /// JSON-Schema (draft-04) of the documents this module encodes.
            pub const JSON_SCHEMA: &str = #schema;

            #kinds
            #(#classes)*
            #(#enums)*
            #(#dictionaries)*
            #nodes
            #visitor
            #rewriting_visitor
            #serializer
        }
    })
}

/// A Rust identifier for a generated name. Keywords become raw identifiers.
pub(crate) fn ident(name: &str) -> CompileResult<Ident> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_";
    if !valid {
        return Err(CompileError::semantic(
            SourceLocation::default(),
            format!("'{}' is not a valid Rust identifier.", name),
        ));
    }
    if syn::parse_str::<syn::Ident>(name).is_ok() {
        return Ok(Ident::new(name, Span::call_site()));
    }
    match name {
        "self" | "super" | "crate" | "Self" => Ok(Ident::new(&format!("{}_", name), Span::call_site())),
        _ => Ok(Ident::new_raw(name, Span::call_site())),
    }
}

/// The struct field of a property.
pub(crate) fn field_ident(property: &PropertyPlan) -> CompileResult<Ident> {
    ident(&naming::snake(&property.name))
}

/// The Rust type of one element.
pub(crate) fn element_type(element: &ElementType) -> CompileResult<TokenStream> {
    Ok(match element {
        ElementType::String | ElementType::Uri => quote!(::std::string::String),
        ElementType::Number => quote!(f64),
        ElementType::Integer => quote!(i64),
        ElementType::Boolean => quote!(bool),
        ElementType::Identifier
        | ElementType::Enum(_)
        | ElementType::Class(_)
        | ElementType::Base(_)
        | ElementType::Dictionary(_) => {
            let name = ident(&element.label())?;
            quote!(#name)
        }
    })
}

/// The Rust type of a property: lists are vectors, singular nodes are boxed
/// and nullable, optional scalars are nullable.
pub(crate) fn field_type(property: &PropertyPlan) -> CompileResult<TokenStream> {
    let element = element_type(&property.element)?;
    Ok(if property.is_list() {
        quote!(::std::vec::Vec<#element>)
    } else if property.element.is_node() {
        quote!(::std::option::Option<::std::boxed::Box<#element>>)
    } else if !property.required {
        quote!(::std::option::Option<#element>)
    } else {
        element
    })
}

pub(crate) fn doc(text: Option<&String>) -> TokenStream {
    match text {
        Some(text) => {
            let text = format!(" {}", naming::collapse_whitespace(text));
            quote!(#[doc = #text])
        }
        None => quote!(),
    }
}

// --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::testing::Testable;

    fn normalize(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn render(source: &str, options: Options) -> String {
        let model = crate::compile(source, &options).test().assert_success();
        let tokens = RustRenderer.render(&model).test().assert_success();
        if let Err(e) = syn::parse2::<syn::File>(tokens.clone()) {
            panic!("generated code does not parse: {}\n{}", e, tokens);
        }
        normalize(&tokens.to_string())
    }

    const DRAWING: &str = "grammar Drawing;
        Doc : 'doc' /* @name{title} */ STRING Shape* Tags? Props ;
        Shape : Circle | Polygon ;
        Polygon : Square | Triangle ;
        Circle : 'circle' /* @name{radius} */ NUMBER Color? ;
        Square : 'square' /* @name{side} */ INTEGER ;
        Triangle : 'triangle' /* @name{type} */ STRING ;
        Color : 'red' | 'dark-green' | '+' ;
        Tags : Tag* ;
        Tag : /* @name{label} */ ID ;
        Props : /* @type{NUMBER} */ DICTIONARY ;";

    #[test]
    fn test_module_structure() {
        let s = render(DRAWING, Options::default());
        assert!(s.contains("pubmoddrawing{"));
        assert!(s.contains("pubconstGRAMMAR_NAME:&str=\"Drawing\""));
        assert!(s.contains("pubconstJSON_SCHEMA:&str="));
        assert!(s.contains("use::datamodel_gen::rt;"));
        assert!(s.contains(
            "pubenumDrawingKind{#[default]None,Circle,DictionaryStringNumber,Doc,Identifier,Polygon,Shape,Square,Tag,Tags,Triangle,}"
        ));
    }

    #[test]
    fn test_classes_and_fields() {
        let s = render(DRAWING, Options::default());
        assert!(s.contains("pubstructCircle{kind:DrawingKind,pubradius:f64,pubcolor:::std::option::Option<Color>,}"));
        assert!(s.contains("pubstructDoc{kind:DrawingKind,pubtitle:::std::string::String,pubshape:::std::vec::Vec<Shape>,pubtags:::std::option::Option<::std::boxed::Box<Tags>>,pubprops:::std::option::Option<::std::boxed::Box<DictionaryStringNumber>>,}"));
        assert!(s.contains("pubr#type:::std::string::String"));
        assert!(s.contains("pubtypeProps=DictionaryStringNumber;"));
        assert!(s.contains("\"radius\"=>match<f64asrt::FromValue<DrawingNode>>::from_value(value)"));
        assert!(s.contains("_=>rt::set_base_property(name,value),"));
    }

    #[test]
    fn test_bases_and_enums() {
        let s = render(DRAWING, Options::default());
        assert!(s.contains("pubenumShape{Circle(Circle),Polygon(Polygon),}"));
        assert!(s.contains("DrawingNode::Square(n)=>::std::option::Option::Some(Self::from(Polygon::from(n)))"));
        assert!(s.contains("pubenumColor{#[default]Red,DarkGreen,Member2,}"));
        assert!(s.contains("Self::DarkGreen=>\"dark-green\""));
    }

    #[test]
    fn test_visitors() {
        let s = render(DRAWING, Options::default());
        assert!(s.contains("pubtraitDrawingVisitor<'ast,T>:SizedwhereT:::std::convert::From<DrawingNodeRef<'ast>>"));
        assert!(s.contains("fnvisit_circle(&mutself,node:&'astCircle)->T"));
        assert!(s.contains("pubtraitDrawingRewritingVisitor:Sized"));
        assert!(s.contains("node.shape=node.shape.into_iter().filter_map(|child|rt::rewritten::<DrawingNode,Shape>(self.visit(DrawingNode::from(child)))).collect();"));
        assert!(s.contains("impl::std::convert::From<Shape>forDrawingNode{fnfrom(node:Shape)->Self{matchnode{Shape::Circle(n)=>Self::from(n),Shape::Polygon(n)=>Self::from(n),}}}"));
        assert!(s.contains("impl<'a>::std::convert::From<DrawingNodeRef<'a>>for(){"));
    }

    #[test]
    fn test_locations_are_serialized() {
        let s = render("grammar G; Doc : 'd' STRING ;", Options::new().generate_locations(true));
        assert!(s.contains("pubstructDoc{kind:GKind,pubstring:::std::string::String,puboffset:i64,publength:i64,}"));
        assert!(s.contains("writer.write_location(self.offset,self.length);"));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(ident("Circle").test().assert_success().to_string(), "Circle");
        assert_eq!(ident("type").test().assert_success().to_string(), "r#type");
        assert_eq!(ident("self").test().assert_success().to_string(), "self_");
        ident("dark-green").test().assert_failure_contains("not a valid Rust identifier");
        ident("1st").test().assert_semantic_failure();
    }

    #[test]
    fn test_schema_renderer() {
        let model = crate::compile(DRAWING, &Options::default()).test().assert_success();
        let schema = SchemaRenderer.render(&model).test().assert_success();
        assert!(schema.starts_with("{\n  \"$schema\": \"http://json-schema.org/draft-04/schema#\""));
    }
}
