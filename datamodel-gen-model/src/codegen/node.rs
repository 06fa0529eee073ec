use super::{ident, Names};
use crate::error::CompileResult;
use crate::plan::*;
use proc_macro2::TokenStream;
use quote::quote;

pub fn generate_kinds(kinds: &KindPlan) -> CompileResult<TokenStream> {
    let name = ident(&kinds.name)?;
    let members = kinds
        .members
        .iter()
        .map(|m| ident(m))
        .collect::<CompileResult<Vec<_>>>()?;
    let texts = &kinds.members;
    let (first, rest) = match members.split_first() {
        Some((first, rest)) => (quote!(#[default] #first,), rest),
        None => (quote!(), &members[..]),
    };

    Ok(quote! {
        /// Discriminant of every node type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub enum #name {
            #first
            #(#rest,)*
        }

        impl #name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    #(Self::#members => #texts,)*
                }
            }
        }

        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    })
}

/// The owned node union, its borrowed twin and the factory used by decoding.
pub fn generate_nodes(model: &DataModel, names: &Names) -> CompileResult<TokenStream> {
    let Names { kind, node, node_ref } = names;
    let variants = model
        .nodes
        .variants
        .iter()
        .map(|v| ident(v))
        .collect::<CompileResult<Vec<_>>>()?;
    let type_names: Vec<String> = model
        .nodes
        .variants
        .iter()
        .map(|v| {
            model
                .serializer
                .object(v)
                .map_or_else(|| v.clone(), |o| o.type_name.clone())
        })
        .collect();

    let base_refs = model
        .classes
        .iter()
        .filter(|c| c.is_abstract)
        .map(|c| {
            let base = ident(&c.name)?;
            let subclasses = c
                .subclasses
                .iter()
                .map(|s| ident(s))
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(quote! {
                impl ::std::convert::From<#base> for #node {
                    fn from(node: #base) -> Self {
                        match node {
                            #(#base::#subclasses(n) => Self::from(n),)*
                        }
                    }
                }

                impl<'a> ::std::convert::From<&'a #base> for #node_ref<'a> {
                    fn from(node: &'a #base) -> Self {
                        match node {
                            #(#base::#subclasses(n) => Self::from(n),)*
                        }
                    }
                }
            })
        })
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(quote! {
        /// Any concrete node.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum #node {
            #(#variants(#variants),)*
        }

        impl #node {
            pub fn kind(&self) -> #kind {
                match self {
                    #(Self::#variants(n) => n.kind(),)*
                }
            }

            pub fn to_json(&self) -> ::std::string::String {
                rt::to_json(self)
            }

            pub fn from_json(text: &str) -> ::std::result::Result<Self, rt::DecodeError> {
                rt::from_json::<Self, Self>(text)
            }
        }

        #(
            impl ::std::convert::From<#variants> for #node {
                fn from(node: #variants) -> Self {
                    Self::#variants(node)
                }
            }
        )*

        impl rt::SyntaxNode for #node {
            type Kind = #kind;

            fn kind(&self) -> #kind {
                #node::kind(self)
            }

            fn create(type_name: &str) -> ::std::option::Option<Self> {
                match type_name {
                    #(#type_names => ::std::option::Option::Some(Self::#variants(#variants::new())),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_property(&mut self, name: &str, value: rt::Value<Self>) -> bool {
                match self {
                    #(Self::#variants(n) => n.set_property(name, value),)*
                }
            }
        }

        impl rt::FromValue<#node> for #node {
            fn from_value(value: rt::Value<#node>) -> ::std::option::Option<Self> {
                match value {
                    rt::Value::Node(n) => ::std::option::Option::Some(n),
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::std::fmt::Display for #node {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(Self::#variants(n) => ::std::fmt::Display::fmt(n, f),)*
                }
            }
        }

        impl rt::WriteJson for #node {
            fn write_json(&self, writer: &mut rt::JsonWriter) {
                match self {
                    #(Self::#variants(n) => rt::WriteJson::write_json(n, writer),)*
                }
            }
        }

        /// A borrowed node, as handed to visitors.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum #node_ref<'a> {
            #(#variants(&'a #variants),)*
        }

        impl<'a> #node_ref<'a> {
            pub fn kind(&self) -> #kind {
                match self {
                    #(Self::#variants(n) => n.kind(),)*
                }
            }

            pub fn to_owned_node(&self) -> #node {
                match self {
                    #(Self::#variants(n) => #node::#variants(::std::clone::Clone::clone(*n)),)*
                }
            }
        }

        #(
            impl<'a> ::std::convert::From<&'a #variants> for #node_ref<'a> {
                fn from(node: &'a #variants) -> Self {
                    Self::#variants(node)
                }
            }
        )*

        #(#base_refs)*

        impl<'a> ::std::convert::From<&'a #node> for #node_ref<'a> {
            fn from(node: &'a #node) -> Self {
                match node {
                    #(#node::#variants(n) => Self::#variants(n),)*
                }
            }
        }

        impl<'a> ::std::convert::From<#node_ref<'a>> for () {
            fn from(_: #node_ref<'a>) -> Self {}
        }
    })
}
