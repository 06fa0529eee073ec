use super::{doc, element_type, field_ident, field_type, ident, Names};
use crate::error::CompileResult;
use crate::naming;
use crate::plan::*;
use proc_macro2::{Ident, TokenStream};
use quote::quote;

/// A field together with its plan.
struct Field<'p> {
    ident: Ident,
    ty: TokenStream,
    plan: &'p PropertyPlan,
}

fn fields(class: &ClassPlan) -> CompileResult<Vec<Field<'_>>> {
    class
        .properties
        .iter()
        .map(|plan| {
            Ok(Field {
                ident: field_ident(plan)?,
                ty: field_type(plan)?,
                plan,
            })
        })
        .collect()
}

pub fn generate_class(class: &ClassPlan, names: &Names) -> CompileResult<TokenStream> {
    if class.is_abstract {
        generate_base(class, names)
    } else {
        generate_struct(class, names)
    }
}

fn generate_struct(class: &ClassPlan, names: &Names) -> CompileResult<TokenStream> {
    let name = ident(&class.name)?;
    let Names { kind, node, .. } = names;
    let fields = fields(class)?;
    let class_doc = doc(class.summary.as_ref());
    let remarks = class
        .remarks
        .as_ref()
        .map(|r| format!(" {}", naming::collapse_whitespace(r)))
        .map(|r| quote!(#[doc = ""] #[doc = #r]));

    let field_defs = fields.iter().map(|f| {
        let Field { ident, ty, plan } = f;
        let field_doc = doc(plan.summary.as_ref());
        quote! { #field_doc pub #ident: #ty, }
    });
    let field_names: Vec<&Ident> = fields.iter().map(|f| &f.ident).collect();

    let setters = class
        .setters
        .iter()
        .filter_map(|setter| fields.iter().find(|f| f.plan.name == setter.property).map(|f| (setter, f)))
        .map(|(setter, f)| {
            let key = &setter.key;
            let Field { ident, ty, .. } = f;
            quote! {
                #key => match <#ty as rt::FromValue<#node>>::from_value(value) {
                    ::std::option::Option::Some(v) => {
                        self.#ident = v;
                        true
                    }
                    ::std::option::Option::None => false,
                },
            }
        });

    let copies = fields.iter().map(|f| {
        let field = &f.ident;
        let value = match f.plan.copy_strategy() {
            CopyStrategy::ByValue if is_copy(&f.plan.element) => quote!(self.#field),
            CopyStrategy::ByValue => quote!(::std::clone::Clone::clone(&self.#field)),
            CopyStrategy::NullableDeep => quote! {
                self.#field
                    .as_ref()
                    .map(|v| ::std::boxed::Box::new(::std::clone::Clone::clone(&**v)))
            },
            CopyStrategy::Deep => quote!(self.#field.iter().cloned().collect()),
        };
        quote! { #field: #value, }
    });

    let equalities = fields.iter().map(|f| {
        let field = &f.ident;
        match f.plan.equality_strategy() {
            EqualityStrategy::Value if f.plan.element == ElementType::Number => {
                quote!(self.#field.to_bits() == other.#field.to_bits())
            }
            EqualityStrategy::Value => quote!(self.#field == other.#field),
            EqualityStrategy::NullSafe | EqualityStrategy::Structural => {
                quote!(rt::StructuralEq::structural_eq(&self.#field, &other.#field))
            }
        }
    });

    let hashes = fields.iter().map(|f| {
        let field = &f.ident;
        match f.plan.equality_strategy() {
            EqualityStrategy::Value if f.plan.element == ElementType::Number => {
                quote!(self.#field.to_bits())
            }
            EqualityStrategy::Value => quote!(self.#field as u64),
            EqualityStrategy::NullSafe | EqualityStrategy::Structural => {
                quote!(rt::StructuralHash::structural_hash(&self.#field))
            }
        }
    });

    let display = generate_display(class, &fields)?;

    Ok(quote! {
        #class_doc
        #remarks
        #[derive(Debug)]
        pub struct #name {
            kind: #kind,
            #(#field_defs)*
        }

        impl #name {
            pub fn new() -> Self {
                Self {
                    kind: #kind::#name,
                    #(#field_names: ::std::default::Default::default(),)*
                }
            }

            pub fn kind(&self) -> #kind {
                self.kind
            }

            /// Assigns a property by its serialized name.
            pub fn set_property(&mut self, name: &str, value: rt::Value<#node>) -> bool {
                match name {
                    #(#setters)*
                    _ => rt::set_base_property(name, value),
                }
            }
        }

        impl ::std::default::Default for #name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::clone::Clone for #name {
            fn clone(&self) -> Self {
                Self {
                    kind: self.kind,
                    #(#copies)*
                }
            }
        }

        impl rt::StructuralEq for #name {
            fn structural_eq(&self, other: &Self) -> bool {
                self.kind == other.kind #(&& #equalities)*
            }
        }

        impl ::std::cmp::PartialEq for #name {
            fn eq(&self, other: &Self) -> bool {
                rt::StructuralEq::structural_eq(self, other)
            }
        }

        impl ::std::cmp::Eq for #name {}

        impl rt::StructuralHash for #name {
            fn structural_hash(&self) -> u64 {
                let mut hash = rt::HASH_SEED;
                #(hash = rt::combine_hash(hash, #hashes);)*
                hash
            }
        }

        impl ::std::hash::Hash for #name {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                state.write_u64(rt::StructuralHash::structural_hash(self));
            }
        }

        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display
            }
        }

        impl rt::FromValue<#node> for #name {
            fn from_value(value: rt::Value<#node>) -> ::std::option::Option<Self> {
                match value {
                    rt::Value::Node(#node::#name(n)) => ::std::option::Option::Some(n),
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

fn is_copy(element: &ElementType) -> bool {
    matches!(
        element,
        ElementType::Number | ElementType::Integer | ElementType::Boolean | ElementType::Enum(_)
    )
}

fn generate_display(class: &ClassPlan, fields: &[Field<'_>]) -> CompileResult<TokenStream> {
    let field_of = |property: &str| fields.iter().find(|f| f.plan.name == property);
    Ok(match &class.display {
        DisplayPlan::Format { template, args } => {
            let args = args.iter().filter_map(|arg| {
                let f = field_of(&arg.property)?;
                let field = &f.ident;
                Some(match arg.style {
                    DisplayStyle::Numeric => quote!(self.#field.to_string()),
                    DisplayStyle::Plain => quote!(self.#field),
                    DisplayStyle::Nullable => {
                        let label = f.plan.element.label();
                        quote!(rt::display_or_null(&self.#field, #label))
                    }
                    DisplayStyle::List => match &arg.delimiter {
                        Some(delimiter) => quote!(rt::display_list_with(&self.#field, #delimiter)),
                        None => quote!(rt::display_list(&self.#field)),
                    },
                })
            });
            quote!(write!(f, #template #(, #args)*))
        }
        DisplayPlan::StringValue => match field_of(crate::members::STRING_VALUE) {
            Some(field) => {
                let field = &field.ident;
                quote!(f.write_str(&self.#field))
            }
            None => quote!(::std::result::Result::Ok(())),
        },
        DisplayPlan::Items { property } => match field_of(property) {
            Some(field) => {
                let field = &field.ident;
                quote!(f.write_str(&rt::display_list(&self.#field)))
            }
            None => quote!(f.write_str("[]")),
        },
        DisplayPlan::Delegate => quote!(::std::result::Result::Ok(())),
    })
}

/// Abstract bases are closed enums over their direct subclasses.
fn generate_base(class: &ClassPlan, names: &Names) -> CompileResult<TokenStream> {
    let name = ident(&class.name)?;
    let Names { kind, node, .. } = names;
    let class_doc = doc(class.summary.as_ref());
    let subclasses = class
        .subclasses
        .iter()
        .map(|s| ident(s))
        .collect::<CompileResult<Vec<_>>>()?;

    let leaves = class
        .leaves
        .iter()
        .map(|path| {
            let leaf = ident(&path.leaf)?;
            let mut value = quote!(n);
            for base in &path.via {
                let base = ident(base)?;
                value = quote!(#base::from(#value));
            }
            Ok(quote! {
                #node::#leaf(n) => ::std::option::Option::Some(Self::from(#value)),
            })
        })
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(quote! {
        #class_doc
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum #name {
            #(#subclasses(#subclasses),)*
        }

        impl #name {
            pub fn kind(&self) -> #kind {
                match self {
                    #(Self::#subclasses(n) => n.kind(),)*
                }
            }
        }

        #(
            impl ::std::convert::From<#subclasses> for #name {
                fn from(node: #subclasses) -> Self {
                    Self::#subclasses(node)
                }
            }
        )*

        impl rt::StructuralEq for #name {
            fn structural_eq(&self, other: &Self) -> bool {
                self == other
            }
        }

        impl rt::StructuralHash for #name {
            fn structural_hash(&self) -> u64 {
                match self {
                    #(Self::#subclasses(n) => rt::StructuralHash::structural_hash(n),)*
                }
            }
        }

        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(Self::#subclasses(n) => ::std::fmt::Display::fmt(n, f),)*
                }
            }
        }

        impl rt::WriteJson for #name {
            fn write_json(&self, writer: &mut rt::JsonWriter) {
                match self {
                    #(Self::#subclasses(n) => rt::WriteJson::write_json(n, writer),)*
                }
            }
        }

        impl rt::FromValue<#node> for #name {
            fn from_value(value: rt::Value<#node>) -> ::std::option::Option<Self> {
                match value {
                    rt::Value::Node(node) => match node {
                        #(#leaves)*
                        _ => ::std::option::Option::None,
                    },
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

pub fn generate_enum(plan: &EnumPlan, names: &Names) -> CompileResult<TokenStream> {
    let name = ident(&plan.name)?;
    let node = &names.node;
    let enum_doc = doc(plan.summary.as_ref());
    let members = plan
        .members
        .iter()
        .map(|m| ident(&m.name))
        .collect::<CompileResult<Vec<_>>>()?;
    let literals: Vec<&String> = plan.members.iter().map(|m| &m.literal).collect();
    let (first, rest) = match members.split_first() {
        Some((first, rest)) => (quote!(#[default] #first,), rest),
        None => (quote!(), &members[..]),
    };

    Ok(quote! {
        #enum_doc
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub enum #name {
            #first
            #(#rest,)*
        }

        impl #name {
            pub const ALL: &'static [#name] = &[#(#name::#members),*];

            /// The literal as written in the grammar.
            pub fn as_str(&self) -> &'static str {
                match self {
                    #(Self::#members => #literals,)*
                }
            }

            pub fn from_literal(text: &str) -> ::std::option::Option<Self> {
                match text {
                    #(#literals => ::std::option::Option::Some(Self::#members),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl rt::StructuralEq for #name {
            fn structural_eq(&self, other: &Self) -> bool {
                self == other
            }
        }

        impl rt::StructuralHash for #name {
            fn structural_hash(&self) -> u64 {
                *self as u64
            }
        }

        impl rt::WriteJson for #name {
            fn write_json(&self, writer: &mut rt::JsonWriter) {
                writer.write_string(self.as_str());
            }
        }

        impl rt::FromValue<#node> for #name {
            fn from_value(value: rt::Value<#node>) -> ::std::option::Option<Self> {
                match value {
                    rt::Value::String(text) => Self::from_literal(&text),
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

pub fn generate_dictionary(plan: &DictionaryPlan, names: &Names) -> CompileResult<TokenStream> {
    let name = ident(&plan.name)?;
    let Names { kind, node, .. } = names;
    let value = element_type(plan.value_type())?;
    let dictionary_doc = match (&plan.key_name, &plan.value_name) {
        (Some(key), Some(value)) => format!(" Maps {} to {}.", key, value),
        _ => format!(" Dictionary from `String` to `{}`.", plan.value_type().label()),
    };
    let summary = doc(plan.summary.as_ref());
    let aliases = plan
        .aliases
        .iter()
        .map(|alias| naming::pascal(alias))
        .filter(|alias| alias != &plan.name)
        .map(|alias| {
            let alias = ident(&alias)?;
            Ok(quote! { pub type #alias = #name; })
        })
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(quote! {
        #[doc = #dictionary_doc]
        #summary
        #[derive(Debug, Clone)]
        pub struct #name {
            kind: #kind,
            pub entries: rt::GrammarDictionary<#value>,
        }

        impl #name {
            pub fn new() -> Self {
                Self {
                    kind: #kind::#name,
                    entries: rt::GrammarDictionary::new(),
                }
            }

            pub fn kind(&self) -> #kind {
                self.kind
            }

            /// Every key is accepted; the value must have the entry type.
            pub fn set_property(&mut self, name: &str, value: rt::Value<#node>) -> bool {
                match <#value as rt::FromValue<#node>>::from_value(value) {
                    ::std::option::Option::Some(v) => {
                        self.entries.insert(name, v);
                        true
                    }
                    ::std::option::Option::None => false,
                }
            }
        }

        impl ::std::default::Default for #name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl rt::StructuralEq for #name {
            fn structural_eq(&self, other: &Self) -> bool {
                self.kind == other.kind && rt::StructuralEq::structural_eq(&self.entries, &other.entries)
            }
        }

        impl ::std::cmp::PartialEq for #name {
            fn eq(&self, other: &Self) -> bool {
                rt::StructuralEq::structural_eq(self, other)
            }
        }

        impl ::std::cmp::Eq for #name {}

        impl rt::StructuralHash for #name {
            fn structural_hash(&self) -> u64 {
                rt::StructuralHash::structural_hash(&self.entries)
            }
        }

        impl ::std::hash::Hash for #name {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                state.write_u64(rt::StructuralHash::structural_hash(self));
            }
        }

        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.entries, f)
            }
        }

        impl rt::FromValue<#node> for #name {
            fn from_value(value: rt::Value<#node>) -> ::std::option::Option<Self> {
                match value {
                    rt::Value::Node(#node::#name(n)) => ::std::option::Option::Some(n),
                    _ => ::std::option::Option::None,
                }
            }
        }

        #(#aliases)*
    })
}
