extern crate proc_macro;

use datamodel_gen_model::{compile, generate_rust, Options};
use derive_syn_parse::Parse;
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use std::path::PathBuf;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Ident, Lit, LitStr, Result, Token};

/// `name = literal`
#[derive(Parse)]
struct Setting {
    name: Ident,
    _eq: Token![=],
    value: Lit,
}

struct DataModelInput {
    settings: Vec<Setting>,
    source: Option<LitStr>,
}

impl Parse for DataModelInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut settings = Vec::new();
        let mut source = None;
        while !input.is_empty() {
            if input.peek(Ident) && input.peek2(Token![=]) {
                settings.push(input.parse()?);
            } else if source.is_none() {
                source = Some(input.parse()?);
            } else {
                return Err(input.error("expected a single grammar string"));
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(Self { settings, source })
    }
}

/// Where the grammar text comes from.
enum GrammarSource {
    Inline(LitStr),
    File { lit: LitStr, path: PathBuf },
}

impl GrammarSource {
    fn span(&self) -> Span {
        match self {
            GrammarSource::Inline(lit) | GrammarSource::File { lit, .. } => lit.span(),
        }
    }

    fn read(&self) -> Result<String> {
        match self {
            GrammarSource::Inline(lit) => Ok(lit.value()),
            GrammarSource::File { lit, path } => std::fs::read_to_string(path).map_err(|e| {
                syn::Error::new(lit.span(), format!("cannot read '{}': {}", path.display(), e))
            }),
        }
    }
}

fn bool_setting(setting: &Setting) -> Result<bool> {
    match &setting.value {
        Lit::Bool(b) => Ok(b.value),
        other => Err(syn::Error::new(
            other.span(),
            format!("'{}' expects `true` or `false`", setting.name),
        )),
    }
}

fn configure(input: DataModelInput) -> Result<(Options, GrammarSource)> {
    let mut options = Options::new();
    let mut source = input.source.map(GrammarSource::Inline);
    for setting in &input.settings {
        match setting.name.to_string().as_str() {
            "locations" => options = options.generate_locations(bool_setting(setting)?),
            "verbose" => options = options.verbose(bool_setting(setting)?),
            "file" => {
                let Lit::Str(lit) = &setting.value else {
                    return Err(syn::Error::new(setting.value.span(), "'file' expects a path string"));
                };
                let root = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
                source = Some(GrammarSource::File {
                    lit: lit.clone(),
                    path: PathBuf::from(root).join(lit.value()),
                });
            }
            other => {
                return Err(syn::Error::new(
                    setting.name.span(),
                    format!("unknown setting '{}'", other),
                ))
            }
        }
    }
    let source = source.ok_or_else(|| {
        syn::Error::new(Span::call_site(), "expected a grammar string or `file = \"...\"`")
    })?;
    Ok((options, source))
}

/// Generates the object model of an annotated EBNF grammar.
///
/// The grammar is given inline or read from a file relative to the crate
/// root. `locations = true` adds `offset`/`length` members to every concrete
/// node type.
///
/// # Example
///
/// ```rust
/// use datamodel_gen::datamodel;
///
/// datamodel! {
///     "grammar Shapes;
///      Shape : Circle | Square ;
///      Circle : 'circle' NUMBER ;
///      Square : 'square' NUMBER ;"
/// }
///
/// let circle = shapes::Circle::new();
/// assert_eq!(circle.kind(), shapes::ShapesKind::Circle);
/// ```
#[proc_macro]
pub fn datamodel(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DataModelInput);
    let (options, source) = match configure(input) {
        Ok(configured) => configured,
        Err(e) => return e.to_compile_error().into(),
    };
    let text = match source.read() {
        Ok(text) => text,
        Err(e) => return e.to_compile_error().into(),
    };

    let generated = compile(&text, &options).and_then(|model| generate_rust(&model));
    let module = match generated {
        Ok(stream) => stream,
        Err(e) => return syn::Error::new(source.span(), e.to_string()).to_compile_error().into(),
    };

    // Rebuild when the grammar file changes.
    let tracked = match &source {
        GrammarSource::File { path, .. } => {
            let path = path.display().to_string();
            quote!(const _: &str = include_str!(#path);)
        }
        GrammarSource::Inline(_) => quote!(),
    };
    quote! {
        #tracked
        #module
    }
    .into()
}
