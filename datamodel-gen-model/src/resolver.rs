//! Type & shape resolution.
//!
//! Every production is classified into exactly one [`Shape`]. Classification
//! runs in two passes over an owned [`ResolverContext`]: first every LHS is
//! indexed (grammars may reference productions declared further down), then
//! each production is classified and the type tables are filled. The context
//! is finally frozen into an immutable [`ResolvedGrammar`].

use crate::builtins::{self, BuiltIn};
use crate::error::{CompileError, CompileResult};
use crate::location::SourceLocation;
use crate::model::*;
use crate::naming;
use indexmap::IndexMap;
use std::fmt;

/// The kind recorded per resolvable type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// An abstract base induced by an alternation of subclasses.
    Base,
    /// A concrete class.
    Leaf,
    BuiltInNumber,
    BuiltInString,
    BuiltInBoolean,
    BuiltInUri,
    BuiltInDictionary,
    BuiltInIdentifier,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInformation {
    pub type_name: String,
    pub concrete_class_name: String,
    /// Primitive-like types (scalars and enums) that are copied by value.
    pub is_base_type: bool,
    pub is_enum_type: bool,
    pub is_nullable: bool,
    pub kind: TypeKind,
}

impl TypeInformation {
    fn builtin(type_name: &str, builtin: BuiltIn) -> Self {
        let kind = match builtin {
            BuiltIn::String | BuiltIn::LexerToken => TypeKind::BuiltInString,
            BuiltIn::Identifier => TypeKind::BuiltInIdentifier,
            BuiltIn::Number | BuiltIn::Integer => TypeKind::BuiltInNumber,
            BuiltIn::Boolean => TypeKind::BuiltInBoolean,
            BuiltIn::Uri => TypeKind::BuiltInUri,
            BuiltIn::Dictionary => TypeKind::BuiltInDictionary,
        };
        Self {
            type_name: type_name.to_string(),
            concrete_class_name: ElementType::from_builtin(builtin, None).label(),
            is_base_type: builtin.is_scalar(),
            is_enum_type: false,
            is_nullable: !matches!(
                builtin,
                BuiltIn::Number | BuiltIn::Integer | BuiltIn::Boolean
            ),
            kind,
        }
    }
}

/// The element type of a property, a collection item or a dictionary value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    String,
    Uri,
    Number,
    Integer,
    Boolean,
    Identifier,
    Enum(String),
    Class(String),
    Base(String),
    /// A dictionary wrapper, by wrapper name.
    Dictionary(String),
}

impl ElementType {
    fn from_builtin(builtin: BuiltIn, dictionary: Option<String>) -> Self {
        match builtin {
            BuiltIn::String | BuiltIn::LexerToken => ElementType::String,
            BuiltIn::Identifier => ElementType::Identifier,
            BuiltIn::Number => ElementType::Number,
            BuiltIn::Integer => ElementType::Integer,
            BuiltIn::Boolean => ElementType::Boolean,
            BuiltIn::Uri => ElementType::Uri,
            BuiltIn::Dictionary => ElementType::Dictionary(
                dictionary.unwrap_or_else(|| DictionaryInstantiation::of_strings().wrapper_name()),
            ),
        }
    }

    /// Name fragment used in generated type names.
    pub fn label(&self) -> String {
        match self {
            ElementType::String => "String".to_string(),
            ElementType::Uri => "Uri".to_string(),
            ElementType::Number => "Number".to_string(),
            ElementType::Integer => "Integer".to_string(),
            ElementType::Boolean => "Boolean".to_string(),
            ElementType::Identifier => "Identifier".to_string(),
            ElementType::Enum(name)
            | ElementType::Class(name)
            | ElementType::Base(name)
            | ElementType::Dictionary(name) => name.clone(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ElementType::Number | ElementType::Integer)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ElementType::String | ElementType::Uri)
    }

    /// Scalars and enums are held by value; everything else is a node.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            ElementType::String
                | ElementType::Uri
                | ElementType::Number
                | ElementType::Integer
                | ElementType::Boolean
                | ElementType::Enum(_)
        )
    }

    pub fn is_node(&self) -> bool {
        !self.is_value()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// One concrete dictionary type per (key, value) pair in use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictionaryInstantiation {
    pub key_type: ElementType,
    pub value_type: ElementType,
}

impl DictionaryInstantiation {
    pub fn new(value_type: ElementType) -> Self {
        Self {
            key_type: ElementType::String,
            value_type,
        }
    }

    pub fn of_strings() -> Self {
        Self::new(ElementType::String)
    }

    pub fn wrapper_name(&self) -> String {
        format!("Dictionary{}{}", self.key_type.label(), self.value_type.label())
    }
}

/// The classification of a production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// No model artifact; references inline the scalar.
    Skip { scalar: BuiltIn },
    /// Members are the literal texts, in grammar order.
    Enum { members: Vec<String> },
    Collection { element: ElementType },
    Dictionary { instantiation: DictionaryInstantiation },
    Class {
        is_abstract: bool,
        /// Literal alternatives typed as a plain string.
        constant_alternative: bool,
    },
}

impl Shape {
    pub fn is_class(&self) -> bool {
        matches!(self, Shape::Class { .. })
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, Shape::Class { is_abstract: true, .. })
    }

    /// Shapes that become a node type of their own.
    pub fn is_node(&self) -> bool {
        matches!(self, Shape::Class { .. } | Shape::Collection { .. })
    }
}

/// The frozen output of the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGrammar {
    pub grammar: Grammar,
    /// Shape per production name, in grammar order.
    pub shapes: IndexMap<String, Shape>,
    /// Type information per declared type name (productions and built-ins).
    pub types: IndexMap<String, TypeInformation>,
    /// subclass → superclass, by production name.
    pub superclasses: IndexMap<String, String>,
    pub dictionaries: Vec<DictionaryInstantiation>,
    /// Production inlined at the top of the schema.
    pub root: Option<String>,
}

impl ResolvedGrammar {
    pub fn shape(&self, production: &str) -> Option<&Shape> {
        self.shapes.get(production)
    }

    pub fn type_info(&self, type_name: &str) -> Option<&TypeInformation> {
        self.types.get(type_name)
    }

    pub fn class_name(&self, production: &str) -> String {
        self.types
            .get(production)
            .map(|info| info.concrete_class_name.clone())
            .unwrap_or_else(|| naming::pascal(production))
    }

    pub fn is_abstract(&self, production: &str) -> bool {
        self.superclasses.values().any(|base| base == production)
    }

    pub fn superclass(&self, production: &str) -> Option<&str> {
        self.superclasses.get(production).map(String::as_str)
    }

    /// Direct subclasses of `base`, in the order the alternation lists them.
    pub fn subclasses(&self, base: &str) -> Vec<&str> {
        self.superclasses
            .iter()
            .filter(|(_, b)| b.as_str() == base)
            .map(|(sub, _)| sub.as_str())
            .collect()
    }

    /// Productions that produce model types, in grammar order.
    pub fn productions_with_shape(&self) -> impl Iterator<Item = (&Production, &Shape)> {
        self.grammar
            .productions
            .iter()
            .filter_map(move |p| self.shapes.get(p.name()).map(|s| (p, s)))
    }

    /// The element type a non-terminal contributes.
    pub fn element_type(&self, nt: &NonTerminal) -> CompileResult<ElementType> {
        if builtins::classify(&nt.grammar_type) == Some(BuiltIn::Dictionary) {
            let instantiation = self.dictionary_for(nt)?;
            return Ok(ElementType::Dictionary(instantiation.wrapper_name()));
        }
        self.resolve_type_name(&nt.declared_type, nt.location)
    }

    /// The dictionary a dictionary-tagged non-terminal instantiates.
    pub fn dictionary_for(&self, nt: &NonTerminal) -> CompileResult<DictionaryInstantiation> {
        let self_referential = nt.declared_type == nt.grammar_type
            || builtins::classify(&nt.declared_type) == Some(BuiltIn::Dictionary);
        let value_type = if self_referential {
            ElementType::String
        } else {
            self.resolve_type_name(&nt.declared_type, nt.location)?
        };
        Ok(DictionaryInstantiation::new(value_type))
    }

    pub fn resolve_type_name(&self, name: &str, location: SourceLocation) -> CompileResult<ElementType> {
        if let Some(builtin) = builtins::classify(name) {
            return Ok(ElementType::from_builtin(builtin, None));
        }
        let shape = self.shapes.get(name).ok_or_else(|| {
            CompileError::semantic(location, format!("Undefined type: '{}'.", name))
        })?;
        let class_name = self.class_name(name);
        Ok(match shape {
            Shape::Skip { scalar } => ElementType::from_builtin(*scalar, None),
            Shape::Enum { .. } => ElementType::Enum(class_name),
            Shape::Class { is_abstract: true, .. } => ElementType::Base(class_name),
            Shape::Class { .. } | Shape::Collection { .. } => ElementType::Class(class_name),
            Shape::Dictionary { instantiation } => ElementType::Dictionary(instantiation.wrapper_name()),
        })
    }
}

/// Resolves shapes and type tables for a parsed grammar.
pub fn resolve(grammar: &Grammar) -> CompileResult<ResolvedGrammar> {
    let mut context = ResolverContext::new(grammar);
    context.index()?;
    context.classify()?;
    context.collect_dictionaries()?;
    context.freeze()
}

/// Mutable builder state, threaded through the resolution passes.
pub struct ResolverContext<'g> {
    grammar: &'g Grammar,
    index: IndexMap<String, usize>,
    shapes: IndexMap<String, Shape>,
    superclasses: IndexMap<String, String>,
    dictionaries: Vec<DictionaryInstantiation>,
}

impl<'g> ResolverContext<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            index: IndexMap::new(),
            shapes: IndexMap::new(),
            superclasses: IndexMap::new(),
            dictionaries: Vec::new(),
        }
    }

    /// First pass: every LHS name, so later passes can look ahead.
    pub fn index(&mut self) -> CompileResult<()> {
        for (position, production) in self.grammar.productions.iter().enumerate() {
            if self.index.insert(production.name().to_string(), position).is_some() {
                return Err(CompileError::semantic(
                    production.location,
                    format!("Duplicate production: '{}'.", production.name()),
                ));
            }
        }
        Ok(())
    }

    /// Second pass: one shape per production.
    pub fn classify(&mut self) -> CompileResult<()> {
        let grammar = self.grammar;
        for production in &grammar.productions {
            let shape = self.classify_production(production)?;
            log::trace!("production '{}' classified as {:?}", production.name(), shape);
            self.shapes.insert(production.name().to_string(), shape);
        }

        // A base named elsewhere as a subclass stays abstract; a class named as a
        // base is abstract regardless of where it was declared.
        let bases: Vec<String> = self.superclasses.values().cloned().collect();
        for base in bases {
            if let Some(Shape::Class { is_abstract, .. }) = self.shapes.get_mut(&base) {
                *is_abstract = true;
            }
        }
        Ok(())
    }

    fn classify_production(&mut self, production: &Production) -> CompileResult<Shape> {
        let name = production.name();

        // 1. Reserved names and scalar aliases.
        if let Some(scalar) = builtins::classify(name) {
            return Ok(Shape::Skip { scalar });
        }
        if let Some(declared) = production.annotations.value("type") {
            match builtins::classify(declared) {
                Some(scalar) if scalar.is_scalar() => return Ok(Shape::Skip { scalar }),
                _ => {}
            }
        }
        if let Some(Symbol::NonTerminal(nt)) = production.single_symbol() {
            match builtins::classify(&nt.declared_type) {
                Some(scalar) if scalar.is_scalar() && !nt.annotations.has("name") => {
                    return Ok(Shape::Skip { scalar })
                }
                _ => {}
            }
        }

        match production.single_symbol() {
            Some(Symbol::Alternative(groups)) => self.classify_alternative(production, groups),
            // 4. Collections.
            Some(Symbol::Structural(_)) => {
                let nt = production.collection_item().ok_or_else(|| {
                    CompileError::semantic(
                        production.location,
                        format!("Collection '{}' must repeat a single non-terminal.", name),
                    )
                })?;
                let element = self.element_type_for_collection(nt)?;
                Ok(Shape::Collection { element })
            }
            // 5. Dictionaries.
            Some(Symbol::NonTerminal(nt))
                if builtins::classify(&nt.grammar_type) == Some(BuiltIn::Dictionary) =>
            {
                // The value type may reference productions not yet classified; it is
                // filled in once every shape is known.
                Ok(Shape::Dictionary {
                    instantiation: DictionaryInstantiation::of_strings(),
                })
            }
            // 6. Everything else is a class.
            _ => Ok(Shape::Class {
                is_abstract: false,
                constant_alternative: false,
            }),
        }
    }

    fn classify_alternative(
        &mut self,
        production: &Production,
        groups: &[Vec<Symbol>],
    ) -> CompileResult<Shape> {
        let name = production.name();
        let literal_count = groups
            .iter()
            .filter(|g| single_of(g).and_then(Symbol::as_single_terminal).is_some())
            .count();
        let reference_count = groups
            .iter()
            .filter(|g| single_of(g).and_then(Symbol::as_single_nonterminal).is_some())
            .count();

        if literal_count > 0 && reference_count > 0 {
            return Err(CompileError::semantic(
                production.location,
                format!(
                    "Alternative in '{}' mixes literals and non-terminals; use either an enumeration of literals or an alternation of subclasses.",
                    name
                ),
            ));
        }

        // 2. Enumerations of literals.
        if is_constant_alternative(groups) {
            let typed_as_string = production
                .annotations
                .value("enumType")
                .and_then(builtins::classify)
                .map(BuiltIn::is_string_like)
                .unwrap_or(false);
            if typed_as_string {
                return Ok(Shape::Class {
                    is_abstract: false,
                    constant_alternative: true,
                });
            }
            let mut members: Vec<String> = Vec::new();
            for group in groups {
                if let Some(terminal) = single_of(group).and_then(Symbol::as_single_terminal) {
                    if members.contains(&terminal.text) {
                        return Err(CompileError::semantic(
                            terminal.location,
                            format!("Duplicate enumeration member '{}' in '{}'.", terminal.text, name),
                        ));
                    }
                    members.push(terminal.text.clone());
                }
            }
            return Ok(Shape::Enum { members });
        }

        // 3. Inheritance alternations.
        if is_subclass_alternative(groups) {
            for group in groups {
                if let Some(nt) = single_of(group).and_then(Symbol::as_single_nonterminal) {
                    self.register_subclass(&nt.declared_type, name, nt.location)?;
                }
            }
            return Ok(Shape::Class {
                is_abstract: true,
                constant_alternative: false,
            });
        }

        Err(CompileError::semantic(
            production.location,
            format!(
                "Unsupported alternative in '{}': every choice must be a single literal or a single non-terminal.",
                name
            ),
        ))
    }

    fn register_subclass(&mut self, subclass: &str, base: &str, location: SourceLocation) -> CompileResult<()> {
        if subclass == base {
            return Err(CompileError::semantic(
                location,
                format!("'{}' cannot be a subclass of itself.", base),
            ));
        }
        if let Some(existing) = self.superclasses.get(subclass) {
            return Err(CompileError::semantic(
                location,
                format!(
                    "'{}' is already a subclass of '{}' and cannot also derive from '{}'.",
                    subclass, existing, base
                ),
            ));
        }
        self.superclasses.insert(subclass.to_string(), base.to_string());
        Ok(())
    }

    /// Collection items are resolved lazily: they may be declared later.
    fn element_type_for_collection(&self, nt: &NonTerminal) -> CompileResult<ElementType> {
        if let Some(builtin) = builtins::classify(&nt.declared_type) {
            return Ok(ElementType::from_builtin(builtin, None));
        }
        if !self.index.contains_key(&nt.declared_type) {
            return Err(CompileError::semantic(
                nt.location,
                format!("Undefined type: '{}'.", nt.declared_type),
            ));
        }
        // Placeholder; replaced in `collect_dictionaries` once all shapes exist.
        Ok(ElementType::Class(nt.declared_type.clone()))
    }

    /// Third pass: dictionary value types, collection items and the set of
    /// dictionary instantiations, now that every shape is known.
    pub fn collect_dictionaries(&mut self) -> CompileResult<()> {
        let grammar = self.grammar;
        let mut found = Vec::new();

        // Dictionary productions first: classes and collections may use them.
        let snapshot = self.snapshot();
        for production in &grammar.productions {
            let is_dictionary = matches!(
                self.shapes.get(production.name()),
                Some(Shape::Dictionary { .. })
            );
            if !is_dictionary {
                continue;
            }
            if let Some(Symbol::NonTerminal(nt)) = production.single_symbol() {
                let instantiation = snapshot.dictionary_for(nt)?;
                found.push(instantiation.clone());
                self.shapes
                    .insert(production.name().to_string(), Shape::Dictionary { instantiation });
            }
        }

        let snapshot = self.snapshot();
        for production in &grammar.productions {
            match snapshot.shape(production.name()) {
                Some(Shape::Collection { .. }) => {
                    if let Some(nt) = production.collection_item() {
                        let element = snapshot.element_type(nt)?;
                        collect_dictionary_uses(&snapshot, &Symbol::NonTerminal(nt.clone()), &mut found)?;
                        self.shapes
                            .insert(production.name().to_string(), Shape::Collection { element });
                    }
                }
                Some(Shape::Class { .. }) => {
                    for symbol in &production.rhs {
                        collect_dictionary_uses(&snapshot, symbol, &mut found)?;
                    }
                }
                _ => {}
            }
        }

        for instantiation in found {
            if !self.dictionaries.contains(&instantiation) {
                self.dictionaries.push(instantiation);
            }
        }
        Ok(())
    }

    /// A read-only view of the tables built so far.
    fn snapshot(&self) -> ResolvedGrammar {
        ResolvedGrammar {
            grammar: self.grammar.clone(),
            shapes: self.shapes.clone(),
            types: self.type_table(),
            superclasses: self.superclasses.clone(),
            dictionaries: self.dictionaries.clone(),
            root: None,
        }
    }

    fn type_table(&self) -> IndexMap<String, TypeInformation> {
        let mut types = IndexMap::new();
        for tag in builtins::BUILTIN_TAGS {
            if let Some(builtin) = builtins::classify(tag) {
                types.insert(tag.to_string(), TypeInformation::builtin(tag, builtin));
            }
        }
        for production in &self.grammar.productions {
            let name = production.name();
            let Some(shape) = self.shapes.get(name) else {
                continue;
            };
            let class_name = production
                .annotations
                .value("className")
                .map(str::to_string)
                .unwrap_or_else(|| naming::pascal(name));
            let info = match shape {
                Shape::Skip { scalar } => {
                    let mut info = TypeInformation::builtin(name, *scalar);
                    info.type_name = name.to_string();
                    info
                }
                Shape::Enum { .. } => TypeInformation {
                    type_name: name.to_string(),
                    concrete_class_name: class_name,
                    is_base_type: true,
                    is_enum_type: true,
                    is_nullable: false,
                    kind: TypeKind::Enum,
                },
                Shape::Dictionary { instantiation } => TypeInformation {
                    type_name: name.to_string(),
                    concrete_class_name: instantiation.wrapper_name(),
                    is_base_type: false,
                    is_enum_type: false,
                    is_nullable: true,
                    kind: TypeKind::BuiltInDictionary,
                },
                Shape::Class { is_abstract, .. } => TypeInformation {
                    type_name: name.to_string(),
                    concrete_class_name: class_name,
                    is_base_type: false,
                    is_enum_type: false,
                    is_nullable: true,
                    kind: if *is_abstract { TypeKind::Base } else { TypeKind::Leaf },
                },
                Shape::Collection { .. } => TypeInformation {
                    type_name: name.to_string(),
                    concrete_class_name: class_name,
                    is_base_type: false,
                    is_enum_type: false,
                    is_nullable: true,
                    kind: TypeKind::Leaf,
                },
            };
            types.insert(name.to_string(), info);
        }
        types
    }

    fn root(&self) -> CompileResult<Option<String>> {
        let marked: Vec<&Production> = self
            .grammar
            .productions
            .iter()
            .filter(|p| p.annotations.has("root"))
            .collect();
        match marked.as_slice() {
            [] => Ok(self
                .grammar
                .productions
                .iter()
                .find(|p| self.shapes.get(p.name()).map(Shape::is_node).unwrap_or(false))
                .map(|p| p.name().to_string())),
            [single] => Ok(Some(single.name().to_string())),
            [_, second, ..] => Err(CompileError::semantic(
                second.location,
                "Only one production may be marked as @root.",
            )),
        }
    }

    /// Freezes the tables. Nothing is mutated after this point.
    pub fn freeze(self) -> CompileResult<ResolvedGrammar> {
        let types = self.type_table();

        let mut seen: IndexMap<&str, &str> = IndexMap::new();
        for (name, info) in &types {
            if !matches!(info.kind, TypeKind::Base | TypeKind::Leaf | TypeKind::Enum) {
                continue;
            }
            let reserved = matches!(info.concrete_class_name.as_str(), "Identifier" | "None");
            if let Some(previous) = seen.insert(info.concrete_class_name.as_str(), name.as_str()) {
                return Err(self.clash(name, &info.concrete_class_name, Some(previous)));
            }
            if reserved {
                return Err(self.clash(name, &info.concrete_class_name, None));
            }
        }

        let root = self.root()?;
        log::debug!(
            "resolved {} shapes, {} subclass links, {} dictionaries",
            self.shapes.len(),
            self.superclasses.len(),
            self.dictionaries.len()
        );
        Ok(ResolvedGrammar {
            grammar: self.grammar.clone(),
            shapes: self.shapes,
            types,
            superclasses: self.superclasses,
            dictionaries: self.dictionaries,
            root,
        })
    }

    fn clash(&self, name: &str, class_name: &str, previous: Option<&str>) -> CompileError {
        let location = self
            .grammar
            .production(name)
            .map(|p| p.location)
            .unwrap_or_default();
        match previous {
            Some(previous) => CompileError::semantic(
                location,
                format!(
                    "'{}' and '{}' both map to the type name '{}'.",
                    previous, name, class_name
                ),
            ),
            None => CompileError::semantic(
                location,
                format!("'{}' maps to the reserved type name '{}'.", name, class_name),
            ),
        }
    }
}

fn collect_dictionary_uses(
    resolved: &ResolvedGrammar,
    symbol: &Symbol,
    found: &mut Vec<DictionaryInstantiation>,
) -> CompileResult<()> {
    match symbol {
        Symbol::NonTerminal(nt) => {
            if builtins::classify(&nt.grammar_type) == Some(BuiltIn::Dictionary) {
                found.push(resolved.dictionary_for(nt)?);
            } else if let Some(Shape::Dictionary { instantiation }) = resolved.shape(&nt.declared_type) {
                found.push(instantiation.clone());
            }
            Ok(())
        }
        Symbol::Terminal(_) => Ok(()),
        Symbol::Group(symbols) => symbols
            .iter()
            .try_for_each(|s| collect_dictionary_uses(resolved, s, found)),
        Symbol::Alternative(groups) => groups
            .iter()
            .flatten()
            .try_for_each(|s| collect_dictionary_uses(resolved, s, found)),
        Symbol::Star(inner) | Symbol::Plus(inner) | Symbol::QuestionMark(inner) | Symbol::Structural(inner) => {
            collect_dictionary_uses(resolved, inner, found)
        }
    }
}

// --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_grammar_source;
    use crate::testing::Testable;

    fn resolve_source(source: &str) -> ResolvedGrammar {
        let grammar = parse_grammar_source(source).test().assert_success();
        resolve(&grammar).test().assert_success()
    }

    fn resolve_err(source: &str) -> CompileResult<ResolvedGrammar> {
        let grammar = parse_grammar_source(source).test().assert_success();
        resolve(&grammar)
    }

    #[test]
    fn test_every_production_has_one_shape() {
        let r = resolve_source(
            "grammar G;
             Doc : 'doc' Shape* Tags? Props? ;
             Shape : Circle | Square ;
             Circle : 'circle' /* @name{radius} */ NUMBER ;
             Square : 'square' /* @name{side} */ NUMBER Color ;
             Color : 'red' | 'green' ;
             Tags : Tag* ;
             Tag : /* @name{label} */ ID ;
             Props : /* @type{NUMBER} */ DICTIONARY ;
             title : STRING ;
             DIGIT : '0'..'9' ;",
        );
        assert_eq!(r.shapes.len(), r.grammar.productions.len());
        assert!(matches!(r.shape("Doc"), Some(Shape::Class { is_abstract: false, .. })));
        assert!(matches!(r.shape("Shape"), Some(Shape::Class { is_abstract: true, .. })));
        assert!(matches!(r.shape("Color"), Some(Shape::Enum { members }) if members == &["red", "green"]));
        assert!(matches!(r.shape("Tags"), Some(Shape::Collection { element: ElementType::Class(c) }) if c == "Tag"));
        assert!(matches!(r.shape("title"), Some(Shape::Skip { scalar: BuiltIn::String })));
        assert!(matches!(r.shape("DIGIT"), Some(Shape::Skip { .. })));
        match r.shape("Props") {
            Some(Shape::Dictionary { instantiation }) => {
                assert_eq!(instantiation.value_type, ElementType::Number);
                assert_eq!(instantiation.wrapper_name(), "DictionaryStringNumber");
            }
            other => panic!("Expected dictionary, got {:?}", other),
        }
        assert_eq!(r.root.as_deref(), Some("Doc"));
    }

    #[test]
    fn test_optional_enum_reference() {
        let r = resolve_source("grammar G; Foo : 'a' Bar? ; Bar : 'b' ;");
        assert!(matches!(r.shape("Foo"), Some(Shape::Class { is_abstract: false, .. })));
        assert!(matches!(r.shape("Bar"), Some(Shape::Enum { members }) if members == &["b"]));
        assert_eq!(r.type_info("Bar").map(|t| t.kind), Some(TypeKind::Enum));
    }

    #[test]
    fn test_inheritance_alternation() {
        let r = resolve_source(
            "grammar G; Shape : Circle | Square ; Circle : 'c' NUMBER ; Square : 's' NUMBER ;",
        );
        assert!(r.is_abstract("Shape"));
        assert_eq!(r.superclass("Circle"), Some("Shape"));
        assert_eq!(r.superclass("Square"), Some("Shape"));
        assert_eq!(r.subclasses("Shape"), vec!["Circle", "Square"]);
        assert_eq!(r.type_info("Shape").map(|t| t.kind), Some(TypeKind::Base));
        assert_eq!(r.type_info("Circle").map(|t| t.kind), Some(TypeKind::Leaf));
    }

    #[test]
    fn test_forward_references() {
        let r = resolve_source("grammar G; Doc : Items ; Items : Item+ ; Item : 'x' NUMBER ;");
        assert!(matches!(r.shape("Items"), Some(Shape::Collection { element: ElementType::Class(c) }) if c == "Item"));
    }

    #[test]
    fn test_constant_alternative() {
        let r = resolve_source("grammar G; Op /* @enumType{STRING} */ : '+' | '-' ;");
        assert!(matches!(
            r.shape("Op"),
            Some(Shape::Class { constant_alternative: true, is_abstract: false })
        ));
    }

    #[test]
    fn test_dictionary_tag_variants() {
        let r = resolve_source("grammar G; Props : PROP_DICT ; Doc : 'd' Props ;");
        match r.shape("Props") {
            Some(Shape::Dictionary { instantiation }) => {
                assert_eq!(instantiation.key_type, ElementType::String);
                assert_eq!(instantiation.value_type, ElementType::String);
            }
            other => panic!("Expected dictionary, got {:?}", other),
        }
        assert_eq!(r.dictionaries, vec![DictionaryInstantiation::of_strings()]);
    }

    #[test]
    fn test_dictionary_of_classes() {
        let r = resolve_source(
            "grammar G; Doc : 'd' /* @name{locations} @type{Location} */ DICTIONARY ; Location : 'l' NUMBER ;",
        );
        assert_eq!(
            r.dictionaries,
            vec![DictionaryInstantiation::new(ElementType::Class("Location".into()))]
        );
        assert_eq!(r.dictionaries[0].wrapper_name(), "DictionaryStringLocation");
    }

    #[test]
    fn test_mixed_alternative_is_rejected() {
        resolve_err("grammar G; Foo : 'a' | Bar ; Bar : 'b' NUMBER ;")
            .test()
            .assert_failure_contains("mixes literals and non-terminals");
    }

    #[test]
    fn test_unsupported_alternative() {
        resolve_err("grammar G; Foo : Bar Baz | Baz ; Bar : 'b' ; Baz : 'z' ;")
            .test()
            .assert_semantic_failure();
    }

    #[test]
    fn test_duplicates() {
        resolve_err("grammar G; Foo : 'a' ; Foo : 'b' ;")
            .test()
            .assert_failure_contains("Duplicate production");
        resolve_err("grammar G; A : C | D ; B : C | E ; C : 'c' NUMBER ; D : 'd' NUMBER ; E : 'e' NUMBER ;")
            .test()
            .assert_failure_contains("already a subclass");
        resolve_err("grammar G; Color : 'red' | 'red' ;")
            .test()
            .assert_failure_contains("Duplicate enumeration member");
    }

    #[test]
    fn test_reserved_and_clashing_names() {
        resolve_err("grammar G; Identifier : 'x' NUMBER ;")
            .test()
            .assert_failure_contains("reserved type name");
        resolve_err("grammar G; fooBar : 'x' NUMBER ; FooBar : 'y' NUMBER ;")
            .test()
            .assert_failure_contains("both map to");
    }

    #[test]
    fn test_root_annotation() {
        let r = resolve_source("grammar G; A : 'a' NUMBER ; /* @root */ B : 'b' A ;");
        assert_eq!(r.root.as_deref(), Some("B"));
        resolve_err("grammar G; /* @root */ A : 'a' ; /* @root */ B : 'b' A ;")
            .test()
            .assert_failure_contains("@root");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let grammar = parse_grammar_source(
            "grammar G; Doc : Shape+ Props ; Shape : Circle | Square ; Circle : 'c' NUMBER ; Square : 's' NUMBER ; Props : DICTIONARY ;",
        )
        .test()
        .assert_success();
        let first = resolve(&grammar).test().assert_success();
        let second = resolve(&grammar).test().assert_success();
        assert_eq!(first, second);
    }
}
