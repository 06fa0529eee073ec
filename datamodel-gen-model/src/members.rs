//! Member synthesis.
//!
//! Walks the RHS of every concrete class and turns each referenced
//! non-terminal into a [`PropertyPlan`]. The plans carry everything the
//! renderers need for copy construction, equality and hashing, debug
//! stringification and dynamic property assignment. The synthesizer also
//! plans the types that have no production of their own: `Identifier`, the
//! dictionary wrappers, the discriminant enumeration and the node union.

use crate::config::Options;
use crate::error::{CompileError, CompileResult};
use crate::location::SourceLocation;
use crate::model::*;
use crate::naming;
use crate::plan::*;
use crate::resolver::{ResolvedGrammar, Shape};
use indexmap::IndexMap;
use itertools::Itertools;

/// Name of the synthesized property of constant alternatives.
pub const STRING_VALUE: &str = "StringValue";
/// Name of the synthesized identifier class.
pub const IDENTIFIER: &str = "Identifier";
pub const OFFSET: &str = "Offset";
pub const LENGTH: &str = "Length";

/// Everything the synthesizer plans.
#[derive(Debug, Clone, PartialEq)]
pub struct Members {
    pub kinds: KindPlan,
    pub classes: Vec<ClassPlan>,
    pub enums: Vec<EnumPlan>,
    pub dictionaries: Vec<DictionaryPlan>,
    pub nodes: NodePlan,
}

pub fn synthesize(resolved: &ResolvedGrammar, options: &Options) -> CompileResult<Members> {
    let synthesizer = Synthesizer { resolved, options };
    let mut classes = vec![synthesizer.identifier()];
    let mut enums = Vec::new();

    for (production, shape) in resolved.productions_with_shape() {
        match shape {
            Shape::Skip { .. } | Shape::Dictionary { .. } => {}
            Shape::Enum { members } => enums.push(synthesizer.enumeration(production, members)),
            Shape::Collection { element } => {
                classes.push(synthesizer.collection(production, element.clone()))
            }
            Shape::Class { is_abstract: true, .. } => {
                classes.push(synthesizer.abstract_base(production)?)
            }
            Shape::Class {
                constant_alternative: true,
                ..
            } => classes.push(synthesizer.constant_alternative(production)),
            Shape::Class { .. } => classes.push(synthesizer.sequence(production)?),
        }
    }

    let dictionaries = synthesizer.dictionaries();
    let kinds = synthesizer.kinds(&classes, &dictionaries);
    let nodes = synthesizer.nodes(&classes, &dictionaries);
    synthesizer.check_type_names(&classes, &enums, &dictionaries, &kinds, &nodes)?;

    log::debug!(
        "synthesized {} classes, {} enums, {} dictionaries",
        classes.len(),
        enums.len(),
        dictionaries.len()
    );
    Ok(Members {
        kinds,
        classes,
        enums,
        dictionaries,
        nodes,
    })
}

struct Synthesizer<'r> {
    resolved: &'r ResolvedGrammar,
    options: &'r Options,
}

impl<'r> Synthesizer<'r> {
    fn super_class(&self, production: &str) -> Option<String> {
        self.resolved
            .superclass(production)
            .map(|base| self.resolved.class_name(base))
    }

    fn location_properties(&self, properties: &mut Vec<PropertyPlan>) {
        let declared = properties.iter().any(|p| p.name == OFFSET || p.name == LENGTH);
        if !self.options.generate_locations || declared {
            return;
        }
        for name in [OFFSET, LENGTH] {
            let mut property = PropertyPlan::new(name, naming::camel(name), ElementType::Integer);
            property.is_location = true;
            properties.push(property);
        }
    }

    fn identifier(&self) -> ClassPlan {
        let mut value = PropertyPlan::new("Value", "value", ElementType::String);
        value.summary = Some("The identifier text.".to_string());
        let mut properties = vec![value];
        self.location_properties(&mut properties);
        class_plan(
            IDENTIFIER,
            None,
            None,
            ClassForm::Identifier,
            properties,
            DisplayPlan::Format {
                template: "{}".to_string(),
                args: vec![DisplayArg {
                    property: "Value".to_string(),
                    style: DisplayStyle::Plain,
                    delimiter: None,
                }],
            },
        )
    }

    fn enumeration(&self, production: &Production, literals: &[String]) -> EnumPlan {
        let mut members: Vec<EnumMember> = Vec::new();
        for (i, literal) in literals.iter().enumerate() {
            let mut name = naming::literal_member(literal).unwrap_or_else(|| format!("Member{}", i));
            if members.iter().any(|m| m.name == name) {
                name = format!("{}{}", name, i);
            }
            members.push(EnumMember {
                literal: literal.clone(),
                name,
            });
        }
        EnumPlan {
            name: self.resolved.class_name(production.name()),
            production: production.name().to_string(),
            members,
            summary: production.annotations.value("summary").map(str::to_string),
        }
    }

    fn collection(&self, production: &Production, element: ElementType) -> ClassPlan {
        let name = production
            .annotations
            .value("itemName")
            .map(naming::pascal)
            .unwrap_or_else(|| "Items".to_string());
        let at_least_once = matches!(
            production.single_symbol(),
            Some(Symbol::Structural(inner)) if matches!(**inner, Symbol::Plus(_))
        );
        let mut items = PropertyPlan::new(name.clone(), naming::camel(&name), element);
        items.cardinality = Cardinality::List;
        items.required = at_least_once;
        if at_least_once {
            items.facets.min_items = Some(1);
        }
        items.summary = production
            .collection_item()
            .and_then(|nt| nt.annotations.value("summary"))
            .map(str::to_string);

        let mut plan = class_plan(
            &self.resolved.class_name(production.name()),
            Some(production),
            self.super_class(production.name()),
            ClassForm::Collection,
            vec![items],
            DisplayPlan::Items { property: name },
        );
        plan.summary = production.annotations.value("summary").map(str::to_string);
        plan
    }

    fn constant_alternative(&self, production: &Production) -> ClassPlan {
        let mut properties = vec![PropertyPlan::new(
            STRING_VALUE,
            naming::camel(STRING_VALUE),
            ElementType::String,
        )];
        self.location_properties(&mut properties);
        let mut plan = class_plan(
            &self.resolved.class_name(production.name()),
            Some(production),
            self.super_class(production.name()),
            ClassForm::ConstantAlternative,
            properties,
            DisplayPlan::StringValue,
        );
        plan.summary = production.annotations.value("summary").map(str::to_string);
        plan.remarks = production.annotations.value("remarks").map(str::to_string);
        plan
    }

    fn abstract_base(&self, production: &Production) -> CompileResult<ClassPlan> {
        let subclasses = self
            .resolved
            .subclasses(production.name())
            .into_iter()
            .map(|sub| self.resolved.class_name(sub))
            .collect();
        let mut visiting = vec![production.name().to_string()];
        let leaves = self.leaves(production.name(), &mut visiting, production.location)?;

        let mut plan = class_plan(
            &self.resolved.class_name(production.name()),
            Some(production),
            self.super_class(production.name()),
            ClassForm::Abstract,
            Vec::new(),
            DisplayPlan::Delegate,
        );
        plan.is_abstract = true;
        plan.subclasses = subclasses;
        plan.leaves = leaves;
        plan.summary = production.annotations.value("summary").map(str::to_string);
        plan.remarks = production.annotations.value("remarks").map(str::to_string);
        Ok(plan)
    }

    /// Every concrete class below `base`, with the bases in between.
    fn leaves(
        &self,
        base: &str,
        visiting: &mut Vec<String>,
        location: SourceLocation,
    ) -> CompileResult<Vec<LeafPath>> {
        let mut leaves = Vec::new();
        for sub in self.resolved.subclasses(base) {
            let class = self.resolved.class_name(sub);
            if !self.resolved.is_abstract(sub) {
                leaves.push(LeafPath {
                    leaf: class,
                    via: Vec::new(),
                });
                continue;
            }
            if visiting.iter().any(|v| v == sub) {
                return Err(CompileError::semantic(
                    location,
                    format!("Inheritance cycle through '{}'.", sub),
                ));
            }
            visiting.push(sub.to_string());
            for mut path in self.leaves(sub, visiting, location)? {
                path.via.push(class.clone());
                leaves.push(path);
            }
            visiting.pop();
        }
        Ok(leaves)
    }

    fn sequence(&self, production: &Production) -> CompileResult<ClassPlan> {
        let class = self.resolved.class_name(production.name());
        let mut collector = PropertyCollector {
            resolved: self.resolved,
            class: &class,
            properties: IndexMap::new(),
            segments: Vec::new(),
            delimiters: IndexMap::new(),
        };
        for symbol in &production.rhs {
            collector.walk(symbol, Context::default())?;
        }
        let (mut properties, display) = collector.finish();
        self.location_properties(&mut properties);

        let mut plan = class_plan(
            &class,
            Some(production),
            self.super_class(production.name()),
            ClassForm::Sequence,
            properties,
            display,
        );
        plan.summary = production.annotations.value("summary").map(str::to_string);
        plan.remarks = production.annotations.value("remarks").map(str::to_string);
        Ok(plan)
    }

    fn dictionaries(&self) -> Vec<DictionaryPlan> {
        self.resolved
            .dictionaries
            .iter()
            .map(|instantiation| {
                let aliases: Vec<&Production> = self
                    .resolved
                    .productions_with_shape()
                    .filter(|(_, shape)| {
                        matches!(shape, Shape::Dictionary { instantiation: i } if i == instantiation)
                    })
                    .map(|(p, _)| p)
                    .collect();
                let annotation = |name: &str| {
                    aliases
                        .iter()
                        .find_map(|p| p.annotations.value(name))
                        .map(str::to_string)
                };
                DictionaryPlan {
                    name: instantiation.wrapper_name(),
                    instantiation: instantiation.clone(),
                    aliases: aliases.iter().map(|p| p.name().to_string()).collect(),
                    key_name: annotation("keyName"),
                    value_name: annotation("valueName"),
                    summary: annotation("summary"),
                }
            })
            .collect()
    }

    fn kinds(&self, classes: &[ClassPlan], dictionaries: &[DictionaryPlan]) -> KindPlan {
        let members = classes
            .iter()
            .map(|c| c.name.clone())
            .chain(dictionaries.iter().map(|d| d.name.clone()))
            .sorted()
            .dedup();
        KindPlan {
            name: self.resolved.grammar.kind_enum_name.clone(),
            members: std::iter::once(KindPlan::NONE.to_string()).chain(members).collect(),
        }
    }

    fn nodes(&self, classes: &[ClassPlan], dictionaries: &[DictionaryPlan]) -> NodePlan {
        let grammar = naming::pascal(&self.resolved.grammar.name);
        NodePlan {
            name: format!("{}Node", grammar),
            ref_name: format!("{}NodeRef", grammar),
            variants: classes
                .iter()
                .filter(|c| !c.is_abstract)
                .map(|c| c.name.clone())
                .chain(dictionaries.iter().map(|d| d.name.clone()))
                .collect(),
        }
    }

    /// Generated support types share the namespace with the model types.
    fn check_type_names(
        &self,
        classes: &[ClassPlan],
        enums: &[EnumPlan],
        dictionaries: &[DictionaryPlan],
        kinds: &KindPlan,
        nodes: &NodePlan,
    ) -> CompileResult<()> {
        let grammar = naming::pascal(&self.resolved.grammar.name);
        let support = [
            kinds.name.clone(),
            nodes.name.clone(),
            nodes.ref_name.clone(),
            format!("{}Visitor", grammar),
            format!("{}RewritingVisitor", grammar),
        ];
        for (name, production) in classes
            .iter()
            .map(|c| (&c.name, c.production.as_deref()))
            .chain(enums.iter().map(|e| (&e.name, Some(e.production.as_str()))))
        {
            let Some(production) = production else {
                continue;
            };
            if support.contains(name) || dictionaries.iter().any(|d| &d.name == name) {
                let location = self
                    .resolved
                    .grammar
                    .production(production)
                    .map(|p| p.location)
                    .unwrap_or_default();
                return Err(CompileError::semantic(
                    location,
                    format!("'{}' maps to the generated type name '{}'.", production, name),
                ));
            }
        }
        Ok(())
    }
}

fn class_plan(
    name: &str,
    production: Option<&Production>,
    super_class: Option<String>,
    form: ClassForm,
    properties: Vec<PropertyPlan>,
    display: DisplayPlan,
) -> ClassPlan {
    let setters = properties
        .iter()
        .map(|p| SetterPlan {
            key: p.serialized_name.clone(),
            property: p.name.clone(),
        })
        .collect();
    ClassPlan {
        name: name.to_string(),
        production: production.map(|p| p.name().to_string()),
        super_class,
        is_abstract: false,
        form,
        properties,
        display,
        setters,
        subclasses: Vec::new(),
        leaves: Vec::new(),
        summary: None,
        remarks: None,
    }
}

/// Quantifiers seen on the way down to a symbol.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    repeated: bool,
    at_least_once: bool,
    optional: bool,
    /// Outside every quantifier; only here are literals copied into the display.
    quantified: bool,
}

impl Context {
    fn repeat(self, at_least_once: bool) -> Self {
        Self {
            repeated: true,
            at_least_once: at_least_once && (!self.repeated || self.at_least_once),
            quantified: true,
            ..self
        }
    }

    fn optional(self) -> Self {
        Self {
            optional: true,
            quantified: true,
            ..self
        }
    }

    fn required(&self) -> bool {
        !self.optional && (!self.repeated || self.at_least_once)
    }
}

enum Segment {
    Text(String),
    Slot(String),
}

struct PropertyCollector<'a> {
    resolved: &'a ResolvedGrammar,
    class: &'a str,
    properties: IndexMap<String, PropertyPlan>,
    segments: Vec<Segment>,
    /// Item delimiters by property name.
    delimiters: IndexMap<String, String>,
}

impl PropertyCollector<'_> {
    fn walk(&mut self, symbol: &Symbol, context: Context) -> CompileResult<()> {
        match symbol {
            Symbol::Terminal(terminal) => {
                if !context.quantified {
                    self.segments.push(Segment::Text(escape_braces(&terminal.text)));
                }
                Ok(())
            }
            Symbol::NonTerminal(nt) => self.non_terminal(nt, context),
            Symbol::Group(symbols) => symbols.iter().try_for_each(|s| self.walk(s, context)),
            Symbol::Star(inner) => {
                self.note_delimiter(inner);
                self.walk(inner, context.repeat(false))
            }
            Symbol::Plus(inner) => {
                self.note_delimiter(inner);
                self.walk(inner, context.repeat(true))
            }
            Symbol::QuestionMark(inner) => self.walk(inner, context.optional()),
            Symbol::Structural(inner) => self.walk(inner, context),
            Symbol::Alternative(groups) => {
                if !is_constant_alternative(groups) {
                    return Err(CompileError::semantic(
                        symbol.location(),
                        "Alternatives inside a sequence may only choose between literals.",
                    ));
                }
                let mut property = PropertyPlan::new(
                    STRING_VALUE,
                    naming::camel(STRING_VALUE),
                    ElementType::String,
                );
                property.required = context.required();
                if context.repeated {
                    property.cardinality = Cardinality::List;
                }
                self.add(property, context, symbol.location())
            }
        }
    }

    /// `('d' x)*` separates the items of `x` with `d`. The first delimiter wins.
    fn note_delimiter(&mut self, repeated: &Symbol) {
        if let Symbol::Group(symbols) = repeated {
            if let [Symbol::Terminal(delimiter), Symbol::NonTerminal(nt)] = symbols.as_slice() {
                self.delimiters
                    .entry(naming::pascal(&nt.name))
                    .or_insert_with(|| delimiter.text.clone());
            }
        }
    }

    fn non_terminal(&mut self, nt: &NonTerminal, context: Context) -> CompileResult<()> {
        let element = self.resolved.element_type(nt)?;
        let name = naming::pascal(&nt.name);
        if naming::snake(&name) == "kind" {
            return Err(CompileError::semantic(
                nt.location,
                format!(
                    "Property '{}' of '{}' is reserved for the node discriminant.",
                    nt.name, self.class
                ),
            ));
        }

        // Numbers are not really lists: a repeated numeric tag stays singular.
        let list = context.repeated && !element.is_numeric();
        let mut property = PropertyPlan::new(
            name,
            nt.annotations
                .value("serializedName")
                .map(str::to_string)
                .unwrap_or_else(|| naming::camel(&nt.name)),
            element,
        );
        if list {
            property.cardinality = Cardinality::List;
            property.required = context.at_least_once && !context.optional;
        } else {
            property.required = context.required();
        }
        property.summary = nt
            .annotations
            .value("summary")
            .or_else(|| {
                self.resolved
                    .grammar
                    .production(&nt.declared_type)
                    .and_then(|p| p.annotations.value("summary"))
            })
            .map(str::to_string);
        property.facets.pattern = nt.annotations.value("pattern").map(str::to_string);
        property.facets.minimum = nt.annotations.value("minimum").map(str::to_string);
        property.facets.default = nt.annotations.value("default").map(str::to_string);
        property.facets.min_items = match nt.annotations.value("minItems") {
            Some(text) => Some(text.parse::<u64>().map_err(|_| {
                CompileError::semantic(
                    nt.location,
                    format!("@minItems of '{}' must be a non-negative integer, got '{}'.", nt.name, text),
                )
            })?),
            None if list && property.required => Some(1),
            None => None,
        };
        self.add(property, context, nt.location)
    }

    fn add(&mut self, property: PropertyPlan, context: Context, location: SourceLocation) -> CompileResult<()> {
        let Some(existing) = self.properties.get_mut(&property.name) else {
            self.segments.push(Segment::Slot(property.name.clone()));
            self.properties.insert(property.name.clone(), property);
            return Ok(());
        };
        if existing.element == property.element {
            // Promotion: a later list occurrence replaces the singular one in place.
            if property.is_list() && !existing.is_list() {
                log::trace!("promoting '{}.{}' to a list", self.class, property.name);
                *existing = property;
                return Ok(());
            }
            if context.repeated && property.element.is_numeric() {
                return Ok(());
            }
        }
        Err(CompileError::semantic(
            location,
            format!("Duplicate property '{}' in '{}'.", property.name, self.class),
        ))
    }

    fn finish(self) -> (Vec<PropertyPlan>, DisplayPlan) {
        let mut template = Vec::new();
        let mut args = Vec::new();
        for segment in self.segments {
            match segment {
                Segment::Text(text) => template.push(text),
                Segment::Slot(name) => {
                    let Some(property) = self.properties.get(&name) else {
                        continue;
                    };
                    template.push("{}".to_string());
                    let delimiter = match property.is_list() {
                        true => self.delimiters.get(&name).cloned(),
                        false => None,
                    };
                    args.push(DisplayArg {
                        style: display_style(property),
                        property: name,
                        delimiter,
                    });
                }
            }
        }
        let display = DisplayPlan::Format {
            template: template.join(" "),
            args,
        };
        (self.properties.into_values().collect(), display)
    }
}

fn display_style(property: &PropertyPlan) -> DisplayStyle {
    if property.is_list() {
        DisplayStyle::List
    } else if property.is_nullable() {
        DisplayStyle::Nullable
    } else if property.element.is_numeric() {
        DisplayStyle::Numeric
    } else {
        DisplayStyle::Plain
    }
}

fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}
