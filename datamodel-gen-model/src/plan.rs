//! Emission plans: the target-agnostic description of everything a renderer emits.
//!
//! Plans are plain data. They are built once by the synthesizers and never
//! mutated afterwards.

use crate::config::Options;
pub use crate::resolver::{DictionaryInstantiation, ElementType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Single,
    List,
}

/// How a member is copied by the copy constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyStrategy {
    /// Scalars and enums.
    ByValue,
    /// Absent stays absent, present is copied recursively.
    NullableDeep,
    /// Lists: every element is copied.
    Deep,
}

/// How a member takes part in equality and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqualityStrategy {
    /// Numbers, booleans and enums: `hash * 31 + value`.
    Value,
    /// Optional members: absent hashes to zero.
    NullSafe,
    /// The element type's own equality and hash.
    Structural,
}

/// Schema facets taken from member annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaFacets {
    pub pattern: Option<String>,
    pub minimum: Option<String>,
    pub default: Option<String>,
    pub min_items: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPlan {
    /// Pascal-cased member name, unique within its class.
    pub name: String,
    /// Key used by JSON and `set_property`.
    pub serialized_name: String,
    pub element: ElementType,
    pub cardinality: Cardinality,
    pub required: bool,
    /// Added by location tracking rather than declared by the grammar.
    pub is_location: bool,
    pub summary: Option<String>,
    pub facets: SchemaFacets,
}

impl PropertyPlan {
    pub fn new(name: impl Into<String>, serialized_name: impl Into<String>, element: ElementType) -> Self {
        Self {
            name: name.into(),
            serialized_name: serialized_name.into(),
            element,
            cardinality: Cardinality::Single,
            required: true,
            is_location: false,
            summary: None,
            facets: SchemaFacets::default(),
        }
    }

    pub fn is_list(&self) -> bool {
        self.cardinality == Cardinality::List
    }

    /// Singular node references are always nullable; scalars only when optional.
    pub fn is_nullable(&self) -> bool {
        !self.is_list() && (self.element.is_node() || !self.required)
    }

    pub fn copy_strategy(&self) -> CopyStrategy {
        if self.is_list() {
            CopyStrategy::Deep
        } else if self.element.is_node() {
            CopyStrategy::NullableDeep
        } else {
            CopyStrategy::ByValue
        }
    }

    pub fn equality_strategy(&self) -> EqualityStrategy {
        if self.is_nullable() {
            EqualityStrategy::NullSafe
        } else if !self.is_list()
            && (self.element.is_numeric()
                || matches!(self.element, ElementType::Boolean | ElementType::Enum(_)))
        {
            EqualityStrategy::Value
        } else {
            EqualityStrategy::Structural
        }
    }

    /// Properties whose values are nodes get visited.
    pub fn is_visited(&self) -> bool {
        self.element.is_node()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayStyle {
    /// Pre-stringified.
    Numeric,
    Plain,
    /// `<Name>(null)` when absent.
    Nullable,
    /// `[a, b]`, or the item delimiter of the grammar in place of `,`.
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayArg {
    pub property: String,
    pub style: DisplayStyle,
    /// The terminal separating list items, as in `Item (';' Item)*`.
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayPlan {
    /// A format template with `{}` slots, literal braces escaped as `{{`/`}}`.
    Format { template: String, args: Vec<DisplayArg> },
    /// The `StringValue` of a constant alternative.
    StringValue,
    /// Collections render their items as `[a, b]`.
    Items { property: String },
    /// Abstract bases render the live subclass.
    Delegate,
}

/// One arm of the generated `set_property` match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetterPlan {
    pub key: String,
    pub property: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassForm {
    /// An ordinary sequence of symbols.
    Sequence,
    ConstantAlternative,
    Collection,
    /// The distinguished identifier type.
    Identifier,
    /// An abstract base induced by an alternation.
    Abstract,
}

/// A concrete leaf reachable from an abstract base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPath {
    pub leaf: String,
    /// Intermediate bases from the leaf upwards, excluding the base itself.
    pub via: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPlan {
    pub name: String,
    /// The defining production; `None` for synthesized classes.
    pub production: Option<String>,
    pub super_class: Option<String>,
    pub is_abstract: bool,
    pub form: ClassForm,
    pub properties: Vec<PropertyPlan>,
    pub display: DisplayPlan,
    pub setters: Vec<SetterPlan>,
    /// Direct subclasses, for abstract classes.
    pub subclasses: Vec<String>,
    /// Every concrete leaf below an abstract class.
    pub leaves: Vec<LeafPath>,
    pub summary: Option<String>,
    pub remarks: Option<String>,
}

impl ClassPlan {
    pub fn property(&self, name: &str) -> Option<&PropertyPlan> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn tracks_locations(&self) -> bool {
        self.properties.iter().any(|p| p.is_location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub literal: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumPlan {
    pub name: String,
    pub production: String,
    pub members: Vec<EnumMember>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPlan {
    pub name: String,
    pub instantiation: DictionaryInstantiation,
    /// Dictionary-shaped productions that stand for this wrapper.
    pub aliases: Vec<String>,
    pub key_name: Option<String>,
    pub value_name: Option<String>,
    pub summary: Option<String>,
}

impl DictionaryPlan {
    pub fn value_type(&self) -> &ElementType {
        &self.instantiation.value_type
    }
}

/// The discriminant enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindPlan {
    pub name: String,
    /// `None` first, then every other discriminant in sorted order.
    pub members: Vec<String>,
}

impl KindPlan {
    pub const NONE: &'static str = "None";
}

/// The closed union over every concrete node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePlan {
    pub name: String,
    pub ref_name: String,
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchArm {
    pub kind: String,
    pub class: String,
    pub method: String,
    /// Abstract discriminants never occur on live nodes.
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitStep {
    pub property: String,
    pub element: ElementType,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitBody {
    /// Visit each listed property.
    Properties(Vec<VisitStep>),
    /// Visit every value of a dictionary wrapper.
    DictionaryValues { element: ElementType },
    /// Abstract stub: forward to the concrete subclass method.
    CastThrough { subclasses: Vec<(String, String)> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitMethod {
    pub class: String,
    pub method: String,
    pub body: VisitBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorPlan {
    pub name: String,
    pub rewriting: bool,
    pub arms: Vec<DispatchArm>,
    pub methods: Vec<VisitMethod>,
}

impl VisitorPlan {
    pub fn arm(&self, kind: &str) -> Option<&DispatchArm> {
        self.arms.iter().find(|a| a.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonEntry {
    pub key: String,
    pub property: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonBody {
    /// Fixed entries in declaration order.
    Entries(Vec<JsonEntry>),
    /// One entry per dictionary key, in insertion order.
    DictionaryEntries,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonObjectPlan {
    pub class: String,
    pub type_name: String,
    pub write_locations: bool,
    pub body: JsonBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerPlan {
    pub objects: Vec<JsonObjectPlan>,
}

impl SerializerPlan {
    pub fn object(&self, class: &str) -> Option<&JsonObjectPlan> {
        self.objects.iter().find(|o| o.class == class)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaPlan {
    pub document: serde_json::Value,
}

impl SchemaPlan {
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.document).unwrap_or_default()
    }
}

/// The complete output of one compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataModel {
    pub grammar_name: String,
    pub namespace: Option<String>,
    pub options: Options,
    pub kinds: KindPlan,
    pub classes: Vec<ClassPlan>,
    pub enums: Vec<EnumPlan>,
    pub dictionaries: Vec<DictionaryPlan>,
    pub nodes: NodePlan,
    pub visitor: VisitorPlan,
    pub rewriting_visitor: VisitorPlan,
    pub serializer: SerializerPlan,
    pub schema: SchemaPlan,
}

/// A reference to one emission plan.
#[derive(Debug, Clone, Copy)]
pub enum EmissionPlan<'a> {
    Kinds(&'a KindPlan),
    Class(&'a ClassPlan),
    Enum(&'a EnumPlan),
    Dictionary(&'a DictionaryPlan),
    Nodes(&'a NodePlan),
    Visitor(&'a VisitorPlan),
    Serializer(&'a SerializerPlan),
    Schema(&'a SchemaPlan),
}

impl fmt::Display for EmissionPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmissionPlan::Kinds(k) => write!(f, "kinds {}", k.name),
            EmissionPlan::Class(c) if c.is_abstract => write!(f, "interface {}", c.name),
            EmissionPlan::Class(c) if c.form == ClassForm::Collection => write!(f, "collection {}", c.name),
            EmissionPlan::Class(c) => write!(f, "class {}", c.name),
            EmissionPlan::Enum(e) => write!(f, "enum {}", e.name),
            EmissionPlan::Dictionary(d) => write!(f, "dictionary {}", d.name),
            EmissionPlan::Nodes(n) => write!(f, "nodes {}", n.name),
            EmissionPlan::Visitor(v) => write!(f, "visitor {}", v.name),
            EmissionPlan::Serializer(_) => write!(f, "serializer"),
            EmissionPlan::Schema(_) => write!(f, "schema"),
        }
    }
}

impl DataModel {
    /// Every plan in emission order.
    pub fn plans(&self) -> Vec<EmissionPlan<'_>> {
        let mut plans = vec![EmissionPlan::Kinds(&self.kinds)];
        plans.extend(self.classes.iter().map(EmissionPlan::Class));
        plans.extend(self.enums.iter().map(EmissionPlan::Enum));
        plans.extend(self.dictionaries.iter().map(EmissionPlan::Dictionary));
        plans.push(EmissionPlan::Nodes(&self.nodes));
        plans.push(EmissionPlan::Visitor(&self.visitor));
        plans.push(EmissionPlan::Visitor(&self.rewriting_visitor));
        plans.push(EmissionPlan::Serializer(&self.serializer));
        plans.push(EmissionPlan::Schema(&self.schema));
        plans
    }

    pub fn class(&self, name: &str) -> Option<&ClassPlan> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumPlan> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn dictionary(&self, name: &str) -> Option<&DictionaryPlan> {
        self.dictionaries.iter().find(|d| d.name == name)
    }

    /// Name of the generated module.
    pub fn module_name(&self) -> String {
        crate::naming::snake(&self.grammar_name)
    }
}
