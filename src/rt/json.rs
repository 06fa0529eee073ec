//! Hand-written JSON encoding and the generic decoder.
//!
//! Every object starts with its `"__type"` entry, so every property written
//! afterwards is preceded by a comma.

use super::{FromValue, GrammarDictionary, SyntaxNode, Value};
use std::fmt::Write;
use thiserror::Error;

pub const TYPE_KEY: &str = "__type";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("object without a \"__type\" entry")]
    MissingType,

    #[error("unknown node type '{0}'")]
    UnknownType(String),

    #[error("cannot assign property '{property}' of '{type_name}'")]
    UnknownProperty { type_name: String, property: String },

    #[error("the decoded value is not a {expected}")]
    TypeMismatch { expected: &'static str },
}

/// Types that encode themselves with a [`JsonWriter`].
pub trait WriteJson {
    fn write_json(&self, writer: &mut JsonWriter);
}

/// Compact JSON output.
#[derive(Debug, Default)]
pub struct JsonWriter {
    out: String,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn begin_object(&mut self, type_name: &str) {
        self.out.push('{');
        self.write_string(TYPE_KEY);
        self.out.push(':');
        self.write_string(type_name);
    }

    pub fn write_location(&mut self, offset: i64, length: i64) {
        self.write_property("offset", &offset);
        self.write_property("length", &length);
    }

    pub fn write_property<T: WriteJson + ?Sized>(&mut self, key: &str, value: &T) {
        self.out.push(',');
        self.write_string(key);
        self.out.push(':');
        value.write_json(self);
    }

    pub fn end_object(&mut self) {
        self.out.push('}');
    }

    pub fn write_null(&mut self) {
        self.out.push_str("null");
    }

    pub fn write_bool(&mut self, value: bool) {
        self.out.push_str(if value { "true" } else { "false" });
    }

    pub fn write_number(&mut self, value: f64) {
        if value.is_finite() {
            let _ = write!(self.out, "{}", value);
        } else {
            self.write_null();
        }
    }

    pub fn write_integer(&mut self, value: i64) {
        let _ = write!(self.out, "{}", value);
    }

    pub fn write_string(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    let _ = write!(self.out, "\\u{:04x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    pub fn write_list<T: WriteJson>(&mut self, items: &[T]) {
        self.out.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            item.write_json(self);
        }
        self.out.push(']');
    }

    /// A dictionary wrapper: the type tag, then one entry per key in insertion order.
    pub fn write_dictionary<V: WriteJson>(&mut self, type_name: &str, entries: &GrammarDictionary<V>) {
        self.begin_object(type_name);
        for (key, value) in entries.iter() {
            self.write_property(key, value);
        }
        self.end_object();
    }
}

impl WriteJson for str {
    fn write_json(&self, writer: &mut JsonWriter) {
        writer.write_string(self);
    }
}

impl WriteJson for String {
    fn write_json(&self, writer: &mut JsonWriter) {
        writer.write_string(self);
    }
}

impl WriteJson for f64 {
    fn write_json(&self, writer: &mut JsonWriter) {
        writer.write_number(*self);
    }
}

impl WriteJson for i64 {
    fn write_json(&self, writer: &mut JsonWriter) {
        writer.write_integer(*self);
    }
}

impl WriteJson for bool {
    fn write_json(&self, writer: &mut JsonWriter) {
        writer.write_bool(*self);
    }
}

impl<T: WriteJson> WriteJson for Option<T> {
    fn write_json(&self, writer: &mut JsonWriter) {
        match self {
            Some(value) => value.write_json(writer),
            None => writer.write_null(),
        }
    }
}

impl<T: WriteJson + ?Sized> WriteJson for Box<T> {
    fn write_json(&self, writer: &mut JsonWriter) {
        (**self).write_json(writer);
    }
}

impl<T: WriteJson> WriteJson for Vec<T> {
    fn write_json(&self, writer: &mut JsonWriter) {
        writer.write_list(self);
    }
}

pub fn to_json<T: WriteJson + ?Sized>(value: &T) -> String {
    let mut writer = JsonWriter::new();
    value.write_json(&mut writer);
    writer.finish()
}

/// Rebuilds a value tree, creating nodes through the factory of `N`.
pub fn decode_value<N: SyntaxNode>(json: &serde_json::Value) -> Result<Value<N>, DecodeError> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(
            items
                .iter()
                .map(decode_value::<N>)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        serde_json::Value::Object(fields) => {
            let type_name = fields
                .get(TYPE_KEY)
                .and_then(serde_json::Value::as_str)
                .ok_or(DecodeError::MissingType)?;
            let mut node =
                N::create(type_name).ok_or_else(|| DecodeError::UnknownType(type_name.to_string()))?;
            for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != TYPE_KEY) {
                if !node.set_property(key, decode_value(value)?) {
                    return Err(DecodeError::UnknownProperty {
                        type_name: type_name.to_string(),
                        property: key.clone(),
                    });
                }
            }
            Value::Node(node)
        }
    })
}

/// Decodes JSON text into a typed node.
pub fn from_json<N, T>(text: &str) -> Result<T, DecodeError>
where
    N: SyntaxNode,
    T: FromValue<N>,
{
    let json: serde_json::Value = serde_json::from_str(text)?;
    let value = decode_value::<N>(&json)?;
    T::from_value(value).ok_or(DecodeError::TypeMismatch {
        expected: std::any::type_name::<T>(),
    })
}
