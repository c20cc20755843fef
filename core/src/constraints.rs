//! # Constraint Sets
//!
//! Immutable bags of validation facts (ranges, lengths, patterns, uniqueness)
//! attached to a field or a type, and the merge rule between two of them.

use crate::python;
use indexmap::IndexMap;
use serde_json::{Number, Value as JsonValue};
use std::collections::BTreeMap;

/// The closed set of constraint kinds understood by the core.
///
/// The declaration order is the canonical rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    /// `uniqueItems`
    UniqueItems,
    /// `exclusiveMinimum` (rendered `gt`)
    Gt,
    /// `minimum` (rendered `ge`)
    Ge,
    /// `exclusiveMaximum` (rendered `lt`)
    Lt,
    /// `maximum` (rendered `le`)
    Le,
    /// `multipleOf`
    MultipleOf,
    /// `minItems`
    MinItems,
    /// `maxItems`
    MaxItems,
    /// `minLength`
    MinLength,
    /// `maxLength`
    MaxLength,
    /// `pattern`
    Pattern,
}

impl ConstraintKind {
    /// All kinds in canonical order.
    pub const ALL: [ConstraintKind; 11] = [
        ConstraintKind::UniqueItems,
        ConstraintKind::Gt,
        ConstraintKind::Ge,
        ConstraintKind::Lt,
        ConstraintKind::Le,
        ConstraintKind::MultipleOf,
        ConstraintKind::MinItems,
        ConstraintKind::MaxItems,
        ConstraintKind::MinLength,
        ConstraintKind::MaxLength,
        ConstraintKind::Pattern,
    ];

    /// The schema keyword this kind is read from.
    pub fn schema_key(self) -> &'static str {
        match self {
            ConstraintKind::UniqueItems => "uniqueItems",
            ConstraintKind::Gt => "exclusiveMinimum",
            ConstraintKind::Ge => "minimum",
            ConstraintKind::Lt => "exclusiveMaximum",
            ConstraintKind::Le => "maximum",
            ConstraintKind::MultipleOf => "multipleOf",
            ConstraintKind::MinItems => "minItems",
            ConstraintKind::MaxItems => "maxItems",
            ConstraintKind::MinLength => "minLength",
            ConstraintKind::MaxLength => "maxLength",
            ConstraintKind::Pattern => "pattern",
        }
    }

    /// Looks a kind up by schema keyword or by its argument name.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.schema_key() == key || k.argument_name() == key)
            .or(match key {
                "regex" => Some(ConstraintKind::Pattern),
                _ => None,
            })
    }

    /// The keyword argument name used in generated `Field(...)` calls.
    pub fn argument_name(self) -> &'static str {
        match self {
            ConstraintKind::UniqueItems => "unique_items",
            ConstraintKind::Gt => "gt",
            ConstraintKind::Ge => "ge",
            ConstraintKind::Lt => "lt",
            ConstraintKind::Le => "le",
            ConstraintKind::MultipleOf => "multiple_of",
            ConstraintKind::MinItems => "min_items",
            ConstraintKind::MaxItems => "max_items",
            ConstraintKind::MinLength => "min_length",
            ConstraintKind::MaxLength => "max_length",
            ConstraintKind::Pattern => "pattern",
        }
    }

    /// Numeric comparison kinds, whose values follow the field's number type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            ConstraintKind::Gt | ConstraintKind::Ge | ConstraintKind::Lt | ConstraintKind::Le
        )
    }

    fn parse_value(self, value: &JsonValue) -> Option<ConstraintValue> {
        match self {
            ConstraintKind::UniqueItems => value.as_bool().map(ConstraintValue::Flag),
            ConstraintKind::Gt
            | ConstraintKind::Ge
            | ConstraintKind::Lt
            | ConstraintKind::Le
            | ConstraintKind::MultipleOf => value.as_number().cloned().map(ConstraintValue::Number),
            ConstraintKind::MinItems
            | ConstraintKind::MaxItems
            | ConstraintKind::MinLength
            | ConstraintKind::MaxLength => value.as_u64().map(ConstraintValue::Count),
            ConstraintKind::Pattern => value.as_str().map(|s| ConstraintValue::Text(s.to_string())),
        }
    }
}

/// One constraint value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintValue {
    /// Boolean facts (`uniqueItems`).
    Flag(bool),
    /// Numeric bounds, integer or float as written in the schema.
    Number(Number),
    /// Non-negative counts (lengths, item counts).
    Count(u64),
    /// Regular expressions.
    Text(String),
}

impl ConstraintValue {
    /// Renders the value as a Python literal.
    pub fn to_python(&self) -> String {
        match self {
            ConstraintValue::Flag(b) => python::bool_literal(*b).to_string(),
            ConstraintValue::Number(n) => python::repr(&JsonValue::Number(n.clone())),
            ConstraintValue::Count(c) => c.to_string(),
            ConstraintValue::Text(s) => python::str_repr(s),
        }
    }

    /// Coerces a numeric value to float or to (truncated) int.
    pub fn coerced(&self, as_float: bool) -> ConstraintValue {
        let ConstraintValue::Number(n) = self else {
            return self.clone();
        };
        if as_float {
            match n.as_f64().and_then(Number::from_f64) {
                Some(f) if !n.is_f64() => ConstraintValue::Number(f),
                _ => self.clone(),
            }
        } else if n.is_f64() {
            let truncated = n.as_f64().map(f64::trunc).unwrap_or_default() as i64;
            ConstraintValue::Number(Number::from(truncated))
        } else {
            self.clone()
        }
    }
}

/// An immutable bag of constraints.
///
/// Absent kinds are simply not stored, so an empty set carries no constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    values: BTreeMap<ConstraintKind, ConstraintValue>,
}

impl ConstraintSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads constraints from schema keywords.
    ///
    /// With `item_bounds_as_length`, the legacy `minItems`/`maxItems` keys are
    /// translated into `minLength`/`maxLength` first; an explicit canonical key
    /// present in the same map still wins. Unknown keys and `null` values are
    /// ignored.
    pub fn from_keywords<'a, I>(keywords: I, item_bounds_as_length: bool) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a JsonValue)>,
    {
        let mut raw: IndexMap<&str, &JsonValue> = keywords
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
            .collect();

        if item_bounds_as_length {
            for (legacy, canonical) in [("minItems", "minLength"), ("maxItems", "maxLength")] {
                if let Some(value) = raw.shift_remove(legacy) {
                    raw.entry(canonical).or_insert(value);
                }
            }
        }

        let mut values = BTreeMap::new();
        for (key, value) in raw {
            let Some(kind) = ConstraintKind::from_key(key) else {
                continue;
            };
            if let Some(parsed) = kind.parse_value(value) {
                values.insert(kind, parsed);
            }
        }
        ConstraintSet { values }
    }

    /// Returns a copy with `kind` set to `value`.
    pub fn with(mut self, kind: ConstraintKind, value: ConstraintValue) -> Self {
        self.values.insert(kind, value);
        self
    }

    /// Whether at least one kind carries a value.
    pub fn has_constraints(&self) -> bool {
        !self.values.is_empty()
    }

    /// The value of one kind.
    pub fn get(&self, kind: ConstraintKind) -> Option<&ConstraintValue> {
        self.values.get(&kind)
    }

    /// The pattern, if any.
    pub fn pattern(&self) -> Option<&str> {
        match self.values.get(&ConstraintKind::Pattern) {
            Some(ConstraintValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Iterates present constraints in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ConstraintKind, &ConstraintValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Merges two optional sets; `b` overrides `a` on overlapping kinds.
    ///
    /// When only one side is present its values are used as-is; when neither
    /// is, the merge yields nothing. Operands are never modified.
    pub fn merge(a: Option<&ConstraintSet>, b: Option<&ConstraintSet>) -> Option<ConstraintSet> {
        match (a, b) {
            (None, None) => None,
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (Some(a), Some(b)) => {
                let mut values = a.values.clone();
                values.extend(b.values.iter().map(|(k, v)| (*k, v.clone())));
                Some(ConstraintSet { values })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn set(value: JsonValue, legacy: bool) -> ConstraintSet {
        let map: Map<String, JsonValue> = serde_json::from_value(value).unwrap();
        ConstraintSet::from_keywords(&map, legacy)
    }

    #[test]
    fn test_empty_set_has_no_constraints() {
        let c = set(json!({"minLength": null, "title": "ignored"}), false);
        assert!(!c.has_constraints());
    }

    #[test]
    fn test_merge_prefers_b() {
        let a = set(json!({"minLength": 1, "maxLength": 10}), false);
        let b = set(json!({"maxLength": 5, "pattern": "^a"}), false);
        let merged = ConstraintSet::merge(Some(&a), Some(&b)).unwrap();
        assert_eq!(merged.get(ConstraintKind::MinLength), Some(&ConstraintValue::Count(1)));
        assert_eq!(merged.get(ConstraintKind::MaxLength), Some(&ConstraintValue::Count(5)));
        assert_eq!(merged.pattern(), Some("^a"));
        // operands untouched
        assert_eq!(a.get(ConstraintKind::MaxLength), Some(&ConstraintValue::Count(10)));
    }

    #[test]
    fn test_merge_with_empty_b_is_a() {
        let a = set(json!({"minimum": 3}), false);
        let b = ConstraintSet::new();
        assert_eq!(ConstraintSet::merge(Some(&a), Some(&b)), Some(a.clone()));
        assert_eq!(ConstraintSet::merge(Some(&a), None), Some(a));
    }

    #[test]
    fn test_merge_neither_side() {
        assert_eq!(ConstraintSet::merge(None, None), None);
    }

    #[test]
    fn test_legacy_item_bounds_translate_but_canonical_wins() {
        let c = set(json!({"minItems": 2, "maxItems": 9, "maxLength": 4}), true);
        assert_eq!(c.get(ConstraintKind::MinLength), Some(&ConstraintValue::Count(2)));
        assert_eq!(c.get(ConstraintKind::MaxLength), Some(&ConstraintValue::Count(4)));
        assert_eq!(c.get(ConstraintKind::MinItems), None);

        let untranslated = set(json!({"minItems": 2}), false);
        assert_eq!(untranslated.get(ConstraintKind::MinItems), Some(&ConstraintValue::Count(2)));
    }

    #[test]
    fn test_coercion() {
        let v = ConstraintValue::Number(Number::from(3));
        assert_eq!(v.coerced(true).to_python(), "3.0");
        let f = ConstraintValue::Number(Number::from_f64(2.7).unwrap());
        assert_eq!(f.coerced(false).to_python(), "2");
    }
}
