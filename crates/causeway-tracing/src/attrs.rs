//! Attributes and call-site arguments.
//!
//! The recording macros accept a flat argument list mixing an optional
//! causal link with attribute values. Both are wrapped in the closed
//! [`CallArg`] enum by the [`caused_by`] and [`attr`] constructors, so an
//! unsupported argument kind is unrepresentable rather than a runtime error.

use crate::counters::TracingCounters;
use crate::dispatch;
use crate::Id;

/// Inline attribute capacity of a tracelet. Attributes beyond this are
/// dropped and counted.
pub const MAX_ATTRIBUTES_PER_TRACELET: usize = 6;

/// A tagged attribute value. Strings are carried as interner hashes so the
/// record stays fixed-size and `Copy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(u64),
}

impl Default for AttrValue {
    fn default() -> Self {
        Self::Bool(false)
    }
}

/// An interned key hash paired with a value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attribute {
    pub key: u64,
    pub value: AttrValue,
}

impl Attribute {
    /// The sentinel written into unused tracelet slots.
    pub const EMPTY: Self = Self {
        key: 0,
        value: AttrValue::Bool(false),
    };
}

/// An explicit causal link to another trace entity, independent of nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CausedBy(pub Id);

/// One argument in a recording call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallArg {
    Cause(CausedBy),
    Attr(Attribute),
}

/// Tags `id` as the cause of the span or event being recorded.
pub fn caused_by(id: Id) -> CallArg {
    CallArg::Cause(CausedBy(id))
}

/// Builds an attribute from a key and one of the supported value types.
/// Both the key and any string value are interned immediately.
pub fn attr(key: &str, value: impl IntoAttrValue) -> CallArg {
    CallArg::Attr(Attribute {
        key: dispatch::intern_string(key),
        value: value.into_attr_value(),
    })
}

pub trait IntoAttrValue {
    fn into_attr_value(self) -> AttrValue;
}

impl IntoAttrValue for AttrValue {
    fn into_attr_value(self) -> AttrValue {
        self
    }
}

impl IntoAttrValue for bool {
    fn into_attr_value(self) -> AttrValue {
        AttrValue::Bool(self)
    }
}

impl IntoAttrValue for i64 {
    fn into_attr_value(self) -> AttrValue {
        AttrValue::I64(self)
    }
}

impl IntoAttrValue for i32 {
    fn into_attr_value(self) -> AttrValue {
        AttrValue::I64(i64::from(self))
    }
}

impl IntoAttrValue for u32 {
    fn into_attr_value(self) -> AttrValue {
        AttrValue::I64(i64::from(self))
    }
}

impl IntoAttrValue for f64 {
    fn into_attr_value(self) -> AttrValue {
        AttrValue::F64(self)
    }
}

impl IntoAttrValue for f32 {
    fn into_attr_value(self) -> AttrValue {
        AttrValue::F64(f64::from(self))
    }
}

impl IntoAttrValue for &str {
    fn into_attr_value(self) -> AttrValue {
        AttrValue::Str(dispatch::intern_string(self))
    }
}

impl IntoAttrValue for String {
    fn into_attr_value(self) -> AttrValue {
        AttrValue::Str(dispatch::intern_string(&self))
    }
}

/// Splits a call-site argument list into the first cause tag and the
/// attributes in declaration order, bounded by the tracelet capacity.
/// Overflowing attributes are dropped and counted.
pub(crate) fn parse_call_args(
    args: &[CallArg],
    counters: &TracingCounters,
) -> (Id, [Attribute; MAX_ATTRIBUTES_PER_TRACELET], u8) {
    let mut cause: Option<Id> = None;
    let mut attrs = [Attribute::EMPTY; MAX_ATTRIBUTES_PER_TRACELET];
    let mut count: usize = 0;
    let mut truncated: u64 = 0;
    for arg in args {
        match arg {
            CallArg::Cause(tag) => {
                if cause.is_none() {
                    cause = Some(tag.0);
                }
            }
            CallArg::Attr(attribute) => {
                if count < MAX_ATTRIBUTES_PER_TRACELET {
                    attrs[count] = *attribute;
                    count += 1;
                } else {
                    truncated += 1;
                }
            }
        }
    }
    if truncated > 0 {
        counters.note_truncated_attributes(truncated);
    }
    (cause.unwrap_or(Id::INVALID), attrs, count as u8)
}
