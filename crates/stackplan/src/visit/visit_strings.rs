use super::VisitMut;
use crate::value::{Properties, Value};

/// Recursively visit all string leaves mutably
///
/// The visitor receives the enclosing [Value] (always a [Value::String]) so it may replace the
/// leaf with a value of a different type.
pub trait VisitStringsMut {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<Value>);
}

impl VisitStringsMut for Value {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<Value>) {
        match self {
            Value::String(_) => visitor.visit_mut(self),
            Value::Array(array) => {
                for value in array {
                    value.visit_strings_mut(visitor);
                }
            }
            Value::Object(object) => object.visit_strings_mut(visitor),
            Value::Boolean(_) | Value::Integer(_) | Value::Decimal(_) => {}
        }
    }
}

impl VisitStringsMut for Properties {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<Value>) {
        for value in self.values_mut() {
            value.visit_strings_mut(visitor);
        }
    }
}
