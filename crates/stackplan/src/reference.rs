//! `${...}` placeholders
//!
//! Two placeholder grammars are understood:
//!
//! | placeholder | resolves to |
//! |---|---|
//! | `${resources.<name>.<attribute>}` | output `<attribute>` recorded for resource `<name>` |
//! | `${resources.<name>}` | output `id` recorded for resource `<name>` |
//! | `${vars.<name>}` | variable `<name>` |
//!
//! Anything else (including `${other.namespace}`) is left untouched.
//!
//! A string that is exactly one placeholder (surrounding whitespace ignored) is replaced by the
//! referenced value, keeping its type. Placeholders embedded in a longer string are spliced in
//! textually using [Value::to_template_string].
use crate::store::OutputStore;
use crate::value::{Properties, Value};
use crate::visit::{VisitMut, VisitStringsMut};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Named variables available to `${vars.<name>}`
pub type Variables = indexmap::IndexMap<String, Value>;

/// Attribute used when a resource placeholder omits one
pub const DEFAULT_ATTRIBUTE: &str = "id";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(resources|vars)\.([^}]*)\}").expect("placeholder pattern must compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Resource {
        name: String,
        attribute: Option<String>,
    },
    Variable {
        name: String,
    },
}

impl Reference {
    fn from_parts(namespace: &str, path: &str) -> Option<Self> {
        match namespace {
            "resources" => {
                let (name, attribute) = match path.split_once('.') {
                    Some((name, attribute)) => (name, Some(attribute)),
                    None => (path, None),
                };

                if name.is_empty() || attribute.is_some_and(str::is_empty) {
                    return None;
                }

                Some(Reference::Resource {
                    name: name.to_string(),
                    attribute: attribute.map(str::to_string),
                })
            }
            "vars" if !path.is_empty() => Some(Reference::Variable {
                name: path.to_string(),
            }),
            _ => None,
        }
    }

    fn from_captures(captures: &Captures) -> Option<Self> {
        Self::from_parts(&captures[1], &captures[2])
    }

    /// Parses a string that is exactly one placeholder
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let captures = PLACEHOLDER.captures(s)?;
        let whole = captures.get(0)?;
        if whole.start() != 0 || whole.end() != s.len() {
            return None;
        }

        Self::from_captures(&captures)
    }

    /// All well-formed placeholders embedded in `s`, in order of appearance
    pub fn find_all(s: &str) -> impl Iterator<Item = Reference> + '_ {
        PLACEHOLDER
            .captures_iter(s)
            .filter_map(|captures| Self::from_captures(&captures))
    }

    /// The resource or variable name, without any attribute
    pub fn root(&self) -> &str {
        match self {
            Reference::Resource { name, .. } => name,
            Reference::Variable { name } => name,
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Resource {
                name,
                attribute: Some(attribute),
            } => write!(f, "${{resources.{name}.{attribute}}}"),
            Reference::Resource {
                name,
                attribute: None,
            } => write!(f, "${{resources.{name}}}"),
            Reference::Variable { name } => write!(f, "${{vars.{name}}}"),
        }
    }
}

/// Resource name a `depends_on` entry points at
///
/// Entries may be written as bare names or as `${resources.<name>}`.
pub fn dependency_name(entry: &str) -> String {
    match Reference::parse(entry) {
        Some(Reference::Resource { name, .. }) => name,
        _ => entry.trim().to_string(),
    }
}

/// Replaces each well-formed placeholder by its root name
///
/// `${resources.X.Y}` becomes `X`, `${vars.X}` becomes `X`. Malformed placeholders are kept.
pub fn strip_placeholders(s: &str) -> String {
    PLACEHOLDER
        .replace_all(s, |captures: &Captures| match Reference::from_captures(captures) {
            Some(reference) => reference.root().to_string(),
            None => captures[0].to_string(),
        })
        .into_owned()
}

/// Everything a placeholder may resolve against
#[derive(derive_new::new, Debug, Clone, Copy)]
pub struct Context<'a> {
    outputs: &'a OutputStore,
    variables: &'a Variables,
}

impl<'a> Context<'a> {
    fn lookup(
        &self,
        reference: &Reference,
        placeholder: &str,
    ) -> Result<&'a Value, UnresolvedReferenceError> {
        match reference {
            Reference::Resource { name, attribute } => {
                let attribute = attribute.as_deref().unwrap_or(DEFAULT_ATTRIBUTE);
                if !self.outputs.is_deployed(name) {
                    return Err(UnresolvedReferenceError::NotDeployed {
                        placeholder: placeholder.to_string(),
                        resource: name.clone(),
                    });
                }

                self.outputs.get(name, attribute).ok_or_else(|| {
                    UnresolvedReferenceError::MissingOutput {
                        placeholder: placeholder.to_string(),
                        resource: name.clone(),
                        attribute: attribute.to_string(),
                    }
                })
            }
            Reference::Variable { name } => self.variables.get(name).ok_or_else(|| {
                UnresolvedReferenceError::MissingVariable {
                    placeholder: placeholder.to_string(),
                    variable: name.clone(),
                }
            }),
        }
    }
}

/// Resolves a single string
#[tracing::instrument(level = "trace", skip(context))]
pub fn resolve_str(s: &str, context: &Context) -> Result<Value, UnresolvedReferenceError> {
    let trimmed = s.trim();
    if let Some(captures) = PLACEHOLDER.captures(trimmed) {
        if captures.get(0).is_some_and(|m| m.range() == (0..trimmed.len())) {
            let reference = Reference::from_captures(&captures)
                .ok_or_else(|| UnresolvedReferenceError::Malformed(trimmed.to_string()))?;
            return context.lookup(&reference, trimmed).cloned();
        }
    }

    let mut resolved = String::with_capacity(s.len());
    let mut last = 0;
    for captures in PLACEHOLDER.captures_iter(s) {
        let Some(whole) = captures.get(0) else {
            continue;
        };

        let reference = Reference::from_captures(&captures)
            .ok_or_else(|| UnresolvedReferenceError::Malformed(whole.as_str().to_string()))?;
        let value = context.lookup(&reference, whole.as_str())?;

        resolved.push_str(&s[last..whole.start()]);
        resolved.push_str(&value.to_template_string());
        last = whole.end();
    }
    resolved.push_str(&s[last..]);

    tracing::trace!(%resolved, "after substitution");
    Ok(Value::String(resolved))
}

/// Resolves every string leaf of `value`, returning a new value
pub fn resolve(value: &Value, context: &Context) -> Result<Value, UnresolvedReferenceError> {
    let mut resolved = value.clone();
    let mut resolver = Resolver::new(context);
    resolved.visit_strings_mut(&mut resolver);
    resolver.finish().map(|()| resolved)
}

/// Resolves every string leaf of a property bag, returning a new bag
pub fn resolve_properties(
    properties: &Properties,
    context: &Context,
) -> Result<Properties, UnresolvedReferenceError> {
    let mut resolved = properties.clone();
    let mut resolver = Resolver::new(context);
    resolved.visit_strings_mut(&mut resolver);
    resolver.finish().map(|()| resolved)
}

/// Visitor that substitutes placeholders in place and keeps the first failure
#[derive(derive_new::new)]
struct Resolver<'c, 'a> {
    context: &'c Context<'a>,
    #[new(default)]
    error: Option<UnresolvedReferenceError>,
}

impl Resolver<'_, '_> {
    fn finish(self) -> Result<(), UnresolvedReferenceError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl VisitMut<Value> for Resolver<'_, '_> {
    fn visit_mut(&mut self, value: &mut Value) {
        if self.error.is_some() {
            return;
        }

        let Value::String(s) = value else {
            return;
        };

        match resolve_str(s, self.context) {
            Ok(resolved) => *value = resolved,
            Err(error) => self.error = Some(error),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UnresolvedReferenceError {
    #[error("unresolved reference `{placeholder}`: resource `{resource}` has not been deployed yet")]
    NotDeployed {
        placeholder: String,
        resource: String,
    },
    #[error("unresolved reference `{placeholder}`: resource `{resource}` has no output `{attribute}`")]
    MissingOutput {
        placeholder: String,
        resource: String,
        attribute: String,
    },
    #[error("unresolved reference `{placeholder}`: variable `{variable}` is not defined")]
    MissingVariable {
        placeholder: String,
        variable: String,
    },
    #[error("unresolved reference `{placeholder}`: resource `{resource}` is not part of the deployment")]
    UnknownResource {
        placeholder: String,
        resource: String,
    },
    #[error("malformed reference `{0}`")]
    Malformed(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outputs() -> OutputStore {
        let mut outputs = OutputStore::default();
        outputs.mark_deployed("wh");
        outputs.record("wh", "id", Value::Integer(42));
        outputs.record("wh", "serverless", Value::Boolean(true));
        outputs
    }

    fn variables() -> Variables {
        Variables::from_iter([("env".to_string(), Value::from("prod"))])
    }

    #[test]
    fn variable() {
        let (outputs, variables) = (outputs(), variables());
        let context = Context::new(&outputs, &variables);

        assert_eq!(
            resolve_str("${vars.env}", &context),
            Ok(Value::from("prod"))
        );
        assert_eq!(
            resolve_str("prefix-${vars.env}-suffix", &context),
            Ok(Value::from("prefix-prod-suffix"))
        );
    }

    #[test]
    fn whole_placeholder_keeps_native_type() {
        let (outputs, variables) = (outputs(), variables());
        let context = Context::new(&outputs, &variables);

        assert_eq!(
            resolve_str("${resources.wh.id}", &context),
            Ok(Value::Integer(42))
        );
        assert_eq!(
            resolve_str("  ${resources.wh.serverless} ", &context),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            resolve_str("prefix-${resources.wh.id}", &context),
            Ok(Value::from("prefix-42"))
        );
    }

    #[test]
    fn bare_resource_resolves_to_id() {
        let (outputs, variables) = (outputs(), variables());
        let context = Context::new(&outputs, &variables);

        assert_eq!(
            resolve_str("${resources.wh}", &context),
            Ok(Value::Integer(42))
        );
    }

    #[test]
    fn missing_resource_fails() {
        let (outputs, variables) = (outputs(), variables());
        let context = Context::new(&outputs, &variables);

        assert_eq!(
            resolve_str("${resources.missing.id}", &context),
            Err(UnresolvedReferenceError::NotDeployed {
                placeholder: "${resources.missing.id}".to_string(),
                resource: "missing".to_string(),
            })
        );
        assert!(matches!(
            resolve_str("${resources.wh.url}", &context),
            Err(UnresolvedReferenceError::MissingOutput { .. })
        ));
    }

    #[test]
    fn missing_variable_fails() {
        let (outputs, variables) = (outputs(), variables());
        let context = Context::new(&outputs, &variables);

        assert!(matches!(
            resolve_str("a-${vars.region}", &context),
            Err(UnresolvedReferenceError::MissingVariable { variable, .. }) if variable == "region"
        ));
    }

    #[test]
    fn other_strings_pass_through() {
        let (outputs, variables) = (outputs(), variables());
        let context = Context::new(&outputs, &variables);

        for s in ["plain", "${other.thing}", "$vars.env", ""] {
            assert_eq!(resolve_str(s, &context), Ok(Value::from(s)));
        }

        assert_eq!(
            resolve_str("${resources.}", &context),
            Err(UnresolvedReferenceError::Malformed("${resources.}".to_string()))
        );
    }

    #[test]
    fn nested_bag_is_resolved_without_mutating_input() {
        let (outputs, variables) = (outputs(), variables());
        let context = Context::new(&outputs, &variables);

        let declared: Value = serde_json::from_str(
            r#"{"id": "${resources.wh.id}", "list": ["${vars.env}", 1], "deep": {"name": "n-${vars.env}"}}"#,
        )
        .unwrap();
        let before = declared.clone();

        let resolved = resolve(&declared, &context).unwrap();

        let expected: Value =
            serde_json::from_str(r#"{"id": 42, "list": ["prod", 1], "deep": {"name": "n-prod"}}"#)
                .unwrap();
        assert_eq!(resolved, expected);
        assert_eq!(declared, before);
    }

    #[test]
    fn first_failure_is_reported() {
        let (outputs, variables) = (outputs(), variables());
        let context = Context::new(&outputs, &variables);

        let properties = Properties::from_iter([
            ("a".to_string(), Value::from("${vars.nope}")),
            ("b".to_string(), Value::from("${resources.gone.id}")),
        ]);

        assert!(matches!(
            resolve_properties(&properties, &context),
            Err(UnresolvedReferenceError::MissingVariable { .. })
        ));
    }

    #[test]
    fn helpers() {
        assert_eq!(
            strip_placeholders("x-${resources.wh.id}-${vars.env}-${resources.}"),
            "x-wh-env-${resources.}"
        );
        assert_eq!(dependency_name("${resources.wh}"), "wh");
        assert_eq!(dependency_name("${resources.wh.id}"), "wh");
        assert_eq!(dependency_name(" wh "), "wh");
        assert_eq!(
            Reference::find_all("${vars.a} ${resources.b.c}").collect::<Vec<_>>(),
            vec![
                Reference::Variable {
                    name: "a".to_string()
                },
                Reference::Resource {
                    name: "b".to_string(),
                    attribute: Some("c".to_string())
                },
            ]
        );
        assert_eq!(Reference::parse("x${vars.a}"), None);
    }
}
