//! Named Argument Interpolation - `$$key$$` substitution
//!
//! Tokens are found by literal substring search, not regex. A key resolves
//! against the named arguments first, then the defaults.
//!
//! List sources behave differently on purpose:
//! - a value that is *exactly* `$$list_key$$` expands into one entry per
//!   list element, in order
//! - a list key embedded in a larger string is left as-is, token included

use std::borrow::Cow;

use rustc_hash::FxHashSet;

use crate::ast::{ArgMap, NamedArgs};
use crate::error::{Result, WeftError};

pub const PREFIX: &str = "$$";
pub const SUFFIX: &str = "$$";

/// Output of [`interpolate_args`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interpolated {
    pub args: ArgMap,
    /// List keys spliced in by a whole-string token
    pub consumed: FxHashSet<String>,
}

impl Interpolated {
    /// Entries of `lists` that no whole-string token consumed, in declaration order
    pub fn remaining<'a>(
        &'a self,
        lists: &'a ArgMap,
    ) -> impl Iterator<Item = (&'a String, &'a Vec<String>)> + 'a {
        lists
            .iter()
            .filter(move |(key, _)| !self.consumed.contains(key.as_str()))
    }
}

/// Interpolate every value of `input`.
///
/// `named` wins over `defaults`; `lists` only participates through
/// whole-string tokens. An unresolvable scalar token is an error.
pub fn interpolate_args(
    input: &ArgMap,
    named: &NamedArgs,
    defaults: &NamedArgs,
    lists: &ArgMap,
) -> Result<Interpolated> {
    let mut out = Interpolated {
        args: ArgMap::with_capacity(input.len()),
        consumed: FxHashSet::default(),
    };

    for (arg, values) in input {
        let mut result = Vec::with_capacity(values.len());
        for value in values {
            if let Some(list) = whole_token(value).and_then(|key| lists.get_key_value(key)) {
                result.extend(list.1.iter().cloned());
                out.consumed.insert(list.0.clone());
                continue;
            }
            result.push(substitute(value, named, defaults, Some(lists))?.into_owned());
        }
        out.args.insert(arg.clone(), result);
    }

    Ok(out)
}

/// Interpolate a single string against scalar sources only
pub fn interpolate(input: &str, named: &NamedArgs, defaults: &NamedArgs) -> Result<String> {
    substitute(input, named, defaults, None).map(Cow::into_owned)
}

/// `Some(key)` when the whole value is one `$$key$$` token
fn whole_token(value: &str) -> Option<&str> {
    let key = value.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    is_key(key).then_some(key)
}

/// Keys are non-empty and free of whitespace and of the delimiter itself
fn is_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(PREFIX) && !key.chars().any(char::is_whitespace)
}

fn substitute<'a>(
    input: &'a str,
    named: &NamedArgs,
    defaults: &NamedArgs,
    lists: Option<&ArgMap>,
) -> Result<Cow<'a, str>> {
    // Early return with borrowed string (zero alloc)
    if !input.contains(PREFIX) {
        return Ok(Cow::Borrowed(input));
    }

    let mut result = String::with_capacity(input.len() + 32);
    let mut rest = input;

    while let Some(start) = rest.find(PREFIX) {
        let after = &rest[start + PREFIX.len()..];
        let Some(len) = after.find(SUFFIX) else {
            break;
        };
        let key = &after[..len];

        if !is_key(key) {
            // Not a token: keep the opening delimiter and rescan from just past it
            result.push_str(&rest[..start + PREFIX.len()]);
            rest = after;
            continue;
        }

        result.push_str(&rest[..start]);
        match named.get(key).or_else(|| defaults.get(key)) {
            Some(value) => result.push_str(value),
            None if lists.is_some_and(|l| l.contains_key(key)) => {
                result.push_str(PREFIX);
                result.push_str(key);
                result.push_str(SUFFIX);
            }
            None => {
                return Err(WeftError::UnresolvedVariable {
                    key: key.to_string(),
                    input: input.to_string(),
                })
            }
        }
        rest = &after[len + SUFFIX.len()..];
    }

    result.push_str(rest);
    Ok(Cow::Owned(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn named() -> NamedArgs {
        NamedArgs::from([("key".to_string(), "value".to_string())])
    }

    fn defaults() -> NamedArgs {
        NamedArgs::from([("default".to_string(), "default_value".to_string())])
    }

    fn lists() -> ArgMap {
        ArgMap::from([(
            "list_key".to_string(),
            vec!["list_value_one".to_string(), "list_value_two".to_string()],
        )])
    }

    fn args(entries: &[(&str, &[&str])]) -> ArgMap {
        entries
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn no_tokens_is_equal_copy() {
        let input = args(&[("one", &["two", "three"])]);
        let result = interpolate_args(&input, &named(), &NamedArgs::new(), &lists()).unwrap();
        assert_eq!(result.args, input);
        assert!(result.consumed.is_empty());
    }

    #[test]
    fn named_substitution() {
        let input = args(&[("one", &["$$key$$", "three"])]);
        let result = interpolate_args(&input, &named(), &NamedArgs::new(), &lists()).unwrap();
        assert_eq!(result.args, args(&[("one", &["value", "three"])]));
    }

    #[test]
    fn defaults_fill_in_missing_keys() {
        let input = args(&[("one", &["$$key$$", "three"]), ("two", &["$$default$$", "four"])]);
        let result = interpolate_args(&input, &named(), &defaults(), &lists()).unwrap();
        assert_eq!(
            result.args,
            args(&[("one", &["value", "three"]), ("two", &["default_value", "four"])])
        );
    }

    #[test]
    fn named_wins_over_default() {
        let mut defaults = defaults();
        defaults.insert("key".into(), "default_value".into());
        assert_eq!(interpolate("hello $$key$$", &named(), &defaults).unwrap(), "hello value");
    }

    #[test]
    fn single_string_with_default() {
        assert_eq!(
            interpolate("hello $$default$$", &named(), &defaults()).unwrap(),
            "hello default_value"
        );
    }

    #[test]
    fn whole_list_token_expands_in_place() {
        let input = args(&[("one", &["$$key$$", "three", "$$list_key$$"])]);
        let result = interpolate_args(&input, &named(), &NamedArgs::new(), &lists()).unwrap();
        assert_eq!(
            result.args,
            args(&[("one", &["value", "three", "list_value_one", "list_value_two"])])
        );
        assert!(result.consumed.contains("list_key"));
    }

    #[test]
    fn embedded_list_token_is_untouched() {
        let input = args(&[("one", &["$$key$$", "three", "other_$$list_key$$_stuff"])]);
        let lists = lists();
        let result = interpolate_args(&input, &named(), &NamedArgs::new(), &lists).unwrap();
        assert_eq!(
            result.args,
            args(&[("one", &["value", "three", "other_$$list_key$$_stuff"])])
        );
        assert!(result.consumed.is_empty());
        assert_eq!(result.remaining(&lists).count(), 1);
    }

    #[test]
    fn missing_key_is_error() {
        let err = interpolate("x $$nope$$ y", &named(), &defaults()).unwrap_err();
        assert!(matches!(err, WeftError::UnresolvedVariable { ref key, .. } if key == "nope"));
    }

    #[test]
    fn list_key_is_not_a_scalar_source() {
        // Outside argument maps there is no list source to fall back on
        assert!(interpolate("$$list_key$$", &named(), &defaults()).is_err());
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let named = NamedArgs::from([("a".to_string(), "$$b$$".to_string())]);
        assert_eq!(interpolate("$$a$$", &named, &NamedArgs::new()).unwrap(), "$$b$$");
    }

    #[test]
    fn stray_delimiters_are_literal() {
        assert_eq!(
            interpolate("cost $$ 5 and $$key$$", &named(), &NamedArgs::new()).unwrap(),
            "cost $$ 5 and value"
        );
        assert_eq!(interpolate("trailing $$", &named(), &NamedArgs::new()).unwrap(), "trailing $$");
    }

    #[test]
    fn input_map_is_left_alone() {
        let input = args(&[("one", &["$$list_key$$"])]);
        let lists = lists();
        let before = (input.clone(), lists.clone());
        let first = interpolate_args(&input, &named(), &defaults(), &lists).unwrap();
        let second = interpolate_args(&input, &named(), &defaults(), &lists).unwrap();
        assert_eq!(first, second);
        assert_eq!((input, lists), before);
    }
}
