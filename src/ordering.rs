//! Token ordering strategies
//!
//! A [`TokenListTransform`] rewrites the list of token variables routed to
//! one target file before rendering; several transforms can be chained per
//! render invocation. Three strategies are provided:
//!
//! - [`token_sorter_by_name`] (the pipeline default): alphabetical on the
//!   rendered key, with numeric grade awareness so `var-5` sorts before
//!   `var-10`;
//! - [`token_sorter_by_ref`]: moves referenced tokens before their first
//!   referencer, so every non-cyclic reference is defined before use;
//! - [`token_sorter_from_regexp_list`]: explicit ordering driven by a list of
//!   patterns matched against the token name.
//!
//! Transforms are infallible: a token whose raw value cannot be rendered is
//! treated as having no references here, and the render phase surfaces the
//! error afterwards.

use std::sync::LazyLock;

use regex::Regex;

use crate::variable::{TokenVariable, TokenVariableSet};

/// Transform over the list of token variables routed to one target file.
pub type TokenListTransform =
    Box<dyn for<'a> Fn(&'a TokenVariableSet, Vec<&'a TokenVariable>) -> Vec<&'a TokenVariable>>;

/// Pattern splitting a trailing numeric grade from a key.
static SPLIT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(\d+)$").expect("invalid name split pattern"));

/// Sort tokens by rendered key, numerically on a shared trailing grade.
pub fn token_sorter_by_name() -> TokenListTransform {
    Box::new(|_, mut tokens| {
        tokens.sort_by(|a, b| {
            let key_a = a.key(None);
            let key_b = b.key(None);
            if let (Some(split_a), Some(split_b)) =
                (SPLIT_NAME_RE.captures(&key_a), SPLIT_NAME_RE.captures(&key_b))
            {
                if split_a[1] == split_b[1] {
                    let grade_a: u64 = split_a[2].parse().unwrap_or(0);
                    let grade_b: u64 = split_b[2].parse().unwrap_or(0);
                    return grade_a.cmp(&grade_b);
                }
            }
            key_a.cmp(&key_b)
        });
        tokens
    })
}

/// Reorder tokens so every token referenced by another one is defined first.
///
/// The longest reference chain depth bounds the number of bubble passes
/// (`max_depth + 1`, stopping early when a pass moves nothing); cyclic
/// references are left in their relative positions without error.
pub fn token_sorter_by_ref() -> TokenListTransform {
    Box::new(|set, tokens| {
        let limit = tokens
            .iter()
            .map(|token| reference_level(set, token, 0, &mut Vec::new()))
            .max()
            .unwrap_or(0);

        let mut sorted = tokens;
        for _ in 0..=limit {
            let mut has_changed = false;
            let mut pass: Vec<&TokenVariable> = Vec::with_capacity(sorted.len());
            for token in sorted {
                let first_referencer = pass.iter().position(|placed| {
                    references_of(set, placed).contains(&token.token_reference_name)
                });
                match first_referencer {
                    Some(index) => {
                        pass.insert(index, token);
                        has_changed = true;
                    }
                    None => pass.push(token),
                }
            }
            sorted = pass;
            if !has_changed {
                break;
            }
        }
        sorted
    })
}

/// Reorder tokens according to an ordered list of patterns.
///
/// Each pattern is matched against the last segment of the token reference
/// name, or against the rendered key when `apply_renderer_name` is enabled.
/// Tokens matching a later pattern come first; unmatched tokens keep their
/// relative order at the end of the list.
pub fn token_sorter_from_regexp_list(
    reg_exps: Vec<Regex>,
    apply_renderer_name: bool,
) -> TokenListTransform {
    Box::new(move |_, tokens| {
        let mut indexed: Vec<(Option<usize>, &TokenVariable)> = tokens
            .into_iter()
            .map(|token| {
                let subject = if apply_renderer_name {
                    token.key(None)
                } else {
                    token
                        .token_reference_name
                        .rsplit('.')
                        .next()
                        .unwrap_or(&token.token_reference_name)
                        .to_string()
                };
                let index = reg_exps.iter().position(|re| re.is_match(&subject));
                (index, token)
            })
            .collect();
        indexed.sort_by(|(a, _), (b, _)| match (a, b) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some(_), None) => std::cmp::Ordering::Less,
            (Some(a), Some(b)) => b.cmp(a),
        });
        indexed.into_iter().map(|(_, token)| token).collect()
    })
}

/// Longest reference chain depth of a token, cycle-bounded: a token revisited
/// during depth computation terminates that branch at its current level.
fn reference_level<'a>(
    set: &'a TokenVariableSet,
    token: &'a TokenVariable,
    level: usize,
    visited: &mut Vec<&'a str>,
) -> usize {
    let children = token.references_node(set).unwrap_or_default();
    if children.is_empty() || visited.contains(&token.token_reference_name.as_str()) {
        return level;
    }
    visited.push(&token.token_reference_name);
    let deepest = children
        .iter()
        .map(|child| reference_level(set, child, level + 1, visited))
        .max()
        .unwrap_or(level + 1);
    visited.pop();
    deepest
}

fn references_of(set: &TokenVariableSet, token: &TokenVariable) -> Vec<String> {
    token.references(set).unwrap_or_default()
}
