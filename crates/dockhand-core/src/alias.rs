//! Alias expansion of the leading argument

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Replace the first argument by its alias, recursively.
///
/// Arguments after the first are kept unchanged after the expanded tokens.
/// Expansion stops when the leading token is not an alias; reaching an alias
/// already expanded on the current chain is an [`Error::AliasCycle`].
pub fn expand_aliases(aliases: &BTreeMap<String, String>, args: &[String]) -> Result<Vec<String>> {
    let mut chain = Vec::new();
    expand(aliases, args.to_vec(), &mut chain)
}

fn expand(
    aliases: &BTreeMap<String, String>,
    args: Vec<String>,
    chain: &mut Vec<String>,
) -> Result<Vec<String>> {
    let Some(first) = args.first() else {
        return Ok(args);
    };
    let Some(replacement) = aliases.get(first).filter(|r| !r.trim().is_empty()) else {
        return Ok(args);
    };

    let revisits = chain.contains(first);
    chain.push(first.clone());
    if revisits {
        return Err(Error::AliasCycle {
            chain: chain.clone(),
        });
    }

    tracing::debug!(alias = %first, %replacement, "Expanding alias");
    let expanded = expand(aliases, tokenize(replacement), chain)?;
    Ok(expanded.into_iter().chain(args.into_iter().skip(1)).collect())
}

/// Split on whitespace, keeping quoted segments in one token.
///
/// When any quote was seen, `="value"` is normalized to `=value` and
/// surrounding double quotes are trimmed from every token.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;

    for c in text.chars() {
        match quote {
            Some(open) => {
                current.push(c);
                if c == open {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                quoted = true;
                current.push(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    if quoted {
        tokens
            .into_iter()
            .map(|t| t.replacen("=\"", "=", 1).trim_matches('"').to_string())
            .collect()
    } else {
        tokens
    }
}
