//! Semantic-version range expressions
//!
//! Grammar:
//!
//! - Comparators separated by whitespace must all match (`>=1.2.0 <2.0.0`)
//! - Alternatives are separated by `||` (`<1.0.0 || >=2.0.0`)
//! - Operators: `>`, `>=`, `<`, `<=`, `=`, `==`, `!=`, `!`; a bare version means `=`
//! - `x`, `X` or `*` may replace the minor or patch component (`1.x`, `>=1.2.x`)
//! - An operator may be separated from its version by spaces (`>= 1.2.0`)
//!
//! Versions inside a range accept `major.minor` (patch 0) as well as full
//! semantic versions. Build metadata never takes part in comparisons.

use std::fmt;

use semver::Version;

/// A single version comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A single comparator: an operator paired with a version.
#[derive(Debug, Clone)]
struct Comparator {
    op: CompareOp,
    version: Version,
}

impl Comparator {
    fn new(op: CompareOp, version: Version) -> Self {
        Self { op, version }
    }

    fn matches(&self, candidate: &Version) -> bool {
        let ordering = compare_ignoring_build(candidate, &self.version);
        match self.op {
            CompareOp::Eq => ordering.is_eq(),
            CompareOp::Ne => ordering.is_ne(),
            CompareOp::Gt => ordering.is_gt(),
            CompareOp::Gte => ordering.is_ge(),
            CompareOp::Lt => ordering.is_lt(),
            CompareOp::Lte => ordering.is_le(),
        }
    }
}

fn compare_ignoring_build(a: &Version, b: &Version) -> std::cmp::Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// A parsed range: alternatives of comparator conjunctions.
#[derive(Debug, Clone)]
pub struct VersionRange {
    alternatives: Vec<Vec<Comparator>>,
    raw: String,
}

/// Why a range expression was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeError(pub String);

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl VersionRange {
    /// Parse a range expression.
    pub fn parse(expression: &str) -> Result<Self, RangeError> {
        let mut alternatives = Vec::new();
        for alternative in expression.split("||") {
            let mut comparators = Vec::new();
            for token in join_operators(alternative)? {
                comparators.extend(parse_comparator(&token)?);
            }
            if comparators.is_empty() {
                return Err(RangeError(format!("empty alternative in `{expression}`")));
            }
            alternatives.push(comparators);
        }

        Ok(Self {
            alternatives,
            raw: expression.to_string(),
        })
    }

    /// Whether `version` satisfies any alternative.
    pub fn contains(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|all| all.iter().all(|c| c.matches(version)))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split on whitespace, gluing a bare operator to the following version.
fn join_operators(alternative: &str) -> Result<Vec<String>, RangeError> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<&str> = None;
    for word in alternative.split_whitespace() {
        if let Some(op) = pending.take() {
            tokens.push(format!("{op}{word}"));
        } else if word.chars().all(|c| matches!(c, '<' | '>' | '=' | '!')) {
            pending = Some(word);
        } else {
            tokens.push(word.to_string());
        }
    }
    if let Some(op) = pending {
        return Err(RangeError(format!("operator `{op}` without a version")));
    }
    Ok(tokens)
}

fn split_operator(token: &str) -> (CompareOp, &str) {
    const OPERATORS: &[(&str, CompareOp)] = &[
        (">=", CompareOp::Gte),
        ("<=", CompareOp::Lte),
        ("!=", CompareOp::Ne),
        ("==", CompareOp::Eq),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
        ("=", CompareOp::Eq),
        ("!", CompareOp::Ne),
    ];
    for (prefix, op) in OPERATORS {
        if let Some(rest) = token.strip_prefix(prefix) {
            return (*op, rest);
        }
    }
    (CompareOp::Eq, token)
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "x" | "X" | "*")
}

/// Parse one comparator token; wildcards expand to a bounded pair.
fn parse_comparator(token: &str) -> Result<Vec<Comparator>, RangeError> {
    let (op, version) = split_operator(token);
    let parts: Vec<&str> = version.split('.').collect();

    let wildcard_at = parts.iter().position(|p| is_wildcard(p));
    let Some(index) = wildcard_at else {
        let version = parse_range_version(version)
            .map_err(|e| RangeError(format!("invalid version in `{token}`: {e}")))?;
        return Ok(vec![Comparator::new(op, version)]);
    };

    if index == 0 {
        return Err(RangeError(format!("wildcard major version in `{token}`")));
    }
    if parts[index..].iter().any(|p| !is_wildcard(p)) || parts.len() > 3 {
        return Err(RangeError(format!("malformed wildcard in `{token}`")));
    }

    let number = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| RangeError(format!("invalid number `{s}` in `{token}`")))
    };
    let major = number(parts[0])?;
    let (lower, upper) = if index == 1 {
        (Version::new(major, 0, 0), Version::new(major + 1, 0, 0))
    } else {
        let minor = number(parts[1])?;
        (Version::new(major, minor, 0), Version::new(major, minor + 1, 0))
    };

    Ok(match op {
        CompareOp::Eq => vec![
            Comparator::new(CompareOp::Gte, lower),
            Comparator::new(CompareOp::Lt, upper),
        ],
        CompareOp::Gte => vec![Comparator::new(CompareOp::Gte, lower)],
        CompareOp::Gt => vec![Comparator::new(CompareOp::Gte, upper)],
        CompareOp::Lt => vec![Comparator::new(CompareOp::Lt, lower)],
        CompareOp::Lte => vec![Comparator::new(CompareOp::Lt, upper)],
        CompareOp::Ne => {
            return Err(RangeError(format!(
                "`!=` cannot be combined with a wildcard in `{token}`"
            )));
        }
    })
}

/// Parse a version inside a range, padding `major.minor` with `.0`.
fn parse_range_version(s: &str) -> Result<Version, semver::Error> {
    match Version::parse(s) {
        Ok(v) => Ok(v),
        Err(e) if s.matches('.').count() == 1 => Version::parse(&format!("{s}.0")).map_err(|_| e),
        Err(e) => Err(e),
    }
}
