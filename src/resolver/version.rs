//! Maven version handling for PubGrub ranges.
//!
//! Two kinds of open-ended constraint are accepted in a coordinate's version
//! slot:
//!
//! - the open marker `a.b.+`, meaning `[a.b, a.(b+1))`
//! - Maven range syntax such as `[1.0,2.0)`, `[1.5,)` or `(,1.0],[1.2,)`
//!
//! Either form becomes a `pubgrub::Range<MavenVersion>`, and the highest
//! published version inside the range wins.

use std::cmp::Ordering;
use std::fmt;

use pubgrub::Range;

use crate::core::{Coordinate, Repository};
use crate::resolver::errors::ResolveError;
use crate::sources::VersionLister;

/// One component of a Maven version.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(u64),
    Qualifier(String),
}

/// Well-known qualifiers, lowest first. Unknown qualifiers sort after all of
/// them, alphabetically.
fn qualifier_rank(q: &str) -> usize {
    match q {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => 5,
        "sp" => 6,
        _ => 7,
    }
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    qualifier_rank(a)
        .cmp(&qualifier_rank(b))
        .then_with(|| if qualifier_rank(a) == 7 { a.cmp(b) } else { Ordering::Equal })
}

fn push_item(current: &mut String, digits: bool, items: &mut Vec<Item>) {
    if current.is_empty() {
        return;
    }
    let item = if digits {
        match current.parse::<u64>() {
            Ok(n) => Item::Number(n),
            Err(_) => Item::Qualifier(current.to_lowercase()),
        }
    } else {
        Item::Qualifier(current.to_lowercase())
    };
    items.push(item);
    current.clear();
}

/// A Maven version string with Maven's ordering.
///
/// Numeric components compare numerically, missing components compare as
/// zero (or as a release when the other side has a qualifier), and
/// pre-release qualifiers sort below the release they precede. Equality
/// follows the ordering, so `1.0` equals `1.0.0`.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    text: String,
    items: Vec<Item>,
}

impl MavenVersion {
    pub fn parse(text: &str) -> MavenVersion {
        let text = text.trim();
        let mut items = Vec::new();
        let mut current = String::new();
        let mut digits = false;

        for c in text.chars() {
            if c == '.' || c == '-' || c == '_' {
                push_item(&mut current, digits, &mut items);
                continue;
            }
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != digits {
                push_item(&mut current, digits, &mut items);
            }
            digits = is_digit;
            current.push(c);
        }
        push_item(&mut current, digits, &mut items);

        MavenVersion {
            text: text.to_string(),
            items,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The version reached by incrementing the last numeric component, used
    /// as the exclusive upper bound of an open marker.
    fn bump_last(&self) -> Option<MavenVersion> {
        let position = self
            .items
            .iter()
            .rposition(|item| matches!(item, Item::Number(_)))?;
        if position + 1 != self.items.len() {
            return None;
        }

        let parts: Option<Vec<String>> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Item::Number(n) if i == position => n.checked_add(1).map(|n| n.to_string()),
                Item::Number(n) => Some(n.to_string()),
                Item::Qualifier(q) => Some(q.clone()),
            })
            .collect();
        Some(MavenVersion::parse(&parts?.join(".")))
    }
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(Item::Number(x)), Some(Item::Number(y))) => x.cmp(y),
        (Some(Item::Qualifier(x)), Some(Item::Qualifier(y))) => compare_qualifiers(x, y),
        (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
        (Some(Item::Number(x)), None) => x.cmp(&0),
        (None, Some(Item::Number(y))) => 0.cmp(y),
        (Some(Item::Qualifier(x)), None) => compare_qualifiers(x, ""),
        (None, Some(Item::Qualifier(y))) => compare_qualifiers("", y),
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for i in 0..len {
            let ord = compare_items(self.items.get(i), other.items.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A parsed version constraint together with its Maven notation.
#[derive(Debug, Clone)]
pub struct VersionRequirement {
    notation: String,
    range: Range<MavenVersion>,
}

impl VersionRequirement {
    /// Parse the version slot of a non-concrete coordinate.
    pub fn parse(version: &str) -> Option<VersionRequirement> {
        let version = version.trim();
        if let Some(prefix) = version.strip_suffix('+') {
            return open_marker(prefix);
        }
        if version.starts_with('[') || version.starts_with('(') {
            return maven_range(version);
        }
        None
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        self.range.contains(version)
    }

    /// Highest candidate inside the range.
    pub fn select<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> Option<MavenVersion> {
        candidates
            .into_iter()
            .map(MavenVersion::parse)
            .filter(|v| self.contains(v))
            .max()
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation)
    }
}

/// `1.3.+` means `[1.3,1.4)`; a bare `+` matches anything.
fn open_marker(prefix: &str) -> Option<VersionRequirement> {
    let prefix = prefix.trim_end_matches(['.', '-']);
    if prefix.is_empty() {
        return Some(VersionRequirement {
            notation: "[0,)".to_string(),
            range: Range::full(),
        });
    }

    let lower = MavenVersion::parse(prefix);
    let upper = lower.bump_last()?;
    Some(VersionRequirement {
        notation: format!("[{},{})", lower, upper),
        range: Range::between(lower, upper),
    })
}

/// Maven range syntax; several ranges separated by commas are unioned.
fn maven_range(text: &str) -> Option<VersionRequirement> {
    let mut range = Range::empty();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let open = rest.chars().next()?;
        if open != '[' && open != '(' {
            return None;
        }
        let close_at = rest.find([']', ')'])?;
        let close = rest[close_at..].chars().next()?;
        let body = &rest[1..close_at];
        range = range.union(&bounded(open, body, close)?);

        rest = rest[close_at + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
            if rest.is_empty() {
                return None;
            }
        }
    }

    Some(VersionRequirement {
        notation: text.trim().to_string(),
        range,
    })
}

fn bounded(open: char, body: &str, close: char) -> Option<Range<MavenVersion>> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [exact] if open == '[' && close == ']' && !exact.is_empty() => {
            Some(Range::singleton(MavenVersion::parse(exact)))
        }
        [low, high] => {
            let lower = if low.is_empty() {
                Range::full()
            } else if open == '[' {
                Range::higher_than(MavenVersion::parse(low))
            } else {
                Range::strictly_higher_than(MavenVersion::parse(low))
            };
            let upper = if high.is_empty() {
                Range::full()
            } else if close == ']' {
                Range::lower_than(MavenVersion::parse(high))
            } else {
                Range::strictly_lower_than(MavenVersion::parse(high))
            };
            Some(lower.intersection(&upper))
        }
        _ => None,
    }
}

/// Pin a coordinate to a concrete version.
///
/// Concrete coordinates are returned unchanged without consulting the
/// lister. Otherwise every published version is listed and the highest one
/// inside the requested range is chosen.
pub fn resolve_version(
    coordinate: &Coordinate,
    repositories: &[Repository],
    lister: &dyn VersionLister,
) -> Result<Coordinate, ResolveError> {
    if coordinate.is_concrete() {
        return Ok(coordinate.clone());
    }

    let requirement = VersionRequirement::parse(coordinate.version()).ok_or_else(|| {
        ResolveError::MalformedConstraint {
            coordinate: coordinate.to_string(),
        }
    })?;

    let available = lister.list_versions(coordinate.group(), coordinate.artifact(), repositories)?;
    tracing::debug!(
        "{} candidates for {}: {}",
        available.len(),
        coordinate,
        available.join(", ")
    );

    let chosen = requirement
        .select(available.iter().map(String::as_str))
        .ok_or_else(|| ResolveError::VersionResolution {
            coordinate: coordinate.to_string(),
            range: requirement.to_string(),
        })?;

    Ok(coordinate.with_version(chosen.as_str()))
}
