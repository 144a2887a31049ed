//! Selector-dialect detection and translation.
//!
//! Persisted extraction rules accept selectors in two dialects: native CSS,
//! used as-is, and a path-like attribute dialect (`//div[@class="content"]`)
//! that must be translated before use. Translation goes through a typed
//! AST rather than string replacement, so any predicate shape the dialect
//! does not cover (multiple predicates, positional indexes, attributes
//! other than `class`/`id`) is rejected as unsupported instead of being
//! silently mistranslated.

use crate::error::SelectorError;
use scraper::Selector;

/// Marker distinguishing the attribute-path dialect from native CSS.
const PATH_MARKER: &str = "//";

/// One step of an attribute path: an element name with at most one
/// qualifying predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub tag: String,
    pub predicate: Option<Predicate>,
}

/// The only predicate shapes the dialect supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Class(String),
    Id(String),
}

/// A parsed selector in either dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSelector {
    /// Already-native CSS, passed through unmodified.
    Native(String),
    /// Attribute-path steps, outermost first.
    AttrPath(Vec<PathStep>),
}

/// Detect the dialect of `input` and parse it.
pub fn parse(input: &str) -> Result<ParsedSelector, SelectorError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SelectorError::Empty);
    }
    if !input.starts_with(PATH_MARKER) {
        // Native dialect: validate, never rewrite.
        Selector::parse(input)
            .map_err(|_| SelectorError::Invalid(input.to_string()))?;
        return Ok(ParsedSelector::Native(input.to_string()));
    }

    let path = &input[PATH_MARKER.len()..];
    let steps: Result<Vec<PathStep>, SelectorError> = path
        .replace(PATH_MARKER, "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(parse_step)
        .collect();
    let steps = steps?;
    if steps.is_empty() {
        return Err(SelectorError::Empty);
    }
    Ok(ParsedSelector::AttrPath(steps))
}

fn parse_step(segment: &str) -> Result<PathStep, SelectorError> {
    let Some(bracket) = segment.find('[') else {
        return Ok(PathStep {
            tag: segment.to_string(),
            predicate: None,
        });
    };

    let tag = segment[..bracket].to_string();
    let predicate_src = &segment[bracket..];
    if !predicate_src.ends_with(']') || predicate_src.matches('[').count() != 1 {
        return Err(SelectorError::Unsupported(segment.to_string()));
    }

    let inner = &predicate_src[1..predicate_src.len() - 1];
    if inner.contains(" and ") || inner.contains(" or ") {
        return Err(SelectorError::Unsupported(segment.to_string()));
    }
    let Some(body) = inner.strip_prefix('@') else {
        // Positional indexes and bare-text predicates are out of scope.
        return Err(SelectorError::Unsupported(segment.to_string()));
    };
    let Some((attr, raw_value)) = body.split_once('=') else {
        return Err(SelectorError::Unsupported(segment.to_string()));
    };

    let value = raw_value
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string();
    if value.is_empty() {
        return Err(SelectorError::Unsupported(segment.to_string()));
    }

    let predicate = match attr.trim() {
        "class" => Predicate::Class(value),
        "id" => Predicate::Id(value),
        _ => return Err(SelectorError::Unsupported(segment.to_string())),
    };
    Ok(PathStep {
        tag,
        predicate: Some(predicate),
    })
}

/// Render a parsed selector as native CSS.
pub fn to_css(parsed: &ParsedSelector) -> String {
    match parsed {
        ParsedSelector::Native(css) => css.clone(),
        ParsedSelector::AttrPath(steps) => steps
            .iter()
            .map(|step| match &step.predicate {
                None => step.tag.clone(),
                Some(Predicate::Class(class)) => format!("{}.{class}", step.tag),
                Some(Predicate::Id(id)) => format!("{}#{id}", step.tag),
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Detect, translate, and validate a selector string into usable CSS.
pub fn resolve(input: &str) -> Result<String, SelectorError> {
    let css = to_css(&parse(input)?);
    Selector::parse(&css).map_err(|_| SelectorError::Invalid(css.clone()))?;
    Ok(css)
}
