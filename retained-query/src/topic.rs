use std::fmt::{self, Write};
use std::str::FromStr;

use crate::error::{Error, QueryError};

pub const LEVEL_SEPARATOR: char = '/';
pub const SINGLE_WILDCARD: &str = "+";

/// Upper bound on levels in stored and queried topics. Trie walks and result
/// building recurse once per level.
pub const MAX_LEVELS: usize = 128;

/// Splits a topic into levels. Empty levels are kept, so `a//b` has three.
#[inline]
pub fn levels(topic: &str) -> std::str::Split<'_, char> {
    topic.split(LEVEL_SEPARATOR)
}

/// Rejects topic strings that cannot be resolved against the tree.
#[inline]
pub fn validate(topic: &str) -> Result<(), QueryError> {
    if topic.starts_with(LEVEL_SEPARATOR) {
        return Err(QueryError::LeadingSlash(topic.into()));
    }
    if topic.ends_with(LEVEL_SEPARATOR) {
        return Err(QueryError::TrailingSlash(topic.into()));
    }
    if levels(topic).filter(|l| *l == SINGLE_WILDCARD).count() > 1 {
        return Err(QueryError::MultipleWildcards(topic.into()));
    }
    if levels(topic).nth(MAX_LEVELS).is_some() {
        return Err(QueryError::TooManyLevels(topic.into()));
    }
    Ok(())
}

/// Checks a topic name before it is stored. Wildcard characters are never
/// allowed, not even inside a level.
#[inline]
pub fn validate_retained(topic: &str) -> Result<(), Error> {
    if topic.contains(['+', '#']) {
        return Err(Error::WildcardInTopic(topic.into()));
    }
    if levels(topic).nth(MAX_LEVELS).is_some() {
        return Err(Error::TooManyLevels(topic.into()));
    }
    Ok(())
}

/// A validated query topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTopic {
    Exact(String),
    /// Levels before and after the single `+` level.
    Wildcard { prefix: Vec<String>, suffix: Vec<String> },
}

impl QueryTopic {
    #[inline]
    pub fn parse<T: AsRef<str>>(s: T) -> Result<QueryTopic, QueryError> {
        QueryTopic::from_str(s.as_ref())
    }
}

impl FromStr for QueryTopic {
    type Err = QueryError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, QueryError> {
        validate(s)?;
        let levels = levels(s).collect::<Vec<_>>();
        match levels.iter().position(|l| *l == SINGLE_WILDCARD) {
            None => Ok(QueryTopic::Exact(s.into())),
            Some(pos) => Ok(QueryTopic::Wildcard {
                prefix: levels[..pos].iter().map(|l| String::from(*l)).collect(),
                suffix: levels[pos + 1..].iter().map(|l| String::from(*l)).collect(),
            }),
        }
    }
}

impl fmt::Display for QueryTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTopic::Exact(t) => f.write_str(t),
            QueryTopic::Wildcard { prefix, suffix } => {
                for l in prefix {
                    f.write_str(l)?;
                    f.write_char(LEVEL_SEPARATOR)?;
                }
                f.write_str(SINGLE_WILDCARD)?;
                for l in suffix {
                    f.write_char(LEVEL_SEPARATOR)?;
                    f.write_str(l)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(levels("a/b/c").collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(levels("a//b").collect::<Vec<_>>(), vec!["a", "", "b"]);
        assert_eq!(levels("").collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate("/a"), Err(QueryError::LeadingSlash("/a".into())));
        assert_eq!(validate("a/"), Err(QueryError::TrailingSlash("a/".into())));
        assert_eq!(validate("a/+/b/+"), Err(QueryError::MultipleWildcards("a/+/b/+".into())));
        assert_eq!(validate("/"), Err(QueryError::LeadingSlash("/".into())));
        assert!(validate("a/b").is_ok());
        assert!(validate("a/+/b").is_ok());
        assert!(validate("a//b").is_ok());
        assert!(validate("a+b/+").is_ok());
    }

    #[test]
    fn test_validate_level_count() {
        let max = vec!["a"; MAX_LEVELS].join("/");
        assert!(validate(&max).is_ok());
        let deep = vec!["a"; 5000].join("/");
        assert_eq!(validate(&deep), Err(QueryError::TooManyLevels(deep.clone())));
        assert_eq!(QueryTopic::parse(&deep), Err(QueryError::TooManyLevels(deep.clone())));
    }

    #[test]
    fn test_validate_retained() {
        assert!(validate_retained("a/b/c").is_ok());
        assert!(validate_retained("a//b").is_ok());
        assert!(validate_retained(&vec!["a"; MAX_LEVELS].join("/")).is_ok());
        for t in ["a/+/b", "a/#", "+", "#", "a/b+c", "a#"] {
            assert!(matches!(validate_retained(t), Err(Error::WildcardInTopic(_))), "{t}");
        }
        let deep = vec!["a"; 5000].join("/");
        assert!(matches!(validate_retained(&deep), Err(Error::TooManyLevels(_))));
    }

    #[test]
    fn test_parse_exact() {
        assert_eq!(QueryTopic::parse("a/b").unwrap(), QueryTopic::Exact("a/b".into()));
        assert_eq!(QueryTopic::parse("a/b+").unwrap(), QueryTopic::Exact("a/b+".into()));
    }

    #[test]
    fn test_parse_wildcard() {
        let wildcard = |prefix: &[&str], suffix: &[&str]| QueryTopic::Wildcard {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            suffix: suffix.iter().map(|s| s.to_string()).collect(),
        };
        assert_eq!(QueryTopic::parse("a/+/b").unwrap(), wildcard(&["a"], &["b"]));
        assert_eq!(QueryTopic::parse("+/b").unwrap(), wildcard(&[], &["b"]));
        assert_eq!(QueryTopic::parse("a/+").unwrap(), wildcard(&["a"], &[]));
        assert_eq!(QueryTopic::parse("+").unwrap(), wildcard(&[], &[]));
        assert_eq!(QueryTopic::parse("a/+//foo").unwrap(), wildcard(&["a"], &["", "foo"]));
    }

    #[test]
    fn test_display() {
        for t in ["a/+/b", "+/b", "a/+", "+", "a/+//foo", "a/b"] {
            assert_eq!(QueryTopic::parse(t).unwrap().to_string(), t);
        }
    }
}
