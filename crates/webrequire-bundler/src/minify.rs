//! Minification of the JavaScript webrequire ships itself (loader, prologue).
//!
//! User files are never minified; their text goes into packs byte for byte.

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::{Error, Result};

/// Validated minification level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinifyLevel {
    /// No minification - ship the runtime as written.
    #[default]
    None,
    /// Reprint without whitespace and comments.
    Whitespace,
    /// Compress and mangle identifiers.
    Full,
}

impl MinifyLevel {
    /// Parse a minification level from a string.
    ///
    /// # Examples
    ///
    /// ```
    /// use webrequire_bundler::MinifyLevel;
    ///
    /// assert_eq!(MinifyLevel::parse("none").unwrap(), MinifyLevel::None);
    /// assert_eq!(MinifyLevel::parse("FULL").unwrap(), MinifyLevel::Full);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error for unrecognized values.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" | "false" => Ok(Self::None),
            "whitespace" => Ok(Self::Whitespace),
            "full" | "true" => Ok(Self::Full),
            _ => Err(Error::InvalidConfig(format!(
                "Invalid minify level: '{}'. Expected: none, whitespace, full",
                s
            ))),
        }
    }

    /// Returns true if any minification is enabled.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for MinifyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Whitespace => write!(f, "whitespace"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl std::str::FromStr for MinifyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Minify a script at the given level.
///
/// The output always ends with a newline so it can be concatenated as is.
pub fn minify(source: &str, level: MinifyLevel) -> Result<String> {
    if !level.is_enabled() {
        return Ok(source.to_string());
    }

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(Error::InvalidConfig(format!(
            "Cannot minify runtime script: {}",
            error
        )));
    }
    let mut program = parsed.program;

    let scoping = match level {
        MinifyLevel::Full => {
            Minifier::new(MinifierOptions::default())
                .minify(&allocator, &mut program)
                .scoping
        }
        _ => None,
    };

    let mut code = Codegen::new()
        .with_options(CodegenOptions::minify())
        .with_scoping(scoping)
        .build(&program)
        .code;

    if !code.ends_with('\n') {
        code.push('\n');
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{LOADER_SOURCE, PACK_PROLOGUE};

    #[test]
    fn test_parse_levels() {
        assert_eq!(MinifyLevel::parse("Whitespace").unwrap(), MinifyLevel::Whitespace);
        assert_eq!(MinifyLevel::parse("true").unwrap(), MinifyLevel::Full);
        assert_eq!(MinifyLevel::parse("false").unwrap(), MinifyLevel::None);
        assert!(MinifyLevel::parse("identifiers").is_err());
        assert!(MinifyLevel::parse("").is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for level in [MinifyLevel::None, MinifyLevel::Whitespace, MinifyLevel::Full] {
            assert_eq!(MinifyLevel::parse(&level.to_string()).unwrap(), level);
        }
    }

    #[test]
    fn none_returns_source_unchanged() {
        assert_eq!(minify(PACK_PROLOGUE, MinifyLevel::None).unwrap(), PACK_PROLOGUE);
    }

    #[test]
    fn whitespace_shrinks_the_loader() {
        let out = minify(LOADER_SOURCE, MinifyLevel::Whitespace).unwrap();
        assert!(out.len() < LOADER_SOURCE.len());
        assert!(out.contains("registerModule"));
        assert!(out.contains("moduleQueue"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn full_keeps_global_names() {
        let out = minify(LOADER_SOURCE, MinifyLevel::Full).unwrap();
        assert!(out.contains("registerModule"));
        assert!(out.contains("moduleQueue"));
        assert!(out.len() < LOADER_SOURCE.len());
    }

    #[test]
    fn broken_scripts_are_reported() {
        assert!(matches!(
            minify("function (", MinifyLevel::Whitespace),
            Err(Error::InvalidConfig(_))
        ));
    }
}
