//! Function extraction
//!
//! Parses a source file once and walks the typed tree with a visitor,
//! recording every named function declaration whose identifier starts with a
//! prefix. The walk is pre-order: a declaration is recorded before anything
//! nested inside it, and children are visited in field order, so results come
//! out in source order with nested declarations interleaved.
//!
//! Only standalone declarations count. Function expressions, arrows, methods
//! and bodiless TypeScript signatures (`declare function`, overloads) are
//! walked through but never recorded. Anonymous declarations
//! (`export default function () {}`) are skipped.

use crate::loader::{LoaderError, SourceLoader};
use oxc_allocator::Allocator;
use oxc_ast::ast::Function;
use oxc_ast_visit::{walk, Visit};
use oxc_diagnostics::OxcDiagnostic;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_syntax::scope::ScopeFlags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One matching declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMatch {
    /// Declared identifier
    pub name: String,
    /// Source text between the body braces, braces excluded
    pub body: String,
    /// Character count of `body`
    pub len: usize,
}

impl FunctionMatch {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let len = body.chars().count();
        Self {
            name: name.into(),
            body,
            len,
        }
    }
}

/// Language extensions accepted by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Js,
    Jsx,
    Ts,
    /// TypeScript with JSX, the superset accepted by default
    #[default]
    Tsx,
}

impl Dialect {
    fn source_type(self, module: bool) -> SourceType {
        let source_type = match self {
            Dialect::Js => SourceType::mjs(),
            Dialect::Jsx => SourceType::jsx(),
            Dialect::Ts => SourceType::ts(),
            Dialect::Tsx => SourceType::tsx(),
        };
        source_type.with_module(module)
    }
}

/// Serialization used for a match list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render(self, matches: &[FunctionMatch]) -> Result<String, ExtractError> {
        match self {
            OutputFormat::Json => to_json(matches),
            OutputFormat::Yaml => to_yaml(matches),
        }
    }
}

/// Parser settings for an [`Extractor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub dialect: Dialect,
    /// Parse as an ES module; `false` parses a classic script
    pub module: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Tsx,
            module: true,
        }
    }
}

/// Errors that abort an extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The source file could not be read
    Load(LoaderError),
    /// The source is not valid in the configured dialect
    Parse {
        message: String,
        /// 1-based line and column of the first diagnostic, when it has one
        location: Option<(usize, usize)>,
        /// Number of diagnostics the parser reported
        count: usize,
    },
    /// The match list could not be serialized
    Serialize(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Load(err) => write!(f, "{}", err),
            ExtractError::Parse {
                message,
                location,
                count,
            } => {
                match location {
                    Some((line, column)) => write!(f, "{} ({}:{})", message, line, column)?,
                    None => write!(f, "{}", message)?,
                }
                if *count > 1 {
                    write!(f, " and {} more error(s)", count - 1)?;
                }
                Ok(())
            }
            ExtractError::Serialize(message) => write!(f, "cannot serialize matches: {}", message),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<LoaderError> for ExtractError {
    fn from(err: LoaderError) -> Self {
        ExtractError::Load(err)
    }
}

/// Finds function declarations by name prefix
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Read `path` and extract from it
    pub fn extract_file<P: AsRef<Path>>(
        &self,
        path: P,
        prefix: &str,
    ) -> Result<Vec<FunctionMatch>, ExtractError> {
        let loader = SourceLoader::from_path(path)?;
        self.extract_source(loader.source_ref(), prefix)
    }

    /// Parse `source` and collect the matching declarations in traversal order
    pub fn extract_source(
        &self,
        source: &str,
        prefix: &str,
    ) -> Result<Vec<FunctionMatch>, ExtractError> {
        let allocator = Allocator::default();
        let source_type = self.options.dialect.source_type(self.options.module);
        let parsed = Parser::new(&allocator, source, source_type).parse();

        if parsed.panicked || !parsed.errors.is_empty() {
            return Err(parse_error(source, &parsed.errors));
        }

        // Early errors (redeclarations, misplaced `return`, ...) come from the
        // semantic pass, not the parser.
        let checked = SemanticBuilder::new()
            .with_check_syntax_error(true)
            .build(&parsed.program);
        if !checked.errors.is_empty() {
            return Err(parse_error(source, &checked.errors));
        }

        let mut collector = DeclarationCollector::new(source, prefix);
        collector.visit_program(&parsed.program);
        log::debug!(
            "{} declaration(s) matched prefix {:?}, {} anonymous skipped",
            collector.matches.len(),
            prefix,
            collector.anonymous
        );
        Ok(collector.matches)
    }
}

/// Pretty JSON with two-space indentation; an empty list renders as `[]`.
pub fn to_json(matches: &[FunctionMatch]) -> Result<String, ExtractError> {
    serde_json::to_string_pretty(matches).map_err(|err| ExtractError::Serialize(err.to_string()))
}

pub fn to_yaml(matches: &[FunctionMatch]) -> Result<String, ExtractError> {
    serde_yaml::to_string(matches).map_err(|err| ExtractError::Serialize(err.to_string()))
}

struct DeclarationCollector<'s> {
    source: &'s str,
    prefix: &'s str,
    matches: Vec<FunctionMatch>,
    anonymous: usize,
}

impl<'s> DeclarationCollector<'s> {
    fn new(source: &'s str, prefix: &'s str) -> Self {
        Self {
            source,
            prefix,
            matches: Vec::new(),
            anonymous: 0,
        }
    }

    fn inspect(&mut self, func: &Function<'_>) {
        let Some(body) = &func.body else {
            return;
        };
        let Some(id) = &func.id else {
            self.anonymous += 1;
            return;
        };
        let name = id.name.as_str();
        if !name.starts_with(self.prefix) {
            return;
        }
        // The body span covers the braces.
        let inner = body.span.shrink(1).source_text(self.source);
        self.matches.push(FunctionMatch::new(name, inner));
    }
}

impl<'a> Visit<'a> for DeclarationCollector<'_> {
    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        if func.is_function_declaration() {
            self.inspect(func);
        }
        walk::walk_function(self, func, flags);
    }
}

fn parse_error(source: &str, errors: &[OxcDiagnostic]) -> ExtractError {
    let Some(first) = errors.first() else {
        return ExtractError::Parse {
            message: "parser aborted".to_string(),
            location: None,
            count: 0,
        };
    };
    let location = first
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map(|label| line_column(source, label.offset()));
    ExtractError::Parse {
        message: first.to_string(),
        location,
        count: errors.len(),
    }
}

fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;
    (line, column)
}
