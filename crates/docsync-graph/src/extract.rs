//! Raw import/export extraction.
//!
//! Extraction is a best-effort, regex-based pass over the head of each file.
//! Each language is an [`ImportExtractor`] strategy selected by extension.
//! Extractors emit raw identifiers only; mapping them onto indexed files is
//! the resolver's job, so both halves can be tested on their own.
//!
//! Relative imports are emitted in path form (`./x`, `../y/z`) whatever the
//! source language's own syntax, and project-rooted imports start with `/`.
//! Anything else is left as-is and later treated as external.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Raw identifiers found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Import specifiers in first-seen order, deduplicated.
    pub imports: Vec<String>,
    /// Exported names in first-seen order, deduplicated.
    pub exports: Vec<String>,
}

impl Extracted {
    fn push_import(&mut self, seen: &mut HashSet<String>, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        if seen.insert(raw.to_string()) {
            self.imports.push(raw.to_string());
        }
    }

    fn dedup_exports(mut self) -> Self {
        let mut seen = HashSet::new();
        self.exports.retain(|e| seen.insert(e.clone()));
        self
    }
}

/// A language-specific extraction strategy.
pub trait ImportExtractor: Send + Sync {
    /// Extensions (lower-case, no dot) this extractor handles.
    fn extensions(&self) -> &'static [&'static str];

    /// Extract raw imports and exports from `content`.
    fn extract(&self, content: &str) -> Extracted;

    /// Extract from the file at project-relative `path`. Strategies whose
    /// import syntax depends on where the file sits override this.
    fn extract_file(&self, _path: &str, content: &str) -> Extracted {
        self.extract(content)
    }
}

/// Extractor lookup keyed by file extension.
///
/// # Examples
///
/// ```
/// use docsync_graph::extract::ExtractorRegistry;
///
/// let registry = ExtractorRegistry::default();
/// let found = registry.extract("ts", "import { a } from './a';\nexport function b() {}");
/// assert_eq!(found.imports, vec!["./a"]);
/// assert_eq!(found.exports, vec!["b"]);
///
/// assert!(registry.extract("md", "import x from './x'").imports.is_empty());
/// ```
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn ImportExtractor>>,
}

impl ExtractorRegistry {
    /// An empty registry; every extension yields nothing.
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Register a strategy. Later registrations win for shared extensions.
    pub fn register(&mut self, extractor: Box<dyn ImportExtractor>) {
        self.extractors.insert(0, extractor);
    }

    /// Find the strategy for `extension`, if any.
    pub fn for_extension(&self, extension: &str) -> Option<&dyn ImportExtractor> {
        self.extractors
            .iter()
            .find(|e| e.extensions().contains(&extension))
            .map(|e| e.as_ref())
    }

    /// Extract with the matching strategy; unknown extensions yield nothing.
    pub fn extract(&self, extension: &str, content: &str) -> Extracted {
        match self.for_extension(extension) {
            Some(extractor) => extractor.extract(content).dedup_exports(),
            None => Extracted::default(),
        }
    }

    /// Like [`extract`](Self::extract), for the file at `path`.
    pub fn extract_file(&self, path: &str, extension: &str, content: &str) -> Extracted {
        match self.for_extension(extension) {
            Some(extractor) => extractor.extract_file(path, content).dedup_exports(),
            None => Extracted::default(),
        }
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(RubyExtractor));
        registry.register(Box::new(GoExtractor));
        registry.register(Box::new(RustExtractor));
        registry.register(Box::new(PythonExtractor));
        registry.register(Box::new(JsExtractor));
        registry
    }
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid extractor regex {pattern}: {e}"))
}

static JS_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(?m)^\s*(?:import|export)\s[^'"`;]*?\sfrom\s*['"]([^'"]+)['"]"#));
static JS_BARE_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(?m)^\s*import\s*['"]([^'"]+)['"]"#));
static JS_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"\b(?:require|import)\s*\(\s*['"`]([^'"`]+)['"`]\s*\)"#));
static JS_EXPORT_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?m)^\s*export\s+(?:default\s+)?(?:async\s+)?(?:function\*?|class|const|let|var|interface|type|enum)\s+([A-Za-z_$][\w$]*)")
});
static JS_EXPORT_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^\s*export\s*\{([^}]*)\}"));
static JS_COMMONJS_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^\s*(?:module\.)?exports\.([A-Za-z_$][\w$]*)\s*="));

/// JavaScript / TypeScript: ES modules, CommonJS and dynamic `import()`.
pub struct JsExtractor;

impl ImportExtractor for JsExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs", "ts", "tsx", "vue", "svelte"]
    }

    fn extract(&self, content: &str) -> Extracted {
        let mut out = Extracted::default();
        let mut seen = HashSet::new();

        for re in [&*JS_FROM_RE, &*JS_BARE_IMPORT_RE, &*JS_CALL_RE] {
            for cap in re.captures_iter(content) {
                out.push_import(&mut seen, &cap[1]);
            }
        }

        for cap in JS_EXPORT_DECL_RE.captures_iter(content) {
            out.exports.push(cap[1].to_string());
        }
        for cap in JS_EXPORT_LIST_RE.captures_iter(content) {
            for item in cap[1].split(',') {
                // `a as b` exports `b`
                let name = item.split_whitespace().last().unwrap_or("");
                if !name.is_empty() {
                    out.exports.push(name.to_string());
                }
            }
        }
        for cap in JS_COMMONJS_RE.captures_iter(content) {
            out.exports.push(cap[1].to_string());
        }
        out
    }
}

static PY_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?m)^\s*from\s+(\.*[\w.]*)\s+import\s+(?:\(([^)]*)\)|([\w, ]+))")
});
static PY_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^\s*import\s+([\w.]+(?:\s*,\s*[\w.]+)*)"));
static PY_DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^(?:async\s+)?(?:def|class)\s+([A-Za-z]\w*)"));

/// Python: `import x`, `from x import y`, with relative dots mapped to paths.
pub struct PythonExtractor;

impl ImportExtractor for PythonExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn extract(&self, content: &str) -> Extracted {
        let mut out = Extracted::default();
        let mut seen = HashSet::new();

        for cap in PY_FROM_RE.captures_iter(content) {
            let module = &cap[1];
            if module.chars().all(|c| c == '.') {
                // `from . import a, b` names sibling modules
                let names = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
                for name in python_names(names) {
                    let spec = python_relative(&format!("{module}{name}"));
                    out.push_import(&mut seen, &spec);
                }
            } else if module.starts_with('.') {
                out.push_import(&mut seen, &python_relative(module));
            } else {
                out.push_import(&mut seen, module);
            }
        }
        for cap in PY_IMPORT_RE.captures_iter(content) {
            for module in cap[1].split(',') {
                out.push_import(&mut seen, module.trim());
            }
        }
        for cap in PY_DEF_RE.captures_iter(content) {
            out.exports.push(cap[1].to_string());
        }
        out
    }
}

/// Names in an import list, with comments and `as` aliases dropped.
fn python_names(list: &str) -> Vec<&str> {
    list.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.split(','))
        .filter_map(|item| item.split_whitespace().next())
        .collect()
}

/// `.a.b` -> `./a/b`, `..a` -> `../a`, `...a` -> `../../a`.
fn python_relative(module: &str) -> String {
    let dots = module.chars().take_while(|c| *c == '.').count();
    let rest = module[dots..].replace('.', "/");
    let prefix = if dots <= 1 {
        "./".to_string()
    } else {
        "../".repeat(dots - 1)
    };
    format!("{prefix}{rest}")
}

static RS_MOD_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^\s*(?:pub(?:\([\w:]+\))?\s+)?mod\s+([a-z_][\w]*)\s*;"));
static RS_USE_CRATE_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^\s*(?:pub\s+)?use\s+crate::([a-z_][\w]*)"));
static RS_PUB_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?m)^\s*pub\s+(?:async\s+)?(?:fn|struct|enum|trait|type|const|static)\s+([A-Za-z_]\w*)")
});

/// Rust: `mod x;` declarations and `use crate::x` paths.
///
/// Both are emitted relative to the declaring file. A `mod x;` in
/// `src/graph.rs` names `src/graph/x.rs`, while one in `lib.rs`, `main.rs`,
/// `mod.rs` or a `src/bin/*.rs` target names a sibling. `crate::x` is
/// anchored at the nearest enclosing `src/` directory, so workspace member
/// crates resolve too. Without a path the file is taken to be `src/lib.rs`.
pub struct RustExtractor;

impl ImportExtractor for RustExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn extract(&self, content: &str) -> Extracted {
        self.extract_file("src/lib.rs", content)
    }

    fn extract_file(&self, path: &str, content: &str) -> Extracted {
        let mut out = Extracted::default();
        let mut seen = HashSet::new();
        let mod_dir = rust_mod_dir(path);
        let crate_root = rust_crate_root(path);

        for cap in RS_MOD_RE.captures_iter(content) {
            out.push_import(&mut seen, &format!("{mod_dir}{}", &cap[1]));
        }
        for cap in RS_USE_CRATE_RE.captures_iter(content) {
            out.push_import(&mut seen, &format!("{crate_root}{}", &cap[1]));
        }
        for cap in RS_PUB_RE.captures_iter(content) {
            out.exports.push(cap[1].to_string());
        }
        out
    }
}

/// Directories of `path`, without the file name.
fn parent_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.pop();
    segments
}

fn is_rust_bin_target(path: &str) -> bool {
    parent_segments(path).ends_with(&["src", "bin"])
}

/// Where `mod x;` declared in `path` looks for `x`, relative to `path`.
fn rust_mod_dir(path: &str) -> String {
    let stem = path
        .rsplit('/')
        .next()
        .and_then(|name| name.strip_suffix(".rs"))
        .unwrap_or("");
    if stem.is_empty() || matches!(stem, "lib" | "main" | "mod") || is_rust_bin_target(path) {
        "./".to_string()
    } else {
        format!("./{stem}/")
    }
}

/// Relative prefix from `path` to its crate root (the nearest enclosing
/// `src/`, or `src/bin/` for binary targets). A file outside any `src/` is
/// its own root.
fn rust_crate_root(path: &str) -> String {
    let dirs = parent_segments(path);
    if is_rust_bin_target(path) {
        return "./".to_string();
    }
    match dirs.iter().rposition(|d| *d == "src") {
        Some(pos) if pos + 1 < dirs.len() => "../".repeat(dirs.len() - pos - 1),
        _ => "./".to_string(),
    }
}

static GO_SINGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(?m)^\s*import\s+(?:\w+\s+)?"([^"]+)""#));
static GO_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?s)import\s*\((.*?)\)"));
static GO_QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| regex(r#""([^"]+)""#));
static GO_EXPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^(?:func(?:\s+\([^)]*\))?|type)\s+([A-Z]\w*)"));

/// Go: single and grouped `import` declarations.
pub struct GoExtractor;

impl ImportExtractor for GoExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn extract(&self, content: &str) -> Extracted {
        let mut out = Extracted::default();
        let mut seen = HashSet::new();

        for cap in GO_SINGLE_RE.captures_iter(content) {
            out.push_import(&mut seen, &cap[1]);
        }
        for block in GO_BLOCK_RE.captures_iter(content) {
            for cap in GO_QUOTED_RE.captures_iter(&block[1]) {
                out.push_import(&mut seen, &cap[1]);
            }
        }
        for cap in GO_EXPORT_RE.captures_iter(content) {
            out.exports.push(cap[1].to_string());
        }
        out
    }
}

static RB_RELATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(?m)^\s*require_relative\s*\(?\s*['"]([^'"]+)['"]"#));
static RB_REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(?m)^\s*require\s*\(?\s*['"]([^'"]+)['"]"#));
static RB_DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^\s*(?:class|module)\s+([A-Z]\w*)"));

/// Ruby: `require_relative` (made relative) and `require`.
pub struct RubyExtractor;

impl ImportExtractor for RubyExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["rb"]
    }

    fn extract(&self, content: &str) -> Extracted {
        let mut out = Extracted::default();
        let mut seen = HashSet::new();

        for cap in RB_RELATIVE_RE.captures_iter(content) {
            let spec = &cap[1];
            if spec.starts_with('.') {
                out.push_import(&mut seen, spec);
            } else {
                out.push_import(&mut seen, &format!("./{spec}"));
            }
        }
        for cap in RB_REQUIRE_RE.captures_iter(content) {
            out.push_import(&mut seen, &cap[1]);
        }
        for cap in RB_DEF_RE.captures_iter(content) {
            out.exports.push(cap[1].to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_collects_every_import_form() {
        let code = r#"
import React from 'react';
import { a, b } from "./a";
import * as c from '../c/index.js';
import './styles.css';
export { d } from './d';
const e = require('./e');
const f = await import('./f');
"#;
        let found = JsExtractor.extract(code);
        assert_eq!(
            found.imports,
            vec!["react", "./a", "../c/index.js", "./d", "./styles.css", "./e", "./f"]
        );
    }

    #[test]
    fn js_imports_are_deduplicated_in_order() {
        let code = "import a from './a';\nconst again = require('./a');\nimport b from './b';";
        let found = JsExtractor.extract(code);
        assert_eq!(found.imports, vec!["./a", "./b"]);
    }

    #[test]
    fn js_exports() {
        let code = r#"
export default function main() {}
export const VERSION = '1';
export class Server {}
export { helper, inner as outer };
module.exports.legacy = 1;
exports.other = 2;
"#;
        let found = JsExtractor.extract(code);
        assert_eq!(
            found.exports,
            vec!["main", "VERSION", "Server", "helper", "outer", "legacy", "other"]
        );
    }

    #[test]
    fn python_relative_imports_become_paths() {
        let code = r#"
import os, sys
from . import models, views
from .utils import slugify
from ..core.db import session
from requests import get

def handler(): pass
class Service: pass
def _private(): pass
"#;
        let found = PythonExtractor.extract(code);
        assert_eq!(
            found.imports,
            vec![
                "./models",
                "./views",
                "./utils",
                "../core/db",
                "requests",
                "os",
                "sys"
            ]
        );
        assert_eq!(found.exports, vec!["handler", "Service"]);
    }

    #[test]
    fn python_relative_helper() {
        assert_eq!(python_relative(".a.b"), "./a/b");
        assert_eq!(python_relative("..a"), "../a");
        assert_eq!(python_relative("...a"), "../../a");
    }

    #[test]
    fn rust_mods_and_crate_paths() {
        let code = r#"
mod config;
pub mod graph;
pub(crate) mod walker;
mod tests { }
use crate::config::Settings;
use std::io;
pub fn run() {}
pub struct Engine;
fn private() {}
"#;
        let found = RustExtractor.extract(code);
        assert_eq!(found.imports, vec!["./config", "./graph", "./walker"]);
        assert_eq!(found.exports, vec!["run", "Engine"]);
    }

    #[test]
    fn rust_mod_in_non_root_file_is_nested() {
        let found = RustExtractor.extract_file("src/graph.rs", "mod edge;
pub mod node;
");
        assert_eq!(found.imports, vec!["./graph/edge", "./graph/node"]);

        let found = RustExtractor.extract_file("src/graph/mod.rs", "mod edge;");
        assert_eq!(found.imports, vec!["./edge"]);

        let found = RustExtractor.extract_file("src/bin/tool.rs", "mod cli;");
        assert_eq!(found.imports, vec!["./cli"]);
    }

    #[test]
    fn rust_crate_paths_anchor_at_enclosing_src() {
        let code = "use crate::config::Settings;
";
        let at = |path: &str| RustExtractor.extract_file(path, code).imports;

        assert_eq!(at("crates/a/src/lib.rs"), vec!["./config"]);
        assert_eq!(at("crates/a/src/graph/edge.rs"), vec!["../config"]);
        assert_eq!(at("src/a/b/c.rs"), vec!["../../config"]);
        assert_eq!(at("build.rs"), vec!["./config"]);
    }

    #[test]
    fn python_parenthesised_import_list() {
        let code = "from . import (\n    models,\n    views as v,  # html\n)\nfrom .. import (core)\n";
        let found = PythonExtractor.extract(code);
        assert_eq!(found.imports, vec!["./models", "./views", "../core"]);
    }

    #[test]
    fn registry_passes_the_file_path() {
        let registry = ExtractorRegistry::default();
        let found = registry.extract_file("src/graph.rs", "rs", "mod edge;");
        assert_eq!(found.imports, vec!["./graph/edge"]);
        let found = registry.extract_file("pkg/a.py", "py", "from .b import c");
        assert_eq!(found.imports, vec!["./b"]);
    }

    #[test]
    fn go_grouped_imports() {
        let code = r#"
package main

import "fmt"
import (
    "os"
    log "github.com/sirupsen/logrus"
)

func Run() {}
func (s *Server) Start() {}
func helper() {}
type Config struct {}
"#;
        let found = GoExtractor.extract(code);
        assert_eq!(found.imports, vec!["fmt", "os", "github.com/sirupsen/logrus"]);
        assert_eq!(found.exports, vec!["Run", "Start", "Config"]);
    }

    #[test]
    fn ruby_require_relative_is_relative() {
        let code = "require 'json'\nrequire_relative 'lib/parser'\nrequire_relative '../shared'\nclass Parser\nend\n";
        let found = RubyExtractor.extract(code);
        assert_eq!(found.imports, vec!["./lib/parser", "../shared", "json"]);
        assert_eq!(found.exports, vec!["Parser"]);
    }

    #[test]
    fn registry_routes_by_extension() {
        let registry = ExtractorRegistry::default();
        assert!(registry.for_extension("tsx").is_some());
        assert!(registry.for_extension("py").is_some());
        assert!(registry.for_extension("txt").is_none());
        assert_eq!(registry.extract("py", "from .a import b").imports, vec!["./a"]);
    }

    #[test]
    fn registry_later_registration_wins() {
        struct Nothing;
        impl ImportExtractor for Nothing {
            fn extensions(&self) -> &'static [&'static str] {
                &["js"]
            }
            fn extract(&self, _content: &str) -> Extracted {
                Extracted::default()
            }
        }

        let mut registry = ExtractorRegistry::default();
        registry.register(Box::new(Nothing));
        assert!(registry.extract("js", "import a from './a'").imports.is_empty());
    }

    #[test]
    fn malformed_input_yields_nothing() {
        let found = JsExtractor.extract("import from ''; require(); import('')");
        assert!(found.imports.is_empty());
    }
}
