//! Document loader
//!
//! Loads an hsx page into a live document:
//!
//! 1. fetch the page and extract its `<hsx>` block;
//! 2. hoist the block's `<script>` elements into the document body;
//! 3. run the block's hsx lines one by one with the runtime grammar. A failing
//!    line is logged and recorded; the following lines still run;
//! 4. append a deep copy of every media or container element of the block
//!    (`img`, `video`, `canvas`, `div` by default) to the document body.
//!
//! Step 4 runs unconditionally. An element that a component render already
//! placed in the document may therefore show up twice.

use markup5ever_rcdom::Handle;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::hsx::diagnostics::Diagnostic;
use crate::hsx::error::LoadError;
use crate::hsx::functions::FunctionTable;
use crate::hsx::parsing::{parse_line, Grammar, Line};
use crate::hsx::runtime::RuntimeExecutor;
use crate::hsx::state::RuntimeState;
use crate::hsx::surface::dom::{
    append_child, attribute, create_element, create_text, deep_clone, element_name, elements,
    parse_fragment, text_content,
};
use crate::hsx::surface::DomSurface;

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Name of the element wrapping the hsx block.
    pub block_tag: String,
    /// Tags copied into the body by the final clone pass.
    pub clone_tags: Vec<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            block_tag: "hsx".to_string(),
            clone_tags: ["img", "video", "canvas", "div"]
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
        }
    }
}

/// Source of hsx pages.
#[allow(async_fn_in_trait)]
pub trait DocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, LoadError>;
}

/// Reads pages from the local filesystem. `file://` URLs are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl DocumentFetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<String, LoadError> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read_to_string(Path::new(path))
            .await
            .map_err(|source| LoadError::Fetch {
                url: url.to_string(),
                source,
            })
    }
}

/// A block line whose command failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineFailure {
    /// 1-based line within the block.
    pub line: usize,
    pub text: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub commands_executed: usize,
    pub failures: Vec<LineFailure>,
    pub scripts_hoisted: usize,
    pub elements_cloned: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of a load: the state the page left behind, and what happened.
#[derive(Debug)]
pub struct LoadOutcome {
    pub state: RuntimeState,
    pub report: LoadReport,
}

pub struct DocumentLoader<F: DocumentFetcher = FileFetcher> {
    fetcher: F,
    options: LoaderOptions,
    functions: FunctionTable,
}

impl DocumentLoader<FileFetcher> {
    pub fn new(options: LoaderOptions) -> Self {
        Self::with_fetcher(FileFetcher, options)
    }
}

impl<F: DocumentFetcher> DocumentLoader<F> {
    pub fn with_fetcher(fetcher: F, options: LoaderOptions) -> Self {
        Self {
            fetcher,
            options,
            functions: FunctionTable::with_builtins(),
        }
    }

    /// Functions available to `run async` lines of loaded pages.
    pub fn with_functions(mut self, functions: FunctionTable) -> Self {
        self.functions = functions;
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Fetch `url` and load it into `surface`.
    #[tracing::instrument(level = "debug", skip(self, surface))]
    pub async fn load(&self, url: &str, surface: &DomSurface) -> Result<LoadOutcome, LoadError> {
        let page = self.fetcher.fetch(url).await?;
        self.load_page(url, &page, surface).await
    }

    /// Load already fetched page text. `url` is only used for reporting.
    pub async fn load_page(
        &self,
        url: &str,
        page: &str,
        surface: &DomSurface,
    ) -> Result<LoadOutcome, LoadError> {
        let block = self.extract_block(url, page)?;
        let mut report = LoadReport::default();

        let fragment = create_element("div", Vec::new());
        for node in parse_fragment(&block) {
            append_child(&fragment, node);
        }

        report.scripts_hoisted = hoist_scripts(&fragment, surface);

        let mut executor = RuntimeExecutor::new(surface.clone()).with_functions(self.functions.clone());
        for (index, line) in block.lines().enumerate() {
            match parse_line(line, Grammar::Runtime) {
                Line::Command(command) => {
                    let seen = executor.diagnostics().len();
                    match executor.execute(&command).await {
                        Ok(()) => report.commands_executed += 1,
                        Err(e) => {
                            tracing::error!("Failed to run hsx line {}: {}", line.trim(), e);
                            report.failures.push(LineFailure {
                                line: index + 1,
                                text: line.trim().to_string(),
                                message: e.to_string(),
                            });
                        }
                    }
                    report.diagnostics.extend(
                        executor.diagnostics()[seen..]
                            .iter()
                            .map(|d| Diagnostic::at_line(index + 1, d.message.clone())),
                    );
                }
                Line::Unrecognized => {
                    let diagnostic = Diagnostic::at_line(
                        index + 1,
                        format!("unknown hsx line: {}", line.trim()),
                    );
                    tracing::warn!("{}", diagnostic);
                    report.diagnostics.push(diagnostic);
                }
                Line::Blank | Line::Comment | Line::Ignored => {}
            }
        }

        report.elements_cloned = self.clone_elements(&fragment, surface);

        tracing::info!("HSX runtime fully loaded: {}", url);
        Ok(LoadOutcome {
            state: executor.into_state(),
            report,
        })
    }

    /// Inner text of the first `<block_tag ...>` up to the last closing tag.
    fn extract_block(&self, url: &str, page: &str) -> Result<String, LoadError> {
        let tag = regex::escape(&self.options.block_tag);
        let pattern = format!(r"(?is)<{tag}[^>]*>(.*)</{tag}>", tag = tag);
        let block = Regex::new(&pattern)
            .map_err(|source| LoadError::BlockTag {
                tag: self.options.block_tag.clone(),
                source,
            })?
            .captures(page)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        match block {
            Some(block) if !block.is_empty() => Ok(block),
            _ => Err(LoadError::MissingBlock {
                url: url.to_string(),
                tag: self.options.block_tag.clone(),
            }),
        }
    }

    fn clone_elements(&self, fragment: &Handle, surface: &DomSurface) -> usize {
        let body = surface.body();
        let mut cloned = 0;
        for element in elements(fragment) {
            let wanted = element_name(&element)
                .map(|name| self.options.clone_tags.iter().any(|tag| tag.eq_ignore_ascii_case(name)))
                .unwrap_or(false);
            if !wanted {
                continue;
            }
            if let Some(copy) = deep_clone(&element) {
                append_child(&body, copy);
                cloned += 1;
            }
        }
        cloned
    }
}

/// Re-create every `<script>` of the fragment in the document body so the
/// host treats it as a fresh script.
fn hoist_scripts(fragment: &Handle, surface: &DomSurface) -> usize {
    let body = surface.body();
    let mut hoisted = 0;
    for script in elements(fragment)
        .into_iter()
        .filter(|node| element_name(node) == Some("script"))
    {
        let mut attrs = Vec::new();
        let src = attribute(&script, "src").filter(|v| !v.is_empty());
        let kind = attribute(&script, "type").filter(|v| !v.is_empty());
        if let Some(src) = src.as_deref() {
            attrs.push(("src", src));
        }
        if let Some(kind) = kind.as_deref() {
            attrs.push(("type", kind));
        }

        let fresh = create_element("script", attrs);
        let text = text_content(&script);
        if !text.is_empty() {
            append_child(&fresh, create_text(&text));
        }
        append_child(&body, fresh);
        hoisted += 1;
    }
    hoisted
}
