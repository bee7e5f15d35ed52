//! Render surfaces
//!
//! The runtime executor never touches a concrete document. It talks to a
//! [`RenderSurface`], which knows how to resolve a selector, replace a node's
//! content, append an element and find placeholder tokens. [`DomSurface`] is
//! the html5ever-backed implementation used by the document loader and tests.

pub mod dom;
pub mod selector;

pub use dom::{DomSlot, DomSurface};
pub use selector::Selector;

/// Description of an element to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// A location in rendered content that holds a placeholder token.
///
/// Slots are captured once, when content is bound, and keep pointing at the
/// same text afterwards.
pub trait PlaceholderSlot {
    /// Replace the first occurrence of `token` with `value`.
    ///
    /// Returns false when the token is no longer present.
    fn replace_first(&self, token: &str, value: &str) -> bool;
}

/// The capabilities the runtime executor needs from a document host.
pub trait RenderSurface {
    type Node: Clone;
    type Slot: PlaceholderSlot + 'static;

    /// The container used when a selector does not resolve (the page body).
    fn root(&self) -> Self::Node;

    /// First node matching `selector`, in document order.
    fn resolve(&self, selector: &str) -> Option<Self::Node>;

    /// Replace the content of `target` with the given raw markup.
    fn set_content(&self, target: &Self::Node, markup: &str);

    /// Create an element and append it as the last child of `target`.
    fn append_element(&self, target: &Self::Node, element: &ElementSpec) -> Self::Node;

    /// Every location under `target` currently containing `token`.
    fn placeholders(&self, target: &Self::Node, token: &str) -> Vec<Self::Slot>;
}
