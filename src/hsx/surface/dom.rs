//! html5ever-backed document surface
//!
//! Documents are `markup5ever_rcdom` trees. Node handles are reference
//! counted, so a [`DomSurface`] is a cheap handle onto one shared document and
//! placeholder slots can hold on to the nodes they were captured from.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{ns, parse_document, Attribute, LocalName, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::selector::Selector;
use super::{ElementSpec, PlaceholderSlot, RenderSurface};

const EMPTY_PAGE: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

/// A live document the runtime renders into.
#[derive(Clone)]
pub struct DomSurface {
    dom: Rc<RcDom>,
}

impl DomSurface {
    /// An empty page with `<head>` and `<body>`.
    pub fn new() -> Self {
        Self::from_html(EMPTY_PAGE)
    }

    /// Parse a complete host page.
    pub fn from_html(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        Self { dom: Rc::new(dom) }
    }

    /// The `<body>` element. The html5ever tree builder always creates one.
    pub fn body(&self) -> Handle {
        find_first(&self.dom.document, &|node| element_name(node) == Some("body"))
            .unwrap_or_else(|| self.dom.document.clone())
    }

    /// First element matching `selector`, in document order.
    pub fn query(&self, selector: &str) -> Option<Handle> {
        let selector = Selector::parse(selector)?;
        find_first(&self.dom.document, &|node| element_matches(node, &selector))
    }

    /// Every element matching `selector`, in document order.
    pub fn query_all(&self, selector: &str) -> Vec<Handle> {
        match Selector::parse(selector) {
            Some(selector) => elements(&self.dom.document)
                .into_iter()
                .filter(|node| element_matches(node, &selector))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        inner_html(&self.dom.document)
    }
}

impl Default for DomSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for DomSurface {
    type Node = Handle;
    type Slot = DomSlot;

    fn root(&self) -> Handle {
        self.body()
    }

    fn resolve(&self, selector: &str) -> Option<Handle> {
        self.query(selector)
    }

    fn set_content(&self, target: &Handle, markup: &str) {
        for child in target.children.borrow().iter() {
            child.parent.set(None);
        }
        target.children.borrow_mut().clear();
        for node in parse_fragment(markup) {
            append_child(target, node);
        }
    }

    fn append_element(&self, target: &Handle, element: &ElementSpec) -> Handle {
        let attrs: Vec<(&str, &str)> = element
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let node = create_element(&element.tag, attrs);
        append_child(target, node.clone());
        node
    }

    fn placeholders(&self, target: &Handle, token: &str) -> Vec<DomSlot> {
        let mut slots = Vec::new();
        collect_slots(target, token, &mut slots);
        slots
    }
}

/// A text node or attribute value holding a placeholder token.
#[derive(Clone)]
pub enum DomSlot {
    Text(Handle),
    Attribute { element: Handle, name: QualName },
}

impl PlaceholderSlot for DomSlot {
    fn replace_first(&self, token: &str, value: &str) -> bool {
        match self {
            DomSlot::Text(node) => {
                if let NodeData::Text { contents } = &node.data {
                    let current = contents.borrow().to_string();
                    if current.contains(token) {
                        *contents.borrow_mut() = current.replacen(token, value, 1).into();
                        return true;
                    }
                }
                false
            }
            DomSlot::Attribute { element, name } => {
                if let NodeData::Element { attrs, .. } = &element.data {
                    let mut attrs = attrs.borrow_mut();
                    if let Some(attr) = attrs.iter_mut().find(|a| &a.name == name) {
                        let current = attr.value.to_string();
                        if current.contains(token) {
                            attr.value = current.replacen(token, value, 1).into();
                            return true;
                        }
                    }
                }
                false
            }
        }
    }
}

fn collect_slots(node: &Handle, token: &str, slots: &mut Vec<DomSlot>) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                if contents.borrow().contains(token) {
                    slots.push(DomSlot::Text(child.clone()));
                }
            }
            NodeData::Element { attrs, .. } => {
                for attr in attrs.borrow().iter() {
                    if attr.value.contains(token) {
                        slots.push(DomSlot::Attribute {
                            element: child.clone(),
                            name: attr.name.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
        collect_slots(child, token, slots);
    }
}

// ===== Tree helpers =====

/// Detached HTML element; attribute names are taken as given.
pub fn create_element(tag: &str, attrs: Vec<(&str, &str)>) -> Handle {
    let attrs = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        })
        .collect();
    detached(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(tag)),
        attrs: RefCell::new(attrs),
        template_contents: Default::default(),
        mathml_annotation_xml_integration_point: false,
    })
}

pub fn create_text(text: &str) -> Handle {
    detached(NodeData::Text {
        contents: RefCell::new(text.into()),
    })
}

fn detached(data: NodeData) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data,
    })
}

pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Parse a markup fragment into detached nodes.
///
/// The fragment is parsed as a full document; whatever the tree builder put in
/// `<head>` (leading scripts, styles) comes first, followed by the `<body>`
/// content.
pub fn parse_fragment(markup: &str) -> Vec<Handle> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);

    let mut nodes = Vec::new();
    for section in ["head", "body"] {
        if let Some(container) =
            find_first(&dom.document, &|node| element_name(node) == Some(section))
        {
            let children: Vec<Handle> = container.children.borrow_mut().drain(..).collect();
            for child in children {
                child.parent.set(None);
                nodes.push(child);
            }
        }
    }
    nodes
}

/// Deep copy of an element, text or comment subtree (detached).
pub fn deep_clone(node: &Handle) -> Option<Handle> {
    let data = match &node.data {
        NodeData::Element {
            name,
            attrs,
            mathml_annotation_xml_integration_point,
            ..
        } => NodeData::Element {
            name: name.clone(),
            attrs: RefCell::new(attrs.borrow().clone()),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: *mathml_annotation_xml_integration_point,
        },
        NodeData::Text { contents } => NodeData::Text {
            contents: RefCell::new(contents.borrow().clone()),
        },
        NodeData::Comment { contents } => NodeData::Comment {
            contents: contents.clone(),
        },
        _ => return None,
    };

    let copy = detached(data);
    for child in node.children.borrow().iter() {
        if let Some(child_copy) = deep_clone(child) {
            append_child(&copy, child_copy);
        }
    }
    Some(copy)
}

pub fn element_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

pub fn attribute(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn element_matches(node: &Handle, selector: &Selector) -> bool {
    match &node.data {
        NodeData::Element { name, attrs, .. } => {
            let attrs = attrs.borrow();
            selector.matches(&name.local, |wanted| {
                attrs
                    .iter()
                    .find(|a| &*a.name.local == wanted)
                    .map(|a| &*a.value)
            })
        }
        _ => false,
    }
}

/// Every element below `node`, pre-order.
pub fn elements(node: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    collect_elements(node, &mut out);
    out
}

fn collect_elements(node: &Handle, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if matches!(child.data, NodeData::Element { .. }) {
            out.push(child.clone());
        }
        collect_elements(child, out);
    }
}

fn find_first(node: &Handle, predicate: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if predicate(child) {
            return Some(child.clone());
        }
        if let Some(found) = find_first(child, predicate) {
            return Some(found);
        }
    }
    None
}

/// Concatenated text of every text node below `node`.
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            out.push_str(&contents.borrow());
        }
        collect_text(child, out);
    }
}

/// Serialized markup of the children of `node`.
pub fn inner_html(node: &Handle) -> String {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    let serializable = SerializableHandle::from(node.clone());
    if let Err(e) = serialize(&mut output, &serializable, opts) {
        tracing::error!("HTML serialization failed: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&output).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_has_a_body() {
        let surface = DomSurface::new();
        assert_eq!(element_name(&surface.body()), Some("body"));
        assert_eq!(inner_html(&surface.body()), "");
    }

    #[test]
    fn query_finds_first_match_in_document_order() {
        let surface = DomSurface::from_html(
            r#"<body><p class="x">one</p><div id="app"><p class="x">two</p></div></body>"#,
        );
        let first = surface.query(".x").unwrap();
        assert_eq!(text_content(&first), "one");
        assert_eq!(surface.query_all("p.x").len(), 2);
        assert!(surface.query("#nope").is_none());
    }

    #[test]
    fn set_content_replaces_children() {
        let surface = DomSurface::from_html(r#"<body><div id="app"><span>old</span></div></body>"#);
        let app = surface.query("#app").unwrap();
        surface.set_content(&app, "<b>new</b> text");
        assert_eq!(inner_html(&app), "<b>new</b> text");
    }

    #[test]
    fn parse_fragment_keeps_leading_scripts() {
        let nodes = parse_fragment("<script>let a = 1;</script><p>hi</p>");
        let names: Vec<_> = nodes.iter().filter_map(element_name).collect();
        assert_eq!(names, vec!["script", "p"]);
    }

    #[test]
    fn placeholders_cover_text_and_attributes() {
        let surface = DomSurface::new();
        let body = surface.body();
        surface.set_content(&body, r#"<img alt="{{name}}"><p>Hi {{name}}</p><p>none</p>"#);

        let slots = surface.placeholders(&body, "{{name}}");
        assert_eq!(slots.len(), 2);
        for slot in &slots {
            assert!(slot.replace_first("{{name}}", "Ann"));
            assert!(!slot.replace_first("{{name}}", "Bob"));
        }
        assert_eq!(inner_html(&body), r#"<img alt="Ann"><p>Hi Ann</p><p>none</p>"#);
    }

    #[test]
    fn deep_clone_is_detached_copy() {
        let surface = DomSurface::from_html(r#"<body><div class="c"><img src="a.png"></div></body>"#);
        let original = surface.query("div").unwrap();
        let copy = deep_clone(&original).unwrap();

        append_child(&surface.body(), copy);
        assert_eq!(surface.query_all("div.c").len(), 2);
        assert_eq!(surface.query_all("img").len(), 2);
    }
}
