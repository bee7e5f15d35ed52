//! Minimal selector support
//!
//! Only compound simple selectors are understood: an optional tag name (or
//! `*`) followed by any number of `#id` and `.class` parts, e.g. `div`,
//! `#app`, `.card`, `section#main.wide`. Anything else (combinators,
//! attribute selectors, pseudo classes) does not parse and therefore never
//! resolves.

use once_cell::sync::Lazy;
use regex::Regex;

static SELECTOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<tag>[A-Za-z][A-Za-z0-9-]*|\*)?(?P<parts>(?:[#.][A-Za-z0-9_-]+)*)$").unwrap()
});

static PART_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"([#.])([A-Za-z0-9_-]+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl Selector {
    pub fn parse(source: &str) -> Option<Self> {
        let source = source.trim();
        if source.is_empty() {
            return None;
        }
        let caps = SELECTOR_REGEX.captures(source)?;

        let mut selector = Selector {
            tag: caps
                .name("tag")
                .map(|m| m.as_str())
                .filter(|tag| *tag != "*")
                .map(|tag| tag.to_ascii_lowercase()),
            ..Default::default()
        };

        let parts = caps.name("parts").map(|m| m.as_str()).unwrap_or("");
        for part in PART_REGEX.captures_iter(parts) {
            let value = part[2].to_string();
            if &part[1] == "#" {
                selector.id = Some(value);
            } else {
                selector.classes.push(value);
            }
        }
        Some(selector)
    }

    /// Check an element given its tag name and attribute lookup.
    pub fn matches<'a>(&self, tag: &str, attribute: impl Fn(&str) -> Option<&'a str>) -> bool {
        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_list = attribute("class").unwrap_or("");
            let present: Vec<&str> = class_list.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_selectors() {
        let selector = Selector::parse("section#main.wide.dark").unwrap();
        assert_eq!(selector.tag.as_deref(), Some("section"));
        assert_eq!(selector.id.as_deref(), Some("main"));
        assert_eq!(selector.classes, vec!["wide", "dark"]);
    }

    #[test]
    fn universal_selector_has_no_tag() {
        let selector = Selector::parse("*").unwrap();
        assert_eq!(selector, Selector::default());
    }

    #[test]
    fn rejects_combinators_and_empty_input() {
        assert!(Selector::parse("div > p").is_none());
        assert!(Selector::parse("a[href]").is_none());
        assert!(Selector::parse("  ").is_none());
    }

    #[test]
    fn matches_by_id_and_class() {
        let selector = Selector::parse("div.card").unwrap();
        let attrs = |name: &str| match name {
            "class" => Some("card big"),
            _ => None,
        };
        assert!(selector.matches("div", attrs));
        assert!(!selector.matches("p", attrs));
        assert!(!Selector::parse("#app").unwrap().matches("div", attrs));
    }
}
