//! Document loader end to end, with an in-memory page source

use hsx::hsx::error::LoadError;
use hsx::hsx::loader::{DocumentFetcher, DocumentLoader, LoaderOptions};
use hsx::hsx::surface::dom::{inner_html, text_content};
use hsx::{DomSurface, Value};
use std::collections::HashMap;
use std::io;

#[derive(Default)]
struct MemoryFetcher {
    pages: HashMap<String, String>,
}

impl MemoryFetcher {
    fn with_page(url: &str, page: &str) -> Self {
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), page.to_string());
        Self { pages }
    }
}

impl DocumentFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<String, LoadError> {
        self.pages.get(url).cloned().ok_or_else(|| LoadError::Fetch {
            url: url.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such page"),
        })
    }
}

fn loader(url: &str, page: &str) -> DocumentLoader<MemoryFetcher> {
    DocumentLoader::with_fetcher(MemoryFetcher::with_page(url, page), LoaderOptions::default())
}

#[tokio::test]
async fn failing_line_does_not_stop_later_lines() {
    let page = r#"<html><hsx>
hsx set variable broken = 1 +
hsx run async explode()
hsx set variable title = "Welcome"
hsx define component Title <h1>{{title}}</h1>
hsx render component Title to #app
</hsx></html>"#;
    let surface = DomSurface::from_html(r#"<body><section id="app"></section></body>"#);

    let outcome = loader("app.html", page).load("app.html", &surface).await.unwrap();

    let lines: Vec<usize> = outcome.report.failures.iter().map(|f| f.line).collect();
    assert_eq!(lines, vec![2, 3]);
    assert_eq!(outcome.report.commands_executed, 3);
    assert_eq!(outcome.state.value("title"), Some(Value::from("Welcome")));
    assert_eq!(
        text_content(&surface.query("#app").unwrap()),
        "{{title}}"
    );
}

#[tokio::test]
async fn block_elements_are_cloned_after_commands_run() {
    let page = r#"<hsx>
<div class="card"><img src="cat.png"></div>
<canvas id="c"></canvas>
<p>not cloned</p>
hsx media load img from dog.png to #gallery
</hsx>"#;
    let surface = DomSurface::from_html(r#"<body><div id="gallery"></div></body>"#);

    let outcome = loader("p", page).load("p", &surface).await.unwrap();

    assert_eq!(outcome.report.elements_cloned, 3);
    let gallery = surface.query("#gallery").unwrap();
    assert_eq!(inner_html(&gallery), r#"<img src="dog.png">"#);
    assert_eq!(surface.query_all("div.card").len(), 1);
    // dog.png, the card's nested image, and the standalone clone of that image
    assert_eq!(surface.query_all("img").len(), 3);
    assert!(surface.query("canvas#c").is_some());
    assert!(surface.query("p").is_none());
}

#[tokio::test]
async fn scripts_are_hoisted_before_commands_and_clones() {
    let page = r#"<hsx><script src="lib.js"></script>
hsx media load video from intro.mp4 to #none
</hsx>"#;
    let surface = DomSurface::new();

    let outcome = loader("p", page).load("p", &surface).await.unwrap();

    assert_eq!(outcome.report.scripts_hoisted, 1);
    assert_eq!(outcome.report.diagnostics.len(), 1);
    insta::assert_snapshot!(
        inner_html(&surface.body()),
        @r#"<script src="lib.js"></script><video src="intro.mp4"></video>"#
    );
}

#[tokio::test]
async fn diagnostics_point_at_their_block_line() {
    let page = "<hsx>\nhsx render component Ghost to #app\nhsx frobnicate everything\n</hsx>";
    let surface = DomSurface::from_html(r#"<body><div id="app"></div></body>"#);

    let outcome = loader("p", page).load("p", &surface).await.unwrap();

    let located: Vec<(Option<usize>, &str)> = outcome
        .report
        .diagnostics
        .iter()
        .map(|d| (d.line, d.message.as_str()))
        .collect();
    assert_eq!(
        located,
        vec![
            (Some(2), "Component not found: Ghost"),
            (Some(3), "unknown hsx line: hsx frobnicate everything"),
        ]
    );
}

#[tokio::test]
async fn page_without_block_is_rejected() {
    let surface = DomSurface::new();
    let err = loader("p", "<html><body>nothing here</body></html>")
        .load("p", &surface)
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::MissingBlock { ref tag, .. } if tag == "hsx"));
}

#[tokio::test]
async fn block_tag_is_configurable() {
    let options = LoaderOptions {
        block_tag: "hsx-page".into(),
        clone_tags: vec!["img".into()],
    };
    let page = "<hsx-page>\nhsx set variable x = true\n<img src=\"a.png\">\n</hsx-page>";
    let loader = DocumentLoader::with_fetcher(MemoryFetcher::with_page("p", page), options);
    let surface = DomSurface::new();

    let outcome = loader.load("p", &surface).await.unwrap();

    assert_eq!(outcome.state.value("x"), Some(Value::Bool(true)));
    assert_eq!(outcome.report.elements_cloned, 1);
}

#[tokio::test]
async fn unknown_page_is_a_fetch_error() {
    let surface = DomSurface::new();
    let err = loader("p", "<hsx></hsx>")
        .load("elsewhere", &surface)
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Fetch { .. }));
}
