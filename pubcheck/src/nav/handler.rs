use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::context::ValidationContext;
use crate::messages::MessageId;
use crate::xml::{XmlElement, XmlHandler};

/// Nav types that may only link into the publication.
const LOCAL_ONLY_NAV_TYPES: [&str; 3] = ["toc", "page-list", "landmarks"];

static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"^(?<scheme>[A-Za-z][A-Za-z0-9+.\-]*):(?<rest>.*)$") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid scheme regex: {err}"),
    }
});

/// One `a[@href]` found inside a `nav`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    /// The reserved nav type (`toc`, `page-list`, `landmarks`), else the
    /// first `epub:type` token of the nav, else empty.
    pub nav_type: String,
    pub href: String,
    pub line: usize,
    pub column: usize,
}

/// Structural handler of a navigation document.
#[derive(Debug, Default)]
pub struct NavHandler {
    depth: usize,
    /// Open navs as `(depth, nav_type)`.
    navs: Vec<(usize, String)>,
    links: Vec<NavLink>,
}

impl NavHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_links(self) -> Vec<NavLink> {
        self.links
    }
}

fn nav_type_of(nav: &XmlElement) -> String {
    LOCAL_ONLY_NAV_TYPES
        .iter()
        .copied()
        .find(|t| nav.has_epub_type(t))
        .or_else(|| nav.epub_types().next())
        .unwrap_or_default()
        .to_owned()
}

/// Whether `href` is an absolute URL with an authority (`scheme://...`).
fn is_remote(href: &str) -> bool {
    SCHEME_RE
        .captures(href)
        .is_some_and(|caps| caps["rest"].starts_with("//"))
}

fn has_scheme(href: &str) -> bool {
    SCHEME_RE.is_match(href)
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = input.get(i + 1..i + 3)
            && hex.bytes().all(|b| b.is_ascii_hexdigit())
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Resolve a relative `href` against the directory of `base`, dropping the
/// fragment and query. Returns `None` for same-document references and for
/// paths escaping the container root.
fn resolve_local(base: &str, href: &str) -> Option<String> {
    let path = href.split(['#', '?']).next().unwrap_or_default();
    if path.is_empty() {
        return None;
    }
    let path = percent_decode(path);

    let mut segments: Vec<&str> = if path.starts_with('/') {
        Vec::new()
    } else {
        base.rsplit_once('/')
            .map_or_else(Vec::new, |(dir, _)| dir.split('/').collect())
    };
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

impl XmlHandler for NavHandler {
    fn start_element(&mut self, context: &ValidationContext, element: &XmlElement) {
        self.depth += 1;
        if element.is_xhtml("nav") {
            self.navs.push((self.depth, nav_type_of(element)));
            return;
        }

        let Some((_, nav_type)) = self.navs.last() else {
            return;
        };
        if !element.is_xhtml("a") {
            return;
        }
        let Some(href) = element.attribute(None, "href") else {
            return;
        };

        if is_remote(href) {
            if LOCAL_ONLY_NAV_TYPES.contains(&nav_type.as_str()) {
                context.report().message(
                    MessageId::Nav010,
                    element.location(context.path()),
                    &[nav_type.as_str(), href],
                );
            }
        } else if !has_scheme(href)
            && let Some(target) = resolve_local(context.path(), href)
            && !context.container().has_entry(&target)
        {
            tracing::debug!(path = context.path(), href, resolved = %target, "unresolved nav link");
            context.report().message(
                MessageId::Rsc007,
                element.location(context.path()),
                &[target.as_str()],
            );
        }

        self.links.push(NavLink {
            nav_type: nav_type.clone(),
            href: href.to_owned(),
            line: element.line,
            column: element.column,
        });
    }

    fn end_element(&mut self, _context: &ValidationContext, _element: &XmlElement) {
        if self.navs.last().is_some_and(|(depth, _)| *depth == self.depth) {
            self.navs.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }
}
