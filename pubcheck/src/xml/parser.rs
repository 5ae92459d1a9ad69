use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use super::element::{XmlAttribute, XmlElement};
use super::location::LineIndex;
use super::XmlHandler;
use crate::context::ValidationContext;
use crate::messages::{MessageId, MessageLocation};
use crate::validators::Validator;

/// What one pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Number of elements delivered to the observers.
    pub elements: usize,
    /// The pass stopped early on a fatal error.
    pub aborted: bool,
}

/// A well-formedness failure that ends the pass.
struct Fatal {
    offset: usize,
    message: String,
}

/// Single-pass driver: reads the context's document from its container and
/// feeds every event to the structural handler, then to each validator
/// session in registration order.
pub struct XmlParser<'a> {
    context: &'a ValidationContext,
    handler: &'a mut dyn XmlHandler,
    validators: Vec<&'a Validator>,
}

impl<'a> XmlParser<'a> {
    #[must_use]
    pub fn new(context: &'a ValidationContext, handler: &'a mut dyn XmlHandler) -> Self {
        Self {
            context,
            handler,
            validators: Vec::new(),
        }
    }

    pub fn add_validator(&mut self, validator: &'a Validator) {
        self.validators.push(validator);
    }

    /// Run the pass. Findings go to the context's report; a fatal error is
    /// reported once and stops the pass without `end_document`.
    pub fn process(self) -> ParseOutcome {
        let Self {
            context,
            handler,
            validators,
        } = self;
        let path = context.path();
        let report = context.report();

        let bytes = match context.container().read_entry(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path, error = %e, "unable to read entry");
                report.message(
                    MessageId::Pkg008,
                    MessageLocation::new(path, -1, -1),
                    &[path, e.to_string().as_str()],
                );
                return ParseOutcome {
                    elements: 0,
                    aborted: true,
                };
            }
        };

        let index = LineIndex::new(&bytes);
        let mut observers = Observers {
            context,
            handler,
            sessions: validators.iter().map(|v| v.start_session()).collect(),
        };
        let mut elements = 0;

        match drive(&bytes, &index, &mut observers, &mut elements) {
            Ok(()) => {
                observers.each(|h, ctx| h.end_document(ctx));
                tracing::debug!(path, elements, "parse pass complete");
                ParseOutcome {
                    elements,
                    aborted: false,
                }
            }
            Err(fatal) => {
                let (line, column) = index.locate(fatal.offset);
                tracing::warn!(path, line, column, "parse pass aborted: {}", fatal.message);
                report.message(
                    MessageId::Rsc016,
                    MessageLocation::at(path, line, column),
                    &[fatal.message.as_str()],
                );
                ParseOutcome {
                    elements,
                    aborted: true,
                }
            }
        }
    }
}

/// The handler and validator sessions of one pass.
struct Observers<'a> {
    context: &'a ValidationContext,
    handler: &'a mut dyn XmlHandler,
    sessions: Vec<Box<dyn XmlHandler + 'a>>,
}

impl Observers<'_> {
    fn each(&mut self, mut f: impl FnMut(&mut dyn XmlHandler, &ValidationContext)) {
        f(&mut *self.handler, self.context);
        for session in &mut self.sessions {
            f(session.as_mut(), self.context);
        }
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn is_xml_whitespace(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

const fn outside_root_message(elements: usize) -> &'static str {
    if elements == 0 {
        "Content is not allowed in prolog"
    } else {
        "Content is not allowed in trailing section"
    }
}

/// Only whitespace may appear before or after the document element.
fn outside_root(text: &[u8], offset: usize, elements: usize) -> Result<(), Fatal> {
    let text = if offset == 0 {
        text.strip_prefix(UTF8_BOM).unwrap_or(text)
    } else {
        text
    };
    if is_xml_whitespace(text) {
        Ok(())
    } else {
        Err(Fatal {
            offset,
            message: outside_root_message(elements).to_owned(),
        })
    }
}

fn position(reader: &NsReader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn drive(
    bytes: &[u8],
    index: &LineIndex,
    observers: &mut Observers<'_>,
    elements: &mut usize,
) -> Result<(), Fatal> {
    let mut reader = NsReader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut open: Vec<XmlElement> = Vec::new();

    loop {
        let offset = position(&reader);
        let event = reader.read_event_into(&mut buf).map_err(|e| Fatal {
            offset: position(&reader),
            message: e.to_string(),
        })?;

        let empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(start) | Event::Empty(start) => {
                if open.is_empty() && *elements > 0 {
                    return Err(Fatal {
                        offset,
                        message: "The markup in the document following the root element must be \
                                  well-formed"
                            .to_owned(),
                    });
                }
                let element = resolve(&reader, &start, index.locate(offset))
                    .map_err(|message| Fatal { offset, message })?;
                *elements += 1;
                observers.each(|h, ctx| h.start_element(ctx, &element));
                if empty {
                    observers.each(|h, ctx| h.end_element(ctx, &element));
                } else {
                    open.push(element);
                }
            }
            Event::End(_) => {
                let Some(element) = open.pop() else {
                    return Err(Fatal {
                        offset,
                        message: "End tag without a matching start tag".to_owned(),
                    });
                };
                observers.each(|h, ctx| h.end_element(ctx, &element));
            }
            Event::Text(text) if open.is_empty() => outside_root(&text, offset, *elements)?,
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| Fatal {
                    offset,
                    message: e.to_string(),
                })?;
                if !text.is_empty() {
                    observers.each(|h, ctx| h.characters(ctx, &text));
                }
            }
            Event::CData(_) if open.is_empty() => {
                return Err(Fatal {
                    offset,
                    message: outside_root_message(*elements).to_owned(),
                });
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata);
                observers.each(|h, ctx| h.characters(ctx, &text));
            }
            Event::Eof => break,
            // XML declaration, comments, processing instructions, DOCTYPE
            _ => {}
        }
        buf.clear();
    }

    if let Some(unclosed) = open.last() {
        return Err(Fatal {
            offset: bytes.len(),
            message: format!(
                "Premature end of file: element \"{}\" is not closed",
                unclosed.qualified_name()
            ),
        });
    }
    if *elements == 0 {
        return Err(Fatal {
            offset: bytes.len(),
            message: "Premature end of file: no root element".to_owned(),
        });
    }
    Ok(())
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(format!(
            "The prefix \"{}\" is not bound to a namespace",
            String::from_utf8_lossy(&prefix)
        )),
    }
}

fn resolve(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    (line, column): (usize, usize),
) -> Result<XmlElement, String> {
    let name = start.name();
    let (resolved, local) = reader.resolve_element(name);
    let namespace = namespace_of(resolved)?;
    let prefix = name
        .prefix()
        .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (resolved, attr_local) = reader.resolve_attribute(attr.key);
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.push(XmlAttribute {
            namespace: namespace_of(resolved)?,
            local: String::from_utf8_lossy(attr_local.as_ref()).into_owned(),
            value: value.into_owned(),
        });
    }

    Ok(XmlElement {
        namespace,
        prefix,
        local: String::from_utf8_lossy(local.as_ref()).into_owned(),
        attributes,
        line,
        column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use crate::report::{MemoryReport, Report, ReportCounts};
    use std::sync::Arc;

    /// Records every event as a short string.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl XmlHandler for Recorder {
        fn start_element(&mut self, _: &ValidationContext, element: &XmlElement) {
            self.events.push(format!("<{}", element.local));
        }

        fn end_element(&mut self, _: &ValidationContext, element: &XmlElement) {
            self.events.push(format!("</{}", element.local));
        }

        fn characters(&mut self, _: &ValidationContext, text: &str) {
            if !text.trim().is_empty() {
                self.events.push(format!("#{}", text.trim()));
            }
        }

        fn end_document(&mut self, _: &ValidationContext) {
            self.events.push("$".to_owned());
        }
    }

    fn context(doc: &str) -> (ValidationContext, Arc<MemoryReport>, Arc<MemoryContainer>) {
        let report = Arc::new(MemoryReport::new());
        let container = Arc::new(MemoryContainer::new("book").with_entry("doc.xhtml", doc));
        let ctx = ValidationContext::builder(
            "doc.xhtml",
            "application/xhtml+xml",
            container.clone(),
            report.clone(),
        )
        .build();
        (ctx, report, container)
    }

    #[test]
    fn test_events_in_document_order() {
        let (ctx, report, container) =
            context("<?xml version=\"1.0\"?>\n<!-- c --><a><b x=\"1\"/>t &amp; u<![CDATA[<raw>]]></a>");
        let mut recorder = Recorder::default();
        let outcome = XmlParser::new(&ctx, &mut recorder).process();

        assert_eq!(
            outcome,
            ParseOutcome {
                elements: 2,
                aborted: false
            }
        );
        assert_eq!(
            recorder.events,
            vec!["<a", "<b", "</b", "#t & u", "#<raw>", "</a", "$"]
        );
        assert_eq!(report.counts(), ReportCounts::default());
        assert_eq!(container.read_count(), 1);
    }

    #[test]
    fn test_namespaces_are_resolved() {
        #[derive(Default)]
        struct Capture(Vec<XmlElement>);
        impl XmlHandler for Capture {
            fn start_element(&mut self, _: &ValidationContext, element: &XmlElement) {
                self.0.push(element.clone());
            }
        }

        let (ctx, _report, _) = context(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" \
             xmlns:epub=\"http://www.idpf.org/2007/ops\">\
             <nav epub:type=\"toc\" id=\"n\"/></html>",
        );

        let mut capture = Capture::default();
        XmlParser::new(&ctx, &mut capture).process();
        let nav = &capture.0[1];
        assert!(nav.is_xhtml("nav"));
        assert!(nav.has_epub_type("toc"));
        assert_eq!(nav.attribute(None, "id"), Some("n"));
        // xmlns declarations are not attributes
        assert!(capture.0[0].attributes.is_empty());
    }

    #[test]
    fn test_mismatched_end_tag_is_fatal_and_stops() {
        let (ctx, report, _) = context("<a>\n<b></c>\n<d/></a>");
        let mut recorder = Recorder::default();
        let outcome = XmlParser::new(&ctx, &mut recorder).process();

        assert!(outcome.aborted);
        assert_eq!(report.fatal_error_count(), 1);
        assert_eq!(report.count_of(MessageId::Rsc016), 1);
        assert!(!recorder.events.contains(&"<d".to_owned()));
        assert!(!recorder.events.contains(&"$".to_owned()));
        let messages = report.messages();
        assert_eq!(messages[0].location.line, 2);
    }

    #[test]
    fn test_unclosed_element_is_fatal() {
        let (ctx, report, _) = context("<a><b></b>");
        let mut recorder = Recorder::default();
        let outcome = XmlParser::new(&ctx, &mut recorder).process();
        assert!(outcome.aborted);
        assert_eq!(report.count_of(MessageId::Rsc016), 1);
        assert_eq!(report.fatal_error_count(), 1);
    }

    #[test]
    fn test_empty_document_is_fatal() {
        let (ctx, report, _) = context("");
        let outcome = XmlParser::new(&ctx, &mut Recorder::default()).process();
        assert!(outcome.aborted);
        assert_eq!(report.fatal_error_count(), 1);
    }

    #[test]
    fn test_undeclared_prefix_is_fatal() {
        let (ctx, report, _) = context("<a><x:b/></a>");
        let outcome = XmlParser::new(&ctx, &mut Recorder::default()).process();
        assert!(outcome.aborted);
        assert!(report.messages()[0].text.contains("\"x\""));
    }

    fn assert_fatal(doc: &str, expected: &str) {
        let (ctx, report, _) = context(doc);
        let mut recorder = Recorder::default();
        let outcome = XmlParser::new(&ctx, &mut recorder).process();

        assert!(outcome.aborted, "{doc:?}");
        assert_eq!(report.fatal_error_count(), 1, "{doc:?}");
        assert_eq!(report.count_of(MessageId::Rsc016), 1, "{doc:?}");
        assert!(report.messages()[0].text.contains(expected), "{doc:?}");
        assert!(!recorder.events.contains(&"$".to_owned()));
    }

    #[test]
    fn test_second_root_element_is_fatal() {
        assert_fatal("<a><b/></a>\n<c/>", "following the root element");
        assert_fatal("<a/><a></a>", "following the root element");
    }

    #[test]
    fn test_text_after_root_is_fatal() {
        assert_fatal("<a></a>\nthis is not xml", "trailing section");
        assert_fatal("<a/><![CDATA[x]]>", "trailing section");
    }

    #[test]
    fn test_text_before_root_is_fatal() {
        assert_fatal("leading junk<a/>", "prolog");
        assert_fatal("<?xml version=\"1.0\"?>\nx\n<a/>", "prolog");
    }

    #[test]
    fn test_whitespace_around_root_is_allowed() {
        let (ctx, report, _) =
            context("\u{feff}<?xml version=\"1.0\"?>\n\t<!-- c -->\r\n<a>t</a>\n<!-- end -->\n\n");
        let mut recorder = Recorder::default();
        let outcome = XmlParser::new(&ctx, &mut recorder).process();

        assert!(!outcome.aborted);
        assert_eq!(report.counts(), ReportCounts::default());
        assert_eq!(recorder.events, vec!["<a", "#t", "</a", "$"]);
    }

    #[test]
    fn test_unreadable_entry_reports_pkg_008() {
        let report = Arc::new(MemoryReport::new());
        let ctx = ValidationContext::builder(
            "doc.xhtml",
            "application/xhtml+xml",
            Arc::new(MemoryContainer::new("book").with_unreadable_entry("doc.xhtml")),
            report.clone(),
        )
        .build();
        let outcome = XmlParser::new(&ctx, &mut Recorder::default()).process();
        assert!(outcome.aborted);
        assert_eq!(report.count_of(MessageId::Pkg008), 1);
        assert_eq!(report.fatal_error_count(), 1);
    }
}
