use std::collections::HashMap;

use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Parses page markup into a [`Dom`]. Script and style bodies are kept as raw
/// text and never interpreted. An end tag with no open match is ignored.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut open: Vec<(NodeId, String)> = Vec::new();
    let mut scan = Scanner { rest: html };

    while !scan.at_end() {
        let parent = open.last().map_or(dom.root, |(node, _)| *node);

        if scan.eat("<!--") {
            scan.skip_past("-->")
                .ok_or_else(|| parse_error("unclosed HTML comment"))?;
        } else if scan.eat("</") {
            let tag = scan.name().to_ascii_lowercase();
            scan.skip_past(">")
                .ok_or_else(|| parse_error("unclosed end tag"))?;
            if let Some(depth) = open.iter().rposition(|(_, name)| *name == tag) {
                open.truncate(depth);
            }
        } else if scan.eat("<!") {
            scan.skip_past(">")
                .ok_or_else(|| parse_error("unclosed markup declaration"))?;
        } else if scan.eat("<") {
            let tag = StartTag::read(&mut scan)?;
            let node = dom.create_element(parent, tag.name.clone(), tag.attrs);
            if RAW_TEXT_TAGS.contains(&tag.name.as_str()) {
                let body = scan
                    .raw_text(&tag.name)
                    .ok_or_else(|| parse_error(format!("unclosed <{}>", tag.name)))?;
                if !body.is_empty() {
                    dom.create_text(node, body.to_string());
                }
            } else if !tag.self_closing && !VOID_TAGS.contains(&tag.name.as_str()) {
                open.push((node, tag.name));
            }
        } else {
            let text = scan.take_while(|c| c != '<');
            dom.create_text(parent, decode_entities(text));
        }
    }

    dom.initialize_form_control_values()?;
    Ok(dom)
}

fn parse_error(message: impl Into<String>) -> Error {
    Error::HtmlParse(message.into())
}

struct StartTag {
    name: String,
    attrs: HashMap<String, String>,
    self_closing: bool,
}

impl StartTag {
    /// Reads the rest of a start tag once its `<` is consumed. Bare
    /// attributes get an empty value.
    fn read(scan: &mut Scanner<'_>) -> Result<Self> {
        let name = scan.name().to_ascii_lowercase();
        if name.is_empty() {
            return Err(parse_error("empty tag name"));
        }

        let mut attrs = HashMap::new();
        loop {
            scan.skip_ws();
            let self_closing = scan.eat("/>");
            if self_closing || scan.eat(">") {
                return Ok(Self {
                    name,
                    attrs,
                    self_closing,
                });
            }
            if scan.at_end() {
                return Err(parse_error(format!("unclosed <{name}>")));
            }

            let attr = scan.name().to_ascii_lowercase();
            if attr.is_empty() {
                return Err(parse_error(format!("invalid attribute name in <{name}>")));
            }
            scan.skip_ws();
            let value = if scan.eat("=") {
                scan.skip_ws();
                decode_entities(scan.attr_value()?)
            } else {
                String::new()
            };
            attrs.insert(attr, value);
        }
    }
}

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn at_end(&self) -> bool {
        self.rest.is_empty()
    }

    fn eat(&mut self, prefix: &str) -> bool {
        match self.rest.strip_prefix(prefix) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest.find(|c: char| !keep(c)).unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn name(&mut self) -> &'a str {
        self.skip_ws();
        self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
    }

    fn skip_past(&mut self, needle: &str) -> Option<()> {
        let at = self.rest.find(needle)?;
        self.rest = &self.rest[at + needle.len()..];
        Some(())
    }

    fn attr_value(&mut self) -> Result<&'a str> {
        match self.rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                self.rest = &self.rest[1..];
                let value = self.take_while(|c| c != quote);
                if self.at_end() {
                    return Err(parse_error("unclosed quoted attribute value"));
                }
                self.rest = &self.rest[1..];
                Ok(value)
            }
            Some(_) => Ok(self.take_while(|c| !c.is_ascii_whitespace() && c != '>')),
            None => Err(parse_error("missing attribute value")),
        }
    }

    /// Body of a raw-text element up to its end tag (any case), consuming
    /// the end tag too.
    fn raw_text(&mut self, tag: &str) -> Option<&'a str> {
        let at = self.rest.to_ascii_lowercase().find(&format!("</{tag}"))?;
        let body = &self.rest[..at];
        self.rest = &self.rest[at..];
        self.skip_past(">")?;
        Some(body)
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&middot;", "\u{b7}")
        .replace("&copy;", "\u{a9}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_markup_with_void_elements() -> Result<()> {
        let dom = parse_html(
            r#"<!DOCTYPE html>
            <div class="car-card" data-brand="Toyota" data-price="25000">
              <div class="car-image"><img src="a.jpg" alt="car"></div>
              <h3 class="car-title">2021 Toyota Camry</h3>
            </div>"#,
        )?;
        let card = dom
            .query_selector(".car-card")?
            .ok_or(Error::SelectorNotFound(".car-card".into()))?;
        assert_eq!(dom.attr(card, "data-price").as_deref(), Some("25000"));
        let title = dom
            .query_selector(".car-card .car-title")?
            .ok_or(Error::SelectorNotFound(".car-title".into()))?;
        assert_eq!(dom.text_content(title), "2021 Toyota Camry");
        assert_eq!(dom.query_selector_all(".car-image img")?.len(), 1);
        Ok(())
    }

    #[test]
    fn keeps_script_bodies_as_inert_text() -> Result<()> {
        let dom = parse_html("<script>if (a < b) { x(); }</script><p id='after'>ok</p>")?;
        let after = dom.by_id("after").ok_or(Error::SelectorNotFound("#after".into()))?;
        assert_eq!(dom.text_content(after), "ok");
        Ok(())
    }

    #[test]
    fn decodes_common_entities() -> Result<()> {
        let dom = parse_html("<p id='p' title='a &amp; b'>Fish &amp; Chips</p>")?;
        let p = dom.by_id("p").ok_or(Error::SelectorNotFound("#p".into()))?;
        assert_eq!(dom.text_content(p), "Fish & Chips");
        assert_eq!(dom.attr(p, "title").as_deref(), Some("a & b"));
        Ok(())
    }

    #[test]
    fn stray_end_tag_leaves_open_elements_alone() -> Result<()> {
        let dom = parse_html("<div id='outer'><p id='p'>a</span>b</p></div><i id='after'></i>")?;
        let p = dom.by_id("p").ok_or(Error::SelectorNotFound("#p".into()))?;
        assert_eq!(dom.text_content(p), "ab");
        let after = dom.by_id("after").ok_or(Error::SelectorNotFound("#after".into()))?;
        assert_eq!(dom.parent(after), Some(dom.root));
        Ok(())
    }

    #[test]
    fn bare_and_unquoted_attributes() -> Result<()> {
        let dom = parse_html("<button id=send type=submit disabled>Go</button>")?;
        let send = dom.by_id("send").ok_or(Error::SelectorNotFound("#send".into()))?;
        assert_eq!(dom.attr(send, "type").as_deref(), Some("submit"));
        assert_eq!(dom.attr(send, "disabled").as_deref(), Some(""));
        assert!(dom.disabled(send));
        Ok(())
    }

    #[test]
    fn rejects_unclosed_comment() {
        assert!(matches!(
            parse_html("<div><!-- open"),
            Err(Error::HtmlParse(_))
        ));
    }
}
