use crate::dom::{Dom, NodeId, has_class};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to previous (left) selector part.
    combinator: Option<SelectorCombinator>,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_selector_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut steps = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokens {
        if token == ">" {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_combinator = Some(SelectorCombinator::Child);
            continue;
        }
        if token == "+" || token == "~" {
            return Err(Error::UnsupportedSelector(selector.into()));
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    Ok(steps)
}

fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '>' | '+' | '~' if bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(ch.to_string());
            }
            ch if ch.is_ascii_whitespace() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }

    Ok(tokens)
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    if part.is_empty() {
        return Err(Error::UnsupportedSelector(part.into()));
    }

    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                i += 1;
                let Some((id, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                if step.id.replace(id).is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                i = next;
            }
            b'.' => {
                i += 1;
                let Some((class_name, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            _ => {
                if step.tag.is_some()
                    || step.id.is_some()
                    || !step.classes.is_empty()
                    || step.universal
                {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                let Some((tag, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.tag = Some(tag);
                i = next;
            }
        }
    }

    Ok(step)
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    if start >= bytes.len() || !is_selector_ident_char(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn parse_selector_attr_condition(
    src: &str,
    open_bracket: usize,
) -> Result<(SelectorAttrCondition, usize)> {
    let bytes = src.as_bytes();
    let mut i = open_bracket + 1;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        if b == b'\'' || b == b'"' {
            quote = Some(b);
            i += 1;
            continue;
        }

        if b == b']' {
            let Some(body) = src.get(open_bracket + 1..i) else {
                return Err(Error::UnsupportedSelector(src.into()));
            };
            let body = body.trim();
            if body.is_empty() {
                return Err(Error::UnsupportedSelector(src.into()));
            }
            let cond = if let Some((key, value)) = body.split_once('=') {
                let value = unquote(value.trim());
                if let Some(key) = key.trim().strip_suffix('^') {
                    let key = key.trim().to_ascii_lowercase();
                    if key.is_empty() {
                        return Err(Error::UnsupportedSelector(src.into()));
                    }
                    SelectorAttrCondition::StartsWith { key, value }
                } else {
                    let key = key.trim().to_ascii_lowercase();
                    if key.is_empty() || !key.bytes().all(is_selector_ident_char) {
                        return Err(Error::UnsupportedSelector(src.into()));
                    }
                    SelectorAttrCondition::Eq { key, value }
                }
            } else {
                SelectorAttrCondition::Exists {
                    key: body.to_ascii_lowercase(),
                }
            };
            return Ok((cond, i + 1));
        }

        i += 1;
    }

    Err(Error::UnsupportedSelector(src.into()))
}

fn unquote(value: &str) -> String {
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

pub(crate) fn matches_selector_chain(dom: &Dom, node_id: NodeId, parts: &[SelectorPart]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if !matches_selector_step(dom, node_id, &last.step) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    match last.combinator {
        Some(SelectorCombinator::Child) => dom
            .parent(node_id)
            .is_some_and(|parent| matches_selector_chain(dom, parent, rest)),
        Some(SelectorCombinator::Descendant) | None => {
            let mut cursor = dom.parent(node_id);
            while let Some(ancestor) = cursor {
                if matches_selector_chain(dom, ancestor, rest) {
                    return true;
                }
                cursor = dom.parent(ancestor);
            }
            false
        }
    }
}

fn matches_selector_step(dom: &Dom, node_id: NodeId, step: &SelectorStep) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if let Some(tag) = &step.tag {
        if !element.tag_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }

    if let Some(id) = &step.id {
        if element.attrs.get("id") != Some(id) {
            return false;
        }
    }

    if !step
        .classes
        .iter()
        .all(|class_name| has_class(element, class_name))
    {
        return false;
    }

    step.attrs.iter().all(|cond| match cond {
        SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
        SelectorAttrCondition::Eq { key, value } => element.attrs.get(key) == Some(value),
        SelectorAttrCondition::StartsWith { key, value } => element
            .attrs
            .get(key)
            .is_some_and(|actual| !value.is_empty() && actual.starts_with(value.as_str())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    const PAGE: &str = r##"
        <header class="header">
          <nav>
            <ul id="navMenu" class="nav-menu">
              <li><a href="#home" class="nav-link">Home</a></li>
              <li><a href="#about" class="nav-link">About</a></li>
              <li><a href="/terms">Terms</a></li>
            </ul>
          </nav>
        </header>
        <section id="about">
          <div class="stat"><h3>0</h3><p>Cars</p></div>
          <div class="stat"><h3>0</h3><p>Clients</p></div>
        </section>
        <form id="contactForm"><button type="submit">Send</button></form>
    "##;

    #[test]
    fn supports_hash_prefixed_anchor_selector() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let anchors = dom.query_selector_all(r##"a[href^="#"]"##)?;
        assert_eq!(anchors.len(), 2);
        Ok(())
    }

    #[test]
    fn descendant_and_child_combinators_match() -> Result<()> {
        let dom = parse_html(PAGE)?;
        assert_eq!(dom.query_selector_all(".stat h3")?.len(), 2);
        assert_eq!(dom.query_selector_all("#about > .stat > h3")?.len(), 2);
        assert_eq!(dom.query_selector_all("#about > h3")?.len(), 0);
        Ok(())
    }

    #[test]
    fn groups_preserve_document_order_without_duplicates() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let nodes = dom.query_selector_all("h3, .stat, .stat h3")?;
        let tags = nodes
            .iter()
            .map(|node| dom.tag_name(*node).unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(tags, vec!["div", "h3", "div", "h3"]);
        Ok(())
    }

    #[test]
    fn attribute_equality_matches_quoted_values() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let form = dom
            .by_id("contactForm")
            .ok_or(Error::SelectorNotFound("#contactForm".into()))?;
        let button = dom.query_selector_all_from(form, r#"button[type="submit"]"#)?;
        assert_eq!(button.len(), 1);
        Ok(())
    }

    #[test]
    fn sibling_combinators_are_rejected() {
        assert!(matches!(
            parse_selector_groups("h3 + p"),
            Err(Error::UnsupportedSelector(_))
        ));
        assert!(matches!(
            parse_selector_groups("a[href"),
            Err(Error::UnsupportedSelector(_))
        ));
    }
}
