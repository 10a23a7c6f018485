use std::collections::{HashMap, HashSet};

use crate::selector::{SelectorPart, matches_selector_chain, parse_selector_groups};
use crate::{Error, Result};

/// Handle to a node in a [`Dom`] arena. Stable for the lifetime of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) default_value: String,
    pub(crate) disabled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let disabled = attrs.contains_key("disabled");
        let element = Element {
            tag_name,
            attrs,
            default_value: value.clone(),
            value,
            disabled,
        };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(id_attr) = self
            .element(id)
            .and_then(|element| element.attrs.get("id").cloned())
        {
            self.id_index.entry(id_attr).or_insert(id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut_or_err(&mut self, node_id: NodeId, what: &str) -> Result<&mut Element> {
        self.element_mut(node_id)
            .ok_or_else(|| Error::Runtime(format!("{what} target is not an element")))
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn is_tag(&self, node_id: NodeId, tag: &str) -> bool {
        self.tag_name(node_id)
            .map(|t| t.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0)?.parent
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|element| element.attrs.get(name).cloned())
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self.element_mut_or_err(node_id, "setAttribute")?;
        let previous = element.attrs.insert(name.to_string(), value.to_string());
        if name == "id" {
            if let Some(previous) = previous {
                if self.id_index.get(&previous) == Some(&node_id) {
                    self.id_index.remove(&previous);
                }
            }
            self.id_index.entry(value.to_string()).or_insert(node_id);
        }
        Ok(())
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document | NodeType::Element(_) => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
        }
    }

    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Runtime("textContent target is not an element".into()));
        }
        let mut detached = Vec::new();
        self.collect_elements_descendants_dfs(node_id, &mut detached);
        for element in detached {
            let Some(id) = self.attr(element, "id") else {
                continue;
            };
            if self.id_index.get(&id) == Some(&element) {
                self.id_index.remove(&id);
            }
        }
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        Ok(())
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::Runtime("value target is not an element".into()))?;
        Ok(element.value.clone())
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.is_tag(node_id, "select") {
            return self.set_select_value(node_id, value);
        }
        let element = self.element_mut_or_err(node_id, "value")?;
        element.value = value.to_string();
        Ok(())
    }

    fn set_select_value(&mut self, select: NodeId, value: &str) -> Result<()> {
        // A value with no matching option leaves the select with no selection.
        let matched = self
            .select_options(select)
            .into_iter()
            .any(|option| self.option_value(option) == value);
        let element = self.element_mut_or_err(select, "select")?;
        element.value = if matched {
            value.to_string()
        } else {
            String::new()
        };
        Ok(())
    }

    fn select_options(&self, select: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.collect_elements_descendants_dfs(select, &mut nodes);
        nodes.retain(|node| self.is_tag(*node, "option"));
        nodes
    }

    fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .unwrap_or_else(|| self.text_content(option).trim().to_string())
    }

    pub(crate) fn disabled(&self, node_id: NodeId) -> bool {
        self.element(node_id).map(|e| e.disabled).unwrap_or(false)
    }

    pub(crate) fn set_disabled(&mut self, node_id: NodeId, disabled: bool) -> Result<()> {
        let element = self.element_mut_or_err(node_id, "disabled")?;
        element.disabled = disabled;
        if disabled {
            element.attrs.insert("disabled".into(), String::new());
        } else {
            element.attrs.remove("disabled");
        }
        Ok(())
    }

    pub(crate) fn initialize_form_control_values(&mut self) -> Result<()> {
        for node in self.all_element_nodes() {
            if self.is_tag(node, "textarea") {
                let text = self.text_content(node);
                let element = self.element_mut_or_err(node, "textarea")?;
                element.value = text.clone();
                element.default_value = text;
                continue;
            }

            if self.is_tag(node, "select") {
                let options = self.select_options(node);
                let chosen = options
                    .iter()
                    .copied()
                    .find(|option| self.attr(*option, "selected").is_some())
                    .or_else(|| options.first().copied());
                let value = chosen
                    .map(|option| self.option_value(option))
                    .unwrap_or_default();
                let element = self.element_mut_or_err(node, "select")?;
                element.value = value.clone();
                element.default_value = value;
            }
        }
        Ok(())
    }

    /// Restores every input, select and textarea under `form` to its markup default.
    pub(crate) fn reset_form_controls(&mut self, form: NodeId) -> Result<usize> {
        let mut controls = Vec::new();
        self.collect_elements_descendants_dfs(form, &mut controls);
        let mut reset = 0usize;
        for control in controls {
            let resettable = ["input", "select", "textarea"]
                .iter()
                .any(|tag| self.is_tag(control, tag));
            if !resettable {
                continue;
            }
            let element = self.element_mut_or_err(control, "reset")?;
            element.value = element.default_value.clone();
            reset += 1;
        }
        Ok(reset)
    }

    pub(crate) fn class_contains(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id)
            .map(|element| has_class(element, class_name))
            .unwrap_or(false)
    }

    pub(crate) fn class_add(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self.element_mut_or_err(node_id, "classList")?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        if !classes.iter().any(|name| name == class_name) {
            classes.push(class_name.to_string());
        }
        set_class_attr(element, &classes);
        Ok(())
    }

    pub(crate) fn class_remove(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self.element_mut_or_err(node_id, "classList")?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        classes.retain(|name| name != class_name);
        set_class_attr(element, &classes);
        Ok(())
    }

    pub(crate) fn class_toggle(&mut self, node_id: NodeId, class_name: &str) -> Result<bool> {
        if self.class_contains(node_id, class_name) {
            self.class_remove(node_id, class_name)?;
            Ok(false)
        } else {
            self.class_add(node_id, class_name)?;
            Ok(true)
        }
    }

    pub(crate) fn style_property(&self, node_id: NodeId, name: &str) -> Option<String> {
        let decls = parse_style_declarations(self.attr(node_id, "style").as_deref());
        let name = name.to_ascii_lowercase();
        decls
            .into_iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn set_style_property(
        &mut self,
        node_id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let element = self.element_mut_or_err(node_id, "style")?;
        let mut decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        let name = name.to_ascii_lowercase();
        if let Some(pos) = decls.iter().position(|(existing, _)| *existing == name) {
            if value.is_empty() {
                decls.remove(pos);
            } else {
                decls[pos].1 = value.to_string();
            }
        } else if !value.is_empty() {
            decls.push((name, value.to_string()));
        }

        if decls.is_empty() {
            element.attrs.remove("style");
        } else {
            element
                .attrs
                .insert("style".into(), serialize_style_declarations(&decls));
        }
        Ok(())
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if groups.len() == 1 && groups[0].len() == 1 {
            if let Some(id) = groups[0][0].step.id_only() {
                return Ok(self.by_id(id).into_iter().collect());
            }
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);
        Ok(self.filter_matches(ids, &groups))
    }

    pub(crate) fn query_selector_all_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        let mut ids = Vec::new();
        self.collect_elements_descendants_dfs(root, &mut ids);
        Ok(self.filter_matches(ids, &groups))
    }

    fn filter_matches(&self, candidates: Vec<NodeId>, groups: &[Vec<SelectorPart>]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for candidate in candidates {
            if groups
                .iter()
                .any(|steps| matches_selector_chain(self, candidate, steps))
                && seen.insert(candidate)
            {
                matched.push(candidate);
            }
        }
        matched
    }

    pub(crate) fn closest(&self, node_id: NodeId, selector: &str) -> Result<Option<NodeId>> {
        if self.element(node_id).is_none() {
            return Ok(None);
        }

        let groups = parse_selector_groups(selector)?;
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if groups
                .iter()
                .any(|steps| matches_selector_chain(self, current, steps))
            {
                return Ok(Some(current));
            }
            cursor = self.parent(current);
        }
        Ok(None)
    }

    pub(crate) fn find_ancestor_by_tag(&self, node_id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if self.is_tag(current, tag) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub(crate) fn all_element_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements_dfs(self.root, &mut out);
        out
    }

    fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        if self.element(node_id).is_some() {
            out.push(node_id);
        }
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    fn collect_elements_descendants_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        match &self.nodes[node_id.0].node_type {
            NodeType::Document => {
                let mut out = String::new();
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out
            }
            NodeType::Text(text) => text.clone(),
            NodeType::Element(element) => {
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort();
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(v);
                    out.push('"');
                }
                out.push('>');
                for child in &self.nodes[node_id.0].children {
                    out.push_str(&self.dump_node(*child));
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
                out
            }
        }
    }
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|value| {
            value
                .split_whitespace()
                .filter(|token| !token.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

fn set_class_attr(element: &mut Element, classes: &[String]) {
    if classes.is_empty() {
        element.attrs.remove("class");
    } else {
        element.attrs.insert("class".to_string(), classes.join(" "));
    }
}

fn parse_style_declarations(style_attr: Option<&str>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(style_attr) = style_attr else {
        return out;
    };

    for decl in style_attr.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        let value = value.trim().to_string();
        if let Some(pos) = out.iter().position(|(existing, _)| existing == &name) {
            out[pos].1 = value;
        } else {
            out.push((name, value));
        }
    }

    out
}

fn serialize_style_declarations(decls: &[(String, String)]) -> String {
    let mut out = String::new();
    for (idx, (name, value)) in decls.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push(';');
    }
    out
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut it = value.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        let Some(ch) = it.next() else {
            return out;
        };
        out.push(ch);
    }
    if it.next().is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    #[test]
    fn style_properties_round_trip_through_the_style_attribute() -> Result<()> {
        let mut dom = parse_html("<div id='card' style='color: red'></div>")?;
        let card = dom.by_id("card").ok_or(Error::SelectorNotFound("#card".into()))?;

        dom.set_style_property(card, "opacity", "0")?;
        dom.set_style_property(card, "transform", "translateY(50px)")?;
        assert_eq!(dom.style_property(card, "opacity").as_deref(), Some("0"));
        assert_eq!(dom.style_property(card, "color").as_deref(), Some("red"));
        assert_eq!(
            dom.attr(card, "style").as_deref(),
            Some("color: red; opacity: 0; transform: translateY(50px);")
        );

        dom.set_style_property(card, "opacity", "1")?;
        assert_eq!(dom.style_property(card, "opacity").as_deref(), Some("1"));
        Ok(())
    }

    #[test]
    fn class_toggle_reports_the_new_state() -> Result<()> {
        let mut dom = parse_html("<ul id='menu' class='nav-menu'></ul>")?;
        let menu = dom.by_id("menu").ok_or(Error::SelectorNotFound("#menu".into()))?;

        assert!(dom.class_toggle(menu, "active")?);
        assert_eq!(dom.attr(menu, "class").as_deref(), Some("nav-menu active"));
        assert!(!dom.class_toggle(menu, "active")?);
        assert_eq!(dom.attr(menu, "class").as_deref(), Some("nav-menu"));
        Ok(())
    }

    #[test]
    fn select_value_falls_back_to_empty_when_no_option_matches() -> Result<()> {
        let mut dom = parse_html(
            "<select id='inquiry'><option value=''>Pick</option><option value='import'>Import</option></select>",
        )?;
        let select = dom
            .by_id("inquiry")
            .ok_or(Error::SelectorNotFound("#inquiry".into()))?;

        dom.set_value(select, "import")?;
        assert_eq!(dom.value(select)?, "import");
        dom.set_value(select, "lease")?;
        assert_eq!(dom.value(select)?, "");
        Ok(())
    }

    #[test]
    fn reset_restores_markup_defaults() -> Result<()> {
        let mut dom = parse_html(
            "<form id='f'><input id='a' value='x'><textarea id='t'>hi</textarea>\
             <select id='s'><option value='1'>1</option><option value='2' selected>2</option></select></form>",
        )?;
        let form = dom.by_id("f").ok_or(Error::SelectorNotFound("#f".into()))?;
        let input = dom.by_id("a").ok_or(Error::SelectorNotFound("#a".into()))?;
        let textarea = dom.by_id("t").ok_or(Error::SelectorNotFound("#t".into()))?;
        let select = dom.by_id("s").ok_or(Error::SelectorNotFound("#s".into()))?;

        assert_eq!(dom.value(select)?, "2");
        dom.set_value(input, "changed")?;
        dom.set_value(textarea, "changed")?;
        dom.set_value(select, "1")?;

        assert_eq!(dom.reset_form_controls(form)?, 3);
        assert_eq!(dom.value(input)?, "x");
        assert_eq!(dom.value(textarea)?, "hi");
        assert_eq!(dom.value(select)?, "2");
        Ok(())
    }

    #[test]
    fn truncate_chars_appends_ellipsis_only_when_cut() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}
