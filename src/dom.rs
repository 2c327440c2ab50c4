use super::*;
use std::collections::HashMap;

/// Handle to a node of a [`Page`] tree.
///
/// Handles stay valid after the node is removed; operations on a detached
/// node are tolerated and mostly no-ops.
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
    // Set once the value was edited; until then the value derives from markup.
    pub(crate) dirty_value: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
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
        let element = Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs,
            dirty_value: None,
        };
        self.create_node(Some(parent), NodeType::Element(element))
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0)?.parent
    }

    pub(crate) fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes
            .get(node_id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|element| element.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    pub(crate) fn has_attr(&self, node_id: NodeId, name: &str) -> bool {
        self.element(node_id)
            .is_some_and(|element| element.attrs.contains_key(&name.to_ascii_lowercase()))
    }

    pub(crate) fn is_connected(&self, node_id: NodeId) -> bool {
        let mut cursor = Some(node_id);
        while let Some(node) = cursor {
            if node == self.root {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    /// Detaches `node` and its subtree. Returns false when it was already
    /// detached, which makes removal idempotent.
    pub(crate) fn remove_node(&mut self, node: NodeId) -> bool {
        if node == self.root || !self.is_valid_node(node) {
            return false;
        }
        let Some(parent) = self.parent(node) else {
            return false;
        };
        self.nodes[parent.0].children.retain(|id| *id != node);
        self.nodes[node.0].parent = None;
        true
    }

    /// Element descendants of `scope` in document order, excluding `scope`.
    pub(crate) fn descendant_elements(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.children(scope).iter().rev().copied().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if self.element(node).is_some() {
                out.push(node);
            }
            for child in self.children(node).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.descendant_elements(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id").as_deref() == Some(id))
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        match self.nodes.get(node_id.0).map(|node| &node.node_type) {
            Some(NodeType::Text(text)) => text.clone(),
            Some(NodeType::Document | NodeType::Element(_)) => {
                let mut out = String::new();
                for child in self.children(node_id) {
                    out.push_str(&self.text_content(*child));
                }
                out
            }
            None => String::new(),
        }
    }

    /// Current value of a form control, or `None` for elements without one.
    pub(crate) fn value(&self, node_id: NodeId) -> Option<String> {
        let element = self.element(node_id)?;
        if let Some(value) = &element.dirty_value {
            return Some(value.clone());
        }
        match element.tag_name.as_str() {
            "input" => Some(match element.attrs.get("value") {
                Some(value) => value.clone(),
                None if is_checkable_input(element) => "on".to_string(),
                None => String::new(),
            }),
            "button" | "data" => Some(element.attrs.get("value").cloned().unwrap_or_default()),
            "option" => Some(self.option_value(node_id)),
            "textarea" => Some(self.text_content(node_id)),
            "select" => Some(self.select_value(node_id)),
            _ => None,
        }
    }

    fn select_value(&self, select: NodeId) -> String {
        let options = self
            .descendant_elements(select)
            .into_iter()
            .filter(|node| self.tag_name(*node) == Some("option"))
            .collect::<Vec<_>>();
        // The last `selected` option wins in a single-select.
        let chosen = options
            .iter()
            .rev()
            .copied()
            .find(|option| self.has_attr(*option, "selected"))
            .or_else(|| options.first().copied());
        chosen
            .map(|option| self.option_value(option))
            .unwrap_or_default()
    }

    fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .unwrap_or_else(|| self.text_content(option).trim().to_string())
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Runtime("value target is not an element".into()))?;
        element.dirty_value = Some(value.to_string());
        Ok(())
    }

    pub(crate) fn style_get(&self, node_id: NodeId, name: &str) -> Option<String> {
        let element = self.element(node_id)?;
        let name = name.to_ascii_lowercase();
        parse_style_declarations(element.attrs.get("style").map(String::as_str))
            .into_iter()
            .find(|(prop, _)| prop == &name)
            .map(|(_, value)| value)
    }

    /// Writes an inline style property; an empty value clears the override.
    pub(crate) fn style_set(&mut self, node_id: NodeId, name: &str, value: &str) -> bool {
        let Some(element) = self.element_mut(node_id) else {
            return false;
        };
        let name = name.to_ascii_lowercase();
        let mut decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        if let Some(pos) = decls.iter().position(|(prop, _)| prop == &name) {
            if value.is_empty() {
                decls.remove(pos);
            } else {
                decls[pos].1 = value.to_string();
            }
        } else if !value.is_empty() {
            decls.push((name, value.to_string()));
        }

        if decls.is_empty() {
            // An emptied style attribute stays present, as CSSStyleDeclaration leaves it.
            if element.attrs.contains_key("style") {
                element.attrs.insert("style".to_string(), String::new());
            }
        } else {
            element
                .attrs
                .insert("style".to_string(), serialize_style_declarations(&decls));
        }
        true
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let Some(node) = self.nodes.get(node_id.0) else {
            return String::new();
        };
        match &node.node_type {
            NodeType::Document => {
                let mut out = String::new();
                for child in &node.children {
                    out.push_str(&self.dump_node(*child));
                }
                out
            }
            NodeType::Text(text) => escape_html_text(text),
            NodeType::Element(element) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&element.tag_name);
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort_by(|(left, _), (right, _)| left.cmp(right));
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape_html_attr(v));
                    out.push('"');
                }
                out.push('>');
                if is_void_tag(&element.tag_name) {
                    return out;
                }
                for child in &node.children {
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

fn is_checkable_input(element: &Element) -> bool {
    element
        .attrs
        .get("type")
        .is_some_and(|kind| {
            kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio")
        })
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_html_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_html_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

pub(crate) fn parse_style_declarations(style_attr: Option<&str>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(style_attr) = style_attr else {
        return out;
    };

    let bytes = style_attr.as_bytes();
    let mut start = 0usize;
    let mut paren_depth = 0isize;
    let mut quote: Option<u8> = None;
    let mut i = 0usize;

    while i < bytes.len() {
        let ch = bytes[i];
        match quote {
            Some(_) if ch == b'\\' => {
                i += 2;
                continue;
            }
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                b'\'' | b'"' => quote = Some(ch),
                b'(' => paren_depth += 1,
                b')' => paren_depth = (paren_depth - 1).max(0),
                b';' if paren_depth == 0 => {
                    push_style_declaration(&style_attr[start..i], &mut out);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }

    if start < style_attr.len() {
        push_style_declaration(&style_attr[start..], &mut out);
    }
    out
}

fn push_style_declaration(raw_decl: &str, out: &mut Vec<(String, String)>) {
    let decl = raw_decl.trim();
    let Some((name, value)) = decl.split_once(':') else {
        return;
    };
    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return;
    }
    let value = value.trim().to_string();

    if let Some(pos) = out.iter().position(|(existing, _)| existing == &name) {
        out[pos].1 = value;
    } else {
        out.push((name, value));
    }
}

pub(crate) fn serialize_style_declarations(decls: &[(String, String)]) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with_style(dom: &mut Dom, style: &str) -> NodeId {
        let mut attrs = HashMap::new();
        attrs.insert("style".to_string(), style.to_string());
        dom.create_element(dom.root, "div".into(), attrs)
    }

    #[test]
    fn style_set_replaces_and_clears_properties() {
        let mut dom = Dom::new();
        let node = element_with_style(&mut dom, "color: red; border-color: blue");

        assert!(dom.style_set(node, "border-color", "#f44336"));
        assert_eq!(dom.style_get(node, "border-color").as_deref(), Some("#f44336"));
        assert_eq!(
            dom.attr(node, "style").as_deref(),
            Some("color: red; border-color: #f44336;")
        );

        dom.style_set(node, "border-color", "");
        assert_eq!(dom.style_get(node, "border-color"), None);
        assert_eq!(dom.attr(node, "style").as_deref(), Some("color: red;"));
    }

    #[test]
    fn style_parsing_keeps_semicolons_inside_parentheses() {
        let decls = parse_style_declarations(Some("background: url('a;b.png'); opacity: 1"));
        assert_eq!(
            decls,
            vec![
                ("background".to_string(), "url('a;b.png')".to_string()),
                ("opacity".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn remove_node_is_idempotent() {
        let mut dom = Dom::new();
        let node = dom.create_element(dom.root, "div".into(), HashMap::new());
        assert!(dom.is_connected(node));
        assert!(dom.remove_node(node));
        assert!(!dom.is_connected(node));
        assert!(!dom.remove_node(node));
        assert!(!dom.remove_node(dom.root));
    }

    #[test]
    fn by_id_ignores_detached_subtrees() {
        let mut dom = Dom::new();
        let mut attrs = HashMap::new();
        attrs.insert("id".to_string(), "box".to_string());
        let node = dom.create_element(dom.root, "div".into(), attrs);
        assert_eq!(dom.by_id("box"), Some(node));
        dom.remove_node(node);
        assert_eq!(dom.by_id("box"), None);
    }

    #[test]
    fn checkable_inputs_default_to_on() -> Result<()> {
        let dom = parse_html(
            "<input id='tos' type='checkbox'><input id='pick' type='RADIO'>\
             <input id='named' type='checkbox' value='yes'><input id='plain'>",
        )?;
        let value = |id: &str| dom.by_id(id).and_then(|node| dom.value(node));
        assert_eq!(value("tos").as_deref(), Some("on"));
        assert_eq!(value("pick").as_deref(), Some("on"));
        assert_eq!(value("named").as_deref(), Some("yes"));
        assert_eq!(value("plain").as_deref(), Some(""));
        Ok(())
    }

    #[test]
    fn select_uses_last_selected_option() -> Result<()> {
        let dom = parse_html(
            "<select id='s'><option selected>a</option><option value='b' selected>B</option>\
             <option>c</option></select>",
        )?;
        let select = dom.by_id("s").map(|node| dom.value(node));
        assert_eq!(select, Some(Some("b".to_string())));
        Ok(())
    }
}
