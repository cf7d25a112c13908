use std::collections::BTreeMap;

use crate::model::Element;

/// Key used for the direct text of the element being flattened when no parent
/// path exists yet.
pub const TEXT_KEY: &str = "text";

/// One flattened element: path → scalar value.
pub type Record = BTreeMap<String, String>;

/// Flattens `element` and its subtree into a single [`Record`].
///
/// Paths are built as follows:
/// * attributes become `parent@name` (`@name` at the top level),
/// * non-blank direct text is stored under the parent path itself (`text` at the
///   top level),
/// * a uniquely named child descends into `parent.tag`,
/// * the `i`-th of several same-named children descends into `parent.tag[i]`.
///
/// Writes happen in that order and an identical key is silently overwritten by
/// the later write.
pub fn flatten(element: &Element, parent_path: &str) -> Record {
    let mut record = Record::new();
    flatten_into(element, parent_path, &mut record);
    record
}

fn flatten_into(element: &Element, path: &str, record: &mut Record) {
    for (name, value) in element.attributes() {
        record.insert(attribute_key(path, name), value.to_string());
    }

    if let Some(text) = element.text().map(str::trim).filter(|text| !text.is_empty()) {
        let key = if path.is_empty() { TEXT_KEY } else { path };
        record.insert(key.to_string(), text.to_string());
    }

    for (tag, members) in group_children(element) {
        let child_path = child_path(path, tag);
        if let [only] = members.as_slice() {
            flatten_into(only, &child_path, record);
        } else {
            for (index, member) in members.iter().enumerate() {
                flatten_into(member, &format!("{child_path}[{index}]"), record);
            }
        }
    }
}

/// Groups direct children by tag, keeping the order in which each tag was
/// first seen and document order within a group.
fn group_children(element: &Element) -> Vec<(&str, Vec<&Element>)> {
    let mut groups: Vec<(&str, Vec<&Element>)> = Vec::new();
    for child in element.children() {
        match groups.iter_mut().find(|(tag, _)| *tag == child.tag()) {
            Some((_, members)) => members.push(child),
            None => groups.push((child.tag(), vec![child])),
        }
    }
    groups
}

fn attribute_key(path: &str, name: &str) -> String {
    format!("{path}@{name}")
}

fn child_path(path: &str, tag: &str) -> String {
    if path.is_empty() {
        tag.to_string()
    } else {
        format!("{path}.{tag}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entries: &[(&str, &str)]) -> Record {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn top_level_attributes_and_text() {
        let item = Element::new("item").with_attribute("id", "1").with_text("  A \n");
        assert_eq!(flatten(&item, ""), record(&[("@id", "1"), ("text", "A")]));
    }

    #[test]
    fn nested_paths_use_dots_and_indexes() {
        let order = Element::new("order")
            .with_attribute("no", "7")
            .with_child(
                Element::new("customer")
                    .with_attribute("vip", "yes")
                    .with_child(Element::new("name").with_text("Ann")),
            )
            .with_child(Element::new("line").with_child(Element::new("sku").with_text("X1")))
            .with_child(Element::new("line").with_child(Element::new("sku").with_text("X2")));

        assert_eq!(
            flatten(&order, ""),
            record(&[
                ("@no", "7"),
                ("customer@vip", "yes"),
                ("customer.name", "Ann"),
                ("line[0].sku", "X1"),
                ("line[1].sku", "X2"),
            ])
        );
    }

    #[test]
    fn parent_path_prefixes_every_key() {
        let element = Element::new("v")
            .with_attribute("unit", "kg")
            .with_text("3");
        assert_eq!(
            flatten(&element, "g[0].v"),
            record(&[("g[0].v@unit", "kg"), ("g[0].v", "3")])
        );
    }

    #[test]
    fn blank_text_is_ignored() {
        let element = Element::new("root")
            .with_text("\n    ")
            .with_child(Element::new("a"));
        assert!(flatten(&element, "").is_empty());
    }

    #[test]
    fn nested_text_collides_with_scalar_child_and_last_write_wins() {
        // A sibling whose tag contains a dot produces the same path as `a > b`.
        let element = Element::new("root")
            .with_child(
                Element::new("a")
                    .with_text("outer")
                    .with_child(Element::new("b").with_text("inner")),
            )
            .with_child(Element::new("a.b").with_text("later"));

        let flattened = flatten(&element, "");
        assert_eq!(flattened.get("a"), Some(&"outer".to_string()));
        assert_eq!(flattened.get("a.b"), Some(&"later".to_string()));
    }

    #[test]
    fn flattening_is_repeatable() {
        let element = Element::new("g")
            .with_child(Element::new("v").with_text("1"))
            .with_child(Element::new("v").with_text("2"));
        assert_eq!(flatten(&element, "x"), flatten(&element, "x"));
    }
}
