use std::collections::BTreeSet;
use std::mem;

use tracing::debug;

use crate::error::{Result, ToolError};
use crate::flatten::{Record, flatten};
use crate::model::Element;
use crate::progress::{DEFAULT_PROGRESS_INTERVAL, ProgressEvent, ProgressObserver};

/// How the record elements of a document were chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSelection {
    /// The requested record tag equals the root tag: the root is the only record.
    ExplicitRoot,
    /// Every descendant carrying the requested tag, falling back to direct
    /// children of the root when no descendant matches.
    ExplicitTag(String),
    /// No tag was requested: the tag of the root's first child is used and only
    /// direct children with that tag become records. Siblings with other tags
    /// are ignored.
    InferredFirstTag(String),
    /// No tag was requested and the root has no children.
    InferredRoot,
}

impl RecordSelection {
    /// Decides the selection policy for `root`.
    pub fn resolve(root: &Element, record_tag: Option<&str>) -> Self {
        match record_tag {
            Some(tag) if tag == root.tag() => Self::ExplicitRoot,
            Some(tag) => Self::ExplicitTag(tag.to_string()),
            None => match root.children().first() {
                Some(first) => Self::InferredFirstTag(first.tag().to_string()),
                None => Self::InferredRoot,
            },
        }
    }

    /// Tag of the elements that become records.
    pub fn record_tag<'a>(&'a self, root: &'a Element) -> &'a str {
        match self {
            Self::ExplicitRoot | Self::InferredRoot => root.tag(),
            Self::ExplicitTag(tag) | Self::InferredFirstTag(tag) => tag,
        }
    }

    /// Collects the record elements of `root` in document order.
    pub fn select<'a>(&self, root: &'a Element) -> Vec<&'a Element> {
        match self {
            Self::ExplicitRoot | Self::InferredRoot => vec![root],
            Self::ExplicitTag(tag) => {
                let found: Vec<&Element> = root
                    .descendants()
                    .filter(|element| element.tag() == tag)
                    .collect();
                if found.is_empty() {
                    direct_children(root, tag)
                } else {
                    found
                }
            }
            Self::InferredFirstTag(tag) => direct_children(root, tag),
        }
    }
}

fn direct_children<'a>(root: &'a Element, tag: &str) -> Vec<&'a Element> {
    root.children()
        .iter()
        .filter(|child| child.tag() == tag)
        .collect()
}

/// Rows in document order plus the sorted union of their keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Record>,
    columns: Vec<String>,
}

impl Table {
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Column headers in ascending lexicographic order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fails with [`ToolError::NoData`] when there is nothing to export.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            Err(ToolError::NoData)
        } else {
            Ok(())
        }
    }

    /// Iterates over the rows as cells aligned to [`Table::columns`]. Missing
    /// keys become empty strings.
    pub fn cells(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or_default())
                .collect()
        })
    }
}

/// Accumulates flattened records into a [`Table`].
///
/// The builder is owned by the caller; [`TableBuilder::build`] starts from a
/// clean state on every call.
pub struct TableBuilder<'o> {
    observer: &'o dyn ProgressObserver,
    progress_interval: usize,
    rows: Vec<Record>,
    columns: BTreeSet<String>,
}

impl<'o> TableBuilder<'o> {
    pub fn new(observer: &'o dyn ProgressObserver) -> Self {
        Self {
            observer,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            rows: Vec::new(),
            columns: BTreeSet::new(),
        }
    }

    /// Sets how many records are processed between two progress events.
    /// Zero is treated as one.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Discards every accumulated row and column.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.columns.clear();
    }

    /// Appends a record, skipping empty ones. Returns whether it was kept.
    pub fn add_record(&mut self, record: Record) -> bool {
        if record.is_empty() {
            return false;
        }
        self.columns.extend(record.keys().cloned());
        self.rows.push(record);
        true
    }

    /// Selects the records of `root`, flattens each one and returns the table.
    pub fn build(&mut self, root: &Element, record_tag: Option<&str>) -> Table {
        self.reset();

        let selection = RecordSelection::resolve(root, record_tag);
        let elements = selection.select(root);
        debug!(
            ?selection,
            record_tag = selection.record_tag(root),
            "resolved record selection"
        );

        let total = elements.len();
        self.observer
            .notify(&ProgressEvent::RecordsFound { count: total });

        for (index, element) in elements.into_iter().enumerate() {
            if index % self.progress_interval == 0 {
                self.observer.notify(&ProgressEvent::RecordProcessed {
                    index: index + 1,
                    total,
                });
            }
            if !self.add_record(flatten(element, "")) {
                debug!(index, "skipping empty record");
            }
        }

        self.finish()
    }

    /// Takes the accumulated rows and columns, leaving the builder empty.
    pub fn finish(&mut self) -> Table {
        let table = Table {
            rows: mem::take(&mut self.rows),
            columns: mem::take(&mut self.columns).into_iter().collect(),
        };
        self.observer.notify(&ProgressEvent::ProcessingFinished {
            records: table.rows.len(),
            fields: table.columns.len(),
        });
        table
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::progress::NoopObserver;

    fn leaf(tag: &str, text: &str) -> Element {
        Element::new(tag).with_text(text)
    }

    #[test]
    fn inferred_selection_keeps_first_tag_only() {
        let root = Element::new("root")
            .with_child(leaf("item", "a"))
            .with_child(leaf("note", "ignored"))
            .with_child(leaf("item", "b"));

        let selection = RecordSelection::resolve(&root, None);
        assert_eq!(selection, RecordSelection::InferredFirstTag("item".into()));

        let texts: Vec<_> = selection
            .select(&root)
            .into_iter()
            .filter_map(Element::text)
            .collect();
        assert_eq!(texts, ["a", "b"]);
    }

    #[test]
    fn explicit_tag_searches_descendants() {
        let root = Element::new("root")
            .with_child(Element::new("batch").with_child(leaf("row", "1")))
            .with_child(leaf("row", "2"));

        let selection = RecordSelection::resolve(&root, Some("row"));
        assert_eq!(selection, RecordSelection::ExplicitTag("row".into()));
        assert_eq!(selection.select(&root).len(), 2);
    }

    #[test]
    fn explicit_tag_without_matches_selects_nothing() {
        let root = Element::new("root").with_child(leaf("row", "1"));
        let selection = RecordSelection::resolve(&root, Some("missing"));
        assert!(selection.select(&root).is_empty());
    }

    #[test]
    fn root_is_the_record_when_requested_or_childless() {
        let root = Element::new("root").with_child(leaf("row", "1"));
        assert_eq!(
            RecordSelection::resolve(&root, Some("root")),
            RecordSelection::ExplicitRoot
        );

        let empty = Element::new("empty");
        let selection = RecordSelection::resolve(&empty, None);
        assert_eq!(selection, RecordSelection::InferredRoot);
        assert_eq!(selection.select(&empty), vec![&empty]);
    }

    #[test]
    fn build_unions_sorted_columns_and_preserves_row_order() {
        let root = Element::new("root")
            .with_child(Element::new("p").with_attribute("z", "1"))
            .with_child(Element::new("p"))
            .with_child(Element::new("p").with_attribute("a", "2").with_text("t"));

        let table = TableBuilder::new(&NoopObserver).build(&root, None);

        assert_eq!(table.columns(), ["@a", "@z", "text"]);
        assert_eq!(table.rows().len(), 2);
        let cells: Vec<Vec<&str>> = table.cells().collect();
        assert_eq!(cells, vec![vec!["", "1", ""], vec!["2", "", "t"]]);
    }

    #[test]
    fn empty_root_yields_no_rows() {
        let table = TableBuilder::new(&NoopObserver).build(&Element::new("empty"), None);
        assert!(table.is_empty());
        assert!(matches!(table.ensure_not_empty(), Err(ToolError::NoData)));
    }

    #[test]
    fn builder_starts_clean_on_every_build() {
        let first = Element::new("root").with_child(Element::new("a").with_attribute("x", "1"));
        let second = Element::new("root").with_child(Element::new("b").with_attribute("y", "2"));

        let mut builder = TableBuilder::new(&NoopObserver);
        builder.build(&first, None);
        let table = builder.build(&second, None);

        assert_eq!(table.columns(), ["@y"]);
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn progress_is_reported_every_interval() {
        let mut root = Element::new("root");
        for index in 0..5 {
            root.push_child(Element::new("r").with_attribute("i", index.to_string()));
        }

        let events = RefCell::new(Vec::new());
        let observer = |event: &ProgressEvent| events.borrow_mut().push(event.clone());
        let table = TableBuilder::new(&observer)
            .with_progress_interval(2)
            .build(&root, None);
        assert_eq!(table.rows().len(), 5);

        assert_eq!(
            events.into_inner(),
            vec![
                ProgressEvent::RecordsFound { count: 5 },
                ProgressEvent::RecordProcessed { index: 1, total: 5 },
                ProgressEvent::RecordProcessed { index: 3, total: 5 },
                ProgressEvent::RecordProcessed { index: 5, total: 5 },
                ProgressEvent::ProcessingFinished {
                    records: 5,
                    fields: 1
                },
            ]
        );
    }
}
