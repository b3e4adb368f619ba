//! Column label classification.
//!
//! Splits the result-set labels into flat columns and one level of nested
//! groups using dot notation. Only the first `.` separates parent from child;
//! anything after it (further dots included) is the child name verbatim.

/// Where a column's value lands in the record layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSlot {
    /// Index into [`ColumnLayout::flat`].
    Flat(usize),
    /// Indices into [`ColumnLayout::groups`] and that group's children.
    Nested { group: usize, child: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub parent: String,
    pub children: Vec<String>,
}

/// Top-level entry in first-appearance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopLevel {
    Flat(usize),
    Group(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub flat: Vec<String>,
    pub groups: Vec<ColumnGroup>,
    /// One entry per input label, in label order.
    pub slots: Vec<ColumnSlot>,
    pub order: Vec<TopLevel>,
}

pub fn split_label(label: &str) -> Option<(&str, &str)> {
    label.split_once('.')
}

impl ColumnLayout {
    /// Identical labels share a slot; a repeated child within the same parent
    /// does too.
    pub fn classify(labels: &[String]) -> Self {
        let mut layout = ColumnLayout::default();
        for label in labels {
            let slot = match split_label(label) {
                Some((parent, child)) => {
                    let group = layout.group_index(parent);
                    let children = &mut layout.groups[group].children;
                    let child = match children.iter().position(|c| c == child) {
                        Some(idx) => idx,
                        None => {
                            children.push(child.to_string());
                            children.len() - 1
                        }
                    };
                    ColumnSlot::Nested { group, child }
                }
                None => {
                    let idx = match layout.flat.iter().position(|f| f == label) {
                        Some(idx) => idx,
                        None => {
                            layout.flat.push(label.clone());
                            layout.order.push(TopLevel::Flat(layout.flat.len() - 1));
                            layout.flat.len() - 1
                        }
                    };
                    ColumnSlot::Flat(idx)
                }
            };
            layout.slots.push(slot);
        }
        layout
    }

    fn group_index(&mut self, parent: &str) -> usize {
        if let Some(idx) = self.groups.iter().position(|g| g.parent == parent) {
            return idx;
        }
        self.groups.push(ColumnGroup {
            parent: parent.to_string(),
            children: Vec::new(),
        });
        self.order.push(TopLevel::Group(self.groups.len() - 1));
        self.groups.len() - 1
    }

    pub fn column_count(&self) -> usize {
        self.slots.len()
    }

    pub fn group(&self, parent: &str) -> Option<&ColumnGroup> {
        self.groups.iter().find(|g| g.parent == parent)
    }

    /// Number of labels that resolved onto an already occupied slot.
    pub fn duplicate_count(&self) -> usize {
        let distinct = self.flat.len() + self.groups.iter().map(|g| g.children.len()).sum::<usize>();
        self.slots.len() - distinct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classify_separates_flat_and_nested_columns() {
        let layout = ColumnLayout::classify(&labels(&[
            "id",
            "category.name",
            "title",
            "category.id",
        ]));
        assert_eq!(layout.flat, vec!["id", "title"]);
        assert_eq!(layout.groups.len(), 1);
        assert_eq!(layout.groups[0].parent, "category");
        assert_eq!(layout.groups[0].children, vec!["name", "id"]);
        assert_eq!(
            layout.order,
            vec![TopLevel::Flat(0), TopLevel::Group(0), TopLevel::Flat(1)]
        );
        assert_eq!(
            layout.slots[3],
            ColumnSlot::Nested { group: 0, child: 1 }
        );
    }

    #[test]
    fn classify_splits_on_first_dot_only() {
        let layout = ColumnLayout::classify(&labels(&["a.b.c"]));
        let group = layout.group("a").expect("group a");
        assert_eq!(group.children, vec!["b.c"]);
    }

    #[test]
    fn classify_passes_empty_names_through() {
        let layout = ColumnLayout::classify(&labels(&[".child", "parent."]));
        assert_eq!(layout.group("").unwrap().children, vec!["child"]);
        assert_eq!(layout.group("parent").unwrap().children, vec![""]);
    }

    #[test]
    fn classify_shares_slots_for_repeated_labels() {
        let layout = ColumnLayout::classify(&labels(&["id", "x.y", "id", "x.y"]));
        assert_eq!(layout.flat, vec!["id"]);
        assert_eq!(layout.slots[0], layout.slots[2]);
        assert_eq!(layout.slots[1], layout.slots[3]);
        assert_eq!(layout.duplicate_count(), 2);
        assert_eq!(layout.column_count(), 4);
    }

    #[test]
    fn classify_handles_no_columns() {
        let layout = ColumnLayout::classify(&[]);
        assert!(layout.flat.is_empty());
        assert!(layout.groups.is_empty());
        assert_eq!(layout.duplicate_count(), 0);
    }
}
