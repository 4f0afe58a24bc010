use indexmap::IndexSet;
use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// The ordered set of labels spanning both axes of a confusion matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelIndex {
    /// Labels in row/column order.
    labels: IndexSet<Box<str>>,
}

impl LabelIndex {
    /// Uses the supplied labels in the given order. A repeated label keeps its first position.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels.into_iter().map(|l| l.as_ref().into()).collect(),
        }
    }

    /// Derives the index as the sorted union of every actual and predicted label.
    pub fn derive<S: AsRef<str>>(actual: &[S], predicted: &[S]) -> Self {
        let union: BTreeSet<&str> = actual
            .iter()
            .chain(predicted.iter())
            .map(AsRef::as_ref)
            .collect();
        Self::new(union)
    }

    /// Returns the 1-based position of the label, which is also its row/column in the grid.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.get_index_of(label).map(|idx| idx + 1)
    }

    pub(crate) fn require(&self, axis: &'static str, label: &str) -> Result<usize> {
        self.position(label).ok_or_else(|| Error::UnknownLabel {
            axis,
            label: label.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(AsRef::as_ref)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_labels_are_sorted_union() {
        let actual = ["cat", "dog", "cat"];
        let predicted = ["bird", "dog", "dog"];
        let index = LabelIndex::derive(&actual, &predicted);

        assert_eq!(index.iter().collect::<Vec<_>>(), vec!["bird", "cat", "dog"]);
        assert_eq!(index.position("bird"), Some(1));
        assert_eq!(index.position("dog"), Some(3));
        assert_eq!(index.position("fish"), None);
    }

    #[test]
    fn explicit_labels_keep_their_order() {
        let index = LabelIndex::new(["z", "a", "m", "a"]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.position("z"), Some(1));
        assert_eq!(index.position("a"), Some(2));
        assert_eq!(index.position("m"), Some(3));
    }

    #[test]
    fn missing_label_is_an_error() {
        let index = LabelIndex::new(["A"]);
        let err = index.require("actual", "B").unwrap_err();
        assert!(matches!(err, Error::UnknownLabel { axis: "actual", ref label } if label == "B"));
    }

    #[test]
    fn empty_observations_give_empty_index() {
        let index = LabelIndex::derive::<&str>(&[], &[]);
        assert_eq!(index.len(), 0);
    }
}
