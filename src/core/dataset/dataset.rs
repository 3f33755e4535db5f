use std::ffi::OsString;

/// The three subsets a class is repartitioned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetSplit {
    Train,
    Validation,
    Test,
}

impl DatasetSplit {
    /// Directory name of the split under the destination root.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Validation => "validation",
            DatasetSplit::Test => "test",
        }
    }

    pub fn all() -> [DatasetSplit; 3] {
        [
            DatasetSplit::Train,
            DatasetSplit::Validation,
            DatasetSplit::Test,
        ]
    }
}

impl std::fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File names of one class, assigned to train/validation/test.
///
/// The lists are disjoint and keep the order they were drawn in; together
/// they hold every file of the class exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitAssignment {
    pub train: Vec<OsString>,
    pub validation: Vec<OsString>,
    pub test: Vec<OsString>,
}

impl SplitAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the file list for a specific split
    pub fn get(&self, split: DatasetSplit) -> &[OsString] {
        match split {
            DatasetSplit::Train => &self.train,
            DatasetSplit::Validation => &self.validation,
            DatasetSplit::Test => &self.test,
        }
    }

    /// Total number of files across all three splits
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate over every split together with its files, in train,
    /// validation, test order.
    pub fn iter(&self) -> impl Iterator<Item = (DatasetSplit, &[OsString])> {
        DatasetSplit::all()
            .into_iter()
            .map(move |split| (split, self.get(split)))
    }
}
