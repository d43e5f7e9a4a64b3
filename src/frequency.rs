use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::dataset::{Column, Dataset};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Occurrences of each value of `column`, most frequent first.
///
/// Equal counts keep the order in which the values first appear. Missing cells are
/// counted under the missing placeholder rather than dropped.
pub fn frequency(dataset: &Dataset, column: Column) -> Vec<CategoryCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for t in dataset.transactions() {
        let key = t.key(column);
        match index.get(&key) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push(CategoryCount { category: key, count: 1 });
            }
        }
    }

    // sort_by is stable, so first-seen order survives among ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    debug!(%column, categories = counts.len(), "computed frequency table");
    counts
}
