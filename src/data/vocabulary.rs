use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

/// Sorted, deduplicated class names. A class's index is its sort rank.
///
/// Frozen once built; the same vocabulary travels with the model so indices
/// mean the same thing at inference time.
///
/// Deserialization accepts only a strictly ascending list, so a stored
/// vocabulary can never disagree with the indices it was trained with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ClassVocabulary {
    names: Vec<String>,
}

impl ClassVocabulary {
    pub fn from_names<I, S>(names: I) -> ClassVocabulary
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        ClassVocabulary { names: set.into_iter().collect() }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TryFrom<Vec<String>> for ClassVocabulary {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        if let Some(pair) = names.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "class names must be sorted and unique, found '{}' before '{}'",
                pair[0], pair[1]
            ));
        }
        Ok(ClassVocabulary { names })
    }
}

impl From<ClassVocabulary> for Vec<String> {
    fn from(vocabulary: ClassVocabulary) -> Self {
        vocabulary.names
    }
}
