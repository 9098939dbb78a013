/// One or more names (station identifiers or field names) as given by the caller.
///
/// A lone string becomes a one-element selection. Order is kept and duplicates
/// are dropped when the selection is normalised.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection(Vec<String>);

impl Selection {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    /// Entries in first-seen order with repeats removed.
    pub fn distinct(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.0.len());
        for item in &self.0 {
            let item = item.trim();
            if !seen.iter().any(|s: &String| s == item) {
                seen.push(item.to_string());
            }
        }
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for Selection {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(value: Vec<&str>) -> Self {
        Self(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Selection {
    fn from(value: &[&str]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for Selection {
    fn from(value: &[String]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(value: [&str; N]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

impl FromIterator<String> for Selection {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
