//! Ordered header multimap.

use std::collections::HashMap;
use std::fmt;

/// Collection of message headers.
///
/// Fields keep their original order and spelling; duplicates are allowed.
/// Lookups ignore case.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    fields: Vec<(String, String)>,
    index: HashMap<String, Vec<usize>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, keeping any existing fields with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.index
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(self.fields.len());
        self.fields.push((name, value.into()));
    }

    /// Sets a field value.
    ///
    /// The first field with this name is updated in place and later
    /// duplicates are dropped. If the name is absent the field is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        let positions = self.index.get(&key).cloned().unwrap_or_default();
        let Some((&first, duplicates)) = positions.split_first() else {
            self.add(name, value);
            return;
        };
        self.fields[first].1 = value.into();
        if !duplicates.is_empty() {
            let mut position = 0;
            self.fields.retain(|_| {
                let keep = !duplicates.contains(&position);
                position += 1;
                keep
            });
            self.reindex();
        }
    }

    /// Gets the first value for a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(&name.to_ascii_lowercase())
            .and_then(|positions| positions.first())
            .map(|&i| self.fields[i].1.as_str())
    }

    /// Gets all values for a field, in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| self.fields[i].1.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if at least one field has this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// Removes every field with this name.
    pub fn remove(&mut self, name: &str) {
        let key = name.to_ascii_lowercase();
        if self.index.remove(&key).is_some() {
            self.fields
                .retain(|(field, _)| !field.eq_ignore_ascii_case(&key));
            self.reindex();
        }
    }

    /// Number of fields, counting duplicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, (name, _)) in self.fields.iter().enumerate() {
            self.index
                .entry(name.to_ascii_lowercase())
                .or_default()
                .push(i);
        }
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("Content-type"));
    }

    #[test]
    fn test_preserves_order_and_case() {
        let mut headers = Headers::new();
        headers.add("Received", "from a");
        headers.add("X-Custom", "1");
        headers.add("received", "from b");

        let fields: Vec<_> = headers.iter().collect();
        assert_eq!(
            fields,
            vec![("Received", "from a"), ("X-Custom", "1"), ("received", "from b")]
        );
        assert_eq!(headers.get_all("RECEIVED"), vec!["from a", "from b"]);
    }

    #[test]
    fn test_set_replaces_first_and_drops_duplicates() {
        let mut headers = Headers::new();
        headers.add("Subject", "one");
        headers.add("To", "a@b.c");
        headers.add("subject", "two");
        headers.set("SUBJECT", "three");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_all("subject"), vec!["three"]);
        assert_eq!(headers.iter().next(), Some(("Subject", "three")));
        assert_eq!(headers.get("to"), Some("a@b.c"));
    }

    #[test]
    fn test_set_appends_when_absent() {
        let mut headers = Headers::new();
        headers.add("From", "a@b.c");
        headers.set("Subject", "hi");
        assert_eq!(headers.iter().last(), Some(("Subject", "hi")));
    }

    #[test]
    fn test_remove() {
        let mut headers = Headers::new();
        headers.add("A", "1");
        headers.add("B", "2");
        headers.add("a", "3");
        headers.remove("A");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("a"), None);
        assert_eq!(headers.get("b"), Some("2"));
    }

    #[test]
    fn test_display() {
        let mut headers = Headers::new();
        headers.add("From", "a@b.c");
        headers.add("Subject", "Hi");
        assert_eq!(headers.to_string(), "From: a@b.c\r\nSubject: Hi\r\n");
    }
}
