use std::fmt;

use crate::error::{Error, Result};

pub const CONTENT_TYPE: &str = "content-type";
pub const CONTENT_LENGTH: &str = "content-length";

/// Case-insensitive, multi-valued HTTP header collection.
///
/// Names are stored lower-cased. Distinct names keep their insertion order,
/// and values under one name keep theirs. A name that is present always has
/// at least one value: removing the last value removes the name.
///
/// # Examples
///
/// ```
/// use pulith_http::Headers;
///
/// let mut headers = Headers::new();
/// headers.add("Set-Cookie", "a=1");
/// headers.add("SET-COOKIE", "b=2");
/// assert_eq!(headers.get("set-cookie").map(<[String]>::len), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

fn canonical(name: &str) -> String { name.trim().to_ascii_lowercase() }

impl Headers {
    pub fn new() -> Self { Self::default() }

    /// Build from name to value-list pairs. Names are canonicalised and
    /// repeated names are merged; empty value lists are skipped.
    pub fn from_map<K, V, I>(map: impl IntoIterator<Item = (K, I)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        let mut headers = Self::new();
        for (name, values) in map {
            for value in values {
                headers.add(name.as_ref(), value);
            }
        }
        headers
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = canonical(name);
        self.entries.iter().position(|(key, _)| *key == name)
    }

    /// Append a value, keeping any existing ones.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        match self.position(name) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => self.entries.push((canonical(name), vec![value.into()])),
        }
    }

    /// Replace every value stored under `name` with `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.set_all(name, [value.into()]);
    }

    /// Replace every value stored under `name` with `values`.
    ///
    /// An empty `values` removes the name.
    pub fn set_all<V: Into<String>>(&mut self, name: &str, values: impl IntoIterator<Item = V>) {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.remove_all(name);
            return;
        }
        match self.position(name) {
            Some(idx) => self.entries[idx].1 = values,
            None => self.entries.push((canonical(name), values)),
        }
    }

    /// Remove exactly one matching value. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str, value: &str) -> bool {
        let Some(idx) = self.position(name) else {
            return false;
        };
        let values = &mut self.entries[idx].1;
        let Some(pos) = values.iter().position(|v| v == value) else {
            return false;
        };
        values.remove(pos);
        if values.is_empty() {
            self.entries.remove(idx);
        }
        true
    }

    pub fn remove_all(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    /// Single value stored under `name`.
    ///
    /// Callers use this to assert the header is single-valued: more than one
    /// value fails with [`Error::AmbiguousHeader`].
    pub fn value(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some([single]) => Ok(Some(single.as_str())),
            Some(values) => Err(Error::AmbiguousHeader {
                name: canonical(name),
                count: values.len(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool { self.position(name).is_some() }

    pub fn for_each(&self, mut visitor: impl FnMut(&str, &[String])) {
        for (name, values) in &self.entries {
            visitor(name, values);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// One `name: value\n` line per value, in insertion order.
    pub fn render(&self) -> String { self.to_string() }

    pub fn clear(&mut self) { self.entries.clear(); }

    /// Number of distinct names.
    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// `Content-Length` as a number, if present, single-valued and well-formed.
    pub fn content_length(&self) -> Option<u64> {
        self.value(CONTENT_LENGTH)
            .ok()
            .flatten()
            .and_then(|v| v.trim().parse().ok())
    }

    /// First `Content-Type` value, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE).and_then(|values| values.first()).map(String::as_str)
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, values) in &self.entries {
            for value in values {
                writeln!(f, "{name}: {value}")?;
            }
        }
        Ok(())
    }
}

impl<K: AsRef<str>, V: Into<String>> Extend<(K, V)> for Headers {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.add(name.as_ref(), value);
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Headers {
        Headers::from_map([("content-length", vec!["200"]), ("test", vec!["1", "2"])])
    }

    #[test]
    fn add_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.add("set-cookie", "a");
        headers.add("set-cookie", "b");
        headers.add("SET-COOKIE", "c");

        assert_eq!(headers.get("set-cookie").map(<[String]>::len), Some(3));
        assert_eq!(headers.get("Set-Cookie"), headers.get("SET-COOKIE"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn value_single_ambiguous_and_absent() {
        let headers = sample();
        assert_eq!(headers.value("Content-Length").unwrap(), Some("200"));
        assert!(headers.value("missing").unwrap().is_none());

        match headers.value("TEST") {
            Err(Error::AmbiguousHeader { name, count }) => {
                assert_eq!(name, "test");
                assert_eq!(count, 2);
            }
            other => panic!("expected ambiguous header, got {other:?}"),
        }
    }

    #[test]
    fn render_matches_insertion_order() {
        assert_eq!(sample().render(), "content-length: 200\ntest: 1\ntest: 2\n");
    }

    #[test]
    fn set_replaces_values() {
        let mut headers = sample();
        headers.set("Test", "3");
        assert_eq!(headers.get("test"), Some(&["3".to_string()][..]));

        headers.set_all("test", ["4", "5"]);
        assert_eq!(headers.get("test").map(<[String]>::len), Some(2));

        headers.set_all("test", Vec::<String>::new());
        assert!(!headers.contains("test"));
    }

    #[test]
    fn removing_last_value_drops_key() {
        let mut headers = sample();
        assert!(headers.remove("TEST", "1"));
        assert_eq!(headers.value("test").unwrap(), Some("2"));
        assert!(!headers.remove("test", "nope"));
        assert!(headers.remove("test", "2"));
        assert!(!headers.contains("test"));
        assert_eq!(headers.render(), "content-length: 200\n");
    }

    #[test]
    fn remove_all_and_clear() {
        let mut headers = sample();
        assert_eq!(headers.remove_all("test").map(|v| v.len()), Some(2));
        assert!(headers.remove_all("test").is_none());
        headers.clear();
        assert!(headers.is_empty());
    }

    #[test]
    fn from_map_merges_and_skips_empty() {
        let headers = Headers::from_map([
            ("Accept", vec!["a"]),
            ("empty", vec![]),
            ("ACCEPT", vec!["b"]),
        ]);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.render(), "accept: a\naccept: b\n");
    }

    #[test]
    fn for_each_visits_in_order() {
        let mut seen = Vec::new();
        sample().for_each(|name, values| seen.push((name.to_string(), values.len())));
        assert_eq!(seen, vec![("content-length".to_string(), 1), ("test".to_string(), 2)]);
    }

    #[test]
    fn content_length_helper() {
        assert_eq!(sample().content_length(), Some(200));
        let headers: Headers = [("content-length", "1"), ("Content-Length", "2")].into_iter().collect();
        assert_eq!(headers.content_length(), None);
    }
}
