//! Typed query builder for list endpoints.

/// Ordered list of `(key, value)` query pairs.
///
/// A key may repeat; the service reads repeated keys as a logical OR over
/// the values for that key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pairs: Vec<(String, String)>,
}

impl ListQuery {
    /// Create an empty query (no filters).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single `key=value` pair.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Append one `key=value` pair per value.
    pub fn with_any<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let key = key.into();
        self.pairs
            .extend(values.into_iter().map(|v| (key.clone(), v.to_string())));
        self
    }

    /// Restrict to jobs of any of the given workflows.
    pub fn workflows<I, V>(self, slugs: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.with_any("workflow", slugs)
    }

    /// Page number.
    pub fn page(self, page: u32) -> Self {
        self.with("page", page)
    }

    /// Page size.
    pub fn size(self, size: u32) -> Self {
        self.with("size", size)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// All values recorded for `key`, in insertion order.
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        let query = ListQuery::new();
        assert!(query.is_empty());
        assert!(query.pairs().is_empty());
    }

    #[test]
    fn test_multi_value_expansion_keeps_order() {
        let query = ListQuery::new()
            .workflows(["w1", "w2"])
            .with("status", "SUCCEEDED")
            .page(2);

        assert_eq!(
            query.pairs(),
            &[
                ("workflow".to_string(), "w1".to_string()),
                ("workflow".to_string(), "w2".to_string()),
                ("status".to_string(), "SUCCEEDED".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(query.values("workflow").collect::<Vec<_>>(), vec!["w1", "w2"]);
    }

    #[test]
    fn test_with_any_empty_adds_nothing() {
        let query = ListQuery::new().with_any("workflow", Vec::<String>::new());
        assert!(query.is_empty());
    }
}
