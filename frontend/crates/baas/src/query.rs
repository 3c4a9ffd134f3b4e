//! Table Query Builder
//!
//! Builds the query string understood by the REST table endpoint
//! (`/rest/v1/<table>?column=op.value&select=...&order=...`).
//!
//! Building is pure; [`crate::rest`] sends the result.

use std::fmt::Display;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    const fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Query against one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    single: bool,
}

impl Query {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            select: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            single: false,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Column list, including embedded relations such as
    /// `*, opportunity:opportunities(title, company)`
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        let columns: String = columns.into();
        // Whitespace outside quotes is insignificant to the server
        self.select = Some(columns.split_whitespace().collect());
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value.to_string())
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "neq", value.to_string())
    }

    pub fn gt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gt", value.to_string())
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value.to_string())
    }

    pub fn lt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lt", value.to_string())
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lte", value.to_string())
    }

    /// Case-insensitive pattern match; `%` is the wildcard
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern.to_string())
    }

    /// Column value is one of `values`
    pub fn is_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let list = join_quoted(values);
        self.filter(column, "in", format!("({})", list))
    }

    /// Array column contains every element of `values`
    pub fn contains<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let list = join_quoted(values);
        self.filter(column, "cs", format!("{{{}}}", list))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null".to_string())
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order.push(format!("{}.{}", column, order.as_str()));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Rows `from..=to`, zero-based
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.offset = Some(from);
        self.limit = Some(to.saturating_sub(from) + 1);
        self
    }

    /// Expect exactly one row
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    fn filter(mut self, column: &str, operator: &str, value: String) -> Self {
        self.filters
            .push((column.to_string(), format!("{}.{}", operator, value)));
        self
    }

    /// Query-string pairs, unencoded
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 4);
        pairs.push((
            "select".to_string(),
            self.select.clone().unwrap_or_else(|| "*".to_string()),
        ));
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs
    }

    /// Filter pairs only, for mutations
    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        self.filters.clone()
    }
}

/// Values containing list syntax are double-quoted
fn join_quoted<I, V>(values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: Display,
{
    values
        .into_iter()
        .map(|v| {
            let raw = v.to_string();
            if raw.contains([',', '(', ')', '{', '}', '"', ' ']) {
                format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                raw
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(query: &Query) -> Vec<(String, String)> {
        query.to_pairs()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_defaults_to_all_columns() {
        assert_eq!(pairs(&Query::table("opportunities")), vec![pair("select", "*")]);
    }

    #[test]
    fn test_filters_order_and_range() {
        let query = Query::table("applications")
            .select("*, opportunity:opportunities(title, company)")
            .eq("student_id", "u-1")
            .neq("status", "withdrawn")
            .order("created_at", Order::Desc)
            .range(20, 29);

        assert_eq!(
            pairs(&query),
            vec![
                pair("select", "*,opportunity:opportunities(title,company)"),
                pair("student_id", "eq.u-1"),
                pair("status", "neq.withdrawn"),
                pair("order", "created_at.desc"),
                pair("limit", "10"),
                pair("offset", "20"),
            ]
        );
    }

    #[test]
    fn test_list_operators_quote_reserved_values() {
        let query = Query::table("opportunities")
            .is_in("status", ["open", "closed"])
            .contains("skills", ["rust", "c, c++"])
            .ilike("title", "%data%");

        assert_eq!(
            query.filter_pairs(),
            vec![
                pair("status", "in.(open,closed)"),
                pair("skills", "cs.{rust,\"c, c++\"}"),
                pair("title", "ilike.%data%"),
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        let query = Query::table("messages")
            .gt("created_at", "2025-01-01T00:00:00Z")
            .gte("duration_weeks", 2)
            .lt("duration_weeks", 12)
            .lte("stipend", 500)
            .is_null("read_at");
        let ops: Vec<String> = query.filter_pairs().into_iter().map(|(_, v)| v).collect();
        assert_eq!(
            ops,
            vec!["gt.2025-01-01T00:00:00Z", "gte.2", "lt.12", "lte.500", "is.null"]
        );
    }

    #[test]
    fn test_single_flag() {
        let query = Query::table("profiles").eq("id", "u-1").single();
        assert!(query.is_single());
        assert!(query.has_filters());
        assert!(!Query::table("profiles").has_filters());
    }
}
