//! List filter fragments.
//!
//! `List` accepts raw SQL fragments instead of a structured predicate. A
//! fragment containing `=` is a condition and lands in the WHERE clause; one
//! containing the word `asc` or `desc` (any case) is a sort key for ORDER BY.
//! Anything else is dropped. Fragments are embedded verbatim, so they must
//! never carry untrusted input.

use std::sync::OnceLock;

use regex::Regex;

/// Where a list fragment ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Appended to the WHERE clause
    Condition,
    /// Appended to the ORDER BY clause
    Order,
    /// Not recognized, dropped
    Ignored,
}

/// `asc`/`desc` as a whole word, never as part of an identifier.
fn order_direction() -> &'static Regex {
    static ORDER_DIRECTION: OnceLock<Regex> = OnceLock::new();
    ORDER_DIRECTION
        .get_or_init(|| Regex::new(r"(?i)\b(asc|desc)\b").expect("order direction pattern"))
}

/// Classify one fragment. Conditions take precedence over sort keys.
pub fn classify(fragment: &str) -> FragmentKind {
    if fragment.contains('=') {
        FragmentKind::Condition
    } else if order_direction().is_match(fragment) {
        FragmentKind::Order
    } else {
        FragmentKind::Ignored
    }
}

/// Fragments of one `List` call, sorted into their clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub conditions: Vec<String>,
    pub orders: Vec<String>,
}

impl ListFilter {
    pub fn parse(fragments: &[&str]) -> Self {
        let mut filter = Self::default();
        for fragment in fragments {
            let fragment = fragment.trim();
            match classify(fragment) {
                FragmentKind::Condition => filter.conditions.push(fragment.to_string()),
                FragmentKind::Order => filter.orders.push(fragment.to_string()),
                FragmentKind::Ignored => {
                    tracing::warn!(fragment, "Dropping list fragment that is neither a condition nor a sort key");
                }
            }
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.orders.is_empty()
    }

    /// The clause text to append after `FROM <table>`, with a leading space,
    /// or an empty string when there is nothing to filter or sort by.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.orders.join(", "));
        }
        sql
    }
}
