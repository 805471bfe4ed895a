//! Query resolver: translates optional search criteria and pagination into
//! SQL predicate fragments and bind values.
//!
//! An absent or empty criterion contributes nothing (it is "always true");
//! present criteria conjoin with AND. Placeholders are numbered in the order
//! the binds are produced, so the same (fragments, binds) pair serves both
//! the count and the select statement.

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{BookQuery, UserQuery},
};

/// A value bound into a prepared statement
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Str(String),
    Int(i32),
    Date(NaiveDate),
}

/// Resolved pagination: LIMIT/OFFSET plus a whitelisted sort column
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
    pub order_by: &'static str,
}

const DEFAULT_FROM: i64 = 0;
const DEFAULT_SIZE: i64 = 10;

const BOOK_SORT_KEYS: &[&str] = &[
    "id", "genre", "author", "title", "subtitle", "publisher", "year", "pages", "isbn",
];

const USER_SORT_KEYS: &[&str] = &["id", "username", "name", "birthdate"];

fn resolve_sort(sort: Option<&str>, keys: &[&'static str]) -> &'static str {
    sort.and_then(|s| keys.iter().find(|k| **k == s))
        .copied()
        // unknown keys fall back to id; a client-supplied column must never
        // reach the statement text unchecked
        .unwrap_or("id")
}

fn page(from: Option<i64>, size: Option<i64>, sort: Option<&str>, keys: &[&'static str]) -> Page {
    let size = size.filter(|s| *s > 0).unwrap_or(DEFAULT_SIZE);
    let from = from.filter(|f| *f >= 0).unwrap_or(DEFAULT_FROM);
    Page {
        limit: size,
        offset: from * size,
        order_by: resolve_sort(sort, keys),
    }
}

pub fn book_page(from: Option<i64>, size: Option<i64>, sort: Option<&str>) -> Page {
    page(from, size, sort, BOOK_SORT_KEYS)
}

pub fn user_page(from: Option<i64>, size: Option<i64>, sort: Option<&str>) -> Page {
    page(from, size, sort, USER_SORT_KEYS)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Book criteria: exact match on every present attribute; non-positive
/// `pages` is treated as absent.
pub fn book_filters(query: &BookQuery) -> (Vec<String>, Vec<Bind>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    let text_criteria = [
        ("genre", &query.genre),
        ("author", &query.author),
        ("image", &query.image),
        ("title", &query.title),
        ("subtitle", &query.subtitle),
        ("publisher", &query.publisher),
        ("year", &query.year),
        ("isbn", &query.isbn),
    ];

    for (column, value) in text_criteria {
        if let Some(value) = present(value) {
            binds.push(Bind::Str(value.to_string()));
            conditions.push(format!("{} = ${}", column, binds.len()));
        }
    }

    if let Some(pages) = query.pages.filter(|p| *p > 0) {
        binds.push(Bind::Int(pages));
        conditions.push(format!("pages = ${}", binds.len()));
    }

    (conditions, binds)
}

/// User criteria: case-insensitive name containment plus an inclusive
/// birthdate range with independently optional bounds.
pub fn user_filters(query: &UserQuery) -> AppResult<(Vec<String>, Vec<Bind>)> {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(name) = present(&query.name) {
        binds.push(Bind::Str(format!("%{}%", name.to_lowercase())));
        conditions.push(format!("LOWER(name) LIKE ${}", binds.len()));
    }

    if let Some(begin) = parse_date("begin", &query.begin)? {
        binds.push(Bind::Date(begin));
        conditions.push(format!("birthdate >= ${}", binds.len()));
    }

    if let Some(end) = parse_date("end", &query.end)? {
        binds.push(Bind::Date(end));
        conditions.push(format!("birthdate <= ${}", binds.len()));
    }

    Ok((conditions, binds))
}

fn parse_date(field: &str, value: &Option<String>) -> AppResult<Option<NaiveDate>> {
    match present(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| AppError::Validation {
                field: field.to_string(),
                reason: format!("'{}' is not a valid calendar date", raw),
            }),
    }
}

pub fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_criteria_yields_no_conditions() {
        let (conditions, binds) = book_filters(&BookQuery::default());
        assert!(conditions.is_empty());
        assert!(binds.is_empty());
        assert_eq!(where_clause(&conditions), "");
    }

    #[test]
    fn empty_strings_are_absent_criteria() {
        let query = BookQuery {
            publisher: Some(String::new()),
            genre: Some(String::new()),
            ..BookQuery::default()
        };
        let (conditions, _) = book_filters(&query);
        assert!(conditions.is_empty());
    }

    #[test]
    fn non_positive_pages_is_an_absent_criterion() {
        for pages in [Some(0), Some(-3), None] {
            let query = BookQuery { pages, ..BookQuery::default() };
            let (conditions, _) = book_filters(&query);
            assert!(conditions.is_empty());
        }

        let query = BookQuery { pages: Some(100), ..BookQuery::default() };
        let (conditions, binds) = book_filters(&query);
        assert_eq!(conditions, vec!["pages = $1".to_string()]);
        assert_eq!(binds, vec![Bind::Int(100)]);
    }

    #[test]
    fn present_criteria_conjoin_with_sequential_placeholders() {
        let query = BookQuery {
            publisher: Some("Gollancz".to_string()),
            year: Some("1987".to_string()),
            pages: Some(272),
            ..BookQuery::default()
        };
        let (conditions, binds) = book_filters(&query);
        assert_eq!(
            conditions,
            vec![
                "publisher = $1".to_string(),
                "year = $2".to_string(),
                "pages = $3".to_string(),
            ]
        );
        assert_eq!(
            binds,
            vec![
                Bind::Str("Gollancz".to_string()),
                Bind::Str("1987".to_string()),
                Bind::Int(272),
            ]
        );
        assert_eq!(
            where_clause(&conditions),
            "WHERE publisher = $1 AND year = $2 AND pages = $3"
        );
    }

    #[test]
    fn name_criterion_is_case_insensitive_containment() {
        let query = UserQuery {
            name: Some("Prat".to_string()),
            ..UserQuery::default()
        };
        let (conditions, binds) = user_filters(&query).unwrap();
        assert_eq!(conditions, vec!["LOWER(name) LIKE $1".to_string()]);
        assert_eq!(binds, vec![Bind::Str("%prat%".to_string())]);
    }

    #[test]
    fn birthdate_bounds_are_independently_optional() {
        let query = UserQuery {
            begin: Some("2000-01-01".to_string()),
            ..UserQuery::default()
        };
        let (conditions, _) = user_filters(&query).unwrap();
        assert_eq!(conditions, vec!["birthdate >= $1".to_string()]);

        let query = UserQuery {
            end: Some("2010-12-31".to_string()),
            ..UserQuery::default()
        };
        let (conditions, _) = user_filters(&query).unwrap();
        assert_eq!(conditions, vec!["birthdate <= $1".to_string()]);

        let query = UserQuery {
            name: Some("a".to_string()),
            begin: Some("2000-01-01".to_string()),
            end: Some("2010-12-31".to_string()),
            ..UserQuery::default()
        };
        let (conditions, _) = user_filters(&query).unwrap();
        assert_eq!(conditions.len(), 3);
    }

    #[test]
    fn unparsable_dates_name_their_field() {
        let query = UserQuery {
            begin: Some("not-a-date".to_string()),
            ..UserQuery::default()
        };
        match user_filters(&query) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "begin"),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn empty_date_strings_are_absent() {
        let query = UserQuery {
            begin: Some(String::new()),
            end: Some(String::new()),
            ..UserQuery::default()
        };
        let (conditions, _) = user_filters(&query).unwrap();
        assert!(conditions.is_empty());
    }

    #[test]
    fn pagination_defaults_and_offset_arithmetic() {
        let page = book_page(None, None, None);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, 0);
        assert_eq!(page.order_by, "id");

        let page = book_page(Some(3), Some(25), Some("title"));
        assert_eq!(page.limit, 25);
        assert_eq!(page.offset, 75);
        assert_eq!(page.order_by, "title");
    }

    #[test]
    fn sort_keys_are_whitelisted() {
        assert_eq!(book_page(None, None, Some("isbn")).order_by, "isbn");
        assert_eq!(book_page(None, None, Some("; DROP TABLE books")).order_by, "id");
        assert_eq!(user_page(None, None, Some("birthdate")).order_by, "birthdate");
        assert_eq!(user_page(None, None, Some("password")).order_by, "id");
    }

    #[test]
    fn degenerate_paging_values_fall_back_to_defaults() {
        let page = book_page(Some(-1), Some(0), None);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, 0);
    }
}
