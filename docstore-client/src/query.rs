//! Query predicates.
//!
//! The client does not interpret queries; these types only render the
//! store's JSON query DSL. Anything not covered here can be sent through
//! [`Query::Raw`].

use serde_json::{Map, Value, json};

/// A search predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Match all documents.
    MatchAll,
    /// Full-text match on one field.
    Match(MatchQuery),
    /// Exact term on one field.
    Term(TermQuery),
    /// Any of several exact terms on one field.
    Terms {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Numeric or date range.
    Range(RangeQuery),
    /// Boolean combination.
    Bool(BoolQuery),
    /// Lucene query-string syntax.
    QueryString {
        /// Query text.
        query: String,
        /// Field searched when the text names none.
        default_field: Option<String>,
    },
    /// Term prefix.
    Prefix {
        /// Field name.
        field: String,
        /// Prefix value.
        value: String,
    },
    /// Field presence.
    Exists {
        /// Field name.
        field: String,
    },
    /// Query DSL JSON sent as-is.
    Raw(Value),
}

impl Query {
    /// Match every document.
    pub fn match_all() -> Self {
        Query::MatchAll
    }

    /// Exact term query.
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Term(TermQuery::new(field, value))
    }

    /// Any-of terms query.
    pub fn terms<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Query::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Full-text match query.
    pub fn matches(field: impl Into<String>, text: impl Into<String>) -> Self {
        Query::Match(MatchQuery::new(field, text))
    }

    /// Query-string query.
    pub fn query_string(query: impl Into<String>) -> Self {
        Query::QueryString {
            query: query.into(),
            default_field: None,
        }
    }

    /// Prefix query.
    pub fn prefix(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Prefix {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Exists query.
    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists {
            field: field.into(),
        }
    }

    /// Render as query DSL.
    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Match(m) => m.to_json(),
            Query::Term(t) => t.to_json(),
            Query::Terms { field, values } => json!({ "terms": { field: values } }),
            Query::Range(r) => r.to_json(),
            Query::Bool(b) => b.to_json(),
            Query::QueryString {
                query,
                default_field,
            } => {
                let mut qs = json!({ "query": query });
                if let Some(df) = default_field {
                    qs["default_field"] = json!(df);
                }
                json!({ "query_string": qs })
            }
            Query::Prefix { field, value } => json!({ "prefix": { field: value } }),
            Query::Exists { field } => json!({ "exists": { "field": field } }),
            Query::Raw(v) => v.clone(),
        }
    }
}

impl From<Query> for Value {
    fn from(query: Query) -> Self {
        query.to_json()
    }
}

impl From<TermQuery> for Query {
    fn from(q: TermQuery) -> Self {
        Query::Term(q)
    }
}

impl From<MatchQuery> for Query {
    fn from(q: MatchQuery) -> Self {
        Query::Match(q)
    }
}

impl From<RangeQuery> for Query {
    fn from(q: RangeQuery) -> Self {
        Query::Range(q)
    }
}

impl From<BoolQuery> for Query {
    fn from(q: BoolQuery) -> Self {
        Query::Bool(q)
    }
}

/// Full-text match query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    /// Field to search.
    pub field: String,
    /// Search text.
    pub query: String,
    /// `and` / `or`.
    pub operator: Option<String>,
    /// Typo tolerance, e.g. `AUTO`.
    pub fuzziness: Option<String>,
}

impl MatchQuery {
    /// Create a match query.
    pub fn new(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            operator: None,
            fuzziness: None,
        }
    }

    /// Set the operator.
    pub fn operator(mut self, op: impl Into<String>) -> Self {
        self.operator = Some(op.into());
        self
    }

    /// Set fuzziness.
    pub fn fuzziness(mut self, fuzz: impl Into<String>) -> Self {
        self.fuzziness = Some(fuzz.into());
        self
    }

    fn to_json(&self) -> Value {
        if self.operator.is_none() && self.fuzziness.is_none() {
            return json!({ "match": { &self.field: self.query } });
        }

        let mut query = json!({ "query": self.query });
        if let Some(op) = &self.operator {
            query["operator"] = json!(op);
        }
        if let Some(fuzz) = &self.fuzziness {
            query["fuzziness"] = json!(fuzz);
        }
        json!({ "match": { &self.field: query } })
    }
}

/// Exact term query.
#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    /// Field name.
    pub field: String,
    /// Exact value.
    pub value: Value,
    /// Relevance multiplier.
    pub boost: Option<f64>,
}

impl TermQuery {
    /// Create a term query.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            boost: None,
        }
    }

    /// Set boost.
    pub fn boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    fn to_json(&self) -> Value {
        match self.boost {
            None => json!({ "term": { &self.field: self.value } }),
            Some(boost) => json!({
                "term": { &self.field: { "value": self.value, "boost": boost } }
            }),
        }
    }
}

/// Range query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeQuery {
    /// Field name.
    pub field: String,
    /// Greater than.
    pub gt: Option<Value>,
    /// Greater than or equal.
    pub gte: Option<Value>,
    /// Less than.
    pub lt: Option<Value>,
    /// Less than or equal.
    pub lte: Option<Value>,
    /// Date format.
    pub format: Option<String>,
}

impl RangeQuery {
    /// Create an unbounded range on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// Set greater than.
    pub fn gt(mut self, value: impl Into<Value>) -> Self {
        self.gt = Some(value.into());
        self
    }

    /// Set greater than or equal.
    pub fn gte(mut self, value: impl Into<Value>) -> Self {
        self.gte = Some(value.into());
        self
    }

    /// Set less than.
    pub fn lt(mut self, value: impl Into<Value>) -> Self {
        self.lt = Some(value.into());
        self
    }

    /// Set less than or equal.
    pub fn lte(mut self, value: impl Into<Value>) -> Self {
        self.lte = Some(value.into());
        self
    }

    /// Set date format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    fn to_json(&self) -> Value {
        let mut range = Map::new();
        let bounds = [
            ("gt", &self.gt),
            ("gte", &self.gte),
            ("lt", &self.lt),
            ("lte", &self.lte),
        ];
        for (key, bound) in bounds {
            if let Some(v) = bound {
                range.insert(key.to_string(), v.clone());
            }
        }
        if let Some(format) = &self.format {
            range.insert("format".to_string(), json!(format));
        }

        json!({ "range": { &self.field: range } })
    }
}

/// Boolean combination of queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    /// Must match (AND).
    pub must: Vec<Query>,
    /// Should match (OR).
    pub should: Vec<Query>,
    /// Must not match (NOT).
    pub must_not: Vec<Query>,
    /// Non-scoring filter.
    pub filter: Vec<Query>,
    /// Minimum number of `should` clauses to match.
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    /// Create an empty bool query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a must clause.
    pub fn must(mut self, query: impl Into<Query>) -> Self {
        self.must.push(query.into());
        self
    }

    /// Add a should clause.
    pub fn should(mut self, query: impl Into<Query>) -> Self {
        self.should.push(query.into());
        self
    }

    /// Add a must_not clause.
    pub fn must_not(mut self, query: impl Into<Query>) -> Self {
        self.must_not.push(query.into());
        self
    }

    /// Add a filter clause.
    pub fn filter(mut self, query: impl Into<Query>) -> Self {
        self.filter.push(query.into());
        self
    }

    /// Set minimum should match.
    pub fn minimum_should_match(mut self, min: u32) -> Self {
        self.minimum_should_match = Some(min);
        self
    }

    fn to_json(&self) -> Value {
        let mut bool_query = Map::new();
        let clauses = [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
            ("filter", &self.filter),
        ];

        for (key, queries) in clauses {
            if !queries.is_empty() {
                bool_query.insert(
                    key.to_string(),
                    Value::Array(queries.iter().map(Query::to_json).collect()),
                );
            }
        }
        if let Some(min) = self.minimum_should_match {
            bool_query.insert("minimum_should_match".to_string(), json!(min));
        }

        json!({ "bool": bool_query })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_query() {
        assert_eq!(
            Query::term("user", "olivere").to_json(),
            json!({ "term": { "user": "olivere" } })
        );
        assert_eq!(
            Query::from(TermQuery::new("retweets", 3).boost(2.0)).to_json(),
            json!({ "term": { "retweets": { "value": 3, "boost": 2.0 } } })
        );
    }

    #[test]
    fn test_match_query_short_form() {
        assert_eq!(
            Query::matches("message", "take five").to_json(),
            json!({ "match": { "message": "take five" } })
        );

        let q = Query::from(MatchQuery::new("message", "take five").operator("and"));
        assert_eq!(q.to_json()["match"]["message"]["operator"], "and");
    }

    #[test]
    fn test_bool_query() {
        let q: Query = BoolQuery::new()
            .must(Query::term("user", "olivere"))
            .must_not(RangeQuery::new("retweets").gt(100))
            .into();

        let json = q.to_json();
        assert_eq!(json["bool"]["must"][0]["term"]["user"], "olivere");
        assert_eq!(json["bool"]["must_not"][0]["range"]["retweets"]["gt"], 100);
        assert!(json["bool"].get("should").is_none());
    }

    #[test]
    fn test_raw_passthrough() {
        let raw = json!({ "geo_distance": { "distance": "10km", "location": "40,-70" } });
        assert_eq!(Query::Raw(raw.clone()).to_json(), raw);
    }

    #[test]
    fn test_terms_and_exists() {
        assert_eq!(
            Query::terms("tags", ["jazz", "brubeck"]).to_json(),
            json!({ "terms": { "tags": ["jazz", "brubeck"] } })
        );
        assert_eq!(
            Query::exists("image").to_json(),
            json!({ "exists": { "field": "image" } })
        );
    }
}
