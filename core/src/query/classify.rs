//! Query classification and the small string helpers shared by the evaluators.

pub const LINK_MARKER: &str = "LINKTO ";

/// Boolean operators. Case-sensitive and surrounded by spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    And,
    Or,
    ButNot,
}

impl BooleanOp {
    pub const ALL: [BooleanOp; 3] = [BooleanOp::And, BooleanOp::Or, BooleanOp::ButNot];

    pub fn token(self) -> &'static str {
        match self {
            BooleanOp::And => " AND ",
            BooleanOp::Or => " OR ",
            BooleanOp::ButNot => " BUT NOT ",
        }
    }
}

/// What a raw query asks for, with the part of the query each evaluator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind<'q> {
    /// Title following the `LINKTO ` marker.
    Link(&'q str),
    /// Whole query, split later on its operators.
    Boolean(&'q str),
    /// Text before the first `*`.
    Prefix(&'q str),
    /// Text between the first matched pair of quotes.
    Phrase(&'q str),
    Keyword(&'q str),
}

/// Classify in fixed priority order: link, boolean, prefix, phrase, keyword.
pub fn classify(query: &str) -> QueryKind<'_> {
    if let Some(idx) = query.find(LINK_MARKER) {
        return QueryKind::Link(query[idx + LINK_MARKER.len()..].trim());
    }
    if BooleanOp::ALL.iter().any(|op| query.contains(op.token())) {
        return QueryKind::Boolean(query);
    }
    if let Some(prefix) = prefix_text(query) {
        return QueryKind::Prefix(prefix);
    }
    if let Some(phrase) = phrase_text(query) {
        return QueryKind::Phrase(phrase);
    }
    QueryKind::Keyword(query)
}

/// Text before the first `*`, if the query has one.
pub fn prefix_text(query: &str) -> Option<&str> {
    query.find('*').map(|idx| query[..idx].trim())
}

/// Content of the first matched `'...'` pair, else of the first `"..."` pair.
pub fn phrase_text(query: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        let left = query.find(quote)?;
        let rest = &query[left + 1..];
        let right = rest.find(quote)?;
        Some(&rest[..right])
    })
}

/// Split on the rightmost operator occurrence, giving `(left, op, right)`.
pub fn split_rightmost(query: &str) -> Option<(&str, BooleanOp, &str)> {
    BooleanOp::ALL
        .iter()
        .filter_map(|op| query.rfind(op.token()).map(|idx| (idx, *op)))
        .max_by_key(|(idx, _)| *idx)
        .map(|(idx, op)| (&query[..idx], op, &query[idx + op.token().len()..]))
}
