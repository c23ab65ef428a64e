use thiserror::Error;

use crate::DocId;

/// Errors surfaced while evaluating a boolean query.
///
/// Well-formed queries never produce these; they replace the empty-stack
/// failures a malformed expression would otherwise hit mid-evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unbalanced parentheses in query")]
    UnbalancedParentheses,
    #[error("operator `{0}` is missing an operand")]
    MissingOperand(&'static str),
    #[error("query has {0} operands left without an operator joining them")]
    MissingOperator(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Re-adding an id would mix old and new postings; remove it first.
    #[error("document `{0}` is already indexed")]
    DuplicateDocument(DocId),
}
