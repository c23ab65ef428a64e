//! Boolean set queries over an [`InvertedIndex`].
//!
//! Queries combine terms with `AND`, `OR`, `NOT` and parentheses. Keywords are
//! case-sensitive; every other token is a term, canonicalized through the
//! [`Lemmatizer`] before its postings are looked up.
//!
//! Evaluation is a two-stack scan. `AND` (priority 2) and `OR` (priority 1)
//! go through the operator stack. `NOT` never does: it is resolved as soon as
//! it is seen, against the next term or the next parenthesized group, and the
//! complement is pushed as an ordinary operand. `a OR NOT b AND c` therefore
//! evaluates as `a OR ((NOT b) AND c)`.

use crate::error::QueryError;
use crate::lemmatizer::Lemmatizer;
use crate::{DocId, InvertedIndex};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref PAREN: Regex = Regex::new(r"[()]").expect("valid regex");
}

type DocSet = BTreeSet<DocId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
    Open,
}

impl Op {
    fn priority(self) -> u8 {
        match self {
            Op::And => 2,
            Op::Or => 1,
            Op::Open => 0,
        }
    }
}

/// Splits a query into keyword, parenthesis and term tokens.
pub fn tokenize_query(query: &str) -> Vec<String> {
    PAREN
        .replace_all(query, " $0 ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub struct BooleanSearcher<'a, L: ?Sized> {
    index: &'a InvertedIndex,
    lemmatizer: &'a L,
}

impl<'a, L: Lemmatizer + ?Sized> BooleanSearcher<'a, L> {
    pub fn new(index: &'a InvertedIndex, lemmatizer: &'a L) -> Self {
        Self { index, lemmatizer }
    }

    /// Matching document ids, sorted as strings. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Result<Vec<DocId>, QueryError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tokens = tokenize_query(query);
        let result = self.evaluate(&tokens)?;
        tracing::debug!(query, hits = result.len(), "boolean search");
        Ok(result.into_iter().collect())
    }

    fn evaluate(&self, tokens: &[String]) -> Result<DocSet, QueryError> {
        let mut operands: Vec<DocSet> = Vec::new();
        let mut operators: Vec<Op> = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i].as_str() {
                "(" => operators.push(Op::Open),
                ")" => loop {
                    match operators.pop() {
                        Some(Op::Open) => break,
                        Some(op) => apply(op, &mut operands)?,
                        None => return Err(QueryError::UnbalancedParentheses),
                    }
                },
                kw @ ("AND" | "OR") => {
                    let op = if kw == "AND" { Op::And } else { Op::Or };
                    while let Some(&top) = operators.last() {
                        if top == Op::Open || top.priority() < op.priority() {
                            break;
                        }
                        operators.pop();
                        apply(top, &mut operands)?;
                    }
                    operators.push(op);
                }
                "NOT" => {
                    let (negated, last) = self.negate(tokens, i + 1)?;
                    operands.push(negated);
                    i = last;
                }
                term => operands.push(self.lookup(term)),
            }
            i += 1;
        }

        while let Some(op) = operators.pop() {
            apply(op, &mut operands)?;
        }

        let result = operands.pop().unwrap_or_default();
        if !operands.is_empty() {
            return Err(QueryError::MissingOperator(operands.len() + 1));
        }
        Ok(result)
    }

    /// Complements the operand starting at `at`; returns it with the index of
    /// the last token it consumed.
    fn negate(&self, tokens: &[String], at: usize) -> Result<(DocSet, usize), QueryError> {
        match tokens.get(at).map(String::as_str) {
            None | Some(")" | "AND" | "OR" | "NOT") => Err(QueryError::MissingOperand("NOT")),
            Some("(") => {
                let close = matching_paren(tokens, at).ok_or(QueryError::UnbalancedParentheses)?;
                let inner = self.evaluate(&tokens[at + 1..close])?;
                Ok((self.complement(&inner), close))
            }
            Some(term) => Ok((self.complement(&self.lookup(term)), at)),
        }
    }

    fn lookup(&self, term: &str) -> DocSet {
        let lemma = self.lemmatizer.normalize(term);
        self.index.postings(&lemma).cloned().unwrap_or_default()
    }

    fn complement(&self, docs: &DocSet) -> DocSet {
        self.index.documents().difference(docs).cloned().collect()
    }
}

fn matching_paren(tokens: &[String], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, token) in tokens.iter().enumerate().skip(open) {
        match token.as_str() {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}

fn apply(op: Op, operands: &mut Vec<DocSet>) -> Result<(), QueryError> {
    let name = match op {
        Op::And => "AND",
        Op::Or => "OR",
        Op::Open => return Err(QueryError::UnbalancedParentheses),
    };
    let (Some(right), Some(mut left)) = (operands.pop(), operands.pop()) else {
        return Err(QueryError::MissingOperand(name));
    };
    match op {
        Op::And => left.retain(|d| right.contains(d)),
        _ => left.extend(right),
    }
    operands.push(left);
    Ok(())
}
