//! Query predicates: `col op value [conn col op value]...`.

use std::fmt;

use crate::error::{ModuleError, Result};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Greater,
    Less,
    Equal,
    GreaterOrEqual,
    LessOrEqual,
}

impl Operator {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            ">" => Some(Operator::Greater),
            "<" => Some(Operator::Less),
            "=" => Some(Operator::Equal),
            ">=" => Some(Operator::GreaterOrEqual),
            "<=" => Some(Operator::LessOrEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::Equal => "=",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
    /// Excludes the next condition: rendered as `AND NOT`.
    Not,
}

impl Connective {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "AND" => Some(Connective::And),
            "OR" => Some(Connective::Or),
            "NOT" => Some(Connective::Not),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Not => "AND NOT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    /// The number exactly as typed.
    pub value: String,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator.as_str(), self.value)
    }
}

/// A validated `WHERE` clause over numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    first: Condition,
    rest: Vec<(Connective, Condition)>,
}

impl Predicate {
    /// Validate `tokens` against the columns the user could pick from.
    pub fn parse(tokens: &[String], columns: &[String]) -> Result<Self> {
        if tokens.len() < 3 || (tokens.len() - 3) % 4 != 0 {
            return Err(ModuleError::validation(
                "A query is 'column operator value', optionally followed by 'AND|OR|NOT column operator value'.",
            ));
        }

        let first = condition(&tokens[..3], columns)?;
        let rest = tokens[3..]
            .chunks(4)
            .map(|chunk| {
                let connective = Connective::parse(&chunk[0]).ok_or_else(|| {
                    ModuleError::validation(format!(
                        "Unknown connective '{}'. Use AND, OR or NOT.",
                        chunk[0]
                    ))
                })?;
                Ok((connective, condition(&chunk[1..], columns)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { first, rest })
    }

    /// Column whose statistics are reported.
    pub fn query_column(&self) -> &str {
        &self.first.column
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, c)| c))
    }
}

fn condition(tokens: &[String], columns: &[String]) -> Result<Condition> {
    let column = tokens[0].trim();
    if !columns.iter().any(|c| c == column) {
        return Err(ModuleError::validation(format!(
            "'{}' is not a numeric column of the selected map.",
            column
        )));
    }
    let operator = Operator::parse(tokens[1].trim()).ok_or_else(|| {
        ModuleError::validation(format!(
            "Unknown operator '{}'. Use >, <, =, >= or <=.",
            tokens[1]
        ))
    })?;
    let value = tokens[2].trim();
    if validate::number(value).is_none() {
        return Err(ModuleError::validation(format!("'{}' is not a number.", value)));
    }

    Ok(Condition {
        column: column.to_string(),
        operator,
        value: value.to_string(),
    })
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (connective, condition) in &self.rest {
            write!(f, " {} {}", connective.as_sql(), condition)?;
        }
        Ok(())
    }
}
