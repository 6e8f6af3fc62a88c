//! Valutazione dei filtri per [`MemoryStore`](super::MemoryStore): uguaglianza,
//! operatori di campo e `$and`/`$or`/`$nor`. Operatori `$` sconosciuti sono errori.
//!
//! `$regex` usa il crate `regex`, non PCRE come MongoDB: lookaround e
//! backreference (`(?=..)`, `\1`) vengono rifiutati con `InvalidRegex`.

use std::cmp::Ordering;

use mongodb::bson::{Bson, Document, Regex as BsonRegex};
use regex::{Regex, RegexBuilder};

use super::StoreError;

/// Whether `doc` satisfies `filter`.
pub fn matches(doc: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (key, cond) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(key, cond)? {
                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => any_clause(doc, key, cond)?,
            "$nor" => !any_clause(doc, key, cond)?,
            op if op.starts_with('$') => return Err(StoreError::UnknownOperator(op.to_string())),
            path => matches_condition(lookup(doc, path), cond)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(op: &str, cond: &'a Bson) -> Result<Vec<&'a Document>, StoreError> {
    let Bson::Array(items) = cond else {
        return Err(StoreError::BadQuery(format!("{op} must be an array")));
    };
    if items.is_empty() {
        return Err(StoreError::BadQuery(format!("{op} must be a nonempty array")));
    }
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => Ok(d),
            _ => Err(StoreError::BadQuery(format!("{op} entries must be objects"))),
        })
        .collect()
}

fn any_clause(doc: &Document, op: &str, cond: &Bson) -> Result<bool, StoreError> {
    for clause in clauses(op, cond)? {
        if matches(doc, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Resolves a dotted path through nested documents.
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        match current {
            Bson::Document(inner) => current = inner.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

fn is_operator_document(cond: &Bson) -> Option<&Document> {
    match cond {
        Bson::Document(d) if d.keys().next().is_some_and(|k| k.starts_with('$')) => Some(d),
        _ => None,
    }
}

fn matches_condition(value: Option<&Bson>, cond: &Bson) -> Result<bool, StoreError> {
    match is_operator_document(cond) {
        Some(ops) => matches_operators(value, ops),
        None => match cond {
            Bson::RegularExpression(re) => regex_matches(value, &compile_bson(re)?),
            _ => Ok(equals(value, cond)),
        },
    }
}

fn matches_operators(value: Option<&Bson>, ops: &Document) -> Result<bool, StoreError> {
    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => compare(value, operand, |o| o == Ordering::Greater),
            "$gte" => compare(value, operand, |o| o != Ordering::Less),
            "$lt" => compare(value, operand, |o| o == Ordering::Less),
            "$lte" => compare(value, operand, |o| o != Ordering::Greater),
            "$in" => in_list(value, op, operand)?,
            "$nin" => !in_list(value, op, operand)?,
            "$exists" => value.is_some() == truthy(operand),
            "$regex" => {
                let options = match ops.get("$options") {
                    None => "",
                    Some(Bson::String(s)) => s.as_str(),
                    Some(_) => return Err(StoreError::BadQuery("$options has to be a string".into())),
                };
                regex_matches(value, &compile_operand(operand, options)?)?
            }
            "$options" => {
                if !ops.contains_key("$regex") {
                    return Err(StoreError::BadQuery("$options needs a $regex".into()));
                }
                true
            }
            "$not" => match operand {
                Bson::Document(inner) => !matches_operators(value, inner)?,
                Bson::RegularExpression(re) => !regex_matches(value, &compile_bson(re)?)?,
                _ => return Err(StoreError::BadQuery("$not needs a regex or a document".into())),
            },
            other if other.starts_with('$') => return Err(StoreError::UnknownOperator(other.to_string())),
            other => {
                return Err(StoreError::BadQuery(format!(
                    "cannot mix operators and fields in a condition (found {other})"
                )))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn in_list(value: Option<&Bson>, op: &str, operand: &Bson) -> Result<bool, StoreError> {
    let Bson::Array(items) = operand else {
        return Err(StoreError::BadQuery(format!("{op} needs an array")));
    };
    for item in items {
        let hit = match item {
            Bson::RegularExpression(re) => regex_matches(value, &compile_bson(re)?)?,
            _ => equals(value, item),
        };
        if hit {
            return Ok(true);
        }
    }
    Ok(false)
}

fn truthy(b: &Bson) -> bool {
    match b {
        Bson::Boolean(v) => *v,
        Bson::Null | Bson::Undefined => false,
        Bson::Int32(v) => *v != 0,
        Bson::Int64(v) => *v != 0,
        Bson::Double(v) => *v != 0.0,
        _ => true,
    }
}

/// Equality with store semantics: `null` matches missing, arrays match per element.
fn equals(value: Option<&Bson>, target: &Bson) -> bool {
    match value {
        None => matches!(target, Bson::Null),
        Some(v) => {
            if scalar_eq(v, target) {
                return true;
            }
            match v {
                Bson::Array(items) => items.iter().any(|item| scalar_eq(item, target)),
                _ => false,
            }
        }
    }
}

fn as_number(b: &Bson) -> Option<f64> {
    match b {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn scalar_eq(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a, b) {
            (Bson::Null | Bson::Undefined, Bson::Null | Bson::Undefined) => true,
            _ => a == b,
        },
    }
}

/// Range comparison; values of different types never compare.
fn compare(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let Some(value) = value else {
        return false;
    };
    let candidates: Vec<&Bson> = match value {
        Bson::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    candidates
        .into_iter()
        .any(|v| order(v, operand).is_some_and(&accept))
}

fn order(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        _ => None,
    }
}

fn compile_bson(re: &BsonRegex) -> Result<Regex, StoreError> {
    compile(&re.pattern, &re.options)
}

fn compile_operand(operand: &Bson, options: &str) -> Result<Regex, StoreError> {
    match operand {
        Bson::String(pattern) => compile(pattern, options),
        Bson::RegularExpression(re) if options.is_empty() => compile_bson(re),
        Bson::RegularExpression(re) => compile(&re.pattern, options),
        _ => Err(StoreError::BadQuery("$regex has to be a string".into())),
    }
}

pub(crate) fn compile(pattern: &str, options: &str) -> Result<Regex, StoreError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in options.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => return Err(StoreError::BadQuery(format!("invalid flag in regex options: {other}"))),
        };
    }
    Ok(builder.build()?)
}

/// Regexes only ever match strings (or string elements of an array).
fn regex_matches(value: Option<&Bson>, re: &Regex) -> Result<bool, StoreError> {
    Ok(match value {
        Some(Bson::String(s)) => re.is_match(s),
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Bson::String(s) if re.is_match(s))),
        _ => false,
    })
}
