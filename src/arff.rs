//! ARFF text format: `@RELATION`, `@ATTRIBUTE`, `@DATA`, `%` comments,
//! `?`/blank/`NA` missing values.
//!
//! Grounded on `storage/csv.rs`'s reader/writer shape (an `Options`
//! struct, a `load`/`load_with_options` pair, line-oriented parsing via
//! `BufRead::lines`) adapted to the ARFF grammar instead of CSV.

use crate::attribute::{Attribute, AttributeType};
use crate::dataset::Dataset;
use crate::error::{RuleInductionError, RuleInductionResult};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Parsing/writing knobs. Only one so far (which column holds the
/// decision class); kept as a struct so future options (delimiter,
/// sparse format) don't change the function signature.
#[derive(Debug, Clone)]
pub struct ArffOptions {
    /// Name of the attribute to treat as the decision column. `None`
    /// means "the last declared attribute", ARFF's usual convention.
    pub decision_attribute_name: Option<String>,
}

impl Default for ArffOptions {
    fn default() -> Self {
        ArffOptions {
            decision_attribute_name: None,
        }
    }
}

/// Loads a [`Dataset`] from an ARFF file.
pub fn load_from_arff<P: AsRef<Path>>(path: P) -> RuleInductionResult<Dataset> {
    load_from_arff_with_options(path, &ArffOptions::default())
}

pub fn load_from_arff_with_options<P: AsRef<Path>>(
    path: P,
    options: &ArffOptions,
) -> RuleInductionResult<Dataset> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    parse_arff(reader.lines(), options)
}

fn parse_arff(
    lines: impl Iterator<Item = std::io::Result<String>>,
    options: &ArffOptions,
) -> RuleInductionResult<Dataset> {
    let mut relation_name = String::from("relation");
    let mut declared_attributes: Vec<Attribute> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut in_data = false;

    for line in lines {
        let line = line?;
        let trimmed = strip_comment(&line).trim();
        if trimmed.is_empty() {
            continue;
        }

        if !in_data {
            let lower = trimmed.to_ascii_lowercase();
            if let Some(rest) = lower.strip_prefix("@relation") {
                relation_name = trimmed[trimmed.len() - rest.trim().len()..].trim().to_string();
            } else if lower.starts_with("@attribute") {
                declared_attributes.push(parse_attribute_declaration(trimmed)?);
            } else if lower.starts_with("@data") {
                in_data = true;
            } else {
                return Err(RuleInductionError::ParseError(format!(
                    "unexpected line before @DATA: \"{trimmed}\""
                )));
            }
        } else {
            rows.push(split_data_row(trimmed));
        }
    }

    if declared_attributes.is_empty() {
        return Err(RuleInductionError::ParseError(
            "ARFF file declares no attributes".to_string(),
        ));
    }

    let decision_index = match &options.decision_attribute_name {
        Some(name) => declared_attributes
            .iter()
            .position(|a| a.name() == name)
            .ok_or_else(|| {
                RuleInductionError::SchemaMismatch(format!("unknown decision attribute \"{name}\""))
            })?,
        None => declared_attributes.len() - 1,
    };

    let decision_attribute = declared_attributes.remove(decision_index);
    if decision_attribute.attribute_type() != AttributeType::Nominal {
        return Err(RuleInductionError::SchemaMismatch(
            "decision attribute must be nominal".to_string(),
        ));
    }

    let mut dataset = Dataset::new(relation_name, decision_attribute.clone());
    let num_conditional = declared_attributes.len();
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(rows.len()); num_conditional];
    let mut decision_values: Vec<f64> = Vec::with_capacity(rows.len());

    for row in &rows {
        if row.len() != num_conditional + 1 {
            return Err(RuleInductionError::ShapeMismatch {
                expected: num_conditional + 1,
                actual: row.len(),
            });
        }
        for (row_index, raw) in row.iter().enumerate() {
            if row_index == decision_index {
                continue;
            }
            let conditional_index = if row_index < decision_index {
                row_index
            } else {
                row_index - 1
            };
            columns[conditional_index].push(declared_attributes[conditional_index].encode(raw)?);
        }
        decision_values.push(decision_attribute.encode(&row[decision_index])?);
    }

    for (attribute, values) in declared_attributes.into_iter().zip(columns) {
        dataset.add_attribute(values, attribute)?;
    }
    dataset.add_decision(decision_values)?;

    Ok(dataset)
}

fn strip_comment(line: &str) -> &str {
    match line.find('%') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_attribute_declaration(line: &str) -> RuleInductionResult<Attribute> {
    let rest = &line[line.to_ascii_lowercase().find("@attribute").unwrap() + "@attribute".len()..];
    let rest = rest.trim();
    let (name, type_part) = split_name_and_type(rest)?;

    if let Some(levels_str) = type_part.trim().strip_prefix('{') {
        let levels_str = levels_str.trim_end_matches('}');
        let levels = levels_str
            .split(',')
            .map(|level| level.trim().trim_matches('\'').trim_matches('"').to_string())
            .collect();
        Ok(Attribute::nominal(name, levels))
    } else {
        let type_name = type_part.trim().to_ascii_lowercase();
        match type_name.as_str() {
            "numeric" | "real" | "integer" => Ok(Attribute::numerical(name)),
            other => Err(RuleInductionError::ParseError(format!(
                "unsupported ARFF attribute type \"{other}\""
            ))),
        }
    }
}

fn split_name_and_type(rest: &str) -> RuleInductionResult<(String, String)> {
    let rest = rest.trim();
    if let Some(stripped) = rest.strip_prefix('\'').or_else(|| rest.strip_prefix('"')) {
        let quote = rest.chars().next().unwrap();
        let end = stripped.find(quote).ok_or_else(|| {
            RuleInductionError::ParseError(format!("unterminated quoted attribute name in \"{rest}\""))
        })?;
        let name = stripped[..end].to_string();
        let type_part = stripped[end + 1..].trim().to_string();
        Ok((name, type_part))
    } else {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts
            .next()
            .ok_or_else(|| RuleInductionError::ParseError("missing attribute name".to_string()))?
            .to_string();
        let type_part = parts.next().unwrap_or("").to_string();
        Ok((name, type_part))
    }
}

fn split_data_row(line: &str) -> Vec<String> {
    line.split(',').map(|field| field.trim().to_string()).collect()
}

/// Writes `dataset` back out as ARFF text.
pub fn save_to_arff<P: AsRef<Path>>(path: P, dataset: &Dataset) -> RuleInductionResult<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "@RELATION {}", dataset.name())?;
    writeln!(file)?;
    for attribute in dataset.conditional_attributes() {
        writeln!(file, "{}", attribute_declaration(attribute))?;
    }
    writeln!(file, "{}", attribute_declaration(dataset.decision_attribute()))?;
    writeln!(file)?;
    writeln!(file, "@DATA")?;
    for example in dataset.examples() {
        let mut fields: Vec<String> = example
            .attributes()
            .iter()
            .enumerate()
            .map(|(idx, &value)| dataset.conditional_attribute(idx).decode(value))
            .collect();
        fields.push(dataset.decision_attribute().decode(example.decision()));
        writeln!(file, "{}", fields.join(","))?;
    }
    Ok(())
}

fn attribute_declaration(attribute: &Attribute) -> String {
    if attribute.is_nominal() {
        format!("@ATTRIBUTE {} {{{}}}", attribute.name(), attribute.levels().join(","))
    } else {
        format!("@ATTRIBUTE {} NUMERIC", attribute.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "@RELATION iris\n\n@ATTRIBUTE sepal_length NUMERIC\n@ATTRIBUTE species {setosa,versicolor}\n\n@DATA\n5.1,setosa\n? ,versicolor\n";

    #[test]
    fn test_parse_basic_arff() {
        let lines = SAMPLE.lines().map(|l| Ok(l.to_string()));
        let dataset = parse_arff(lines, &ArffOptions::default()).unwrap();
        assert_eq!(dataset.name(), "iris");
        assert_eq!(dataset.num_examples(), 2);
        assert_eq!(dataset.num_conditional_attributes(), 1);
        assert_eq!(dataset.example(0).attribute(0), 5.1);
        assert_eq!(dataset.example(0).decision(), 0.0);
        assert!(dataset.example(1).attribute(0).is_nan());
    }

    #[test]
    fn test_missing_attributes_errors() {
        let lines = "@DATA\n1,2\n".lines().map(|l| Ok(l.to_string()));
        let err = parse_arff(lines, &ArffOptions::default()).unwrap_err();
        assert!(matches!(err, RuleInductionError::ParseError(_)));
    }

    #[test]
    fn test_row_shape_mismatch_errors() {
        let bad = "@RELATION r\n@ATTRIBUTE x NUMERIC\n@ATTRIBUTE y {a,b}\n@DATA\n1\n";
        let lines = bad.lines().map(|l| Ok(l.to_string()));
        let err = parse_arff(lines, &ArffOptions::default()).unwrap_err();
        assert!(matches!(err, RuleInductionError::ShapeMismatch { .. }));
    }
}
