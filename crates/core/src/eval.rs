use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::model::{Blob, ClassificationResult};

pub const EXPECT_EXCLUDED: &str = "excluded";
pub const EXPECT_UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSuite {
    pub cases: Vec<EvaluationCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationCase {
    #[serde(default)]
    pub name: Option<String>,
    pub path: String,
    pub expected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub total_cases: usize,
    pub passed_cases: usize,
    pub accuracy: f32,
    pub case_results: Vec<EvaluationCaseResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationCaseResult {
    pub name: String,
    pub path: String,
    pub expected: String,
    pub observed: String,
    #[serde(default)]
    pub detail: Option<String>,
    pub passed: bool,
}

impl EvaluationResult {
    pub fn failures(&self) -> impl Iterator<Item = &EvaluationCaseResult> {
        self.case_results.iter().filter(|case| !case.passed)
    }
}

pub fn evaluate_suite_file(path: &Path, classifier: &Classifier) -> Result<EvaluationResult> {
    let suite_text = fs::read_to_string(path)
        .with_context(|| format!("failed to read evaluation suite {}", path.display()))?;
    let suite: EvaluationSuite = serde_json::from_str(&suite_text)
        .with_context(|| format!("failed to parse evaluation suite {}", path.display()))?;
    Ok(evaluate_suite(&suite, classifier))
}

pub fn evaluate_suite(suite: &EvaluationSuite, classifier: &Classifier) -> EvaluationResult {
    let mut case_results = Vec::new();
    let mut passed_cases = 0_usize;

    for case in &suite.cases {
        let (observed, detail) = match Blob::from_relative(Path::new(&case.path)) {
            Ok(blob) => {
                let result = classifier.classify_file(&blob);
                let detail = match &result {
                    ClassificationResult::Excluded(rule) => Some(rule.to_string()),
                    _ => None,
                };
                (outcome_label(&result).to_string(), detail)
            }
            Err(err) => ("invalid".to_string(), Some(err.to_string())),
        };

        let passed = observed == case.expected;
        if passed {
            passed_cases += 1;
        }

        case_results.push(EvaluationCaseResult {
            name: case.name.clone().unwrap_or_else(|| case.path.clone()),
            path: case.path.clone(),
            expected: case.expected.clone(),
            observed,
            detail,
            passed,
        });
    }

    let total_cases = suite.cases.len();
    EvaluationResult {
        total_cases,
        passed_cases,
        accuracy: if total_cases == 0 {
            0.0
        } else {
            passed_cases as f32 / total_cases as f32
        },
        case_results,
    }
}

pub fn outcome_label<'a>(result: &ClassificationResult<'a>) -> &'a str {
    match *result {
        ClassificationResult::Excluded(_) => EXPECT_EXCLUDED,
        ClassificationResult::Categorized(section) => section.name(),
        ClassificationResult::Uncategorized => EXPECT_UNCATEGORIZED,
    }
}
