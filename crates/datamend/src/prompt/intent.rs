//! Intent classification for analysis prompts.
//!
//! Prompts are matched against an ordered table of patterns; the first match
//! wins. Each intent then pulls its parameters (selected variable, method,
//! rendering hints) from the prompt with its own patterns.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DatamendError, Result};

/// Phrasings accepted by the classifier, shown when a prompt is not understood.
pub const ACCEPTED_PROMPTS: &str = "summarize\n\
     variability analysis where selected variable is '<column>' [distribution | as image]\n\
     missing value analysis where selected variable is '<column>' [plot]\n\
     outlier analysis where selected variable is '<column>' using <zscore | iqr>";

// =============================================================================
// Intents
// =============================================================================

/// How outliers are flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    #[default]
    ZScore,
    Iqr,
}

impl FromStr for OutlierMethod {
    type Err = DatamendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "zscore" | "z" => Ok(OutlierMethod::ZScore),
            "iqr" => Ok(OutlierMethod::Iqr),
            other => Err(DatamendError::PromptParse(format!(
                "unknown outlier method '{}'; use zscore or iqr",
                other
            ))),
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierMethod::ZScore => write!(f, "zscore"),
            OutlierMethod::Iqr => write!(f, "iqr"),
        }
    }
}

/// How a variability analysis is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariabilityView {
    /// Values over time (or row position) with mean and ±1 std bands.
    Series,
    /// Histogram of the values.
    Distribution,
    /// Static SVG line chart.
    Image,
}

/// A classified prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Summarize,
    Variability {
        column: String,
        view: VariabilityView,
    },
    MissingValues {
        column: String,
        plot: bool,
    },
    Outliers {
        column: String,
        method: OutlierMethod,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntentKind {
    Summarize,
    Variability,
    MissingValues,
    Outliers,
}

impl IntentKind {
    fn phrase(&self) -> &'static str {
        match self {
            IntentKind::Summarize => "summarize",
            IntentKind::Variability => "variability analysis",
            IntentKind::MissingValues => "missing value analysis",
            IntentKind::Outliers => "outlier analysis",
        }
    }
}

// =============================================================================
// Patterns
// =============================================================================

/// Intent triggers in priority order.
static INTENT_PATTERNS: Lazy<Vec<(IntentKind, Regex)>> = Lazy::new(|| {
    vec![
        (IntentKind::Summarize, Regex::new(r"(?i)\bsummar(?:ize|ise|y)\b").unwrap()),
        (IntentKind::Variability, Regex::new(r"(?i)\bvariability\s+analysis\b").unwrap()),
        (
            IntentKind::MissingValues,
            Regex::new(r"(?i)\bmissing[\s_-]+values?\s+analysis\b").unwrap(),
        ),
        (IntentKind::Outliers, Regex::new(r"(?i)\boutliers?\s+analysis\b").unwrap()),
    ]
});

static SELECTED_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bwhere\s+(?:the\s+)?selected\s+variable\s+is\s+(?:['"‘’“”](?P<quoted>[^'"‘’“”]+)['"‘’“”]|(?P<bare>[^\s,;'"]+))"#,
    )
    .unwrap()
});

static USING_METHOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\busing\s+(?:the\s+)?(?P<method>[\w-]+)").unwrap());

static DISTRIBUTION_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:distribution|histogram)\b").unwrap());

static IMAGE_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bas\s+(?:an?\s+)?(?:image|picture|svg)\b").unwrap());

static PLOT_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:plot|chart|graph)\b").unwrap());

// =============================================================================
// Classification
// =============================================================================

/// Classify a prompt, or fail with `PromptParse` naming what is missing.
pub fn classify(prompt: &str) -> Result<Intent> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(DatamendError::PromptParse("empty prompt".to_string()));
    }

    let kind = INTENT_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(prompt))
        .map(|(kind, _)| *kind)
        .ok_or_else(|| {
            DatamendError::PromptParse(format!(
                "'{}' does not match a known analysis",
                prompt
            ))
        })?;

    match kind {
        IntentKind::Summarize => Ok(Intent::Summarize),
        IntentKind::Variability => {
            let (column, clause) = selected_variable(prompt, kind)?;
            let rest = without(prompt, clause);
            let view = if IMAGE_HINT.is_match(&rest) {
                VariabilityView::Image
            } else if DISTRIBUTION_HINT.is_match(&rest) {
                VariabilityView::Distribution
            } else {
                VariabilityView::Series
            };
            Ok(Intent::Variability { column, view })
        }
        IntentKind::MissingValues => {
            let (column, clause) = selected_variable(prompt, kind)?;
            Ok(Intent::MissingValues {
                column,
                plot: PLOT_HINT.is_match(&without(prompt, clause)),
            })
        }
        IntentKind::Outliers => {
            let (column, clause) = selected_variable(prompt, kind)?;
            // The method follows the column name, which may itself contain "using".
            let method = match USING_METHOD.captures(&prompt[clause.end..]) {
                Some(caps) => caps["method"].parse()?,
                None => OutlierMethod::default(),
            };
            Ok(Intent::Outliers { column, method })
        }
    }
}

/// The selected column and the byte range of the clause naming it.
fn selected_variable(prompt: &str, kind: IntentKind) -> Result<(String, Range<usize>)> {
    SELECTED_VARIABLE
        .captures(prompt)
        .and_then(|caps| {
            let name = caps.name("quoted").or_else(|| caps.name("bare"))?;
            let clause = caps.get(0)?.range();
            Some((name.as_str().trim().to_string(), clause))
        })
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| {
            DatamendError::PromptParse(format!(
                "{} needs \"where selected variable is '<column>'\"",
                kind.phrase()
            ))
        })
}

/// The prompt with the selected-variable clause cut out.
fn without(prompt: &str, clause: Range<usize>) -> String {
    format!("{} {}", &prompt[..clause.start], &prompt[clause.end..])
}
