//! Response contract: turn the model's text into an [`ExtractionResult`].
//!
//! Models wrap JSON in ```` ```json ```` fences even when told not to, so
//! every fence marker is removed and the remainder trimmed before a strict
//! `serde_json` parse. There is no partial recovery: either the whole
//! document matches the shape or the caller gets a [`ContractError`]
//! holding the untouched original text.
//!
//! Under [`Strictness::Strict`] the parsed value is also checked field by
//! field: risk labels must be Low/Medium/High and amounts non-negative.

use crate::config::Strictness;
use crate::error::ContractError;
use crate::output::ExtractionResult;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

/// Remove every code-fence marker (optionally tagged `json`) and trim.
pub fn strip_code_fences(input: &str) -> String {
    RE_FENCE.replace_all(input, "").trim().to_string()
}

/// Parse the model's raw answer.
pub fn parse_extraction(
    raw: &str,
    strictness: Strictness,
) -> Result<ExtractionResult, ContractError> {
    let reject = |detail: String| ContractError {
        detail,
        raw: raw.to_string(),
    };

    let cleaned = strip_code_fences(raw);
    let result: ExtractionResult =
        serde_json::from_str(&cleaned).map_err(|e| reject(e.to_string()))?;

    if strictness == Strictness::Strict {
        validate(&result).map_err(reject)?;
    }
    Ok(result)
}

fn validate(result: &ExtractionResult) -> Result<(), String> {
    for (idx, item) in result.items.iter().enumerate() {
        if !item.risk_factor.is_recognized() {
            return Err(format!(
                "items[{idx}].risk_factor must be Low, Medium or High, got '{}'",
                item.risk_factor
            ));
        }
        if item.estimated_price_inr < 0.0 {
            return Err(format!(
                "items[{idx}].estimated_price_inr must not be negative, got {}",
                item.estimated_price_inr
            ));
        }
    }
    if result.total_value < 0.0 {
        return Err(format!("total_value must not be negative, got {}", result.total_value));
    }
    if result.recommended_coverage < 0.0 {
        return Err(format!(
            "recommended_coverage must not be negative, got {}",
            result.recommended_coverage
        ));
    }
    Ok(())
}
