//! Extraction prompt sent alongside the uploaded video.
//!
//! The prompt is the other half of the JSON contract enforced by
//! [`crate::pipeline::contract`]: field names here and serde names on
//! [`crate::output::ExtractionResult`] must stay in lock-step. The tests
//! below check that.
//!
//! Callers can override it via [`crate::config::AnalyzerConfig::prompt`].

/// Default extraction instruction.
pub const UNDERWRITER_PROMPT: &str = r#"You are an expert Insurance Underwriter for the Indian market. Analyze this video. Identify visible high-value assets (Electronics, Furniture, Art, etc.).
For each item:
1. Identify Name (Specific model if possible).
2. Assess Condition ('New', 'Used', 'Damaged').
3. Estimate Price in INR (Indian Rupees) as a whole number.
4. Assign Risk Level ('Low', 'Medium', 'High').

Return ONLY valid JSON with this structure:
{
  "items": [
    { "name": "...", "category": "...", "condition": "...", "estimated_price_inr": 0, "risk_factor": "..." }
  ],
  "total_value": 0,
  "recommended_coverage": 0
}
"total_value" is the sum of all estimated_price_inr values.
"recommended_coverage" is the sum insured you recommend for these assets.
Do not include markdown formatting or code blocks. Just the raw JSON string."#;
