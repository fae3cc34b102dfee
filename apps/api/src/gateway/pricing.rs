//! Provider rate tables and cost accounting.
//!
//! Per-token prices are the providers' posted rates in USD per million
//! tokens. Cost is monotone non-negative; unknown models price at zero and
//! log a warning rather than failing the request.

use tracing::warn;

/// (model id, input USD/Mtok, output USD/Mtok)
const RATE_TABLE: &[(&str, f64, f64)] = &[
    ("anthropic/claude-3-5-haiku", 0.80, 4.00),
    ("anthropic/claude-sonnet-4-5", 3.00, 15.00),
    ("anthropic/claude-opus-4-1", 15.00, 75.00),
    ("openai/gpt-4o-mini", 0.15, 0.60),
    ("openai/gpt-4o", 2.50, 10.00),
];

/// Computes the USD cost of a completed call from the posted rate table.
pub fn compute_cost(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    match RATE_TABLE.iter().find(|(id, _, _)| *id == model) {
        Some((_, input_rate, output_rate)) => {
            let cost = (input_tokens as f64 / 1_000_000.0) * input_rate
                + (output_tokens as f64 / 1_000_000.0) * output_rate;
            cost.max(0.0)
        }
        None => {
            warn!(model, "no posted rate for model; costing at zero");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_model_cost() {
        // 1M input + 1M output at haiku rates
        let cost = compute_cost("anthropic/claude-3-5-haiku", 1_000_000, 1_000_000);
        assert!((cost - 4.80).abs() < 1e-9);
    }

    #[test]
    fn test_small_call_cost_is_positive() {
        let cost = compute_cost("anthropic/claude-sonnet-4-5", 1200, 800);
        assert!(cost > 0.0);
        assert!(cost < 0.02);
    }

    #[test]
    fn test_unknown_model_costs_zero() {
        assert_eq!(compute_cost("acme/unknown-model", 1000, 1000), 0.0);
    }

    #[test]
    fn test_cost_monotone_in_tokens() {
        let small = compute_cost("openai/gpt-4o", 100, 100);
        let large = compute_cost("openai/gpt-4o", 10_000, 10_000);
        assert!(large > small);
    }

    #[test]
    fn test_zero_tokens_zero_cost() {
        assert_eq!(compute_cost("openai/gpt-4o", 0, 0), 0.0);
    }
}
