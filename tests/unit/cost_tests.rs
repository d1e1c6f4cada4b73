/*!
 * Tests for up-front cost estimation
 */

use opensubtrans::errors::ConfigError;
use opensubtrans::translation::cost::{CostEstimator, ModelPricing, PricingTable};

use crate::common;

#[test]
fn test_estimate_withDefaultTable_shouldPriceGpt5Mini() {
    let entries = common::numbered_entries(30);
    let estimate = CostEstimator::new("French")
        .estimate_with_table(&entries, &PricingTable::default(), "gpt-5-mini", 10)
        .unwrap();

    assert_eq!(estimate.batch_count, 3);
    assert_eq!(estimate.total_texts, 30);
    assert!(estimate.total_cost > 0.0);
    let expected = estimate.estimated_input_tokens as f64 * 0.25 / 1e6 + estimate.estimated_output_tokens as f64 * 2.0 / 1e6;
    assert!((estimate.total_cost - expected).abs() < 1e-12);
}

#[test]
fn test_estimate_withSmallerBatches_shouldNeverCostLess() {
    let entries = common::numbered_entries(48);
    let estimator = CostEstimator::new("Japanese");
    let pricing = ModelPricing::new(1.25, 10.0);

    let mut previous = f64::MAX;
    for batch_size in [1usize, 2, 4, 8, 16, 48] {
        let cost = estimator.estimate(&entries, "gpt-5", &pricing, batch_size).total_cost;
        assert!(cost <= previous, "batch size {} cost {} exceeds {}", batch_size, cost, previous);
        previous = cost;
    }
}

#[test]
fn test_estimate_withMoreText_shouldNeverCostLess() {
    let estimator = CostEstimator::new("Spanish");
    let pricing = ModelPricing::new(0.25, 2.0);
    let short = common::numbered_entries(10);
    let long = common::numbered_entries(20);

    assert!(estimator.estimate(&long, "m", &pricing, 5).total_cost >= estimator.estimate(&short, "m", &pricing, 5).total_cost);
}

#[test]
fn test_estimateWithTable_withUnknownModel_shouldFail() {
    let result = CostEstimator::new("French").estimate_with_table(&common::numbered_entries(3), &PricingTable::empty(), "gpt-5", 3);
    assert!(matches!(result, Err(ConfigError::UnknownModel(m)) if m == "gpt-5"));
}

#[test]
fn test_pricingTable_merge_shouldOverrideAndExtend() {
    let mut table = PricingTable::default();
    let mut custom = PricingTable::empty();
    custom.insert("gpt-5-mini", ModelPricing::new(0.5, 4.0));
    custom.insert("local", ModelPricing::new(0.0, 0.0));

    table.merge(&custom);

    assert_eq!(table.get("gpt-5-mini").unwrap().input_per_million, 0.5);
    assert_eq!(table.get("gpt-5").unwrap().output_per_million, 10.0);
    assert_eq!(table.models().count(), 3);
}

#[test]
fn test_costEstimate_display_shouldListTotals() {
    let estimate = CostEstimator::new("German").estimate(&common::numbered_entries(2), "gpt-5", &ModelPricing::new(1.25, 10.0), 2);
    let text = estimate.to_string();

    assert!(text.contains("Model: gpt-5"));
    assert!(text.contains("Batches: 1"));
    assert!(text.contains("Estimated cost: $"));
}
