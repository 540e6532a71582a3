/// Output formatting: terminal tables and JSON.
use std::collections::BTreeMap;

use kidrank_core::{Item, TierBuckets};
use serde::Serialize;

#[derive(Serialize)]
struct JsonItem {
    name: String,
    category: String,
    rating: f64,
    comparisons: u32,
    confidence: f64,
}

#[derive(Serialize)]
struct JsonOutput {
    loves: Vec<JsonItem>,
    likes: Vec<JsonItem>,
    passes: Vec<JsonItem>,
    uncategorized: Vec<JsonItem>,
    category_scores: BTreeMap<String, i64>,
    rising: Vec<String>,
}

fn json_items(items: &[Item]) -> Vec<JsonItem> {
    items
        .iter()
        .map(|i| JsonItem {
            name: i.name.clone(),
            category: i.category.clone(),
            rating: i.rating,
            comparisons: i.comparisons,
            confidence: i.confidence(),
        })
        .collect()
}

fn print_section(title: &str, items: &[Item], name_width: usize) {
    if items.is_empty() {
        return;
    }
    println!("{title}");
    for item in items {
        println!(
            "  {:<name_width$} | {:<12} | {:>6} | {:>4} cmp | {:>5.1}%",
            item.name,
            item.category,
            item.rating,
            item.comparisons,
            item.confidence(),
        );
    }
    println!();
}

/// Print the tiered view as a terminal table, with category leanings and
/// trend hints underneath.
pub fn print_tiers(buckets: &TierBuckets, scores: &BTreeMap<String, i64>, rising: &[Item]) {
    if buckets.is_empty() {
        println!("No interests recorded yet.");
        return;
    }

    let name_width = buckets
        .loves
        .iter()
        .chain(&buckets.likes)
        .chain(&buckets.passes)
        .chain(&buckets.uncategorized)
        .map(|i| i.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    print_section("Loves", &buckets.loves, name_width);
    print_section("Likes", &buckets.likes, name_width);
    print_section("Passes", &buckets.passes, name_width);
    print_section("Not enough data yet", &buckets.uncategorized, name_width);

    if !scores.is_empty() {
        let leanings: Vec<String> = scores
            .iter()
            .map(|(category, score)| format!("{category} {score}%"))
            .collect();
        println!("Leans: {}", leanings.join(", "));
    }
    if !rising.is_empty() {
        let names: Vec<&str> = rising.iter().map(|i| i.name.as_str()).collect();
        println!("Trending up: {}", names.join(", "));
    }
}

/// Print the tiered view as JSON.
pub fn print_json(buckets: &TierBuckets, scores: &BTreeMap<String, i64>, rising: &[Item]) {
    let output = JsonOutput {
        loves: json_items(&buckets.loves),
        likes: json_items(&buckets.likes),
        passes: json_items(&buckets.passes),
        uncategorized: json_items(&buckets.uncategorized),
        category_scores: scores.clone(),
        rising: rising.iter().map(|i| i.name.clone()).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}
