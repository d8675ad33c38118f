//! Text and JSON output for the `foodlens` commands.

use foodlens_core::analysis::{DetailView, NutritionState};
use foodlens_core::progress::ProgressDisplay;
use foodlens_core::state::ResultState;
use providers::Tip;
use std::collections::HashSet;
use storage::AnalyzeHistory;

pub fn detail_lines(view: &DetailView) -> Vec<String> {
    let mut lines = Vec::new();
    let dash = "-";
    lines.push(format!("result:      {}", view.title.as_deref().unwrap_or(dash)));
    lines.push(format!("food:        {}", view.description.as_deref().unwrap_or(dash)));
    lines.push(format!("confidence:  {}", view.score));
    lines.push(format!("image:       {}", view.image.as_deref().unwrap_or(dash)));
    if let Some(rec) = &view.recommendation {
        lines.push(format!("advice:      {}", rec));
    }
    lines
}

pub fn nutrition_line(state: &NutritionState) -> String {
    match state {
        ResultState::Loading => "nutrition:   loading...".to_string(),
        ResultState::Success(Some(data)) => match data.calories {
            Some(kcal) => format!("nutrition:   {} kcal", kcal),
            None => "nutrition:   no calorie data".to_string(),
        },
        ResultState::Success(None) => "nutrition:   food not found".to_string(),
        ResultState::Error(msg) => format!("nutrition:   error: {}", msg),
    }
}

pub fn progress_line(display: &ProgressDisplay) -> String {
    let width = 20usize;
    let filled = (display.fraction() * width as f32).round() as usize;
    format!(
        "today: {} kcal [{}{}]",
        display.label(),
        "#".repeat(filled.min(width)),
        ".".repeat(width - filled.min(width))
    )
}

pub fn history_line(row: &AnalyzeHistory) -> String {
    let nutrition = if row.nutrition.is_empty() {
        "-"
    } else {
        row.nutrition.as_str()
    };
    format!(
        "#{} {} ({}%) nutrition={} image={}",
        row.id, row.analyze_result, row.confidence_score, nutrition, row.image_uri
    )
}

pub fn tip_line(tip: &Tip) -> String {
    match &tip.description {
        Some(d) if !d.is_empty() => format!("* {}: {}", tip.title, d),
        _ => format!("* {}", tip.title),
    }
}

/// Keeps only the requested keys of each JSON object (case-insensitive).
pub fn filter_fields(
    mut results: Vec<serde_json::Value>,
    fields: &[String],
) -> Vec<serde_json::Value> {
    if fields.is_empty() {
        return results;
    }
    let want: HashSet<String> = fields.iter().map(|s| s.to_lowercase()).collect();
    for r in results.iter_mut() {
        if let Some(obj) = r.as_object_mut() {
            obj.retain(|k, _| want.contains(&k.to_lowercase()));
        }
    }
    results
}
