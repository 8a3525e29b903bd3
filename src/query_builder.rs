use crate::error::GfuError;
use crate::pattern_loader::Pattern;

pub const TARGET_PLACEHOLDER: &str = "{target}";

pub fn render(template: &str, target: &str) -> String {
    template.replace(TARGET_PLACEHOLDER, target)
}

/// One query per template, in template order.
pub fn build_queries(pattern: &Pattern, target: &str) -> Vec<String> {
    pattern
        .templates
        .iter()
        .map(|template| render(template, target))
        .collect()
}

/// Allow-list entries may reference the target too (`"{target}"`).
pub fn build_valid_sites(pattern: &Pattern, target: &str) -> Vec<String> {
    pattern
        .valid_sites
        .iter()
        .map(|site| render(site, target))
        .collect()
}

/// A raw user query. The placeholder is only substituted when present, and then a
/// target is mandatory.
pub fn render_custom(query: &str, target: Option<&str>) -> Result<String, GfuError> {
    if !query.contains(TARGET_PLACEHOLDER) {
        return Ok(query.to_string());
    }
    match target {
        Some(target) => Ok(render(query, target)),
        None => Err(GfuError::MissingTarget(format!(
            "the custom query contains '{}' but no target (-t) was provided",
            TARGET_PLACEHOLDER
        ))),
    }
}
