//! CLI-specific outputs of the compile command
//!
//! Each emit is a pipeline stage plus a serialization (e.g. "logic", "js").

use odx_template::odx::codegen::{generate, render_javascript};
use odx_template::odx::logic::CompiledTemplate;

/// All available emit formats of `odx compile`
pub const AVAILABLE_EMITS: &[&str] = &["compiled", "logic", "dictionary", "program", "js", "diagnostics"];

/// Render a compiled template in the named format
pub fn execute_emit(compiled: &CompiledTemplate, emit: &str) -> Result<String, String> {
    match emit {
        "compiled" => serde_json::to_string_pretty(compiled)
            .map_err(|e| format!("JSON serialization failed: {}", e)),
        "logic" => compiled
            .logic
            .to_json_pretty()
            .map_err(|e| format!("JSON serialization failed: {}", e)),
        "dictionary" => serde_json::to_string_pretty(&compiled.dictionary)
            .map_err(|e| format!("JSON serialization failed: {}", e)),
        "program" => generate(&compiled.logic)
            .to_json_pretty()
            .map_err(|e| format!("Program serialization failed: {}", e)),
        "js" => Ok(render_javascript(&compiled.logic)),
        "diagnostics" => Ok(compiled
            .diagnostics
            .iter()
            .map(|d| format!("{}\n", d))
            .collect()),
        other => Err(format!(
            "Unknown emit '{}'. Available: {}",
            other,
            AVAILABLE_EMITS.join(", ")
        )),
    }
}
