//! Target template dialect emission.
//!
//! All template source this crate produces goes through the helpers here, so
//! the delimiters and block keywords live in one place. The output is meant to
//! pass through an HTML-escaping step unharmed: string literals never contain a
//! raw `"`, they are wrapped in [`TEMPL_QUOTE`] which the downstream engine
//! turns back into quotes before parsing.

/// Placeholder used instead of `"` inside compiled template source.
pub const TEMPL_QUOTE: &str = "@#34T;";

/// Variable every dynamic fragment binds its data root to.
pub const FRAGMENT_ROOT: &str = "$frag_root";

// ═══════════════════════════════════════════════════════════════════════════════
// LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Quote a string literal with the placeholder token. Embedded `"` characters
/// are replaced by the same token.
pub fn quote(value: &str) -> String {
    format!(
        "{}{}{}",
        TEMPL_QUOTE,
        value.replace('"', TEMPL_QUOTE),
        TEMPL_QUOTE
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn interpolation(pipeline: &str) -> String {
    format!("{{{{{}}}}}", pipeline)
}

/// `{{$frag_root := .}}`
pub fn bind_fragment_root() -> String {
    interpolation(&format!("{} := .", FRAGMENT_ROOT))
}

pub fn range_block(key_var: &str, elem_var: &str, source: &str, body: &str) -> String {
    format!(
        "{}\n{}\n{}",
        interpolation(&format!("range {}, {} := {}", key_var, elem_var, source)),
        body,
        interpolation("end")
    )
}

pub fn if_block(condition: &str, negate: bool, then: &str, otherwise: Option<&str>) -> String {
    let open = if negate {
        interpolation(&format!("if not {}", condition))
    } else {
        interpolation(&format!("if {}", condition))
    };

    match otherwise {
        Some(alt) => format!(
            "{}\n{}\n{}\n{}\n{}",
            open,
            then,
            interpolation("else"),
            alt,
            interpolation("end")
        ),
        None => format!("{}\n{}\n{}", open, then, interpolation("end")),
    }
}
