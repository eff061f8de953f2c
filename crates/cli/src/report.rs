use lumpy_change_lump::{Excerpt, LumpSource};

/// Render excerpts as markdown sections, one fenced block each
pub fn render_text(excerpts: &[Excerpt]) -> String {
    let mut md = String::new();

    for (idx, excerpt) in excerpts.iter().enumerate() {
        if idx > 0 {
            md.push('\n');
        }
        md.push_str(&heading(excerpt));
        md.push('\n');
        md.push_str(&format!("```{}\n", excerpt.language));
        md.push_str(&excerpt.code);
        if !excerpt.code.ends_with('\n') {
            md.push('\n');
        }
        md.push_str("```\n");
    }

    md
}

fn heading(excerpt: &Excerpt) -> String {
    let label = match (excerpt.source, excerpt.function_name.as_deref()) {
        (LumpSource::Function, Some(name)) => format!("Function `{name}`"),
        (source, _) => source.to_string(),
    };
    format!(
        "## {label} (lines {}-{})",
        excerpt.first_line(),
        excerpt.end_line
    )
}
