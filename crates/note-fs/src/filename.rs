//! Note file naming: `<id>.<slug>.md`.
//!
//! The slug is a filesystem-safe rendering of the title; the
//! authoritative title lives in the file's frontmatter.

/// Sanitize a title into a filename slug.
///
/// Alphanumerics and dashes pass through, whitespace becomes `-`, and
/// anything else (including `.`, which separates the filename fields)
/// becomes `_`. Runs of introduced separators collapse, and leading or
/// trailing separators are trimmed.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        let mapped = if c.is_alphanumeric() || c == '-' {
            c
        } else if c.is_whitespace() {
            '-'
        } else {
            '_'
        };
        if (mapped == '-' || mapped == '_') && slug.ends_with(mapped) {
            continue;
        }
        slug.push(mapped);
    }
    let slug = slug.trim_matches(|c| c == '-' || c == '_');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// Filename for a note's active file.
pub fn note_filename(id: u64, title: &str) -> String {
    format!("{}.{}.md", id, slugify(title))
}

/// Extract the note id from a `<id>.<slug>.md` filename.
///
/// Returns `None` for files that don't follow the naming scheme, so
/// stray markdown files in the notes directory are ignored rather than
/// rejected.
pub fn parse_id(filename: &str) -> Option<u64> {
    let rest = filename.strip_suffix(".md")?;
    let (id, slug) = rest.split_once('.')?;
    if slug.is_empty() {
        return None;
    }
    id.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_replaces_whitespace_and_specials() {
        assert_eq!(slugify("Fix the build"), "Fix-the-build");
        assert_eq!(slugify("v1.2 release?!"), "v1_2-release");
        assert_eq!(slugify("already-safe"), "already-safe");
    }

    #[test]
    fn slugify_collapses_and_trims_separators() {
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("!!!weird!!!"), "weird");
    }

    #[test]
    fn slugify_never_returns_empty() {
        assert_eq!(slugify("???"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn note_filename_keeps_id_parseable() {
        let name = note_filename(42, "A title. With dots.");
        assert_eq!(name, "42.A-title_-With-dots.md");
        assert_eq!(parse_id(&name), Some(42));
    }

    #[test]
    fn parse_id_ignores_non_note_files() {
        assert_eq!(parse_id("README.md"), None);
        assert_eq!(parse_id("notes.txt"), None);
        assert_eq!(parse_id("abc.def.md"), None);
        assert_eq!(parse_id("7.md"), None);
    }

    #[test]
    fn parse_id_handles_dots_in_slug() {
        assert_eq!(parse_id("3.some.odd.slug.md"), Some(3));
    }
}
