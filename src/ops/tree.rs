//! Implementation of `skate tree`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::ResolvedUnit;
use crate::ops::environment::Environment;

#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Maximum include depth to display
    pub depth: Option<usize>,

    /// Expand files already shown elsewhere in the graph
    pub duplicates: bool,
}

/// Resolve `file` and render its include graph and merged libraries.
pub fn tree(env: &Environment, file: &Path, opts: &TreeOptions) -> Result<String> {
    let unit = env.resolve(file)?;
    Ok(render_tree(&unit, opts))
}

pub fn render_tree(unit: &ResolvedUnit, opts: &TreeOptions) -> String {
    let mut out = String::new();
    let mut seen = HashSet::new();
    seen.insert(unit.file().to_path_buf());
    out.push_str(&format!("{}\n", unit.file().display()));
    render_includes(unit, "", 1, opts, &mut seen, &mut out);

    let libraries = unit.libraries();
    if !libraries.is_empty() {
        out.push_str("\nlibraries:\n");
        for library in libraries {
            out.push_str(&format!("  {} ({})\n", library.name, library.primary.display()));
        }
    }
    out
}

fn render_includes(
    unit: &ResolvedUnit,
    prefix: &str,
    depth: usize,
    opts: &TreeOptions,
    seen: &mut HashSet<PathBuf>,
    out: &mut String,
) {
    if opts.depth.is_some_and(|max| depth > max) {
        return;
    }

    let includes = unit.includes();
    for (i, include) in includes.iter().enumerate() {
        let last = i + 1 == includes.len();
        let (branch, indent) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };

        let duplicate = !seen.insert(include.file().to_path_buf());
        let marker = if duplicate && !opts.duplicates { " (*)" } else { "" };
        out.push_str(&format!("{}{}{}{}\n", prefix, branch, display_name(include.file()), marker));

        if duplicate && !opts.duplicates {
            continue;
        }
        render_includes(include, &format!("{}{}", prefix, indent), depth + 1, opts, seen, out);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Library, Manifest, WorkspaceLayout};

    fn unit(path: &str, libs: Vec<Library>, includes: Vec<ResolvedUnit>) -> ResolvedUnit {
        let path = PathBuf::from(path);
        let layout = WorkspaceLayout::new("/build", "/project");
        ResolvedUnit::new(
            path.clone(),
            Manifest::parse(&path, ""),
            PathBuf::from("/stubs/FileAnnotations.kt"),
            libs,
            Vec::new(),
            includes,
            layout.paths(&path),
        )
    }

    #[test]
    fn test_render_diamond() {
        let d = || unit("/s/d.kt", Vec::new(), Vec::new());
        let b = unit("/s/b.kt", Vec::new(), vec![d()]);
        let c = unit("/s/c.kt", Vec::new(), vec![d()]);
        let a = unit(
            "/s/a.kt",
            vec![Library::new("org.x:lib:1.3.72", "/m2/lib-1.3.72.jar")],
            vec![b, c],
        );

        let rendered = render_tree(&a, &TreeOptions::default());
        assert_eq!(
            rendered,
            "/s/a.kt\n\
             ├── b.kt\n\
             │   └── d.kt\n\
             └── c.kt\n    \
             └── d.kt (*)\n\
             \n\
             libraries:\n  \
             org.x:lib:1.3.72 (/m2/lib-1.3.72.jar)\n"
        );

        let shallow = render_tree(&a, &TreeOptions { depth: Some(1), duplicates: false });
        assert!(!shallow.contains("d.kt"));
    }
}
