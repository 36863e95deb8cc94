use crate::cli::ListArgs;
use crate::config::{Config, OutputFormat, Registry};
use anyhow::Context;
use serde_json::json;

pub fn execute(args: ListArgs) -> anyhow::Result<()> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Root directory {:?} is not accessible", args.root))?;
    let config = Config::load_or_default(args.config.as_deref(), &root)?;
    let registry = Registry::from_config(&config)?;

    println!("{}", render(&registry, args.format)?);
    Ok(())
}

fn render(registry: &Registry, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "projects": registry.projects,
            "test_types": registry.test_types,
        }))?,
        OutputFormat::Console => render_console(registry),
        OutputFormat::Markdown => render_markdown(registry),
    })
}

fn render_console(registry: &Registry) -> String {
    let mut out = String::from("Projects:\n");
    for p in &registry.projects {
        out.push_str(&format!(
            "  {:<12} {:<20} {:<16} {:<10} {}\n",
            p.key,
            p.name,
            p.working_dir.display().to_string(),
            p.framework.to_string(),
            p.test_command
        ));
    }

    out.push_str("\nTest types:\n");
    for t in &registry.test_types {
        out.push_str(&format!(
            "  {:<12} priority {:<3} timeout {:>4}s  {}  {}\n",
            t.key,
            t.priority,
            t.timeout().as_secs(),
            if t.parallel { "parallel " } else { "exclusive" },
            t.patterns.join(" ")
        ));
    }
    out
}

fn render_markdown(registry: &Registry) -> String {
    let mut md = String::from("## Projects\n\n| Key | Name | Directory | Framework |\n|-----|------|-----------|-----------|\n");
    for p in &registry.projects {
        md.push_str(&format!(
            "| {} | {} | `{}` | {} |\n",
            p.key,
            p.name,
            p.working_dir.display(),
            p.framework
        ));
    }

    md.push_str("\n## Test types\n\n| Key | Priority | Timeout | Parallel |\n|-----|----------|---------|----------|\n");
    for t in &registry.test_types {
        md.push_str(&format!(
            "| {} | {} | {}s | {} |\n",
            t.key,
            t.priority,
            t.timeout().as_secs(),
            if t.parallel { "yes" } else { "no" }
        ));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lines of a section whose first column is `key`
    fn rows<'a>(section: &'a str, key: &str) -> usize {
        section
            .lines()
            .filter(|line| line.split_whitespace().next() == Some(key))
            .count()
    }

    #[test]
    fn test_console_lists_each_key_once_per_registry() {
        let registry = Registry::builtin();
        let out = render_console(&registry);
        let (projects, types) = out.split_once("Test types:").unwrap();

        for key in registry.project_keys() {
            assert_eq!(rows(projects, key), 1, "project {}", key);
        }
        for key in registry.test_type_keys() {
            assert_eq!(rows(types, key), 1, "test type {}", key);
        }
    }

    #[test]
    fn test_json_shape() {
        let out = render(&Registry::builtin(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["projects"].as_array().unwrap().len(), 5);
        assert_eq!(value["test_types"][0]["key"], "unit");
    }

    #[test]
    fn test_markdown_marks_exclusive_types() {
        let md = render(&Registry::builtin(), OutputFormat::Markdown).unwrap();
        assert!(md.contains("| e2e | 3 | 300s | no |"));
    }
}
