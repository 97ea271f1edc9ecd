//! Target listing for `-projecthelp`

use crate::engine::TargetDescriptor;

/// Spaces between the longest main target name and its description
const GUTTER: usize = 2;

/// Renders the sorted, column-aligned list of a project's targets
#[derive(Debug, Default)]
pub struct TargetCatalogFormatter {
    main: Vec<TargetDescriptor>,
    sub: Vec<String>,
    default_target: Option<String>,
}

impl TargetCatalogFormatter {
    pub fn new<'a, I>(targets: I, default_target: Option<&str>) -> Self
    where
        I: IntoIterator<Item = &'a TargetDescriptor>,
    {
        let mut main = Vec::new();
        let mut sub = Vec::new();
        for target in targets {
            if target.is_documented() {
                main.push(target.clone());
            } else {
                sub.push(target.name.clone());
            }
        }
        main.sort_by(|a, b| a.name.cmp(&b.name));
        sub.sort();

        Self {
            main,
            sub,
            default_target: default_target
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }

    /// Column at which descriptions start, relative to the name
    pub fn description_column(&self) -> usize {
        self.main.iter().map(|t| t.name.chars().count()).max().unwrap_or(0) + GUTTER
    }

    /// The listing; sub-targets are included only when asked for
    pub fn render(&self, include_subtargets: bool) -> String {
        let column = self.description_column();
        let mut text = String::from("Main targets:\n\n");
        for target in &self.main {
            let description = target.description.as_deref().unwrap_or_default();
            text.push_str(&format!(
                " {:<width$}{}\n",
                target.name,
                description,
                width = column
            ));
        }
        text.push('\n');

        if include_subtargets {
            text.push_str("Subtargets:\n\n");
            for name in &self.sub {
                text.push_str(&format!(" {}\n", name));
            }
            text.push('\n');
        }

        if let Some(default) = &self.default_target {
            text.push_str(&format!("Default target: {}\n", default));
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors() -> Vec<TargetDescriptor> {
        vec![
            TargetDescriptor::new("test", Some("Runs tests")),
            TargetDescriptor::new("prepare", None),
            TargetDescriptor::new("build", Some("Builds it")),
            TargetDescriptor::new("clean-all", None),
        ]
    }

    #[test]
    fn test_main_targets_sorted_and_aligned() {
        let listing = TargetCatalogFormatter::new(&descriptors(), Some("build")).render(false);

        assert_eq!(
            listing,
            "Main targets:\n\n build  Builds it\n test   Runs tests\n\nDefault target: build\n"
        );
    }

    #[test]
    fn test_alignment_follows_longest_name() {
        let targets = vec![
            TargetDescriptor::new("a", Some("short")),
            TargetDescriptor::new("distribution", Some("long")),
        ];
        let formatter = TargetCatalogFormatter::new(&targets, None);
        assert_eq!(formatter.description_column(), "distribution".len() + 2);

        let listing = formatter.render(false);
        assert!(listing.contains(" a             short\n"));
        assert!(listing.contains(" distribution  long\n"));
        assert!(!listing.contains("Default target"));
    }

    #[test]
    fn test_subtargets_only_when_requested() {
        let formatter = TargetCatalogFormatter::new(&descriptors(), None);
        assert!(!formatter.render(false).contains("Subtargets:"));

        let listing = formatter.render(true);
        assert!(listing.contains("Subtargets:\n\n clean-all\n prepare\n\n"));
    }

    #[test]
    fn test_empty_default_is_not_listed() {
        let listing = TargetCatalogFormatter::new(&descriptors(), Some("")).render(false);
        assert!(!listing.contains("Default target"));
    }

    #[test]
    fn test_no_documented_targets() {
        let targets = vec![TargetDescriptor::new("only", None)];
        let listing = TargetCatalogFormatter::new(&targets, None).render(false);
        assert_eq!(listing, "Main targets:\n\n\n");
    }
}
