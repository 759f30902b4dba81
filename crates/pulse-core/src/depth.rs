//! Line-item depth extraction
//!
//! The exports encode hierarchy only through indentation of the "Line Item"
//! label. The default convention is two leading spaces per level, rounded
//! down. Other conventions plug in through [`DepthPolicy`].

/// Maps a raw (still indented) label to a hierarchy depth
pub trait DepthPolicy {
    fn depth(&self, label: &str) -> usize;
}

/// Any `Fn(&str) -> usize` is a depth policy
impl<F> DepthPolicy for F
where
    F: Fn(&str) -> usize,
{
    fn depth(&self, label: &str) -> usize {
        self(label)
    }
}

/// Counts leading spaces; tabs are not special
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceIndent {
    pub spaces_per_level: usize,
}

impl Default for SpaceIndent {
    fn default() -> Self {
        Self {
            spaces_per_level: 2,
        }
    }
}

impl DepthPolicy for SpaceIndent {
    fn depth(&self, label: &str) -> usize {
        if self.spaces_per_level == 0 {
            return 0;
        }
        leading_spaces(label) / self.spaces_per_level
    }
}

/// Treats each leading tab as one level and spaces per `SpaceIndent`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabIndent {
    pub spaces: SpaceIndent,
}

impl DepthPolicy for TabIndent {
    fn depth(&self, label: &str) -> usize {
        let tabs = label.chars().take_while(|c| *c == '\t').count();
        tabs + self.spaces.depth(&label[tabs..])
    }
}

/// Depth under the default two-spaces-per-level convention
pub fn get_depth(label: &str) -> usize {
    SpaceIndent::default().depth(label)
}

fn leading_spaces(label: &str) -> usize {
    label.bytes().take_while(|b| *b == b' ').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_depth() {
        assert_eq!(get_depth(""), 0);
        assert_eq!(get_depth("Revenue"), 0);
        assert_eq!(get_depth(" Revenue"), 0);
        assert_eq!(get_depth("  Revenue"), 1);
        assert_eq!(get_depth("   Revenue"), 1);
        assert_eq!(get_depth("    Revenue"), 2);
        assert_eq!(get_depth("          Deep"), 5);
    }

    #[test]
    fn test_tabs_are_not_indentation_by_default() {
        assert_eq!(get_depth("\tRevenue"), 0);
        assert_eq!(get_depth("  \tRevenue"), 1);
    }

    #[test]
    fn test_whitespace_only_label() {
        assert_eq!(get_depth("    "), 2);
    }

    #[test]
    fn test_custom_spaces_per_level() {
        let policy = SpaceIndent {
            spaces_per_level: 4,
        };
        assert_eq!(policy.depth("    Revenue"), 1);
        assert_eq!(policy.depth("   Revenue"), 0);
        assert_eq!(SpaceIndent { spaces_per_level: 0 }.depth("  x"), 0);
    }

    #[test]
    fn test_tab_policy() {
        let policy = TabIndent::default();
        assert_eq!(policy.depth("\t\tPayroll"), 2);
        assert_eq!(policy.depth("\t  Payroll"), 2);
        assert_eq!(policy.depth("Payroll"), 0);
    }

    #[test]
    fn test_closure_policy() {
        let explicit = |label: &str| label.chars().take_while(|c| *c == '>').count();
        assert_eq!(explicit.depth(">>Supplies"), 2);
    }
}
