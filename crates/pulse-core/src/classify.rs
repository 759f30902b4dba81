//! Semantic classification of statement line items
//!
//! Exports do not label rows as revenue or expense, so classes come from the
//! line-item names. The heuristic is an ordered rule list (first match wins):
//!
//! 1. Canonical exact names ("Total Revenue", "Total Operating Expenses",
//!    "Net Income (Loss)", ...). Metric lookups try these before anything else.
//! 2. Net income keywords, so "Net Income" is never read as revenue.
//! 3. Anything containing "total" is a subtotal row.
//! 4. "revenue" / "income" keywords.
//! 5. "expense" keywords.
//!
//! Rules can be replaced from the rollup config.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{walk, Classification, Kpis, LineItemNode, TOTAL_COLUMN};

/// How a rule pattern is compared with a line-item name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Whole name, case-insensitive, ignoring surrounding whitespace
    Exact,
    /// Case-insensitive substring match (supports | for OR)
    Contains,
    /// Regular expression match against the trimmed name
    Regex,
}

/// One classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRule {
    pub pattern: String,
    #[serde(rename = "match")]
    pub kind: MatchKind,
    pub class: Classification,
}

impl ClassifierRule {
    pub fn new(pattern: &str, kind: MatchKind, class: Classification) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind,
            class,
        }
    }
}

/// Headline metric a caller wants out of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Revenue,
    Expenses,
    NetIncome,
}

impl Metric {
    pub fn class(&self) -> Classification {
        match self {
            Self::Revenue => Classification::Revenue,
            Self::Expenses => Classification::Expense,
            Self::NetIncome => Classification::NetIncome,
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: ClassifierRule,
    /// Lowercased alternatives for exact/contains, empty for regex
    needles: Vec<String>,
    regex: Option<Regex>,
}

impl CompiledRule {
    fn compile(rule: ClassifierRule) -> Result<Self> {
        let regex = match rule.kind {
            MatchKind::Regex => Some(Regex::new(&rule.pattern)?),
            _ => None,
        };
        let needles = match rule.kind {
            MatchKind::Regex => Vec::new(),
            _ => rule
                .pattern
                .split('|')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        };
        Ok(Self {
            rule,
            needles,
            regex,
        })
    }

    fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        match self.rule.kind {
            MatchKind::Exact => {
                let lower = name.to_lowercase();
                self.needles.iter().any(|n| *n == lower)
            }
            MatchKind::Contains => {
                let lower = name.to_lowercase();
                self.needles.iter().any(|n| lower.contains(n.as_str()))
            }
            MatchKind::Regex => self.regex.as_ref().is_some_and(|re| re.is_match(name)),
        }
    }
}

/// Ordered rule list classifying line items
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        // Built-in rules contain no regex patterns, so compilation cannot fail
        Self {
            rules: default_rules()
                .into_iter()
                .filter_map(|rule| CompiledRule::compile(rule).ok())
                .collect(),
        }
    }
}

impl Classifier {
    /// Compile a rule list, evaluated in the given order
    pub fn new(rules: Vec<ClassifierRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> impl Iterator<Item = &ClassifierRule> {
        self.rules.iter().map(|r| &r.rule)
    }

    /// First rule matching `name`, if any
    pub fn matching_rule(&self, name: &str) -> Option<&ClassifierRule> {
        self.rules
            .iter()
            .find(|r| r.matches(name))
            .map(|r| &r.rule)
    }

    pub fn classify_name(&self, name: &str) -> Classification {
        self.matching_rule(name)
            .map(|r| r.class)
            .unwrap_or(Classification::Unclassified)
    }

    pub fn classify(&self, node: &LineItemNode) -> Classification {
        self.classify_name(&node.name)
    }

    /// First node (in row order) with a canonical name for `metric`
    ///
    /// Canonical names are the exact-match rules of the metric's class;
    /// earlier rules take priority over earlier rows.
    pub fn canonical<'a>(
        &self,
        nodes: &'a [LineItemNode],
        metric: Metric,
    ) -> Option<&'a LineItemNode> {
        let class = metric.class();
        self.rules
            .iter()
            .filter(|r| r.rule.kind == MatchKind::Exact && r.rule.class == class)
            .find_map(|rule| walk(nodes).find(|node| rule.matches(&node.name)))
    }

    /// Classes after section inheritance, in row order
    ///
    /// A node no rule matches takes the class of its section: the parent's
    /// revenue/expense class, or for a subtotal parent the revenue/expense
    /// keyword in that parent's name. So children of an "Income" header
    /// count as revenue without carrying the keyword themselves.
    pub fn effective_classes<'a>(
        &self,
        nodes: &'a [LineItemNode],
    ) -> Vec<(&'a LineItemNode, Classification)> {
        let mut out = Vec::new();
        for node in nodes {
            self.collect_effective(node, Classification::Unclassified, &mut out);
        }
        out
    }

    fn collect_effective<'a>(
        &self,
        node: &'a LineItemNode,
        inherited: Classification,
        out: &mut Vec<(&'a LineItemNode, Classification)>,
    ) {
        let effective = self.effective_class(node, inherited);
        out.push((node, effective));

        let for_children = section_class(node, effective);
        for child in &node.children {
            self.collect_effective(child, for_children, out);
        }
    }

    fn effective_class(&self, node: &LineItemNode, inherited: Classification) -> Classification {
        match self.classify(node) {
            Classification::Unclassified => inherited,
            own => own,
        }
    }

    /// Rows summed for `class` when no canonical row exists, in row order
    ///
    /// A non-total row of the class counts unless some row beneath it already
    /// counts for the same class. A parent and its parts are never both
    /// summed, while a revenue row whose children are only expenses still
    /// counts as revenue.
    pub fn class_parts<'a>(
        &self,
        nodes: &'a [LineItemNode],
        class: Classification,
    ) -> Vec<&'a LineItemNode> {
        let mut out = Vec::new();
        for node in nodes {
            self.collect_parts(node, Classification::Unclassified, class, &mut out);
        }
        out
    }

    /// Returns whether anything in this subtree counted for `class`
    fn collect_parts<'a>(
        &self,
        node: &'a LineItemNode,
        inherited: Classification,
        class: Classification,
        out: &mut Vec<&'a LineItemNode>,
    ) -> bool {
        let effective = self.effective_class(node, inherited);
        let for_children = section_class(node, effective);

        let mut counted_below = false;
        for child in &node.children {
            counted_below |= self.collect_parts(child, for_children, class, out);
        }
        if counted_below {
            return true;
        }
        if effective == class && !node.is_total {
            out.push(node);
            return true;
        }
        false
    }

    /// Value of `metric` in `column`, or `None` when nothing matched
    ///
    /// Precedence: a canonical row's value; otherwise the first row
    /// classified as net income (net only); otherwise the sum of
    /// [`class_parts`](Self::class_parts) for the metric's class.
    pub fn metric_value(&self, nodes: &[LineItemNode], metric: Metric, column: &str) -> Option<f64> {
        if let Some(node) = self.canonical(nodes, metric) {
            return Some(node.value(column));
        }

        if metric == Metric::NetIncome {
            return walk(nodes)
                .find(|node| self.classify(node) == Classification::NetIncome)
                .map(|node| node.value(column));
        }

        let parts: Vec<f64> = self
            .class_parts(nodes, metric.class())
            .into_iter()
            .map(|node| node.value(column))
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.iter().sum())
        }
    }

    /// Summary-card figures from the `Total` column
    pub fn kpis(&self, nodes: &[LineItemNode]) -> Kpis {
        self.kpis_for_column(nodes, TOTAL_COLUMN)
    }

    /// Summary-card figures for one entity column
    pub fn kpis_for_column(&self, nodes: &[LineItemNode], column: &str) -> Kpis {
        let revenue = self
            .metric_value(nodes, Metric::Revenue, column)
            .unwrap_or(0.0);
        let expenses = self
            .metric_value(nodes, Metric::Expenses, column)
            .unwrap_or(0.0);
        let net_income = self
            .metric_value(nodes, Metric::NetIncome, column)
            .unwrap_or(revenue - expenses);
        Kpis {
            revenue,
            expenses,
            net_income,
        }
    }
}

/// Built-in rule list, highest priority first
pub fn default_rules() -> Vec<ClassifierRule> {
    use Classification::*;
    use MatchKind::*;

    vec![
        ClassifierRule::new("Total Revenue", Exact, Revenue),
        ClassifierRule::new("Total Income", Exact, Revenue),
        ClassifierRule::new("Total Operating Expenses", Exact, Expense),
        ClassifierRule::new("Total Expenses", Exact, Expense),
        ClassifierRule::new("Total Expense", Exact, Expense),
        ClassifierRule::new("Net Income (Loss)", Exact, NetIncome),
        ClassifierRule::new("Net Income", Exact, NetIncome),
        ClassifierRule::new("net income|net profit|net loss", Contains, NetIncome),
        ClassifierRule::new("total", Contains, Total),
        ClassifierRule::new("revenue|income", Contains, Revenue),
        ClassifierRule::new("expense", Contains, Expense),
    ]
}

/// Classify with the built-in rules
pub fn classify(node: &LineItemNode) -> Classification {
    Classifier::default().classify(node)
}

/// Summary value of the first row (in row order) whose name contains
/// `keyword`, case-insensitively; 0 when no row matches
pub fn extract_by_keyword(nodes: &[LineItemNode], keyword: &str) -> f64 {
    let keyword = keyword.to_lowercase();
    walk(nodes)
        .find(|node| node.name.to_lowercase().contains(&keyword))
        .map(|node| node.total)
        .unwrap_or(0.0)
}

/// Class a node hands down to unclassified children
fn section_class(node: &LineItemNode, effective: Classification) -> Classification {
    match effective {
        Classification::Revenue | Classification::Expense => effective,
        Classification::Total => section_hint(&node.name),
        _ => Classification::Unclassified,
    }
}

fn section_hint(name: &str) -> Classification {
    let lower = name.to_lowercase();
    if lower.contains("revenue") || lower.contains("income") {
        Classification::Revenue
    } else if lower.contains("expense") {
        Classification::Expense
    } else {
        Classification::Unclassified
    }
}
