//! Inline suppression directives
//!
//! Supports, inside comments only:
//! - `// sift:disable` / `// sift:disable all` - Disable all rules from the next line on
//! - `// sift:enable` - Re-enable all rules from the next line on
//! - `// sift:disable rule-a rule-b` - Disable specific rules
//! - `// sift:enable rule-a rule-b` - Re-enable specific rules
//! - `// sift:disable:next rule-a` - Disable rules for the next line
//! - `// sift:disable:this rule-a` - Disable rules for the directive's own line
//! - `// sift:disable:previous rule-a` - Disable rules for the previous line
//!
//! Region directives never affect their own line: the state at a line is
//! the state after every directive on earlier lines.

use std::collections::{HashMap, HashSet};

use crate::config::normalize_key;
use crate::syntax::{TokenKind, TokenStream};
use crate::utils::LineIndex;

const DIRECTIVE_PREFIX: &str = "sift:";
const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveAction {
    Disable,
    Enable,
    DisableNext,
    DisableThis,
    DisablePrevious,
}

/// One parsed directive. Rule names are normalized; an empty list means all rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub action: DirectiveAction,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RegionState {
    all_disabled: bool,
    /// Rules disabled while `all_disabled` is false
    disabled: HashSet<String>,
    /// Rules re-enabled while `all_disabled` is true
    enabled: HashSet<String>,
}

impl RegionState {
    fn apply(&mut self, directive: &Directive) {
        match directive.action {
            DirectiveAction::Disable if directive.rules.is_empty() => {
                self.all_disabled = true;
                self.disabled.clear();
                self.enabled.clear();
            }
            DirectiveAction::Enable if directive.rules.is_empty() => {
                *self = RegionState::default();
            }
            DirectiveAction::Disable => {
                for rule in &directive.rules {
                    if self.all_disabled {
                        self.enabled.remove(rule);
                    } else {
                        self.disabled.insert(rule.clone());
                    }
                }
            }
            DirectiveAction::Enable => {
                for rule in &directive.rules {
                    if self.all_disabled {
                        self.enabled.insert(rule.clone());
                    } else {
                        self.disabled.remove(rule);
                    }
                }
            }
            _ => {}
        }
    }

    fn is_disabled(&self, rule: &str) -> bool {
        if self.all_disabled {
            !self.enabled.contains(rule)
        } else {
            self.disabled.contains(rule)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InlineConfig {
    /// Region state in effect from each line (1-indexed) on, in line order
    regions: Vec<(usize, RegionState)>,
    /// Rules disabled for single lines via `disable:next`, `disable:this`, `disable:previous` ("*" means all)
    line_disabled_rules: HashMap<usize, HashSet<String>>,
}

impl InlineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect directives from the comment tokens of one file.
    pub fn from_tokens(source: &str, tokens: &TokenStream, lines: &LineIndex) -> Self {
        let mut config = Self::new();
        let mut state = RegionState::default();

        for token in tokens.as_slice().iter().filter(|t| t.kind == TokenKind::Comment) {
            let Some(text) = token.text(source) else {
                continue;
            };
            for (offset, directive) in parse_directives(text) {
                let line = lines.line_of(token.range.location + offset);
                match directive.action {
                    DirectiveAction::Disable | DirectiveAction::Enable => {
                        state.apply(&directive);
                        match config.regions.last_mut() {
                            Some((from, current)) if *from == line + 1 => *current = state.clone(),
                            _ => config.regions.push((line + 1, state.clone())),
                        }
                    }
                    DirectiveAction::DisableNext => config.disable_line(line + 1, &directive.rules),
                    DirectiveAction::DisableThis => config.disable_line(line, &directive.rules),
                    DirectiveAction::DisablePrevious => {
                        if line > 1 {
                            config.disable_line(line - 1, &directive.rules);
                        }
                    }
                }
            }
        }

        config
    }

    fn disable_line(&mut self, line: usize, rules: &[String]) {
        let line_rules = self.line_disabled_rules.entry(line).or_default();
        if rules.is_empty() {
            line_rules.insert("*".to_string());
        } else {
            line_rules.extend(rules.iter().cloned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.line_disabled_rules.is_empty()
    }

    /// Check if a rule is disabled at a specific line
    pub fn is_rule_disabled(&self, rule_name: &str, line_number: usize) -> bool {
        if let Some(line_rules) = self.line_disabled_rules.get(&line_number)
            && (line_rules.contains("*") || line_rules.contains(rule_name))
        {
            return true;
        }

        let idx = self.regions.partition_point(|(from, _)| *from <= line_number);
        idx.checked_sub(1)
            .and_then(|i| self.regions.get(i))
            .is_some_and(|(_, state)| state.is_disabled(rule_name))
    }
}

/// Every directive in one comment's text, with its byte offset in that text.
pub fn parse_directives(comment: &str) -> Vec<(usize, Directive)> {
    let mut out = Vec::new();
    for (start, _) in comment.match_indices(DIRECTIVE_PREFIX) {
        let rest = &comment[start + DIRECTIVE_PREFIX.len()..];
        let line_end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        let mut rest = &rest[..line_end];
        if let Some(close) = rest.find("*/") {
            rest = &rest[..close];
        }
        let mut words = rest.split_whitespace();
        let action = match words.next() {
            Some("disable") => DirectiveAction::Disable,
            Some("enable") => DirectiveAction::Enable,
            Some("disable:next") => DirectiveAction::DisableNext,
            Some("disable:this") => DirectiveAction::DisableThis,
            Some("disable:previous") => DirectiveAction::DisablePrevious,
            _ => continue,
        };
        let rules: Vec<String> = words.map(normalize_key).collect();
        let rules = if rules.iter().any(|rule| rule == ALL) { Vec::new() } else { rules };
        out.push((start, Directive { action, rules }));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxProvider;
    use crate::syntax::light::LightSyntax;

    fn config_for(source: &str) -> InlineConfig {
        let snapshot = LightSyntax.parse(source).unwrap();
        InlineConfig::from_tokens(source, &snapshot.tokens, &LineIndex::new(source))
    }

    #[test]
    fn test_parse_directives() {
        assert_eq!(
            parse_directives("// sift:disable todo line-length"),
            vec![(
                3,
                Directive {
                    action: DirectiveAction::Disable,
                    rules: vec!["todo".to_string(), "line-length".to_string()]
                }
            )]
        );
        assert!(parse_directives("// sift:enable all")[0].1.rules.is_empty());
        assert!(parse_directives("// sift:enable ALL")[0].1.rules.is_empty());
        assert_eq!(
            parse_directives("/* sift:disable:next todo */")[0].1,
            Directive {
                action: DirectiveAction::DisableNext,
                rules: vec!["todo".to_string()]
            }
        );
        assert!(parse_directives("// sift:frobnicate todo").is_empty());
        assert!(parse_directives("// nothing here").is_empty());
    }

    #[test]
    fn test_regions() {
        let source = "let a = 1\n// sift:disable todo\nlet b = 2\n// sift:enable todo\nlet c = 3\n";
        let config = config_for(source);
        assert!(!config.is_rule_disabled("todo", 1));
        assert!(!config.is_rule_disabled("todo", 2));
        assert!(config.is_rule_disabled("todo", 3));
        assert!(config.is_rule_disabled("todo", 4));
        assert!(!config.is_rule_disabled("todo", 5));
        assert!(!config.is_rule_disabled("line-length", 3));
    }

    #[test]
    fn test_disable_all_with_exception() {
        let source = "// sift:disable\n// sift:enable todo\nlet a = 1\n";
        let config = config_for(source);
        assert!(config.is_rule_disabled("line-length", 3));
        assert!(!config.is_rule_disabled("todo", 3));
    }

    #[test]
    fn test_single_line_directives() {
        let source = "let a = 1\n// sift:disable:previous todo\nlet b = 2 // sift:disable:this\n// sift:disable:next comma-spacing\nlet c = 3\n";
        let config = config_for(source);
        assert!(config.is_rule_disabled("todo", 1));
        assert!(!config.is_rule_disabled("comma-spacing", 1));
        assert!(config.is_rule_disabled("comma-spacing", 3));
        assert!(config.is_rule_disabled("todo", 3));
        assert!(config.is_rule_disabled("comma-spacing", 5));
        assert!(!config.is_rule_disabled("todo", 5));
    }

    #[test]
    fn test_rule_names_are_normalized() {
        assert_eq!(
            parse_directives("// sift:disable Trailing_Semicolon")[0].1.rules,
            vec!["trailing-semicolon".to_string()]
        );

        let source = "// sift:disable Line_Length
let a = 1 // sift:disable:this COMMA_SPACING
";
        let config = config_for(source);
        assert!(config.is_rule_disabled("line-length", 2));
        assert!(config.is_rule_disabled("comma-spacing", 2));
        assert!(!config.is_rule_disabled("todo", 2));
    }

    #[test]
    fn test_directives_in_strings_are_ignored() {
        let source = "let s = \"// sift:disable\"\nlet b = 2\n";
        let config = config_for(source);
        assert!(config.is_empty());
        assert!(!config.is_rule_disabled("todo", 2));
    }
}
