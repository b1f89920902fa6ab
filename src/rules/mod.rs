mod comma_spacing;
mod line_length;
mod multiline_literal_brackets;
mod todo;
mod trailing_semicolon;
mod unowned_variable_capture;
mod unused_enumerated;

pub use comma_spacing::CommaSpacing;
pub use line_length::LineLength;
pub use multiline_literal_brackets::MultilineLiteralBrackets;
pub use todo::Todo;
pub use trailing_semicolon::TrailingSemicolon;
pub use unowned_variable_capture::UnownedVariableCapture;
pub use unused_enumerated::UnusedEnumerated;

use std::collections::HashSet;

use crate::config::GlobalConfig;
use crate::registry::{RegistryError, RuleRegistry};
use crate::rule::Rule;
use crate::types::LanguageVersion;

const ALL: &str = "all";

/// Register every built-in rule. Registration order is evaluation order.
pub(crate) fn register_builtin(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    macro_rules! rule {
        ($ty:ident) => {
            registry.register::<$ty>()?
        };
    }

    rule!(UnusedEnumerated);
    rule!(UnownedVariableCapture);
    rule!(MultilineLiteralBrackets);
    rule!(TrailingSemicolon);
    rule!(CommaSpacing);
    rule!(Todo);
    rule!(LineLength);
    Ok(())
}

/// Select the rules that should run under the global configuration.
///
/// - `only`, when non-empty, is the complete active set (opt-in rules included).
/// - Otherwise every default rule runs, plus the opt-in rules named in `enable`.
/// - `disable` removes rules; `disable = ["all"]` removes every rule not
///   explicitly listed in `enable` or `only`.
/// - Rules requiring a newer language version than `language_version` never run.
pub fn filter_rules(
    rules: &[Box<dyn Rule>],
    global_config: &GlobalConfig,
    language_version: LanguageVersion,
) -> Vec<Box<dyn Rule>> {
    let only: HashSet<&str> = global_config.only.iter().map(String::as_str).collect();
    let enabled: HashSet<&str> = global_config.enable.iter().map(String::as_str).collect();
    let disabled: HashSet<&str> = global_config.disable.iter().map(String::as_str).collect();
    let enable_all = enabled.contains(ALL);
    let disable_all = disabled.contains(ALL);

    rules
        .iter()
        .filter(|rule| {
            let description = rule.description();
            let id = description.identifier;

            let selected = if only.is_empty() {
                !description.is_opt_in || enable_all || enabled.contains(id)
            } else {
                only.contains(id)
            };
            let explicitly_selected = enabled.contains(id) || only.contains(id);
            let removed = disabled.contains(id) || (disable_all && !explicitly_selected);
            let supported = description
                .min_language_version
                .is_none_or(|min| min <= language_version);

            selected && !removed && supported
        })
        .map(|rule| dyn_clone::clone_box(&**rule))
        .collect()
}
