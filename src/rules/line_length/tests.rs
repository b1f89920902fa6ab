use super::*;
use crate::syntax::SyntaxProvider;
use crate::syntax::light::LightSyntax;

fn check(rule: &LineLength, source: &str) -> Vec<Violation> {
    let snapshot = LightSyntax.parse(source).unwrap();
    let ctx = LintContext::new(source, &snapshot);
    rule.validate(&ctx)
}

fn comment_line(length: usize) -> String {
    format!("// {}", "x".repeat(length - 3))
}

#[test]
fn test_default_config() {
    let rule = LineLength::default();
    assert_eq!(rule.config.warning.get(), 120);
    assert_eq!(rule.config.error.get(), 200);
    assert!(!rule.config.ignores_comments);
    assert!(!rule.config.ignores_urls);
}

#[test]
fn test_warning_and_error_thresholds() {
    let rule = LineLength::new(10, 20);
    let source = "let a = 1\nlet abc = 12\nlet abcdefghijklm = 1";
    let violations = check(&rule, source);

    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].byte_offset, 10);
    assert_eq!(violations[0].severity, Severity::Warning);
    assert_eq!(
        violations[0].reason,
        "Line should be 10 characters or less; currently it has 12 characters"
    );
    assert_eq!(violations[1].byte_offset, 23);
    assert_eq!(violations[1].severity, Severity::Error);
    assert!(violations[1].reason.contains("20 characters or less"));
}

#[test]
fn test_counts_characters_not_bytes() {
    let rule = LineLength::new(10, 20);
    // 10 characters, 17 bytes
    assert!(check(&rule, "// ççççççç").is_empty());
}

#[test]
fn test_line_ending_is_not_counted() {
    let rule = LineLength::new(10, 20);
    assert!(check(&rule, "let a = 10\r\nlet b = 11\n").is_empty());
}

#[test]
fn test_ignores_comments() {
    let config = Config::from_toml_str("[line-length]\nwarning = 10\nignores-comments = true\n").unwrap();
    let rule = LineLength::from_config(&config).unwrap();
    let source = format!("{}\nlet abc = 12 // trailing", comment_line(30));
    let violations = rule.validate(&LintContext::new(&source, &LightSyntax.parse(&source).unwrap()));
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].byte_offset, 31);
}

#[test]
fn test_ignores_urls() {
    let rule = LineLength::from_config_struct(LineLengthConfig {
        warning: PositiveUsize::from_const(20),
        ignores_urls: true,
        ..Default::default()
    });
    let source = "// see https://example.com/a/very/long/path\nlet averyveryverylongname = 1";
    let violations = check(&rule, source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].byte_offset, 44);
}

#[test]
fn test_invalid_thresholds_are_config_errors() {
    for doc in ["[line-length]\nwarning = 0\n", "[line-length]\nerror = \"big\"\n", "[line_length]\nignores_urls = \"yes\"\n"] {
        let config = Config::from_toml_str(doc).unwrap();
        assert!(
            matches!(LineLength::from_config(&config), Err(ConfigError::InvalidValue { .. })),
            "{doc}"
        );
    }
}

#[test]
fn test_default_config_section() {
    let (name, value) = LineLength::default().default_config_section().unwrap();
    assert_eq!(name, "line-length");
    let table = value.as_table().unwrap();
    assert_eq!(table.get("warning"), Some(&toml::Value::Integer(120)));
    assert_eq!(table.get("ignores-urls"), Some(&toml::Value::Boolean(false)));
}
