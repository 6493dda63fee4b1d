use anyhow::Result;
use serde_json::Value;

use crate::{CliTest, DE_MAIN, PACKAGE_DIR, catalog, stdout};

const CONTROLLER: &str = r#"<?php
namespace Acme\Site\Controller;

use Neos\Flow\I18n;

class CardController
{
    public function showAction(): string
    {
        $title = I18n::translate('cards.title', 'Cards', [], 'Main', 'Acme.Site');
        return I18n::translate('cards.greeting', 'Hello {name}', ['name' => 'x'], 'Main', 'Acme.Site');
    }
}
"#;

fn translated_title() -> String {
    catalog(
        "de",
        r#"      <trans-unit id="cards.title" xml:space="preserve">
        <source>Cards</source>
        <target>Karten</target>
      </trans-unit>
"#,
    )
}

#[test]
fn test_reports_missing_translation() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &translated_title())?;

    let output = test.scan_command().output()?;
    let stdout = stdout(&output);

    assert_eq!(output.status.code(), Some(5));
    assert!(stdout.starts_with(
        "Prepared scan for all packages (locales: de, format: table, dry-run: no)."
    ));
    assert!(stdout.contains("Reference index: 2 unique (0 duplicates flagged across 2 occurrences)."));
    assert!(stdout.contains("error: \"Acme.Site:Main:cards.greeting\"  missing"));
    assert!(stdout.contains(&format!("--> {}/Classes/Controller.php:11", PACKAGE_DIR)));
    assert!(!stdout.contains("cards.title\""));

    Ok(())
}

#[test]
fn test_clean_project_exits_zero() -> Result<()> {
    let test = CliTest::with_package(
        "<?php\n$t = I18n::translate('cards.title', 'Cards', [], 'Main', 'Acme.Site');\n",
    )?;
    test.write_file(DE_MAIN, &translated_title())?;

    let output = test.scan_command().output()?;

    assert!(output.status.success());
    assert!(stdout(&output).contains("No missing translations detected."));

    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &translated_title())?;

    let output = test.scan_command().args(["--format", "json"]).output()?;
    let json: Value = serde_json::from_str(&stdout(&output))?;

    assert_eq!(output.status.code(), Some(5));
    let missing = json["missing"].as_array().expect("missing array");
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0]["locale"], "de");
    assert_eq!(missing[0]["package"], "Acme.Site");
    assert_eq!(missing[0]["source"], "Main");
    assert_eq!(missing[0]["id"], "cards.greeting");
    assert_eq!(missing[0]["fallback"], "Hello {name}");
    assert_eq!(missing[0]["placeholders"][0], "name");
    assert_eq!(missing[0]["line"], 11);
    assert_eq!(json["duplicates"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["diagnostics"]["errors"].as_array().map(Vec::len), Some(0));

    Ok(())
}

#[test]
fn test_update_creates_missing_entries() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &translated_title())?;

    let output = test.scan_command().arg("--update").output()?;

    // Missing is computed before writing.
    assert_eq!(output.status.code(), Some(5));
    assert!(stdout(&output).contains(&format!("Touched catalog: {}", DE_MAIN)));

    let content = test.read_file(DE_MAIN)?;
    assert!(content.contains(r#"<trans-unit id="cards.greeting""#));
    assert!(content.contains("Hello {name}"));
    assert!(content.contains("needs-review"));
    assert!(content.contains("<target>Karten</target>"));

    let rerun = test.scan_command().output()?;
    assert!(rerun.status.success());

    Ok(())
}

#[test]
fn test_update_without_needs_review() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &translated_title())?;

    test.scan_command()
        .args(["--update", "--no-needs-review"])
        .output()?;

    let content = test.read_file(DE_MAIN)?;
    assert!(content.contains(r#"<trans-unit id="cards.greeting""#));
    assert!(!content.contains("needs-review"));

    Ok(())
}

#[test]
fn test_dry_run_leaves_catalog_untouched() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &translated_title())?;

    let output = test
        .scan_command()
        .args(["--update", "--dry-run"])
        .output()?;
    let stdout = stdout(&output);

    assert!(stdout.contains("dry-run: yes"));
    assert!(stdout.contains(&format!("Would touch catalog: {}", DE_MAIN)));
    assert_eq!(test.read_file(DE_MAIN)?, translated_title());

    Ok(())
}

#[test]
fn test_id_filter() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &catalog("de", ""))?;

    let output = test
        .scan_command()
        .args(["--format", "json", "--id", "cards.t*"])
        .output()?;
    let json: Value = serde_json::from_str(&stdout(&output))?;

    let ids: Vec<&str> = json["missing"]
        .as_array()
        .expect("missing array")
        .iter()
        .filter_map(|m| m["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["cards.title"]);

    Ok(())
}

#[test]
fn test_placeholder_warning() -> Result<()> {
    let test = CliTest::with_package(
        "<?php\n$t = I18n::translate('cards.greeting', 'Hello', [], 'Main', 'Acme.Site');\n",
    )?;
    test.write_file(
        DE_MAIN,
        &catalog(
            "de",
            r#"      <trans-unit id="cards.greeting" xml:space="preserve">
        <source>Hello {name}</source>
        <target>Hallo {name}</target>
      </trans-unit>
"#,
        ),
    )?;

    let output = test.scan_command().output()?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("placeholder-mismatch"));

    let quiet = test
        .scan_command()
        .arg("--ignore-placeholder-warnings")
        .output()?;
    assert!(!stdout(&quiet).contains("placeholder-mismatch"));

    Ok(())
}

#[test]
fn test_duplicates_are_counted() -> Result<()> {
    let test = CliTest::with_package(
        "<?php\n$a = I18n::translate('cards.title', 'Cards', [], 'Main', 'Acme.Site');\n$b = I18n::translate('cards.title', 'Cards', [], 'Main', 'Acme.Site');\n",
    )?;
    test.write_file(DE_MAIN, &translated_title())?;

    let output = test.scan_command().output()?;
    let stdout = stdout(&output);

    assert!(output.status.success());
    assert!(stdout.contains("Duplicate ids detected (1 occurrences)."));
    assert!(!stdout.contains("  duplicate"));

    let verbose = test.scan_command().arg("-v").output()?;
    assert!(crate::stdout(&verbose).contains("  duplicate"));

    Ok(())
}

#[test]
fn test_malformed_catalog_fails() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, "<xliff><file><body><trans-unit")?;

    let output = test.scan_command().output()?;

    assert_eq!(output.status.code(), Some(7));
    assert!(stdout(&output).contains("catalog-error"));

    Ok(())
}

#[test]
fn test_update_skips_malformed_catalog() -> Result<()> {
    let test = CliTest::with_package(
        "<?php\n$a = I18n::translate('cards.title', 'Cards', [], 'Main', 'Acme.Site');\n$b = I18n::translate('menu.home', 'Home', [], 'Other', 'Acme.Site');\n",
    )?;
    test.write_file(DE_MAIN, "<xliff><file><body><trans-unit")?;
    let other = DE_MAIN.replace("Main.xlf", "Other.xlf");

    let output = test.scan_command().arg("--update").output()?;
    let stdout = stdout(&output);

    assert_eq!(output.status.code(), Some(7));
    assert!(stdout.contains("catalog-error"));
    assert_eq!(stdout.matches("catalog-error").count(), 1);
    assert!(stdout.contains("error: \"Acme.Site:Other:menu.home\"  missing"));
    assert!(stdout.contains(&format!("Touched catalog: {}", other)));
    assert!(!stdout.contains(&format!("Touched catalog: {}", DE_MAIN)));

    assert!(test.read_file(&other)?.contains(r#"<trans-unit id="menu.home""#));
    assert_eq!(test.read_file(DE_MAIN)?, "<xliff><file><body><trans-unit");

    Ok(())
}

#[test]
fn test_invalid_id_glob_is_an_error() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;

    let output = test.scan_command().args(["--id", "[x"]).output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(crate::stderr(&output).contains("Invalid glob pattern in '--id'"));

    Ok(())
}
