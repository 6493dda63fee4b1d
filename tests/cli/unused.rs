use anyhow::Result;
use serde_json::Value;

use crate::{CliTest, DE_MAIN, catalog, stdout};

const CONTROLLER: &str =
    "<?php\n$t = I18n::translate('cards.title', 'Cards', [], 'Main', 'Acme.Site');\n";

fn catalog_with_stale_entry() -> String {
    catalog(
        "de",
        r#"      <trans-unit id="cards.title" xml:space="preserve">
        <source>Cards</source>
        <target>Karten</target>
      </trans-unit>
      <trans-unit id="cards.stale" xml:space="preserve">
        <source>Stale</source>
        <target state="translated">Veraltet</target>
      </trans-unit>
"#,
    )
}

#[test]
fn test_reports_unused_entries() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &catalog_with_stale_entry())?;

    let output = test.unused_command().output()?;
    let stdout = stdout(&output);

    assert_eq!(output.status.code(), Some(6));
    assert!(stdout.starts_with(
        "Prepared unused sweep for all packages (locales: de, format: table, dry-run: no)."
    ));
    assert!(stdout.contains("warning: \"Acme.Site:Main:cards.stale\"  unused"));
    assert!(stdout.contains(&format!("--> {}", DE_MAIN)));
    assert!(!stdout.contains("cards.title\""));

    Ok(())
}

#[test]
fn test_nothing_unused() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(
        DE_MAIN,
        &catalog(
            "de",
            r#"      <trans-unit id="cards.title" xml:space="preserve">
        <source>Cards</source>
        <target>Karten</target>
      </trans-unit>
"#,
        ),
    )?;

    let output = test.unused_command().output()?;

    assert!(output.status.success());
    assert!(stdout(&output).contains("No unused translations detected."));

    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &catalog_with_stale_entry())?;

    let output = test.unused_command().args(["--format", "json"]).output()?;
    let json: Value = serde_json::from_str(&stdout(&output))?;

    let unused = json["unused"].as_array().expect("unused array");
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0]["id"], "cards.stale");
    assert_eq!(unused[0]["issue"], "unused");
    assert_eq!(unused[0]["state"], "translated");
    assert_eq!(unused[0]["sourceText"], "Stale");
    assert_eq!(unused[0]["targetText"], "Veraltet");
    assert_eq!(unused[0]["file"], DE_MAIN);

    Ok(())
}

#[test]
fn test_delete_removes_entries() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &catalog_with_stale_entry())?;

    let output = test.unused_command().arg("--delete").output()?;

    assert!(output.status.success());
    assert!(stdout(&output).contains(&format!("Touched catalog: {}", DE_MAIN)));

    let content = test.read_file(DE_MAIN)?;
    assert!(!content.contains("cards.stale"));
    assert!(content.contains(r#"<trans-unit id="cards.title""#));

    Ok(())
}

#[test]
fn test_delete_with_malformed_catalog() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &catalog_with_stale_entry())?;
    test.write_file(
        &DE_MAIN.replace("Main.xlf", "Other.xlf"),
        "<xliff><file><body><trans-unit",
    )?;

    let output = test.unused_command().arg("--delete").output()?;
    let stdout = stdout(&output);

    assert_eq!(output.status.code(), Some(7));
    assert!(stdout.contains("catalog-error"));
    assert!(stdout.contains(&format!("Touched catalog: {}", DE_MAIN)));
    assert!(!test.read_file(DE_MAIN)?.contains("cards.stale"));

    Ok(())
}

#[test]
fn test_delete_dry_run() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &catalog_with_stale_entry())?;

    let output = test
        .unused_command()
        .args(["--delete", "--dry-run"])
        .output()?;

    assert_eq!(output.status.code(), Some(6));
    assert!(stdout(&output).contains(&format!("Would touch catalog: {}", DE_MAIN)));
    assert_eq!(test.read_file(DE_MAIN)?, catalog_with_stale_entry());

    Ok(())
}

#[test]
fn test_custom_exit_code() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(
        ".l10nguy.json",
        r#"{ "locales": ["de"], "exitCodes": { "unused": 3 } }"#,
    )?;
    test.write_file(DE_MAIN, &catalog_with_stale_entry())?;

    let output = test.unused_command().output()?;

    assert_eq!(output.status.code(), Some(3));

    Ok(())
}
