use anyhow::Result;

use crate::{CliTest, DE_MAIN, catalog, stdout};

const CONTROLLER: &str =
    "<?php\n$t = I18n::translate('cards.title', 'Cards', [], 'Main', 'Acme.Site');\n";

const UNSORTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2"><file original="" product-name="Acme.Site" source-language="en" target-language="de" datatype="plaintext"><body>
<trans-unit id="zeta"><source>Zeta</source><target>Zeta!</target></trans-unit>
<trans-unit id="alpha"><source>Alpha</source><target>Alpha!</target></trans-unit>
</body></file></xliff>
"#;

#[test]
fn test_check_reports_dirty_catalog() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, UNSORTED)?;

    let output = test.format_command().arg("--check").output()?;
    let stdout = stdout(&output);

    assert_eq!(output.status.code(), Some(7));
    assert!(stdout.starts_with(
        "Prepared format run for all packages (locales: de, check-only: yes)."
    ));
    assert!(stdout.contains(&format!("Catalog requires formatting: {}", DE_MAIN)));
    assert_eq!(test.read_file(DE_MAIN)?, UNSORTED);

    Ok(())
}

#[test]
fn test_format_rewrites_then_is_clean() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(
        ".l10nguy.json",
        r#"{ "locales": ["de"], "orderById": true }"#,
    )?;
    test.write_file(DE_MAIN, UNSORTED)?;

    let output = test.format_command().output()?;

    assert!(output.status.success());
    assert!(stdout(&output).contains(&format!("Formatted catalog: {}", DE_MAIN)));

    let content = test.read_file(DE_MAIN)?;
    assert!(content.contains("\n      <trans-unit id=\"alpha\" xml:space=\"preserve\">\n"));
    let alpha = content.find(r#"id="alpha""#).expect("alpha unit");
    let zeta = content.find(r#"id="zeta""#).expect("zeta unit");
    assert!(alpha < zeta);

    let again = test.format_command().output()?;
    assert!(stdout(&again).contains("Catalogs already normalized."));

    let check = test.format_command().arg("--check").output()?;
    assert!(check.status.success());
    assert!(stdout(&check).contains("All catalogs already match the canonical format."));

    Ok(())
}

#[test]
fn test_no_catalogs_matched() -> Result<()> {
    let test = CliTest::with_package(CONTROLLER)?;
    test.write_file(DE_MAIN, &catalog("de", ""))?;

    let output = test
        .format_command()
        .args(["--source", "Other"])
        .output()?;

    assert!(output.status.success());
    assert!(stdout(&output).contains("No catalogs matched the given filters."));

    Ok(())
}
