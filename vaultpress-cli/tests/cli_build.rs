use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>{{ title }}</title><link rel="stylesheet" href="{{asset_base}}/assets/css/style.css"></head>
<body>
<aside>{{ sidebar }}</aside>
{{ breadcrumb }}
<main><h1>{{ title }}</h1>
{{ content }}
</main>
</body>
</html>
"#;

fn write(root: &Path, rel: &str, contents: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// Vault from the docs example plus a page template, laid out in a temp project
fn project() -> Result<tempfile::TempDir, Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "vault/Intro.md", "See [[Topics/Algebra]]\n")?;
    write(
        dir.path(),
        "vault/Topics/Algebra.md",
        "# Algebra\n\nGroups and rings. ![diagram](img/groups.png)\n",
    )?;
    write(dir.path(), "vault/Topics/img/groups.png", "png")?;
    write(dir.path(), "vault/.obsidian/app.json", "{}")?;
    write(dir.path(), "templates/section.html", TEMPLATE)?;
    Ok(dir)
}

fn vaultpress(dir: &Path) -> Result<Command, Box<dyn std::error::Error>> {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("vaultpress")?;
    cmd.current_dir(dir).env("RUST_LOG", "warn");
    Ok(cmd)
}

#[test]
fn build_links_notes_and_writes_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;

    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/econ"])
        .assert()
        .success();

    let intro = fs::read_to_string(dir.path().join("pages/intro.html"))?;
    assert!(intro.contains(r#"<a href="/econ/pages/topics/algebra.html">Topics/Algebra</a>"#));
    assert!(intro.contains("<title>Intro</title>"));
    assert!(intro.contains(r#"href="/econ/assets/css/style.css""#));
    assert!(intro.contains(r#"class="active""#));

    let algebra = fs::read_to_string(dir.path().join("pages/topics/algebra.html"))?;
    assert_eq!(algebra.matches("<h1>").count(), 1, "title heading is not repeated");
    assert!(algebra.contains(r#"src="/econ/assets/media/Topics/img/groups.png""#));
    assert!(dir.path().join("assets/media/Topics/img/groups.png").is_file());

    let section_index = fs::read_to_string(dir.path().join("pages/topics/index.html"))?;
    assert!(section_index.contains(r#"<a href="/econ/pages/topics/algebra.html">Algebra</a>"#));

    let site: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("assets/site.json"))?)?;
    let nodes = site.as_array().expect("json array");
    assert_eq!(nodes[0]["title"], "Intro");
    assert_eq!(nodes[1]["title"], "Topics");
    assert_eq!(nodes[1]["kind"], "section");
    assert_eq!(nodes[1]["children"][0]["title"], "Algebra");
    assert_eq!(nodes[1]["children"][0]["slug"], "algebra");
    assert_eq!(nodes[1]["children"][0]["path"], "/pages/topics/algebra.html");

    let info: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("assets/build-info.json"))?)?;
    assert_eq!(info["builder"], "vaultpress");
    assert_eq!(info["asset_base"], "/econ");
    assert_eq!(info["counts"]["pages"], 2);
    // top-level sections only
    assert_eq!(info["counts"]["sections"], 1);

    let sidebar = fs::read_to_string(dir.path().join("assets/partials/sidebar.html"))?;
    assert!(sidebar.contains(r#"<a href="/econ/pages/intro.html">Intro</a>"#));
    assert!(!sidebar.contains("active"));

    let landing = fs::read_to_string(dir.path().join("index.html"))?;
    assert!(landing.contains(r#"href="/econ/pages/topics/index.html""#));
    Ok(())
}

#[test]
fn build_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    let outputs = [
        "pages/intro.html",
        "pages/topics/algebra.html",
        "pages/topics/index.html",
        "assets/site.json",
        "assets/build-info.json",
        "assets/partials/sidebar.html",
        "index.html",
    ];

    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/"])
        .assert()
        .success();
    let first: Vec<String> = outputs
        .iter()
        .map(|rel| fs::read_to_string(dir.path().join(rel)))
        .collect::<Result<_, _>>()?;

    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/"])
        .assert()
        .success();
    for (rel, before) in outputs.iter().zip(&first) {
        assert_eq!(&fs::read_to_string(dir.path().join(rel))?, before, "{rel} changed");
    }
    Ok(())
}

#[test]
fn removed_notes_do_not_linger() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/"])
        .assert()
        .success();
    fs::remove_file(dir.path().join("vault/Intro.md"))?;
    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/"])
        .assert()
        .success();
    assert!(!dir.path().join("pages/intro.html").exists());
    assert!(dir.path().join("pages/topics/algebra.html").exists());
    Ok(())
}

#[test]
fn missing_book_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    vaultpress(dir.path())?
        .args(["--book", "no-such-vault", "--asset-base", "/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source folder not found"));
    assert!(!dir.path().join("pages").exists());
    Ok(())
}

#[test]
fn template_without_content_is_rejected_before_writing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    write(dir.path(), "templates/broken.html", "<h1>{{ title }}</h1>")?;
    vaultpress(dir.path())?
        .args([
            "--book",
            "vault",
            "--asset-base",
            "/",
            "--template",
            "templates/broken.html",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("content"));
    assert!(!dir.path().join("pages").exists());
    assert!(!dir.path().join("assets").exists());
    Ok(())
}

#[test]
fn unwritable_output_is_reported_but_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    // a directory where the manifest file should go
    fs::create_dir_all(dir.path().join("assets/site.json"))?;

    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("site.json"));
    assert!(dir.path().join("pages/intro.html").is_file());
    assert!(dir.path().join("assets/build-info.json").is_file());

    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Strict mode"));
    Ok(())
}

#[test]
fn strict_mode_fails_on_unresolved_links() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    write(dir.path(), "vault/Broken.md", "Points at [[Nowhere]]\n")?;

    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/"])
        .assert()
        .success();
    let broken = fs::read_to_string(dir.path().join("pages/broken.html"))?;
    assert!(broken.contains("Points at Nowhere"));

    vaultpress(dir.path())?
        .args(["--book", "vault", "--asset-base", "/", "--strict"])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn site_file_and_ignore_patterns() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    write(dir.path(), "vault/Templates/Daily.md", "template")?;
    write(dir.path(), "vault/Scratch.md", "scratch")?;
    write(
        dir.path(),
        "site.yml",
        "site:\n  title: Mathematical Economics\nignore_patterns:\n  - '^Templates/'\n",
    )?;

    vaultpress(dir.path())?
        .args([
            "--book",
            "vault",
            "--asset-base",
            "/",
            "--config",
            "site.yml",
            "--ignore",
            "^Scratch\\.md$",
        ])
        .assert()
        .success();

    assert!(!dir.path().join("pages/templates").exists());
    assert!(!dir.path().join("pages/scratch.html").exists());
    let landing = fs::read_to_string(dir.path().join("index.html"))?;
    assert!(landing.contains("<title>Mathematical Economics</title>"));
    Ok(())
}

#[test]
fn custom_out_and_assets_folders() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;

    vaultpress(dir.path())?
        .args([
            "--book",
            "vault",
            "--asset-base",
            "/",
            "--out",
            "site/pages",
            "--assets",
            "site/assets",
        ])
        .assert()
        .success();

    let intro = fs::read_to_string(dir.path().join("site/pages/intro.html"))?;
    assert!(intro.contains(r#"<a href="/site/pages/topics/algebra.html">Topics/Algebra</a>"#));
    let root_index = fs::read_to_string(dir.path().join("site/pages/index.html"))?;
    assert!(root_index.contains(r#"<a href="/site/pages/intro.html">Intro</a>"#));
    assert!(dir.path().join("site/assets/site.json").is_file());
    assert!(dir.path().join("site/assets/media/Topics/img/groups.png").is_file());
    let landing = fs::read_to_string(dir.path().join("site/index.html"))?;
    assert!(landing.contains(r#"href="/site/pages/topics/index.html""#));
    assert!(!dir.path().join("pages").exists());
    Ok(())
}

#[test]
fn pages_at_site_root_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    vaultpress(dir.path())?
        .args([
            "--book",
            "vault",
            "--asset-base",
            "/",
            "--out",
            "site",
            "--assets",
            "site/assets",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is the site root"));
    assert!(!dir.path().join("site").exists());
    Ok(())
}

#[test]
fn missing_required_flags() -> Result<(), Box<dyn std::error::Error>> {
    let dir = project()?;
    vaultpress(dir.path())?
        .args(["--asset-base", "/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--book"));
    Ok(())
}
