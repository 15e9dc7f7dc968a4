//! End-to-end build of a small club site

use movsci_site::configurator::{MovSciConfig, Passthrough, SiteConfigurator};
use movsci_site::Site;
use std::fs;
use std::path::Path;

fn write(root: &Path, path: &str, content: &[u8]) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

fn club_site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "src/_includes/base.html",
        br#"<html><head><link rel="stylesheet" href="{{ '/assets/site.css' | url }}"></head><body>{{ content }}</body></html>"#,
    );
    write(
        root,
        "src/_includes/post.html",
        b"---\nlayout: base.html\n---\n<article><h1>{{ title }}</h1><time>{{ page.date | date(format=\"yyyy-MM-dd\") }}</time>{{ content }}</article>",
    );
    write(
        root,
        "src/index.html",
        br#"---
layout: base
---
<ul>{% for post in collections.movsciposts %}<li><a href="{{ post.url | url }}">{{ post.data.title }}</a> {{ post.date | date(format="d LLL yyyy") }}</li>{% endfor %}</ul>"#,
    );
    for (slug, day, title) in [("a", 1, "Mobility"), ("b", 2, "Sprint Drills"), ("c", 3, "Squat Depth")] {
        write(
            root,
            &format!("src/posts/{}.md", slug),
            format!("---\ntitle: {}\ndate: 2024-03-0{}\nlayout: post\n---\nNotes for *{}*.\n", title, day, slug)
                .as_bytes(),
        );
    }
    write(root, "src/assets/site.css", b"body { font-family: sans-serif }");
    write(root, "src/assets/img/squat.png", &[0x89, 0x50, 0x4e, 0x47, 0, 1, 2, 3]);

    dir
}

#[test]
fn builds_index_with_newest_posts_first() {
    let dir = club_site();
    let site = Site::open(dir.path()).unwrap();
    let report = site.build().unwrap();

    assert_eq!(report.written, 4);
    assert_eq!(report.copied, 2);
    assert_eq!(report.collections["movsciposts"], 3);

    let index = fs::read_to_string(dir.path().join("_site/index.html")).unwrap();
    let c = index.find("Squat Depth").unwrap();
    let b = index.find("Sprint Drills").unwrap();
    let a = index.find("Mobility").unwrap();
    assert!(c < b && b < a, "{}", index);
    assert!(index.contains(r#"<a href="/movement_science_club/posts/c/">Squat Depth</a> 3 Mar 2024"#));
    assert!(index.contains(r#"href="/movement_science_club/assets/site.css""#));
}

#[test]
fn renders_posts_through_layout_chain() {
    let dir = club_site();
    Site::open(dir.path()).unwrap().build().unwrap();

    let post = fs::read_to_string(dir.path().join("_site/posts/b/index.html")).unwrap();
    assert!(post.starts_with("<html>"));
    assert!(post.contains("<h1>Sprint Drills</h1><time>2024-03-02</time>"));
    assert!(post.contains("<em>b</em>"));
}

#[test]
fn passthrough_mirrors_assets() {
    let dir = club_site();
    Site::open(dir.path()).unwrap().build().unwrap();

    for path in ["site.css", "img/squat.png"] {
        let source = fs::read(dir.path().join("src/assets").join(path)).unwrap();
        let copied = fs::read(dir.path().join("_site/assets").join(path)).unwrap();
        assert_eq!(source, copied, "{}", path);
    }
    // Assets are copied, never rendered as pages
    assert!(!dir.path().join("_site/assets/site/index.html").exists());
}

#[test]
fn loosely_typed_front_matter_keeps_date_and_layout() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/_includes/post.html", b"<article>{{ content }}</article>");
    write(
        root,
        "src/index.html",
        b"{% for post in collections.movsciposts %}{{ post.fileSlug }} {% endfor %}",
    );
    write(root, "src/posts/a.md", b"---\ndate: 2020-01-01\n---\nA");
    write(
        root,
        "src/posts/b.md",
        b"---\ndate: 2019-01-01\nlayout: post\nweek: 3\ntags: [2024, strength]\n---\nB",
    );
    write(root, "src/posts/c.md", b"---\ndate: 2022-01-01\n---\nC");

    let report = Site::open(root).unwrap().build().unwrap();
    assert_eq!(report.collections["strength"], 1);
    assert_eq!(report.collections["2024"], 1);

    let index = fs::read_to_string(root.join("_site/index.html")).unwrap();
    assert_eq!(index, "c a b ");
    let post = fs::read_to_string(root.join("_site/posts/b/index.html")).unwrap();
    assert_eq!(post, "<article><p>B</p>\n</article>");
}

#[test]
fn listing_shows_excerpts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "src/index.html",
        b"{% for post in collections.movsciposts %}[{% if post.excerpt %}{{ post.excerpt }}{% else %}-{% endif %}]{% endfor %}",
    );
    write(
        root,
        "src/posts/a.md",
        b"---\ndate: 2024-01-01\n---\nWarm up *first*.\n\n<!-- more -->\n\nThen lift.",
    );
    write(root, "src/posts/b.md", b"---\ndate: 2024-01-02\n---\nNo excerpt.");

    Site::open(root).unwrap().build().unwrap();
    let index = fs::read_to_string(root.join("_site/index.html")).unwrap();
    assert_eq!(index, "[-][<p>Warm up <em>first</em>.</p>\n]");

    let post = fs::read_to_string(root.join("_site/posts/a/index.html")).unwrap();
    assert!(post.contains("Then lift."));
}

#[test]
fn rebuild_is_idempotent() {
    let dir = club_site();
    let site = Site::open(dir.path()).unwrap();
    let first_report = site.build().unwrap();
    let first = fs::read_to_string(dir.path().join("_site/index.html")).unwrap();

    let second_report = site.reload().unwrap().build().unwrap();
    let second = fs::read_to_string(dir.path().join("_site/index.html")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_report, second_report);
}

#[test]
fn empty_posts_directory_builds() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "src/index.html",
        b"{{ collections.movsciposts | length }} posts",
    );
    let report = Site::open(dir.path()).unwrap().build().unwrap();
    assert_eq!(report.collections["movsciposts"], 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("_site/index.html")).unwrap(),
        "0 posts"
    );
}

#[test]
fn non_date_value_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "src/index.md",
        b"---\nwhen: someday\n---\n{{ when | date(format=\"yyyy\") }}",
    );
    let err = Site::open(dir.path()).unwrap().build().unwrap_err();
    assert!(format!("{:#}", err).contains("not a date"));
}

struct ExtraAssets;

impl SiteConfigurator for ExtraAssets {
    fn settings(&self) -> movsci_site::config::SiteSettings {
        MovSciConfig.settings()
    }

    fn list_passthroughs(&self) -> Vec<Passthrough> {
        // Same directory twice collapses to one rule
        vec![Passthrough::new("src/assets"), Passthrough::new("./src/assets")]
    }

    fn list_collections(&self) -> Vec<movsci_site::collections::Collection> {
        MovSciConfig.list_collections()
    }

    fn list_filters(&self) -> Vec<movsci_site::filters::Filter> {
        MovSciConfig.list_filters()
    }
}

#[test]
fn custom_configurator_dedupes_passthroughs() {
    let dir = club_site();
    let site = Site::new(dir.path(), ExtraAssets).unwrap();
    assert_eq!(site.config.passthroughs().len(), 1);
    assert_eq!(site.build().unwrap().copied, 2);
}
