mod common;

use common::fixtures::{catalog_json, encoding_dir, stories_dir, story_pages};
use storybook::loader::LOAD_FAILURE_PLACEHOLDER;
use storybook::{load_stories, Catalog, DirSource, LoadOptions, LoadReport, Story};
use storybook_render::{
    FixedCapacityOracle, HeuristicOracle, LayoutConfig, PageRole, PageSequence, Paginator,
    Viewport,
};

#[test]
fn discover_reads_names_titles_and_covers() {
    let catalog = Catalog::discover(stories_dir()).expect("fixture dir should be readable");
    let ids: Vec<u32> = catalog.stories().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let first = catalog.get(1).expect("story 1");
    assert_eq!(first.title, "Time Mailbox");
    assert_eq!(first.author, "Kim");
    assert_eq!(first.source_ref, "1.Kim.txt");
    assert_eq!(first.cover_image_ref, "image/1.Kim.png");

    let second = catalog.get(2).expect("story 2");
    assert_eq!(second.title, "두 번째 이야기");
    assert_eq!(second.cover_image_ref, "");

    let third = catalog.get(3).expect("story 3");
    assert_eq!(third.title, storybook::catalog::UNTITLED);
}

#[test]
fn load_normalizes_fixture_text() {
    let mut catalog = Catalog::discover(stories_dir()).expect("discover");
    let report = load_stories(
        catalog.stories_mut(),
        &DirSource::new(stories_dir()),
        &LoadOptions::default(),
    );
    assert_eq!(
        report,
        LoadReport {
            loaded: 3,
            failed: 0,
            skipped: 0
        }
    );

    let first = catalog.get(1).and_then(|s| s.paragraphs()).expect("loaded");
    assert_eq!(
        first,
        &[
            "The mailbox stood at the end of the street.".to_string(),
            "Nobody remembered who had put it there.".to_string(),
            "One morning a letter arrived from next year.".to_string(),
        ][..]
    );
    let second = catalog.get(2).and_then(|s| s.paragraphs()).expect("loaded");
    assert_eq!(second.len(), 8);
    assert!(second.iter().all(|p| !p.contains('→') && !p.is_empty()));
}

#[test]
fn catalog_json_with_missing_file_gets_placeholder() {
    let mut catalog = Catalog::from_json_file(catalog_json()).expect("catalog json");
    assert_eq!(catalog.len(), 3);
    let report = load_stories(
        catalog.stories_mut(),
        &DirSource::new(stories_dir()),
        &LoadOptions::default(),
    );
    assert_eq!(report.loaded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(
        catalog.get(4).and_then(|s| s.paragraphs()),
        Some(&[LOAD_FAILURE_PLACEHOLDER.to_string()][..])
    );
}

#[test]
fn damaged_or_bom_prefixed_files_still_load() {
    let mut stories = vec![
        Story::new(1, "Bad byte", "A", "bad-byte.txt", ""),
        Story::new(2, "Bom", "B", "bom.txt", ""),
    ];
    let report = load_stories(
        &mut stories,
        &DirSource::new(encoding_dir()),
        &LoadOptions::default(),
    );
    assert_eq!(report.loaded, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(
        stories[0].paragraphs(),
        Some(
            &[
                "Good line".to_string(),
                "bad \u{fffd} byte".to_string(),
                "Another line".to_string(),
            ][..]
        )
    );
    assert_eq!(
        stories[1].paragraphs(),
        Some(&["Hello".to_string(), "World".to_string()][..])
    );
}

#[test]
fn paginated_fixtures_reproduce_paragraphs() {
    let mut catalog = Catalog::discover(stories_dir()).expect("discover");
    load_stories(
        catalog.stories_mut(),
        &DirSource::new(stories_dir()),
        &LoadOptions::default(),
    );

    let seq = PageSequence::build(
        catalog.stories(),
        &Paginator::default(),
        &FixedCapacityOracle::new(3),
        Viewport::default(),
    );
    assert_eq!(seq.get(0).map(|p| p.role), Some(PageRole::Cover));
    assert_eq!(seq.get(1).map(|p| p.role), Some(PageRole::Toc));
    assert_eq!(seq.pages().last().map(|p| p.role), Some(PageRole::BackCover));

    for story in catalog.stories() {
        let pages = story_pages(&seq, story.id);
        let flat: Vec<String> = pages.into_iter().flatten().collect();
        assert_eq!(Some(flat.as_slice()), story.paragraphs());
    }
    // 8 paragraphs at 3 per page.
    assert_eq!(story_pages(&seq, 2).len(), 3);
    let labels: Vec<String> = seq
        .pages()
        .iter()
        .filter(|p| p.story_id == Some(2))
        .filter_map(|p| p.label())
        .collect();
    assert_eq!(labels, vec!["Page 1 / 3", "Page 2 / 3", "Page 3 / 3"]);
}

#[test]
fn narrower_viewport_never_needs_fewer_pages() {
    let mut catalog = Catalog::discover(stories_dir()).expect("discover");
    load_stories(
        catalog.stories_mut(),
        &DirSource::new(stories_dir()),
        &LoadOptions::default(),
    );
    let oracle = HeuristicOracle::new(LayoutConfig::default());
    let wide = PageSequence::build(
        catalog.stories(),
        &Paginator::default(),
        &oracle,
        Viewport::new(480, 800),
    );
    let narrow = PageSequence::build(
        catalog.stories(),
        &Paginator::default(),
        &oracle,
        Viewport::new(200, 360),
    );
    assert!(narrow.len() >= wide.len());
    for story in catalog.stories() {
        let flat: Vec<String> = story_pages(&narrow, story.id).into_iter().flatten().collect();
        assert_eq!(Some(flat.as_slice()), story.paragraphs());
    }
}
