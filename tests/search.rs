//! End-to-end tests: a gzipped corpus on disk, loaded and searched through
//! the public API.

use dsff::corpus::{load_from_path, Corpus, Entry, LoadError};
use dsff::query::paging::total_pages;
use dsff::query::{SearchExecutor, SearchMode};
use dsff::utils::{concept_slug, normalize_for_search, strip_bracketed_content};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a gzipped JSON array to `dir/name` and return its path
fn write_gz(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(serde_json::to_string(value).unwrap().as_bytes())
        .unwrap();
    encoder.finish().unwrap();
    path
}

fn search_titles(corpus: &Corpus, query: &str, mode: SearchMode) -> Vec<String> {
    SearchExecutor::new(corpus)
        .search(&normalize_for_search(query), mode, 1, 100)
        .entries
        .into_iter()
        .map(|entry| entry.title)
        .collect()
}

fn dictionary() -> serde_json::Value {
    json!([
        {
            "title": "trencar el gel",
            "title_normalized_wp": "trencar el gel",
            "title_normalized_wpc": "trencar el gel",
            "concepte": "GEL",
            "categoria": "sv",
            "definicio": "Iniciar una conversa."
        },
        { "title": "ésser de gel", "concepte": "GEL", "antonim_concepte": true },
        { "title": "fer (algú) el préssec", "concepte": "ENGANYAR", "accepcio_concepte": "1." },
        { "title": "enredar la troca", "concepte": "ENGANYAR", "accepcio_concepte": "2." },
        { "title": "fer la guitza", "concepte": "ENGANYAR" },
        { "title": "música pop", "concepte": "MÚSICA" },
        { "title": "cançó popular", "concepte": "MÚSICA" },
        { "title": "pop-rock", "concepte": "MÚSICA" },
        { "title": "anar de bòlit", "concepte": "ÀNSIA", "nova_incorporacio": true }
    ])
}

#[test]
fn test_one_entry_corpus() {
    let dir = TempDir::new().unwrap();
    let path = write_gz(
        dir.path(),
        "one.json.gz",
        &json!([{ "title": "trencar el gel", "concepte": "GEL" }]),
    );
    let corpus = load_from_path(&path).unwrap();
    let executor = SearchExecutor::new(&corpus);

    assert_eq!(executor.search("gel", SearchMode::Contains, 1, 10).total, 1);
    assert_eq!(executor.search("ela", SearchMode::Contains, 1, 10).total, 0);
}

#[test]
fn test_loaded_fields_match_recomputed_normalization() {
    let dir = TempDir::new().unwrap();
    let path = write_gz(dir.path(), "data.json.gz", &dictionary());
    let corpus = load_from_path(&path).unwrap();

    assert!(corpus.inconsistent_entries().is_empty());
    for entry in corpus.entries() {
        assert_eq!(
            entry.title_normalized_wpc,
            normalize_for_search(&strip_bracketed_content(&entry.title))
        );
        assert_eq!(entry.title_normalized_wp, normalize_for_search(&entry.title));
    }
}

#[test]
fn test_modes_over_loaded_corpus() {
    let dir = TempDir::new().unwrap();
    let corpus = load_from_path(&write_gz(dir.path(), "data.json.gz", &dictionary())).unwrap();

    assert_eq!(
        search_titles(&corpus, "Pop", SearchMode::Contains),
        vec!["música pop", "pop-rock"]
    );
    assert_eq!(
        search_titles(&corpus, "FER", SearchMode::StartsWith),
        vec!["fer (algú) el préssec", "fer la guitza"]
    );
    // Parenthetical content is searchable through the full-title field
    assert_eq!(
        search_titles(&corpus, "fer alg", SearchMode::StartsWith),
        vec!["fer (algú) el préssec"]
    );
    assert_eq!(
        search_titles(&corpus, "de gel", SearchMode::EndsWith),
        vec!["ésser de gel"]
    );
    assert_eq!(
        search_titles(&corpus, "Fer el préssec", SearchMode::ExactMatch),
        vec!["fer (algú) el préssec"]
    );
    assert!(search_titles(&corpus, "", SearchMode::Contains).is_empty());
}

#[test]
fn test_page_past_the_end() {
    let entries: Vec<serde_json::Value> = (0..25)
        .map(|i| json!({ "title": format!("frase número {}", i), "concepte": "FRASE" }))
        .collect();
    let dir = TempDir::new().unwrap();
    let corpus = load_from_path(&write_gz(dir.path(), "many.json.gz", &json!(entries))).unwrap();
    let executor = SearchExecutor::new(&corpus);

    for page_size in [1, 7, 10, 25, 40] {
        let beyond = total_pages(25, page_size) + 1;
        let page = executor.search("frase", SearchMode::Contains, beyond, page_size);
        assert!(page.entries.is_empty());
        assert_eq!(page.total, 25);
    }
}

#[test]
fn test_concept_page_order() {
    let dir = TempDir::new().unwrap();
    let corpus = load_from_path(&write_gz(dir.path(), "data.json.gz", &dictionary())).unwrap();
    let executor = SearchExecutor::new(&corpus);

    let titles: Vec<String> = executor
        .entries_for_slug(&concept_slug("Enganyar"))
        .into_iter()
        .map(|entry| entry.title)
        .collect();
    assert_eq!(
        titles,
        vec!["fer la guitza", "fer (algú) el préssec", "enredar la troca"]
    );

    let gel = executor.entries_for_concept("gel");
    assert_eq!(gel.len(), 2);
    assert!(!gel[0].antonym);
    assert!(gel[1].antonym);

    assert!(executor.entries_for_concept("NO EXISTEIX").is_empty());
}

#[test]
fn test_letters_and_phrases() {
    let dir = TempDir::new().unwrap();
    let corpus = load_from_path(&write_gz(dir.path(), "data.json.gz", &dictionary())).unwrap();

    let letters: Vec<&str> = corpus.letters().collect();
    assert_eq!(letters, vec!["A", "E", "G", "M"]);
    assert_eq!(corpus.concepts_for_letter("A").unwrap(), ["ÀNSIA".to_string()]);
    assert!(corpus.concepts_for_letter("Z").is_none());

    assert!(corpus.phrase_exists("fer el préssec"));
    assert!(corpus.phrase_exists("fer (algú) el préssec"));
    assert!(!corpus.phrase_exists("fer algú el préssec"));
}

#[test]
fn test_bad_corpora_fail_to_load() {
    let dir = TempDir::new().unwrap();

    let empty = write_gz(dir.path(), "empty.json.gz", &json!([]));
    assert!(matches!(load_from_path(&empty), Err(LoadError::Empty)));

    let no_concept = write_gz(dir.path(), "nc.json.gz", &json!([{ "title": "sense concepte" }]));
    assert!(matches!(
        load_from_path(&no_concept),
        Err(LoadError::MissingConcept { index: 0, .. })
    ));

    let not_array = write_gz(dir.path(), "obj.json.gz", &json!({ "title": "x" }));
    assert!(matches!(load_from_path(&not_array), Err(LoadError::Decode(_))));

    let missing = dir.path().join("absent.json.gz");
    assert!(matches!(load_from_path(&missing), Err(LoadError::Open { .. })));
}

#[test]
fn test_plain_json_is_accepted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.json");
    std::fs::write(&path, serde_json::to_string(&dictionary()).unwrap()).unwrap();

    let corpus = load_from_path(&path).unwrap();
    assert_eq!(corpus.len(), 9);
    assert_eq!(corpus.entries()[0], {
        let mut expected = Entry::new("trencar el gel", "GEL");
        expected.category = "sv".to_string();
        expected.definition = "Iniciar una conversa.".to_string();
        expected
    });
}
