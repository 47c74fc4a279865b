use crate::corpus::loader::load_from_path;
use crate::corpus::snapshot::Corpus;
use anyhow::Result;
use rustc_hash::FxHashMap;
use std::path::Path;

/// Summary numbers of a loaded corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusStats {
    pub entries: usize,
    pub concepts: usize,
    pub letters: usize,
    pub phrases: usize,
    pub antonyms: usize,
    pub with_sense: usize,
    pub new_incorporations: usize,
    pub inconsistent: usize,
    /// Category code -> entry count, most frequent first
    pub categories: Vec<(String, usize)>,
}

impl CorpusStats {
    pub fn collect(corpus: &Corpus) -> Self {
        let mut categories: FxHashMap<&str, usize> = FxHashMap::default();
        let mut antonyms = 0;
        let mut with_sense = 0;
        let mut new_incorporations = 0;

        for entry in corpus.entries() {
            *categories.entry(entry.category.as_str()).or_insert(0) += 1;
            antonyms += usize::from(entry.antonym);
            with_sense += usize::from(!entry.sense.is_empty());
            new_incorporations += usize::from(entry.new_incorporation);
        }

        let mut categories: Vec<(String, usize)> = categories
            .into_iter()
            .map(|(category, count)| (category.to_string(), count))
            .collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            entries: corpus.len(),
            concepts: corpus.concepts_by_letter().values().map(Vec::len).sum(),
            letters: corpus.letter_count(),
            phrases: corpus.phrases().len(),
            antonyms,
            with_sense,
            new_incorporations,
            inconsistent: corpus.inconsistent_entries().len(),
            categories,
        }
    }
}

/// Display corpus statistics
pub fn show_stats(data_path: &Path) -> Result<()> {
    let corpus = load_from_path(data_path)?;
    let stats = CorpusStats::collect(&corpus);

    println!("Corpus Statistics");
    println!("=================");
    println!();
    println!("Data file:          {}", data_path.display());
    println!("Entries:            {}", stats.entries);
    println!("Distinct phrases:   {}", stats.phrases);
    println!("Concepts:           {}", stats.concepts);
    println!("Letters:            {}", stats.letters);
    println!("Antonym entries:    {}", stats.antonyms);
    println!("Numbered senses:    {}", stats.with_sense);
    println!("New incorporations: {}", stats.new_incorporations);

    println!();
    println!("Entries by category:");
    for (category, count) in stats.categories.iter().take(15) {
        let label = if category.is_empty() { "(none)" } else { category };
        println!("  {:15} {}", label, count);
    }

    if stats.categories.len() > 15 {
        println!("  ... and {} more", stats.categories.len() - 15);
    }

    println!();
    println!("Letters:");
    for (letter, concepts) in corpus.concepts_by_letter() {
        println!("  {}  {} concepts", letter, concepts.len());
    }

    println!();
    if stats.inconsistent == 0 {
        println!("Normalized titles: consistent");
    } else {
        println!(
            "Normalized titles: {} entries differ from the normalizer",
            stats.inconsistent
        );
        for &index in corpus.inconsistent_entries().iter().take(10) {
            let entry = &corpus.entries()[index];
            println!(
                "  #{} {:?}: stored wpc {:?}, expected {:?}",
                index,
                entry.title,
                entry.title_normalized_wpc,
                entry.computed_wpc()
            );
        }
    }

    Ok(())
}
