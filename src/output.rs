//! Terminal rendering of search pages, concept pages and letter listings

use crate::corpus::Entry;
use crate::query::{PageInfo, SearchMode};
use crate::utils::{concept_slug, concept_title};
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Open stdout with or without color
pub fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn write_colored<W: WriteColor>(out: &mut W, spec: &ColorSpec, text: &str) -> io::Result<()> {
    out.set_color(spec)?;
    write!(out, "{}", text)?;
    out.reset()
}

fn title_spec() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Green)).set_bold(true);
    spec
}

fn concept_spec() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Magenta));
    spec
}

fn dim_spec() -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Cyan));
    spec
}

/// Print one page of search results with its navigation footer
pub fn print_search_page<W: WriteColor>(
    out: &mut W,
    query: &str,
    mode: SearchMode,
    entries: &[Entry],
    total: usize,
    page: &PageInfo,
) -> io::Result<()> {
    if total == 0 {
        writeln!(out, "No results for \"{}\" ({})", query, mode.label())?;
        return Ok(());
    }

    writeln!(out, "{} results for \"{}\" ({})", total, query, mode.label())?;
    writeln!(out)?;

    for entry in entries {
        write_colored(out, &title_spec(), &entry.title)?;
        write!(out, "  ")?;
        write_colored(out, &concept_spec(), &concept_title(&entry.concept))?;
        if entry.antonym {
            write!(out, " (antònim)")?;
        }
        writeln!(out)?;

        if !entry.definition.is_empty() {
            writeln!(out, "    {}", entry.definition)?;
        }
    }

    writeln!(out)?;
    print_page_footer(out, page)
}

/// Print "page X of Y" with the neighbouring page numbers
pub fn print_page_footer<W: WriteColor>(out: &mut W, page: &PageInfo) -> io::Result<()> {
    out.set_color(&dim_spec())?;
    write!(out, "Page {} of {}", page.current, page.total_pages)?;
    if let Some(previous) = page.previous {
        write!(out, "  prev: --page {}", previous)?;
    }
    if let Some(next) = page.next {
        write!(out, "  next: --page {}", next)?;
    }
    out.reset()?;
    writeln!(out)
}

/// Print every entry of a concept, antonym entries under their own heading
pub fn print_concept<W: WriteColor>(out: &mut W, concept: &str, entries: &[Entry]) -> io::Result<()> {
    write_colored(out, &concept_spec(), &concept_title(concept).to_uppercase())?;
    writeln!(out)?;

    let mut in_antonyms = false;
    for entry in entries {
        if entry.antonym && !in_antonyms {
            in_antonyms = true;
            writeln!(out)?;
            write_colored(out, &dim_spec(), "Antònims")?;
            writeln!(out)?;
        }
        writeln!(out)?;
        print_entry(out, entry)?;
    }

    Ok(())
}

/// Print all populated fields of one entry
pub fn print_entry<W: WriteColor>(out: &mut W, entry: &Entry) -> io::Result<()> {
    if !entry.sense.is_empty() {
        write!(out, "{} ", entry.sense)?;
    }
    write_colored(out, &title_spec(), &entry.title)?;
    if !entry.category.is_empty() {
        write!(out, " [{}]", entry.category)?;
    }
    if entry.new_incorporation {
        write!(out, " *")?;
    }
    writeln!(out)?;

    let fields = [
        ("Definició", &entry.definition, &entry.definition_source),
        ("Exemples", &entry.examples, &entry.examples_source),
    ];
    for (label, text, source) in fields {
        if text.is_empty() {
            continue;
        }
        write!(out, "  {}: {}", label, text)?;
        if !source.is_empty() {
            write!(out, " ({})", source)?;
        }
        writeln!(out)?;
    }

    let extras = [
        ("Sinònims", &entry.synonyms),
        ("Altres relacions", &entry.related),
        ("Variants dialectals", &entry.dialectal_variants),
        ("Marcatge dialectal", &entry.dialectal_marking),
        ("Observacions", &entry.observations),
    ];
    for (label, text) in extras {
        if !text.is_empty() {
            writeln!(out, "  {}: {}", label, text)?;
        }
    }

    Ok(())
}

/// Print the concepts of one letter with their slugs
pub fn print_letter<W: WriteColor>(out: &mut W, letter: &str, concepts: &[String]) -> io::Result<()> {
    write_colored(out, &title_spec(), letter)?;
    writeln!(out, " ({} concepts)", concepts.len())?;

    for concept in concepts {
        write!(out, "  ")?;
        write_colored(out, &concept_spec(), &concept_title(concept))?;
        writeln!(out, "  {}", concept_slug(concept))?;
    }

    Ok(())
}

/// Print the letter overview
pub fn print_letters<W: WriteColor>(out: &mut W, letters: &[(String, usize)]) -> io::Result<()> {
    for (letter, count) in letters {
        write_colored(out, &title_spec(), letter)?;
        writeln!(out, "  {}", count)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    fn render(f: impl FnOnce(&mut NoColor<Vec<u8>>) -> io::Result<()>) -> String {
        let mut out = NoColor::new(Vec::new());
        f(&mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_search_page_output() {
        let entries = vec![Entry::new("trencar el gel", "GEL1")];
        let page = PageInfo::new(1, 11, 10);
        let text = render(|out| {
            print_search_page(out, "gel", SearchMode::Contains, &entries, 11, &page)
        });

        assert!(text.starts_with("11 results for \"gel\" (Conté)"));
        assert!(text.contains("trencar el gel  gel 1"));
        assert!(text.contains("Page 1 of 2  next: --page 2"));
    }

    #[test]
    fn test_no_results_output() {
        let page = PageInfo::new(1, 0, 10);
        let text = render(|out| print_search_page(out, "glaç", SearchMode::ExactMatch, &[], 0, &page));
        assert_eq!(text, "No results for \"glaç\" (Coincident)\n");
    }

    #[test]
    fn test_concept_output_groups_antonyms() {
        let mut defined = Entry::new("trencar el gel", "GEL");
        defined.definition = "Iniciar una conversa.".to_string();
        let entries = vec![defined, Entry::new("ésser de gel", "GEL").with_antonym(true)];

        let text = render(|out| print_concept(out, "GEL", &entries));
        let antonyms_at = text.find("Antònims").unwrap();
        assert!(text.find("trencar el gel").unwrap() < antonyms_at);
        assert!(text.find("ésser de gel").unwrap() > antonyms_at);
        assert!(text.contains("  Definició: Iniciar una conversa."));
    }

    #[test]
    fn test_letter_output() {
        let concepts = vec!["FER GOIG".to_string()];
        let text = render(|out| print_letter(out, "F", &concepts));
        assert_eq!(text, "F (1 concepts)\n  fer goig  fer_goig\n");
    }
}
