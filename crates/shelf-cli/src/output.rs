//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;
use serde_json::Value;

use shelf_core::library::Page;
use shelf_core::{Annotation, Book, BookSuggestion, Notice, Review};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single book with its review and annotation count
    pub fn print_book(&self, book: &Book, review: Option<&Review>, annotations: usize) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", book.id);
                println!("Title:     {}", book.title);
                if !book.author.is_empty() {
                    println!("Author:    {}", book.author);
                }
                if let Some(year) = book.year {
                    println!("Year:      {}", year);
                }
                if let Some(ref publisher) = book.publisher {
                    println!("Publisher: {}", publisher);
                }
                if let Some(ref isbn) = book.isbn {
                    println!("ISBN:      {}", isbn);
                }
                if let Some(pages) = book.pages {
                    println!("Pages:     {}", pages);
                }
                println!("Status:    {}", book.status);
                if let Some(bookmark) = book.bookmark {
                    println!("Bookmark:  p. {}", bookmark);
                }
                if book.read_count > 0 {
                    println!("Read:      {} time(s)", book.read_count);
                }
                if !book.tags.is_empty() {
                    println!("Tags:      {}", book.tags.join(", "));
                }
                println!("Cover:     {}", if book.cover.is_some() { "yes" } else { "no" });
                println!("Added:     {}", book.date_added.format("%Y-%m-%d %H:%M"));
                if let Some(updated) = book.date_updated {
                    println!("Updated:   {}", updated.format("%Y-%m-%d %H:%M"));
                }

                if let Some(review) = review {
                    println!();
                    println!("── Review: {}/10 ──", review.rating);
                    if let Some(ref comment) = review.comment {
                        println!("{}", comment);
                    }
                }

                if let Some(ref summary) = book.summary {
                    println!();
                    println!("{}", summary);
                }

                if annotations > 0 {
                    println!();
                    println!("{} annotation(s)", annotations);
                }
            }
            OutputFormat::Json => {
                let mut value = book_json(book);
                if let Value::Object(ref mut map) = value {
                    map.insert("review".into(), to_value(&review));
                    map.insert("annotationCount".into(), annotations.into());
                }
                print_json(&value);
            }
            OutputFormat::Quiet => {
                println!("{}", book.id);
            }
        }
    }

    /// Print a list of books
    pub fn print_books(&self, books: &[Book]) {
        match self.format {
            OutputFormat::Human => {
                if books.is_empty() {
                    println!("No books found.");
                    return;
                }
                for book in books {
                    print_book_row(book);
                }
                println!("\n{} book(s)", books.len());
            }
            OutputFormat::Json => {
                let values: Vec<Value> = books.iter().map(book_json).collect();
                print_json(&values);
            }
            OutputFormat::Quiet => {
                for book in books {
                    println!("{}", book.id);
                }
            }
        }
    }

    /// Print one page of the collection grid
    pub fn print_page(&self, page: &Page<Book>) {
        match self.format {
            OutputFormat::Human => {
                if page.items.is_empty() {
                    println!("No books on page {}.", page.number + 1);
                    return;
                }
                for book in &page.items {
                    print_book_row(book);
                }
                println!(
                    "\nPage {} of {} ({} book(s))",
                    page.number + 1,
                    page.page_count().max(1),
                    page.total_items
                );
            }
            OutputFormat::Json => {
                let values: Vec<Value> = page.items.iter().map(book_json).collect();
                print_json(&serde_json::json!({
                    "page": page.number,
                    "pageCount": page.page_count(),
                    "totalItems": page.total_items,
                    "books": values,
                }));
            }
            OutputFormat::Quiet => {
                for book in &page.items {
                    println!("{}", book.id);
                }
            }
        }
    }

    pub fn print_review(&self, review: &Review) {
        match self.format {
            OutputFormat::Human => {
                println!("Rating:  {}/10", review.rating);
                if let Some(ref comment) = review.comment {
                    println!("Comment: {}", comment);
                }
            }
            OutputFormat::Json => print_json(review),
            OutputFormat::Quiet => println!("{}", review.rating),
        }
    }

    /// Print annotations, each with the title of its book
    pub fn print_annotations(&self, annotations: &[(Annotation, String)]) {
        match self.format {
            OutputFormat::Human => {
                if annotations.is_empty() {
                    println!("No annotations found.");
                    return;
                }
                for (note, title) in annotations {
                    println!("────────────────────────────────────────");
                    let page = note.page.map(|p| format!(", p. {}", p)).unwrap_or_default();
                    println!(
                        "#{}  {}{}  {}",
                        note.id.unwrap_or_default(),
                        title,
                        page,
                        note.date.format("%Y-%m-%d %H:%M")
                    );
                    if let Some(ref quote) = note.quote {
                        println!("> {}", quote);
                    }
                    println!();
                    println!("{}", note.text);
                    if note.image.is_some() {
                        println!("[image]");
                    }
                    println!();
                }
                println!("{} annotation(s)", annotations.len());
            }
            OutputFormat::Json => {
                let values: Vec<Value> = annotations
                    .iter()
                    .map(|(note, _)| blob_as_flag(to_value(note), "image"))
                    .collect();
                print_json(&values);
            }
            OutputFormat::Quiet => {
                for (note, _) in annotations {
                    println!("{}", note.id.unwrap_or_default());
                }
            }
        }
    }

    /// Print registry tags with how many books carry each
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print catalog suggestions
    pub fn print_suggestions(&self, suggestions: &[BookSuggestion]) {
        match self.format {
            OutputFormat::Human => {
                if suggestions.is_empty() {
                    println!("No matches in the catalog.");
                    return;
                }
                for (i, s) in suggestions.iter().enumerate() {
                    let year = s.year.map(|y| format!(" ({})", y)).unwrap_or_default();
                    println!(
                        "{}. {}{} | {} | {}",
                        i + 1,
                        truncate(&s.title, 40),
                        year,
                        truncate(&s.author, 25),
                        s.isbn.as_deref().unwrap_or("-")
                    );
                }
            }
            OutputFormat::Json => print_json(&suggestions),
            OutputFormat::Quiet => {
                for s in suggestions {
                    println!("{}", s.isbn.as_deref().unwrap_or(&s.title));
                }
            }
        }
    }

    /// Print a transient notice
    pub fn notice(&self, notice: &Notice) {
        match self.format {
            OutputFormat::Human => println!("! {}", notice.message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "notice", "message": notice.message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_book_row(book: &Book) {
    println!(
        "{} | {} | {} | {}",
        &book.id.to_string()[..8],
        truncate(&book.title, 35),
        truncate(&book.author, 25),
        book.status
    );
}

/// A book as JSON, with the cover reduced to a presence flag
fn book_json(book: &Book) -> Value {
    blob_as_flag(to_value(book), "cover")
}

fn blob_as_flag(mut value: Value, field: &str) -> Value {
    if let Value::Object(ref mut map) = value {
        let present = map.get(field).is_some_and(|v| !v.is_null());
        map.insert(field.to_string(), Value::Bool(present));
    }
    value
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode JSON: {}", e),
    }
}

/// Truncate a string to max length in characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
