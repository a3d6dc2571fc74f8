//! Pretty-print helpers for CLI output

use crate::array::LabeledArray;
use crate::catalog::CatalogEntry;
use colored::Colorize;

/// How many labels of an axis to show before eliding
const MAX_LABELS: usize = 8;

/// Print a main header
pub fn print_header(title: &str) {
    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(50).dimmed());
}

/// Print a sub-header (section within output)
pub fn print_subheader(title: &str) {
    println!();
    println!("{}", title.bold().white());
}

/// Print a key-value pair
pub fn print_field(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Display an overview of one fetched dataset
pub fn display_array_overview(id: &str, array: &LabeledArray) {
    print_header(&format!("Dataset: {}", id));

    let shape: Vec<String> = array.shape().iter().map(|n| n.to_string()).collect();
    print_field("Shape", &shape.join(" x "));
    print_field(
        "Values",
        &format!(
            "{} present, {} missing",
            format!("{}", array.count_present()).green(),
            format!("{}", array.size() - array.count_present()).yellow(),
        ),
    );

    print_subheader(&format!("Axes ({})", array.ndim()));
    for (i, axis) in array.axes().iter().enumerate() {
        println!(
            "  {}. {} [{}]: {}",
            format!("{:>2}", i + 1).dimmed(),
            axis.name.yellow(),
            axis.len(),
            summarize_labels(&axis.labels)
        );
    }
    println!();
}

/// Display catalog rows as an aligned list
pub fn display_catalog(entries: &[&CatalogEntry], total: usize) {
    print_header(&format!("Catalog ({} of {} entries)", entries.len(), total));

    if entries.is_empty() {
        println!("  {}", "(none)".dimmed());
        println!();
        return;
    }

    let width = entries.iter().map(|e| e.code.len()).max().unwrap_or(0);
    for entry in entries {
        let period = match (&entry.data_start, &entry.data_end) {
            (Some(start), Some(end)) => format!("{}-{}", start, end),
            _ => String::new(),
        };
        println!(
            "  {}  {} {}  {}",
            format!("{:<width$}", entry.code, width = width).green(),
            format!("{:<8}", entry.kind).dimmed(),
            entry.title,
            period.dimmed(),
        );
    }
    println!();
}

/// Display an error message
pub fn display_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

fn summarize_labels(labels: &[String]) -> String {
    if labels.len() <= MAX_LABELS {
        return labels.join(", ");
    }
    let head = labels[..MAX_LABELS / 2].join(", ");
    let tail = labels[labels.len() - MAX_LABELS / 2..].join(", ");
    format!("{}, ..., {}", head, tail)
}
