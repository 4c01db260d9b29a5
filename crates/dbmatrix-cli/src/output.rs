//! Terminal output formatting.

use colored::Colorize;

use dbmatrix_graph::DatabaseCounts;
use dbmatrix_sync::CycleReport;

/// Print the summary of a completed cycle.
pub fn print_cycle_report(report: &CycleReport) {
    println!();
    println!("{}", "Sync complete:".green().bold());
    for db in &report.databases {
        println!(
            "  {:<20} {} tables, {} foreign keys",
            db.database.cyan(),
            db.tables,
            db.foreign_keys
        );
    }
    println!("  Tables upserted:       {}", report.sync.tables_upserted);
    println!("  Foreign keys linked:   {}", report.sync.foreign_keys_linked);
    if report.sync.foreign_keys_skipped > 0 {
        println!(
            "  Foreign keys skipped:  {}",
            report.sync.foreign_keys_skipped.to_string().yellow()
        );
    }
    println!(
        "  {}",
        format!("cycle {} in {} ms", report.cycle_id, report.elapsed.as_millis()).dimmed()
    );
}

/// Print per-database graph counts as a table.
pub fn print_counts(counts: &[DatabaseCounts]) {
    if counts.is_empty() {
        println!("{}", "  No tables in graph.".dimmed());
        return;
    }

    println!("  {:<24} {:>8} {:>14}", "Database", "Tables", "Foreign keys");
    for c in counts {
        println!(
            "  {:<24} {:>8} {:>14}",
            c.database,
            c.tables.to_string().cyan(),
            c.foreign_keys.to_string().cyan()
        );
    }
}
