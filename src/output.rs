use console::Style;

use crate::mutants::{Mutant, Status};
use crate::report::{Results, Summary};

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_warning(msg: &str) {
    let style = Style::new().yellow().bold();
    eprintln!("{} {}", style.apply_to("!"), msg);
}

pub fn print_info(msg: &str) {
    let dim = Style::new().dim();
    println!("{}", dim.apply_to(msg));
}

pub fn print_discovery(total: usize, runnable: usize, seconds: f64) {
    let style = Style::new().green().bold();
    println!(
        "{} found {} mutants ({} runnable) in {:.1}s",
        style.apply_to("✓"),
        total,
        runnable,
        seconds,
    );
}

pub fn print_mutant(mutant: &Mutant) {
    let (glyph, style) = match mutant.status {
        Status::Killed => ("✓", Style::new().green()),
        Status::Lived => ("!", Style::new().yellow().bold()),
        Status::Error => ("✗", Style::new().red().bold()),
        Status::Runnable => ("·", Style::new().cyan()),
        Status::NotViable | Status::TimedOut | Status::NotCovered | Status::Skipped => {
            ("·", Style::new().dim())
        }
    };
    let kind_style = Style::new().magenta();

    println!(
        "  {} {:<12} {} {}",
        style.apply_to(glyph),
        style.apply_to(mutant.status.as_str()),
        kind_style.apply_to(mutant.kind.name()),
        mutant.position(),
    );
    if let Some(err) = &mutant.test_exec_error {
        let dim = Style::new().dim();
        println!("      {}", dim.apply_to(err));
    }
}

pub fn print_summary(results: &Results) {
    let summary = Summary::of(&results.mutants);
    let seconds = results.elapsed.as_secs_f64();

    println!();
    if summary.lived == 0 {
        let style = Style::new().green().bold();
        println!(
            "{} {}: {} killed, none lived ({:.1}% efficacy) in {:.1}s",
            style.apply_to("✓"),
            results.module,
            summary.killed,
            summary.efficacy() * 100.0,
            seconds,
        );
    } else {
        let style = Style::new().yellow().bold();
        println!(
            "{} {}: {} lived / {} tested ({:.1}% efficacy) in {:.1}s",
            style.apply_to("!"),
            results.module,
            summary.lived,
            summary.killed + summary.lived,
            summary.efficacy() * 100.0,
            seconds,
        );
    }

    let dim = Style::new().dim();
    if summary.not_viable > 0 {
        println!("  {} {} not viable", dim.apply_to("·"), summary.not_viable);
    }
    if summary.timed_out > 0 {
        println!("  {} {} timed out", dim.apply_to("·"), summary.timed_out);
    }
    if summary.not_covered > 0 {
        println!("  {} {} not covered", dim.apply_to("·"), summary.not_covered);
    }
    if summary.skipped > 0 {
        println!(
            "  {} {} skipped (outside the change set)",
            dim.apply_to("·"),
            summary.skipped
        );
    }
    if summary.errors > 0 {
        let err = Style::new().red();
        println!("  {} {} errored", err.apply_to("·"), summary.errors);
    }
}
