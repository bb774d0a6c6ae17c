//! Basic usage: compare two small documents and print the marker output.

use splitdiff_core::{compare_strings, markers, CompareOptions, ViewId};

fn main() {
    let old_text = "fn main() {\n    println!(\"hello world\");\n}";
    let new_text = "fn main() {\n    println!(\"hello brave world\");\n    run();\n}";

    let options = CompareOptions::default();
    let (report, sink) = compare_strings(old_text, new_text, &options).expect("compare failed");

    println!("status: {:?}\n", report.status);

    for view in [ViewId::Main, ViewId::Sub] {
        println!("{view:?} markers:");

        for (line, mask) in sink.markers_for(view) {
            let name = match mask {
                markers::ADDED => "added",
                markers::REMOVED => "removed",
                markers::CHANGED => "changed",
                markers::CHANGED_LOCAL => "changed (local)",
                _ => "other",
            };
            println!("  line {line}: {name}");
        }

        for (offset, len) in sink.changes_for(view) {
            println!("  changed bytes: {offset}..{}", offset + len);
        }

        println!();
    }

    println!("alignment:");
    for pair in &report.alignment {
        println!(
            "  main {} (mask {:#x}) <-> sub {} (mask {:#x})",
            pair.main.line, pair.main.diff_mask, pair.sub.line, pair.sub.diff_mask
        );
    }
}
