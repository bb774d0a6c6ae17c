//! Move detection: a block of lines relocated within the document shows up
//! as MOVED markers instead of a remove/add pair.

use splitdiff_core::{compare_strings, markers, CompareOptions, ViewId};

fn main() {
    let old_text = "intro\nhelper_a\nhelper_b\nbody_1\nbody_2\nbody_3\noutro";
    let new_text = "intro\nbody_1\nbody_2\nbody_3\nhelper_a\nhelper_b\noutro";

    let options = CompareOptions::new().with_detect_moves(true);
    let (report, sink) = compare_strings(old_text, new_text, &options).expect("compare failed");

    println!("status: {:?}\n", report.status);

    for view in [ViewId::Main, ViewId::Sub] {
        println!("{view:?}:");

        for (line, mask) in sink.markers_for(view) {
            let name = match mask {
                markers::MOVED_LINE => "moved line",
                markers::MOVED_BEGIN => "moved block begin",
                markers::MOVED_MID => "moved block middle",
                markers::MOVED_END => "moved block end",
                markers::ADDED => "added",
                markers::REMOVED => "removed",
                _ => "other",
            };
            println!("  line {line}: {name}");
        }

        println!();
    }
}
