#![allow(dead_code)]

/// Sample scripts shared by the integration tests and benches.
pub const INTRO: &str = include_str!("scripts/intro.nms");
pub const BRANCHING: &str = include_str!("scripts/branching.nms");
pub const LOOPS: &str = include_str!("scripts/loops.nms");

pub fn golden_scripts() -> [(&'static str, &'static str); 3] {
    [("intro", INTRO), ("branching", BRANCHING), ("loops", LOOPS)]
}

/// A script with `scenes` scenes of mixed statements, for size-dependent
/// checks.
pub fn generated_script(scenes: usize) -> String {
    let mut text = String::from("character hero(name: \"Alex\")\n");
    for index in 0..scenes {
        text.push_str(&format!(
            "scene s{index} {{\n    say hero \"line {index}\"\n    set n = n + {index}\n    if n > {index} {{ wait 0.5 }} else {{ goto s0 }}\n    choice {{ \"a\" -> {{ say \"x\" }} \"b\" if n == 2 -> {{ }} }}\n}}\n"
        ));
    }
    text
}
