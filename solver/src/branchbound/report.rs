use std::fmt::Write as _;

/// Snapshot of the engine state behind one progress line.
#[derive(Debug, Clone, Copy)]
pub struct ProgressLine {
    pub is_solution: bool,
    pub step: u64,
    pub queued: usize,
    pub depth: usize,
    pub bound: f64,
    pub best_bound: f64,
    pub best_obj: f64,
    pub gap_ratio: f64,
    pub elapsed: f64,
    pub id: i64,
    pub parent: i64,
    pub strong_eval: u64,
    pub strong_eval_time: f64,
}

/// Writes the fixed-width progress table on stdout. Incumbent lines are
/// prefixed with `*`.
#[derive(Debug, Default)]
pub struct Reporter;

impl Reporter {
    pub fn print_header(&self) {
        println!(
            "   Step   Left  Depth     Curr Bnd   Best Bound     Best obj  Gap %   Time         Index Parent  StrEval (Time)"
        );
    }

    pub fn print_line(&self, line: &ProgressLine) {
        println!("{}", format_line(line));
    }
}

fn format_line(line: &ProgressLine) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{}{:6} {:6}  {:5}   {:10.2}   {:10.2}   {:10.2} {:6.2} {:6.0}        {:6} {:6}  {:6} ({:5.1})",
        if line.is_solution { "*" } else { " " },
        line.step,
        line.queued,
        line.depth,
        line.bound,
        line.best_bound,
        line.best_obj,
        line.gap_ratio * 100.0,
        line.elapsed,
        line.id,
        line.parent,
        line.strong_eval,
        line.strong_eval_time,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incumbent_lines_are_starred() {
        let line = ProgressLine {
            is_solution: true,
            step: 12,
            queued: 3,
            depth: 2,
            bound: 50.0,
            best_bound: 60.0,
            best_obj: 50.0,
            gap_ratio: 0.2,
            elapsed: 1.4,
            id: 7,
            parent: 3,
            strong_eval: 5,
            strong_eval_time: 0.25,
        };
        let text = format_line(&line);
        assert!(text.starts_with('*'));
        assert!(text.contains("50.00"));
        assert!(text.contains("20.00"));

        let plain = format_line(&ProgressLine { is_solution: false, ..line });
        assert!(plain.starts_with(' '));
    }
}
