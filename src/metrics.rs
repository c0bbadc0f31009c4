use serde::{Deserialize, Serialize};

/// Characters per "word" when converting typed characters to words per minute
pub const CHARS_PER_WORD: f64 = 5.0;

/// Percentage of judged positions that matched, rounded. Nothing judged counts as 100.
pub fn compute_accuracy(correct_count: usize, total_count: usize) -> u32 {
    if total_count == 0 {
        return 100;
    }
    ((correct_count as f64 / total_count as f64) * 100.0).round() as u32
}

/// Words per minute where every 5 characters make one word. Zero elapsed time yields 0.
pub fn compute_wpm(char_count: usize, elapsed_secs: u64) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    let words = char_count as f64 / CHARS_PER_WORD;
    let minutes = elapsed_secs as f64 / 60.0;
    (words / minutes).round() as u32
}

/// Format whole seconds as zero-padded `mm:ss`
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    strum_macros::Display,
)]
pub enum Grade {
    #[strum(to_string = "S")]
    S,
    #[strum(to_string = "A+")]
    APlus,
    #[strum(to_string = "A")]
    A,
    #[strum(to_string = "B+")]
    BPlus,
    #[strum(to_string = "B")]
    B,
    #[strum(to_string = "C+")]
    CPlus,
    #[strum(to_string = "C")]
    C,
    #[strum(to_string = "D")]
    D,
}

/// (grade, minimum wpm, minimum accuracy), best grade first
const GRADE_THRESHOLDS: [(Grade, u32, u32); 7] = [
    (Grade::S, 80, 98),
    (Grade::APlus, 70, 95),
    (Grade::A, 60, 92),
    (Grade::BPlus, 50, 90),
    (Grade::B, 40, 88),
    (Grade::CPlus, 30, 85),
    (Grade::C, 20, 80),
];

pub fn letter_grade(wpm: u32, accuracy: u32) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|&&(_, min_wpm, min_acc)| wpm >= min_wpm && accuracy >= min_acc)
        .map(|&(grade, _, _)| grade)
        .unwrap_or(Grade::D)
}
