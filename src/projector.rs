/// Display classification of one reference-text position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharState {
    Correct,
    Incorrect,
    /// A space in the reference that was typed as something else
    IncorrectSpace,
    /// The caret: the next position to be typed
    Current,
    Pending,
}

impl CharState {
    pub fn is_judged(&self) -> bool {
        matches!(
            self,
            CharState::Correct | CharState::Incorrect | CharState::IncorrectSpace
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CharState::Incorrect | CharState::IncorrectSpace)
    }
}

fn judge(expected: char, typed: Option<char>) -> CharState {
    match typed {
        Some(c) if c == expected => CharState::Correct,
        _ if expected == ' ' => CharState::IncorrectSpace,
        _ => CharState::Incorrect,
    }
}

/// Classify every reference position given what was typed and where the cursor is.
///
/// Positions before `cursor` are judged against `typed`, the cursor position is
/// `Current` and everything after is `Pending`. Newlines are ordinary positions.
/// A `typed` slice shorter than `cursor` judges the missing slots as mismatches.
pub fn project(reference: &[char], typed: &[Option<char>], cursor: usize) -> Vec<CharState> {
    reference
        .iter()
        .enumerate()
        .map(|(i, &expected)| match i.cmp(&cursor) {
            std::cmp::Ordering::Less => judge(expected, typed.get(i).copied().flatten()),
            std::cmp::Ordering::Equal => CharState::Current,
            std::cmp::Ordering::Greater => CharState::Pending,
        })
        .collect()
}

/// A run of reference characters on one line that share a classification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub state: CharState,
}

/// One reference line, plus the state of the newline that terminates it (if any)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectedLine {
    pub segments: Vec<Segment>,
    pub line_break: Option<CharState>,
}

/// Group a projection into lines of same-state segments for line-oriented renderers.
pub fn project_lines(reference: &[char], states: &[CharState]) -> Vec<ProjectedLine> {
    let mut lines = Vec::new();
    let mut line = ProjectedLine::default();

    for (&c, &state) in reference.iter().zip(states) {
        if c == '\n' {
            line.line_break = Some(state);
            lines.push(std::mem::take(&mut line));
            continue;
        }
        match line.segments.last_mut() {
            Some(seg) if seg.state == state => seg.text.push(c),
            _ => line.segments.push(Segment {
                text: c.to_string(),
                state,
            }),
        }
    }

    lines.push(line);
    lines
}
