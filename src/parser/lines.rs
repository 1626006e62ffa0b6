/// One numbered line of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// The line content, without its terminator.
    pub text: &'a str,
}

/// A single-pass cursor over the lines of a document.
///
/// Nested readers (tables, fenced blocks, term requirements) borrow the same
/// stream mutably, so whatever they consume is gone when the outer loop
/// resumes. Lines can be handed back with [`LineStream::push_back`] when a
/// reader has looked one line too far.
#[derive(Debug)]
pub struct LineStream<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    pushed: Vec<Line<'a>>,
}

impl<'a> LineStream<'a> {
    /// Creates a stream positioned before the first line of `text`.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            pushed: Vec::new(),
        }
    }

    /// Returns a line to the stream, so that the next call to `next` yields it
    /// again.
    pub fn push_back(&mut self, line: Line<'a>) {
        self.pushed.push(line);
    }

    /// Looks at the next line without consuming it.
    pub fn peek(&mut self) -> Option<Line<'a>> {
        let line = self.next()?;
        self.push_back(line);
        Some(line)
    }
}

impl<'a> Iterator for LineStream<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pushed.pop().or_else(|| {
            self.lines.next().map(|(i, text)| Line {
                number: i + 1,
                text,
            })
        })
    }
}
