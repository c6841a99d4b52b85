//! Indenting line writer for generated code
//!
//! Output is accumulated in memory and only handed out by [`Writer::finish`],
//! so nothing reaches the file system until generation has fully succeeded.

/// Line-oriented text buffer that tracks brace nesting
#[derive(Debug)]
pub struct Writer {
    out: String,
    level: usize,
    tab_width: usize,
}

impl Writer {
    pub fn new(tab_width: usize) -> Self {
        Self {
            out: String::new(),
            level: 0,
            tab_width,
        }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn unindent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Write one line at the current indentation
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            self.out
                .extend(std::iter::repeat(' ').take(self.level * self.tab_width));
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write `header {` and indent
    pub fn open(&mut self, header: impl AsRef<str>) {
        let header = header.as_ref();
        if header.is_empty() {
            self.line("{");
        } else {
            self.line(format!("{} {{", header));
        }
        self.indent();
    }

    /// Unindent and write `}`
    pub fn close(&mut self) {
        self.close_with("");
    }

    /// Unindent and write `}` followed by `suffix`, e.g. `;` or `)`
    pub fn close_with(&mut self, suffix: &str) {
        self.unindent();
        self.line(format!("}}{}", suffix));
    }

    pub fn finish(self) -> String {
        self.out
    }
}
