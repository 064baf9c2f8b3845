//! Text emission for record files
//!
//! Output is tab-indented, one field per line, with numbers in fixed
//! six-digit decimal notation so that repeated load/save cycles produce
//! byte-identical files.

use crate::math::{Colorf, Recti, Vector2f, Vector2i};

/// Builds record file text line by line
#[derive(Debug, Default)]
pub struct RecordWriter {
    out: String,
    depth: usize,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push('\t');
        }
    }

    /// Write an indented line
    pub fn line(&mut self, text: &str) {
        self.indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Write an empty line
    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write `name = value`, followed by a comma when `more` is set
    pub fn field(&mut self, name: &str, value: &str, more: bool) {
        self.indent();
        self.out.push_str(name);
        self.out.push_str(" = ");
        self.out.push_str(value);
        if more {
            self.out.push(',');
        }
        self.out.push('\n');
    }

    /// Write a positional entry, followed by a comma when `more` is set
    pub fn entry(&mut self, value: &str, more: bool) {
        self.indent();
        self.out.push_str(value);
        if more {
            self.out.push(',');
        }
        self.out.push('\n');
    }

    /// Open a named table: `name =` then `{` on its own line
    pub fn open(&mut self, name: &str) {
        self.indent();
        self.out.push_str(name);
        self.out.push_str(" =\n");
        self.open_anonymous();
    }

    /// Open a positional table element
    pub fn open_anonymous(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    /// Close the innermost table, appending `suffix` after the brace
    pub fn close(&mut self, suffix: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push('}');
        self.out.push_str(suffix);
        self.out.push('\n');
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Fixed-precision decimal. Non-finite values are written as zero so the
/// output always parses.
pub fn number(v: f32) -> String {
    let v = if v.is_finite() { v } else { 0.0 };
    format!("{:.6}", v)
}

pub fn integer(v: i64) -> String {
    v.to_string()
}

pub fn boolean(v: bool) -> String {
    if v { "true" } else { "false" }.to_string()
}

/// Double-quoted string with escapes
pub fn string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `{x = …, y = …}`
pub fn vec2(v: Vector2f) -> String {
    format!("{{x = {}, y = {}}}", number(v.x), number(v.y))
}

/// `{r = …, g = …, b = …, a = …}`
pub fn color(c: Colorf) -> String {
    format!(
        "{{r = {}, g = {}, b = {}, a = {}}}",
        number(c.r),
        number(c.g),
        number(c.b),
        number(c.a)
    )
}

/// `{x = …, y = …, w = …, h = …}` with integer components
pub fn rect(r: Recti) -> String {
    format!("{{x = {}, y = {}, w = {}, h = {}}}", r.x, r.y, r.w, r.h)
}

/// Positional integer range `{min, max}`
pub fn pair_i32(v: Vector2i) -> String {
    format!("{{{}, {}}}", v.x, v.y)
}

/// Positional float range `{min, max}`
pub fn pair_f32(v: Vector2f) -> String {
    format!("{{{}, {}}}", number(v.x), number(v.y))
}
