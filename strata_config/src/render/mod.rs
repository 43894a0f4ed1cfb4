//! The default annotated renderer producing YAML-like text.
//!
//! Values render on a single line when they fit, otherwise the formatter
//! chain in [`format`] picks between quoting styles and block scalars.
//! Header comments carry documentation; inline comments (when present) are
//! placed at a configurable column.

mod format;

use format::format_value;

/// Anything the renderer can write: a key, an optional value, comment
/// material and ordered children.
pub(crate) trait Encodeable {
    /// Indentation depth; the root is -1 and renders no line of its own.
    fn indent(&self) -> i32;
    /// Header comment lines placed above the node.
    fn headers(&self) -> Vec<String>;
    /// Inline comment lines placed after (or under) the value.
    fn inline(&self) -> Vec<String>;
    /// Map key, or `None` for array elements (rendered as `-`).
    fn key(&self) -> Option<&str>;
    /// Rendered scalar value, or `None` for interior nodes.
    fn value(&self) -> Option<String>;
    /// Children in render order; empty for leaves.
    fn children(&self) -> Vec<&dyn Encodeable>;
}

/// Rendering options for the YAML-like output.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Renderer {
    /// Maximum line length for wrapping; 0 disables wrapping.
    pub max_line_length: usize,
    /// Column at which trailing comments start.
    pub trailing_comment_column: usize,
    /// Spaces per indentation level; 0 uses the default of 2.
    pub spaces_per_indent: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            max_line_length: 0,
            trailing_comment_column: 0,
            spaces_per_indent: 2,
        }
    }
}

impl Renderer {
    /// Render `item` as a complete document.
    pub fn encode(&self, item: &dyn Encodeable) -> String {
        let mut buf = String::from("---\n");
        self.encode_item(&mut buf, item);
        buf.push('\n');

        // Header comments at the very start of the document would leave a
        // blank line after the marker; collapse it.
        if let Some(rest) = buf.strip_prefix("---\n\n") {
            let mut collapsed = String::with_capacity(buf.len());
            collapsed.push_str("---\n");
            collapsed.push_str(rest);
            return collapsed;
        }
        buf
    }

    fn encode_item(&self, buf: &mut String, item: &dyn Encodeable) {
        self.headers(buf, item);
        self.node(buf, item);
        for child in item.children() {
            self.encode_item(buf, child);
        }
    }

    fn headers(&self, buf: &mut String, item: &dyn Encodeable) {
        let indent = self.indent_str(item.indent());
        let mut first_rendered = false;
        let mut prepend_newline = true;

        for header in item.headers() {
            let header = header.trim_end_matches('\n');
            if !first_rendered && header.trim().is_empty() {
                continue;
            }
            if prepend_newline {
                prepend_newline = false;
                buf.push('\n');
            }
            buf.push_str(&indent);
            buf.push_str("# ");
            buf.push_str(header);
            buf.push('\n');
            first_rendered = true;
        }
    }

    fn node(&self, buf: &mut String, item: &dyn Encodeable) {
        let mut tmp = String::new();

        let inline = item.inline();
        let (line, v, block) = self.prepare_line(item);

        if item.indent() >= 0 {
            self.write_main_line(&mut tmp, &line, &inline, block);
        }

        self.write_additional_content(&mut tmp, item, &inline, &v, block);

        if !tmp.trim().is_empty() {
            buf.push_str(&tmp);
        }
    }

    fn prepare_line(&self, item: &dyn Encodeable) -> (String, Vec<String>, &'static str) {
        let indent = self.indent_str(item.indent());
        let mut line = match item.key() {
            Some(key) => format!("{indent}{key}:"),
            None => format!("{indent}-"),
        };

        let mut v = Vec::new();
        let mut block = "";
        let value = item.value();
        if value.is_some() || item.children().is_empty() {
            let (lines, style) =
                format_value(value.as_deref(), self.max_len(line.len().saturating_sub(1)));
            v = lines;
            block = style;
        }

        if item.inline().len() <= 1 && v.len() == 1 {
            line.push(' ');
            line.push_str(&v[0]);
        } else if v.len() > 1 && block.is_empty() {
            // The value follows on subsequent lines without a block scalar.
            line.push(' ');
        }

        (line, v, block)
    }

    fn write_main_line(&self, buf: &mut String, line: &str, inline: &[String], block: &str) {
        buf.push_str(line);

        if inline.len() == 1 {
            let spaces = self.trailing_comment_column.saturating_sub(line.len()).max(1);
            buf.push_str(&" ".repeat(spaces));
            buf.push_str("# ");
            buf.push_str(&inline[0]);
        }

        if inline.is_empty() && !block.is_empty() {
            buf.push(' ');
            buf.push_str(block);
        }

        buf.push('\n');
    }

    fn write_additional_content(
        &self,
        buf: &mut String,
        item: &dyn Encodeable,
        inline: &[String],
        v: &[String],
        block: &'static str,
    ) {
        let left = self.indent_str(item.indent() + 1);

        if inline.len() > 1 {
            for comment in inline {
                buf.push_str(&left);
                buf.push_str("# ");
                buf.push_str(comment);
                buf.push('\n');
            }
        }

        self.write_multiline_value(buf, &left, item, inline, v, block);
    }

    fn write_multiline_value(
        &self,
        buf: &mut String,
        left: &str,
        item: &dyn Encodeable,
        inline: &[String],
        v: &[String],
        block: &'static str,
    ) {
        if inline.len() <= 1 && v.len() <= 1 {
            return;
        }

        // Write the block indicator if it was displaced by an inline comment.
        if !inline.is_empty() && !block.is_empty() {
            buf.push_str(left);
            buf.push_str(block);
            buf.push('\n');
        }

        // Recalculate the value wrapping for the deeper indentation.
        let value = item.value();
        let (lines, _) = format_value(value.as_deref(), self.max_len(left.len()));
        let count = lines.len();
        for (i, line) in lines.into_iter().enumerate() {
            buf.push_str(left);
            buf.push_str(&line);
            // Clip style (|) implies the final newline.
            if block != "|" || i != count - 1 {
                buf.push('\n');
            }
        }
    }

    /// Maximum value width after accounting for the prefix. When the prefix
    /// alone exceeds the configured width, widen in whole multiples so the
    /// result stays sane.
    fn max_len(&self, prefix_len: usize) -> usize {
        if self.max_line_length == 0 {
            return usize::MAX;
        }

        let configured = self.max_line_length as i64;
        let prefix = prefix_len as i64;
        let mut max = configured - prefix;
        let mut multiple = 2;
        while max < 1 {
            max = configured * multiple - prefix;
            multiple += 1;
        }
        usize::try_from(max).unwrap_or(usize::MAX)
    }

    fn indent_str(&self, level: i32) -> String {
        if level <= 0 {
            return String::new();
        }
        let spaces = if self.spaces_per_indent == 0 {
            2
        } else {
            self.spaces_per_indent
        };
        " ".repeat(spaces * level as usize)
    }
}
