use std::io::Write;

use vt100::Parser;

/// A virtual terminal for asserting on what the session drew.
///
/// Bytes are fed through a vt100 emulator, so cursor movement and line
/// clearing are applied the way a real terminal would apply them.
pub struct TestEnv {
    parser: Parser,
    width: u16,
    height: u16,
}

impl TestEnv {
    /// Creates a new test environment with the specified terminal size
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            parser: Parser::new(height, width, 0),
            width,
            height,
        }
    }

    /// Feeds raw output into the emulator.
    ///
    /// `\n` is translated to `\r\n` the way a tty line discipline does (onlcr).
    pub fn process(&mut self, bytes: &[u8]) -> &mut Self {
        for chunk in bytes.split_inclusive(|b| *b == b'\n') {
            match chunk.split_last() {
                Some((&b'\n', body)) => {
                    self.parser.process(body);
                    self.parser.process(b"\r\n");
                }
                _ => self.parser.process(chunk),
            }
        }
        self
    }

    /// Gets the current cursor position as `(x, y)`
    pub fn cursor_pos(&self) -> (u16, u16) {
        let (row, col) = self.parser.screen().cursor_position();
        (col, row)
    }

    /// Whether the emulated cursor is hidden
    pub fn cursor_hidden(&self) -> bool {
        self.parser.screen().hide_cursor()
    }

    /// Every row of the screen with trailing blanks removed
    pub fn rows(&self) -> Vec<String> {
        self.parser
            .screen()
            .rows(0, self.width)
            .map(|row| row.trim_end().to_string())
            .collect()
    }

    /// Non-empty rows, top to bottom
    pub fn lines(&self) -> Vec<String> {
        self.rows().into_iter().filter(|row| !row.is_empty()).collect()
    }

    /// Gets the current terminal contents
    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }

    /// Dumps the screen with row numbers and a cursor marker, for failure messages
    pub fn dump_screen(&self) -> String {
        let (cursor_x, cursor_y) = self.cursor_pos();
        let mut result = format!(
            "Screen Buffer ({}x{}, cursor at ({}, {})):\n",
            self.width, self.height, cursor_x, cursor_y
        );
        for (i, line) in self.rows().iter().enumerate() {
            let marker = if i as u16 == cursor_y { ">" } else { " " };
            result.push_str(&format!("{}{:3}: {}\n", marker, i, line));
        }
        result
    }
}

impl Write for TestEnv {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.process(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
