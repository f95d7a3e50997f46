use std::io::{self, BufRead, ErrorKind};

/// Line iterator that never fails on bad encoding: invalid UTF-8 is
/// replaced with U+FFFD. `\n`, `\r\n` and a lone `\r` all end a line and
/// are stripped.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
    /// The previous line ended in `\r`; a `\n` right after it belongs to it.
    after_cr: bool,
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            after_cr: false,
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (used, line_done) = {
                let available = match self.reader.fill_buf() {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Some(Err(e)),
                };
                if available.is_empty() {
                    self.after_cr = false;
                    return if self.buf.is_empty() {
                        None
                    } else {
                        Some(Ok(self.take_line()))
                    };
                }
                if std::mem::take(&mut self.after_cr) && available[0] == b'\n' {
                    (1, false)
                } else {
                    match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                        Some(idx) => {
                            self.buf.extend_from_slice(&available[..idx]);
                            self.after_cr = available[idx] == b'\r';
                            (idx + 1, true)
                        }
                        None => {
                            self.buf.extend_from_slice(available);
                            (available.len(), false)
                        }
                    }
                }
            };
            self.reader.consume(used);
            if line_done {
                return Some(Ok(self.take_line()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn lines(data: &[u8]) -> Vec<String> {
        LossyLines::new(data).map(Result::unwrap).collect()
    }

    #[test]
    fn test_lossy_lines_strip_terminators() {
        assert_eq!(lines("甲\r\n乙\n\n丙".as_bytes()), ["甲", "乙", "", "丙"]);
        assert_eq!(lines(b"a\n"), ["a"]);
        assert!(lines(b"").is_empty());
    }

    #[test]
    fn test_lossy_lines_bare_carriage_return() {
        assert_eq!(lines("甲\r乙\r\r\n丙\r".as_bytes()), ["甲", "乙", "", "丙"]);
    }

    #[test]
    fn test_lossy_lines_crlf_split_across_reads() {
        // capacity 1 forces `\r` and `\n` into separate buffer fills
        let reader = BufReader::with_capacity(1, "a\r\nb".as_bytes());
        let found: Vec<String> = LossyLines::new(reader).map(Result::unwrap).collect();
        assert_eq!(found, ["a", "b"]);
    }

    #[test]
    fn test_lossy_lines_replace_invalid_bytes() {
        assert_eq!(lines(b"ab\xffcd\n"), ["ab\u{FFFD}cd"]);
    }
}
