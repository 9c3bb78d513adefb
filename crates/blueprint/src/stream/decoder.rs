/// Reassembles complete text lines from raw byte chunks.
///
/// Chunk boundaries fall anywhere, including inside a multi-byte character
/// or mid-line. Incomplete trailing bytes and the unfinished line fragment
/// carry over to the next chunk, so the emitted line sequence is identical
/// for every split of the same byte stream.
#[derive(Debug, Default)]
pub struct LineDecoder {
    bytes: Vec<u8>,
    line: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.bytes.extend_from_slice(chunk);
        loop {
            match std::str::from_utf8(&self.bytes) {
                Ok(_) => {
                    let decoded = std::mem::take(&mut self.bytes);
                    self.line.push_str(&String::from_utf8_lossy(&decoded));
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    match e.error_len() {
                        // Genuinely invalid sequence: replace it and keep
                        // scanning the rest of the buffer.
                        Some(bad) => {
                            let decoded: Vec<u8> =
                                self.bytes.drain(..valid_up_to + bad).collect();
                            self.line.push_str(&String::from_utf8_lossy(&decoded));
                        }
                        // Incomplete sequence at the end of the chunk: hold
                        // the bytes until more arrive.
                        None => {
                            let decoded: Vec<u8> = self.bytes.drain(..valid_up_to).collect();
                            self.line.push_str(&String::from_utf8_lossy(&decoded));
                            break;
                        }
                    }
                }
            }
        }
        self.drain_complete_lines()
    }

    /// Flush the trailing fragment once the stream ends.
    pub fn finish(mut self) -> Option<String> {
        if !self.bytes.is_empty() {
            self.line.push_str(&String::from_utf8_lossy(&self.bytes));
        }
        if self.line.is_empty() {
            None
        } else {
            Some(self.line)
        }
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.line.find('\n') {
            let mut line: String = self.line.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_with_chunks(input: &[u8], chunk_size: usize) -> Vec<String> {
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for chunk in input.chunks(chunk_size) {
            lines.extend(decoder.push(chunk));
        }
        lines.extend(decoder.finish());
        lines
    }

    #[test]
    fn test_same_lines_for_every_split() {
        let input = "data: {\"agent_name\": \"Planner\"}\r\nsecond\nthird with café\n".as_bytes();
        let expected = decode_with_chunks(input, input.len());
        for chunk_size in 1..=input.len() {
            assert_eq!(
                decode_with_chunks(input, chunk_size),
                expected,
                "chunk size {}",
                chunk_size
            );
        }
    }

    #[test]
    fn test_split_inside_multibyte_char() {
        let mut decoder = LineDecoder::new();
        let bytes = "é\n".as_bytes();
        assert!(decoder.push(&bytes[..1]).is_empty());
        assert_eq!(decoder.push(&bytes[1..]), vec!["é".to_string()]);
    }

    #[test]
    fn test_split_mid_line() {
        let mut decoder = LineDecoder::new();
        assert!(decoder
            .push(b"data: {\"agent_name\": \"Planner\", \"out")
            .is_empty());
        let lines = decoder.push(b"put\": \"Use microservices\"}\n");
        assert_eq!(
            lines,
            vec!["data: {\"agent_name\": \"Planner\", \"output\": \"Use microservices\"}"]
        );
    }

    #[test]
    fn test_crlf_and_lf_both_split() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"one\r\ntwo\nthree");
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(decoder.finish(), Some("three".to_string()));
    }

    #[test]
    fn test_finish_flushes_fragment() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"tail without newline").is_empty());
        assert_eq!(decoder.finish(), Some("tail without newline".to_string()));

        let decoder = LineDecoder::new();
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_finish_flushes_incomplete_bytes_lossily() {
        let mut decoder = LineDecoder::new();
        let bytes = "é".as_bytes();
        assert!(decoder.push(&bytes[..1]).is_empty());
        assert_eq!(decoder.finish(), Some("\u{FFFD}".to_string()));
    }

    #[test]
    fn test_invalid_sequence_is_replaced_not_fatal() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"ab\xFFcd\n");
        assert_eq!(lines, vec!["ab\u{FFFD}cd".to_string()]);
    }

    #[test]
    fn test_empty_lines_are_emitted() {
        let mut decoder = LineDecoder::new();
        assert_eq!(
            decoder.push(b"\n\ndata\n"),
            vec!["".to_string(), "".to_string(), "data".to_string()]
        );
    }
}
