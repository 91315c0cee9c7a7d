use memchr::memchr;

/// Iterator over the lines of a byte slice, used by the single-threaded
/// baseline. Splits on `\n`, strips one trailing `\r` (so CRLF input works),
/// and yields a final line even when the file lacks its closing terminator.
pub struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Lines<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.rest.is_empty() {
            return None;
        }
        let line = match memchr(b'\n', self.rest) {
            Some(at) => {
                let line = &self.rest[..at];
                self.rest = &self.rest[at + 1..];
                line
            }
            None => {
                let line = self.rest;
                self.rest = &[];
                line
            }
        };
        Some(match line {
            [head @ .., b'\r'] => head,
            _ => line,
        })
    }
}
