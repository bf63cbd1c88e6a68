use std::{
    collections::VecDeque,
    io::{self, ErrorKind, Read, Write},
};

/// The host side of `,` and `.`.
pub trait ByteIo {
    /// Next input byte, or `None` once the input is exhausted
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: ByteIo + ?Sized> ByteIo for &mut T {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Adapts any reader/writer pair (stdin/stdout in the binary).
pub struct StreamIo<R, W> {
    in_stream: R,
    out_stream: W,
}

impl<R: Read, W: Write> StreamIo<R, W> {
    pub fn new(in_stream: R, out_stream: W) -> Self {
        Self {
            in_stream,
            out_stream,
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.in_stream, self.out_stream)
    }
}

impl<R: Read, W: Write> ByteIo for StreamIo<R, W> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.in_stream.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.out_stream.write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out_stream.flush()
    }
}

/// In-memory input queue and output buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryIo {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl MemoryIo {
    pub fn new(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            output: vec![],
        }
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl ByteIo for MemoryIo {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_io_reads_until_eof() {
        let mut io = StreamIo::new(&b"ab"[..], Vec::new());
        assert_eq!(io.read_byte().unwrap(), Some(b'a'));
        assert_eq!(io.read_byte().unwrap(), Some(b'b'));
        assert_eq!(io.read_byte().unwrap(), None);
        io.write_byte(b'z').unwrap();
        assert_eq!(io.into_inner().1, b"z");
    }

    #[test]
    fn memory_io_queues_input() {
        let mut io = MemoryIo::new("hi");
        assert_eq!(io.read_byte().unwrap(), Some(b'h'));
        io.write_byte(b'!').unwrap();
        assert_eq!(io.output_string(), "!");
        assert_eq!(io.input.len(), 1);
    }
}
