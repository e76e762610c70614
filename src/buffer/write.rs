use std::io;
use std::io::Write;
use super::Endian;

pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 128 * 1024;

/// Append-only writer that stages bytes in a fixed-capacity buffer.
///
/// When a put does not fit in the space left, the staged bytes go to the
/// channel first. The buffer only grows when a single put is larger than the
/// whole capacity.
///
/// The owner must call `flush()` once it is done writing: nothing flushes the
/// last partial buffer automatically, not even `Drop`.
#[derive(Debug)]
pub struct WriteBuffer<W: Write> {
    channel: W,
    buffer: Vec<u8>,
    capacity: usize,
    written: u64,
    order: Endian,
}

impl<W: Write> WriteBuffer<W> {
    pub fn new(channel: W) -> WriteBuffer<W> {
        WriteBuffer::with_capacity(channel, DEFAULT_WRITE_BUFFER_SIZE)
    }

    pub fn with_capacity(channel: W, capacity: usize) -> WriteBuffer<W> {
        WriteBuffer {
            channel: channel,
            buffer: Vec::with_capacity(capacity),
            capacity: capacity,
            written: 0,
            order: Endian::Big,
        }
    }

    pub fn order(&mut self, order: Endian) {
        self.order = order;
    }

    /// Number of bytes put so far, flushed or not.
    pub fn written(&self) -> u64 {
        self.written
    }

    fn reserve(&mut self, n_bytes: usize) -> io::Result<()> {
        if self.buffer.len() + n_bytes > self.capacity {
            self.write_staged()?;
            if n_bytes > self.capacity {
                self.capacity = n_bytes;
                self.buffer.reserve(n_bytes);
            }
        }
        Ok(())
    }

    fn write_staged(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.channel.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    pub fn put(&mut self, b: u8) -> io::Result<()> {
        self.reserve(1)?;
        self.buffer.push(b);
        self.written += 1;
        Ok(())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.reserve(bytes.len())?;
        self.buffer.extend_from_slice(bytes);
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn put_i16(&mut self, n: i16) -> io::Result<()> {
        let mut buf = [ 0u8; 2 ];
        self.order.write_i16(&mut buf, n);
        self.put_bytes(&buf)
    }

    pub fn put_i32(&mut self, n: i32) -> io::Result<()> {
        let mut buf = [ 0u8; 4 ];
        self.order.write_i32(&mut buf, n);
        self.put_bytes(&buf)
    }

    pub fn put_f64(&mut self, n: f64) -> io::Result<()> {
        let mut buf = [ 0u8; 8 ];
        self.order.write_f64(&mut buf, n);
        self.put_bytes(&buf)
    }

    /// Pushes staged bytes to the channel and flushes the channel itself.
    pub fn flush(&mut self) -> io::Result<()> {
        self.write_staged()?;
        self.channel.flush()
    }

    /// Flushes, then hands the channel back.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.channel)
    }
}
