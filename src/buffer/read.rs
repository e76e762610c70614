use std::cmp;
use std::io;
use std::io::{Read, Seek, SeekFrom};
use super::Endian;

pub const DEFAULT_READ_BUFFER_SIZE: usize = 32 * 1024;

/// Random-access reader that keeps one window of the channel in memory.
///
/// Every read names an absolute byte offset (or uses the internal cursor,
/// which is just an offset the reader tracks for you). If the requested
/// bytes are inside the resident window, no I/O happens. Otherwise the window
/// moves so it starts at the requested offset, spanning
/// `max(buffer_size, length)` bytes clipped to the end of the channel.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use shpdriver::buffer::{Endian, ReadBuffer};
///
/// let bytes = vec![ 0u8, 0, 0x27, 0x0a, 0xe8, 0x03, 0, 0 ];
/// let mut reader = ReadBuffer::with_capacity(Cursor::new(bytes), 4).unwrap();
///
/// assert_eq!(9994, reader.get_i32().unwrap());
/// reader.order(Endian::Little);
/// assert_eq!(1000, reader.get_i32().unwrap());
/// assert!(reader.is_eof());
/// ```
#[derive(Debug)]
pub struct ReadBuffer<R> {
    channel: R,
    channel_len: u64,
    window: Vec<u8>,
    window_start: u64,
    buffer_size: usize,
    position: u64,
    order: Endian,
}

impl<R: Read + Seek> ReadBuffer<R> {
    pub fn new(channel: R) -> io::Result<ReadBuffer<R>> {
        ReadBuffer::with_capacity(channel, DEFAULT_READ_BUFFER_SIZE)
    }

    pub fn with_capacity(mut channel: R, buffer_size: usize) -> io::Result<ReadBuffer<R>> {
        let channel_len = channel.seek(SeekFrom::End(0))?;
        let mut reader = ReadBuffer {
            channel: channel,
            channel_len: channel_len,
            window: Vec::new(),
            window_start: 0,
            buffer_size: buffer_size,
            position: 0,
            order: Endian::Big,
        };
        reader.load_window(0, 0)?;
        Ok(reader)
    }

    /// Returns the offset of `pos` inside the window, moving the window first
    /// if `[pos, pos + length)` is not resident.
    fn window_offset(&mut self, pos: u64, length: usize) -> io::Result<usize> {
        let end = pos + length as u64;
        if pos >= self.window_start && end <= self.window_start + self.window.len() as u64 {
            return Ok((pos - self.window_start) as usize);
        }

        if end > self.channel_len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("cannot read {} bytes at offset {}: the file is {} bytes long", length, pos, self.channel_len),
            ));
        }

        self.load_window(pos, length)?;
        Ok(0)
    }

    fn load_window(&mut self, pos: u64, length: usize) -> io::Result<()> {
        let wanted = cmp::max(self.buffer_size, length) as u64;
        let capacity = cmp::min(wanted, self.channel_len.saturating_sub(pos)) as usize;

        self.window.resize(capacity, 0);
        self.channel.seek(SeekFrom::Start(pos))?;
        self.channel.read_exact(&mut self.window)?;
        self.window_start = pos;
        Ok(())
    }

    pub fn order(&mut self, order: Endian) {
        self.order = order;
    }

    pub fn byte_order(&self) -> Endian {
        self.order
    }

    /// Total length of the underlying channel, in bytes.
    pub fn len(&self) -> u64 {
        self.channel_len
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    /// Advances the cursor without reading anything.
    pub fn skip(&mut self, n_bytes: u64) {
        self.position += n_bytes;
    }

    /// Bytes left in the channel after the cursor.
    pub fn remaining(&self) -> u64 {
        self.channel_len.saturating_sub(self.position)
    }

    pub fn is_eof(&self) -> bool {
        self.remaining() == 0
    }

    pub fn get_u8_at(&mut self, pos: u64) -> io::Result<u8> {
        let offset = self.window_offset(pos, 1)?;
        Ok(self.window[offset])
    }

    pub fn get_i16_at(&mut self, pos: u64) -> io::Result<i16> {
        let offset = self.window_offset(pos, 2)?;
        Ok(self.order.read_i16(&self.window[offset..offset + 2]))
    }

    pub fn get_i32_at(&mut self, pos: u64) -> io::Result<i32> {
        let offset = self.window_offset(pos, 4)?;
        Ok(self.order.read_i32(&self.window[offset..offset + 4]))
    }

    pub fn get_i64_at(&mut self, pos: u64) -> io::Result<i64> {
        let offset = self.window_offset(pos, 8)?;
        Ok(self.order.read_i64(&self.window[offset..offset + 8]))
    }

    pub fn get_f64_at(&mut self, pos: u64) -> io::Result<f64> {
        let offset = self.window_offset(pos, 8)?;
        Ok(self.order.read_f64(&self.window[offset..offset + 8]))
    }

    /// Fills `buf` with the bytes starting at `pos`. Byte order does not apply.
    pub fn get_bytes_at(&mut self, pos: u64, buf: &mut [u8]) -> io::Result<()> {
        let offset = self.window_offset(pos, buf.len())?;
        buf.copy_from_slice(&self.window[offset..offset + buf.len()]);
        Ok(())
    }

    pub fn get(&mut self) -> io::Result<u8> {
        let ret = self.get_u8_at(self.position)?;
        self.position += 1;
        Ok(ret)
    }

    pub fn get_i16(&mut self) -> io::Result<i16> {
        let ret = self.get_i16_at(self.position)?;
        self.position += 2;
        Ok(ret)
    }

    pub fn get_i32(&mut self) -> io::Result<i32> {
        let ret = self.get_i32_at(self.position)?;
        self.position += 4;
        Ok(ret)
    }

    pub fn get_i64(&mut self) -> io::Result<i64> {
        let ret = self.get_i64_at(self.position)?;
        self.position += 8;
        Ok(ret)
    }

    pub fn get_f64(&mut self) -> io::Result<f64> {
        let ret = self.get_f64_at(self.position)?;
        self.position += 8;
        Ok(ret)
    }

    pub fn get_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let pos = self.position;
        self.get_bytes_at(pos, buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }
}
