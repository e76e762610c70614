//! Windowed byte access over a file channel.
//!
//! Both the `.shp`/`.shx` and the `.dbf` codecs read and write through these
//! two types. Neither is a general-purpose `BufReader`/`BufWriter`:
//!
//! * `ReadBuffer` keeps one window of the file resident and serves random
//!   reads at absolute offsets, refilling the window only on a miss.
//! * `WriteBuffer` is append-only and grows its buffer only when a single put
//!   is larger than the configured capacity.
//!
//! Multi-byte numbers honor a byte order that can be switched at any time,
//! because Shapefile headers mix big- and little-endian words.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

pub mod read;
pub mod write;

pub use self::read::{ReadBuffer, DEFAULT_READ_BUFFER_SIZE};
pub use self::write::{WriteBuffer, DEFAULT_WRITE_BUFFER_SIZE};

/// Byte order applied to multi-byte numeric reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    fn read_i16(self, buf: &[u8]) -> i16 {
        match self {
            Endian::Big => BigEndian::read_i16(buf),
            Endian::Little => LittleEndian::read_i16(buf),
        }
    }

    fn read_i32(self, buf: &[u8]) -> i32 {
        match self {
            Endian::Big => BigEndian::read_i32(buf),
            Endian::Little => LittleEndian::read_i32(buf),
        }
    }

    fn read_i64(self, buf: &[u8]) -> i64 {
        match self {
            Endian::Big => BigEndian::read_i64(buf),
            Endian::Little => LittleEndian::read_i64(buf),
        }
    }

    fn read_f64(self, buf: &[u8]) -> f64 {
        match self {
            Endian::Big => BigEndian::read_f64(buf),
            Endian::Little => LittleEndian::read_f64(buf),
        }
    }

    fn write_i16(self, buf: &mut [u8], n: i16) {
        match self {
            Endian::Big => BigEndian::write_i16(buf, n),
            Endian::Little => LittleEndian::write_i16(buf, n),
        }
    }

    fn write_i32(self, buf: &mut [u8], n: i32) {
        match self {
            Endian::Big => BigEndian::write_i32(buf, n),
            Endian::Little => LittleEndian::write_i32(buf, n),
        }
    }

    fn write_f64(self, buf: &mut [u8], n: f64) {
        match self {
            Endian::Big => BigEndian::write_f64(buf, n),
            Endian::Little => LittleEndian::write_f64(buf, n),
        }
    }
}
