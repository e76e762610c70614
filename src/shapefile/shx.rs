//! Reads ".shx" index files: one fixed-size entry per ".shp" record, giving
//! the record's offset and content length (both in 16-bit words).

use std::io::{Read, Seek};
use buffer::{Endian, ReadBuffer};
use super::header::{ShapefileHeader, SHP_HEADER_LENGTH};
use super::shp::ShpError;

const INDEX_RECORD_LENGTH: u64 = 8;

#[derive(Debug)]
pub struct IndexFile<R> {
    header: ShapefileHeader,
    buffer: ReadBuffer<R>,
    record_count: usize,
    last_index: Option<usize>,
    rec_offset: i32,
    rec_len: i32,
}

impl<R: Read + Seek> IndexFile<R> {
    pub fn new(channel: R, buffer_size: usize) -> Result<IndexFile<R>, ShpError> {
        let mut buffer = ReadBuffer::with_capacity(channel, buffer_size)?;
        let header = ShapefileHeader::read(&mut buffer)?;
        buffer.order(Endian::Big);

        let index_bytes = header.file_length_bytes().saturating_sub(SHP_HEADER_LENGTH as u64);
        let record_count = (index_bytes / INDEX_RECORD_LENGTH) as usize;

        Ok(IndexFile {
            header: header,
            buffer: buffer,
            record_count: record_count,
            last_index: None,
            rec_offset: 0,
            rec_len: 0,
        })
    }

    pub fn header(&self) -> &ShapefileHeader {
        &self.header
    }

    /// Number of records, derived from the header's declared file length.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    fn read_record(&mut self, index: usize) -> Result<(), ShpError> {
        if self.last_index == Some(index) {
            return Ok(());
        }

        if index >= self.record_count {
            return Err(ShpError::ParseError(format!("Index record {} requested, but the index holds {}", index, self.record_count)));
        }

        let pos = SHP_HEADER_LENGTH as u64 + index as u64 * INDEX_RECORD_LENGTH;
        self.rec_offset = self.buffer.get_i32_at(pos)?;
        self.rec_len = self.buffer.get_i32_at(pos + 4)?;
        self.last_index = Some(index);
        Ok(())
    }

    /// Offset of record `index` in the ".shp" file, in 16-bit words.
    pub fn offset(&mut self, index: usize) -> Result<i32, ShpError> {
        self.read_record(index)?;
        Ok(self.rec_offset)
    }

    /// Offset of record `index` in the ".shp" file, in bytes.
    pub fn offset_in_bytes(&mut self, index: usize) -> Result<u64, ShpError> {
        let words = self.offset(index)?;
        if words < 0 {
            return Err(ShpError::ParseError(format!("Index record {} has negative offset {}", index, words)));
        }
        Ok(words as u64 * 2)
    }

    /// Content length of record `index`, in 16-bit words.
    pub fn content_length(&mut self, index: usize) -> Result<i32, ShpError> {
        self.read_record(index)?;
        Ok(self.rec_len)
    }
}
