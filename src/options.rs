use buffer::{DEFAULT_READ_BUFFER_SIZE, DEFAULT_WRITE_BUFFER_SIZE};

/// Configuration for a `ShapefileDriver`
#[derive(Debug, Clone, PartialEq)]
pub struct DriverOptions {
    /// Read window for ".shp" and ".dbf" files (default: 32KB)
    pub read_buffer_size: usize,

    /// Read window for ".shx" files (default: 128 index records)
    pub index_buffer_size: usize,

    /// Write buffer for ".shp", ".shx" and ".dbf" files (default: 128KB)
    pub write_buffer_size: usize,

    /// Encoding label that overrides whatever the ".cpg" file or ".dbf"
    /// header says (default: none)
    pub force_encoding: Option<String>,

    /// Refuse to open a shapefile whose ".shx" and ".dbf" disagree on the
    /// number of records (default: false, a warning is logged instead)
    pub validate_record_counts: bool,
}

impl Default for DriverOptions {
    fn default() -> DriverOptions {
        DriverOptions {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            index_buffer_size: 8 * 128,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            force_encoding: None,
            validate_record_counts: false,
        }
    }
}

impl DriverOptions {
    pub fn new() -> DriverOptions {
        DriverOptions::default()
    }

    pub fn read_buffer_size(mut self, size: usize) -> DriverOptions {
        self.read_buffer_size = size;
        self
    }

    pub fn index_buffer_size(mut self, size: usize) -> DriverOptions {
        self.index_buffer_size = size;
        self
    }

    pub fn write_buffer_size(mut self, size: usize) -> DriverOptions {
        self.write_buffer_size = size;
        self
    }

    /// Read ".dbf" text as `label` (a WHATWG label such as "utf-8", or a code
    /// page such as "cp1251").
    pub fn force_encoding(mut self, label: &str) -> DriverOptions {
        self.force_encoding = Some(label.to_string());
        self
    }

    pub fn validate_record_counts(mut self, enabled: bool) -> DriverOptions {
        self.validate_record_counts = enabled;
        self
    }
}
