//! Maps dBase language-driver ids and ".cpg" code page names to text
//! encodings.

use encoding::all::WINDOWS_1252;
use encoding::label::encoding_from_whatwg_label;
use encoding::EncodingRef;
use regex::Regex;

/// WHATWG label of the encoding used when a file says nothing.
pub const DEFAULT_ENCODING: &'static str = "windows-1252";

/// Language driver id (header byte 29) to WHATWG label.
///
/// 0x4F is Korean here, not Big5: that is what Korean producers actually
/// write.
const LANGUAGE_DRIVERS: &'static [(u8, &'static str)] = &[
    (0x57, "windows-1252"),
    (0x03, "windows-1252"),
    (0x65, "ibm866"),
    (0x4D, "gbk"),
    (0x7A, "gbk"),
    (0x4F, "euc-kr"),
    (0x79, "euc-kr"),
    (0x78, "big5"),
    (0x13, "shift_jis"),
    (0x7B, "shift_jis"),
    (0xC8, "windows-1250"),
    (0xC9, "windows-1251"),
    (0xCA, "windows-1254"),
    (0xCB, "windows-1253"),
    (0xCC, "windows-1257"),
];

/// Windows code page number to WHATWG label, for ".cpg" files that hold a
/// bare number.
const CODE_PAGES: &'static [(&'static str, &'static str)] = &[
    ("65001", "utf-8"),
    ("28591", "windows-1252"),
    ("936", "gbk"),
    ("949", "euc-kr"),
    ("950", "big5"),
    ("932", "shift_jis"),
    ("866", "ibm866"),
    ("874", "windows-874"),
];

lazy_static! {
    static ref CODE_PAGE_NUMBER: Regex = Regex::new(r"^(?i:ansi|cp|windows|ms)?[ _-]?(\d{3,5})$").unwrap();
}

pub fn default_encoding() -> EncodingRef {
    WINDOWS_1252
}

pub fn is_default(encoding: EncodingRef) -> bool {
    encoding.whatwg_name() == Some(DEFAULT_ENCODING)
}

pub fn encoding_for_language_driver(ldid: u8) -> Option<EncodingRef> {
    LANGUAGE_DRIVERS.iter()
        .find(|&&(id, _)| id == ldid)
        .and_then(|&(_, label)| encoding_from_whatwg_label(label))
}

/// The byte to store in the header for `encoding`, or 0 when dBase has no id
/// for it (UTF-8, for one). A ".cpg" file has to carry those.
pub fn language_driver_for(encoding: EncodingRef) -> u8 {
    match encoding.whatwg_name() {
        None => 0,
        Some(name) => {
            LANGUAGE_DRIVERS.iter()
                .find(|&&(_, label)| label == name)
                .map(|&(id, _)| id)
                .unwrap_or(0)
        }
    }
}

/// Resolves a code page name as found in ".cpg" files or given by a user:
/// WHATWG labels ("UTF-8", "ISO-8859-1"), bare Windows code page numbers
/// ("1252", "65001") and prefixed ones ("ANSI 1251", "CP936").
pub fn encoding_from_label(label: &str) -> Option<EncodingRef> {
    let label = label.trim();
    if let Some(encoding) = encoding_from_whatwg_label(label) {
        return Some(encoding);
    }

    let number = match CODE_PAGE_NUMBER.captures(label).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => return None,
    };

    match CODE_PAGES.iter().find(|&&(n, _)| n == number) {
        Some(&(_, whatwg)) => encoding_from_whatwg_label(whatwg),
        None => encoding_from_whatwg_label(&format!("windows-{}", number)),
    }
}
