//! Registration number patterns for Indian business documents.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // GSTIN: state code, PAN, entity code, 'Z', checksum
    pub static ref GSTIN_LABELED: Regex = Regex::new(
        r"(?i)(?:Number|GSTIN)[\s:\-.]*(\d{2}[A-Z]{5}\d{4}[A-Z][1-9A-Z]Z[0-9A-Z])"
    ).unwrap();

    pub static ref GSTIN_STANDALONE: Regex = Regex::new(
        r"\b\d{2}[A-Z]{5}\d{4}[A-Z][1-9A-Z]Z[0-9A-Z]\b"
    ).unwrap();

    // CIN, tolerating OCR-inserted spaces between segments
    pub static ref CIN_LABELED: Regex = Regex::new(
        r"(?is)(?:CIN|Identity\s*Number).*?([LU]\s*\d{5}\s*[A-Z]{2}\s*\d{4}\s*[A-Z]{3}\s*\d{6})"
    ).unwrap();

    pub static ref CIN_STANDALONE: Regex = Regex::new(
        r"\b[LU]\s*\d{5}\s*[A-Z]{2}\s*\d{4}\s*[A-Z]{3}\s*\d{6}\b"
    ).unwrap();

    pub static ref UDYAM_NUMBER: Regex = Regex::new(
        r"(?i)UDYAM-[A-Z]{2}-\d{2}-\d{7}"
    ).unwrap();

    pub static ref FSSAI_LICENSE: Regex = Regex::new(
        r"(?i)(?:License|Lic).*?(\d{14})"
    ).unwrap();

    pub static ref GUMASTA_REGISTRATION: Regex = Regex::new(
        r"(?i)Registration\s*No[\s:\-.]*([A-Z0-9/]{5,25})"
    ).unwrap();

    pub static ref IEC_NUMBER: Regex = Regex::new(
        r"(?i)(?:IEC\s*Number|Code).*?(\d{10})"
    ).unwrap();

    // TAN is printed upper-case; matching is case-sensitive
    pub static ref TAN_NUMBER: Regex = Regex::new(
        r"[A-Z]{4}\d{5}[A-Z]"
    ).unwrap();

    pub static ref ENLISTMENT_NUMBER: Regex = Regex::new(
        r"(?i)(?:CE\s*No|Enlistment).*?(\d{10,15})"
    ).unwrap();
}
