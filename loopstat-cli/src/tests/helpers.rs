//! Test helpers for scratch directories and sample extracts.

use std::fmt::Write as _;

use camino::{Utf8Path, Utf8PathBuf};
use loopstat_core::test_support::recycling_rates;
use tempfile::TempDir;

pub(super) fn scratch_dir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write test file");
}

/// Write the four-country recycling sample as a Eurostat-style extract.
pub(super) fn write_recycling_extract(path: &Utf8Path) {
    let mut csv = String::from("Geopolitical entity (reporting),TIME_PERIOD,OBS_VALUE\n");
    for row in &recycling_rates() {
        writeln!(csv, "{},{},{}", row.entity, row.period, row.value).expect("format row");
    }
    write_utf8(path, csv.as_bytes());
}
