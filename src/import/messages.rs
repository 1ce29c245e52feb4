// User-facing strings for import results, kept in one place for translation.

pub const INVALID_FORMAT: &str = "invalid format";
pub const UNKNOWN_VERSION: &str = "unknown version of data";
pub const NO_PUZZLES_FOUND: &str = "no puzzles found";
pub const UNKNOWN_IMPORT_ERROR: &str = "unknown error occurred during import";
pub const IMPORT_CANCELLED: &str = "import cancelled";
pub const TRANSPORT_FAILED: &str = "could not read import source";

pub fn puzzles_saved(folder_name: &str) -> String {
    format!("Puzzles saved to folder '{}'.", folder_name)
}

pub fn folders_created(count: usize) -> String {
    format!("Folders created: {}", count)
}
