// Ingest core constants.
// These values are load-bearing for on-disk layout and manifest shape --
// do not change without updating DESIGN.md.

pub const TOOL_VERSION: u32 = 1;

// Hashing
pub const HASH_CHUNK_SIZE: usize = 1_048_576; // 1MB streaming buffer

// Paths
pub const PROJECT_STATE_DIR: &str = ".cullmate";
pub const MANIFESTS_FOLDER: &str = "manifests";
pub const REPORTS_FOLDER: &str = "reports";
pub const TEMP_FILE_SUFFIX: &str = ".partial";

// Legacy (no-template) routing
pub const LEGACY_RAW_FOLDER: &str = "01_RAW";
pub const LEGACY_SCAFFOLDS: [&str; 3] = ["01_RAW", "02_EXPORTS", "03_DELIVERY"];

// Media extension partitioning
pub const RAW_EXTENSIONS: [&str; 10] = [
    "cr2", "cr3", "nef", "arw", "dng", "raf", "rw2", "orf", "pef", "srw",
];
pub const PHOTO_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "heic", "tif", "tiff"];
pub const VIDEO_EXTENSIONS: [&str; 2] = ["mp4", "mov"];

// Scanner progress cadence
pub const SCAN_PROGRESS_INTERVAL: usize = 100;

// Verifier sentinel sampling
pub const SENTINEL_FULL_VERIFY_THRESHOLD: usize = 75;
pub const SENTINEL_SAMPLE_SIZE: usize = 25;
pub const VERIFY_PROGRESS_INTERVAL: usize = 10;
